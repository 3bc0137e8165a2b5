//! Wiring of PCF8574 "I2C backpack" boards.
//!
//! The backpacks sold for HD44780 displays all use a PCF8574(A), but connect the LCD pins to
//! different expander bits. [PinMapPreset] lists the known layouts; a board that matches none of
//! them can be described with an explicit role → channel map.

use crate::lcd::hd44780::driver::LcdPins;
use crate::{GpioError, GpioResult, check_channel};
use log::warn;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Expander channel of every LCD line on a backpack board.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PcfPinMap {
    pub rs: usize,
    pub rw: usize,
    pub en: usize,
    pub bl: usize,
    pub d4: usize,
    pub d5: usize,
    pub d6: usize,
    pub d7: usize,
}

impl PcfPinMap {
    /// The six lines driven by the HD44780 protocol.
    pub fn lcd_pins(&self) -> LcdPins {
        LcdPins {
            rs: self.rs,
            en: self.en,
            d4: self.d4,
            d5: self.d5,
            d6: self.d6,
            d7: self.d7,
        }
    }

    fn channels(&self) -> [usize; 8] {
        [self.rs, self.rw, self.en, self.bl, self.d4, self.d5, self.d6, self.d7]
    }
}

/// Known backpack layouts.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PinMapPreset {
    /// DFRobot, YwRobot, Sainsmart and most generic black boards.
    DfRobot,
    /// [PinMapPreset::DfRobot] with the nibbles swapped.
    DfRobotSwapped,
    /// mjkdz board with the 22-turn trimmer, GY-LCD-V1.
    #[default]
    Mjkdz,
    /// [PinMapPreset::Mjkdz] with the nibbles swapped.
    MjkdzSwapped,
    /// Unlabelled layout with a reversed lower data nibble.
    Map4,
}

impl PinMapPreset {
    pub const ALL: [PinMapPreset; 5] = [
        PinMapPreset::DfRobot,
        PinMapPreset::DfRobotSwapped,
        PinMapPreset::Mjkdz,
        PinMapPreset::MjkdzSwapped,
        PinMapPreset::Map4,
    ];

    /// Gets the preset by its index in [PinMapPreset::ALL].
    pub fn from_index(index: usize) -> GpioResult<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| GpioError::UnknownPreset(index.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            PinMapPreset::DfRobot => "dfrobot",
            PinMapPreset::DfRobotSwapped => "dfrobot-swapped",
            PinMapPreset::Mjkdz => "mjkdz",
            PinMapPreset::MjkdzSwapped => "mjkdz-swapped",
            PinMapPreset::Map4 => "map4",
        }
    }

    pub fn pin_map(&self) -> PcfPinMap {
        let [rs, rw, en, bl, d4, d5, d6, d7] = match self {
            PinMapPreset::DfRobot => [0, 1, 2, 3, 4, 5, 6, 7],
            PinMapPreset::DfRobotSwapped => [4, 5, 6, 7, 0, 1, 2, 3],
            PinMapPreset::Mjkdz => [6, 5, 4, 7, 0, 1, 2, 3],
            PinMapPreset::MjkdzSwapped => [0, 1, 2, 3, 6, 5, 4, 7],
            PinMapPreset::Map4 => [4, 5, 6, 7, 2, 1, 0, 3],
        };
        PcfPinMap { rs, rw, en, bl, d4, d5, d6, d7 }
    }
}

/// Accepts the preset name, its index, or `map<index>`.
impl FromStr for PinMapPreset {
    type Err = GpioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if let Some(preset) = Self::ALL.iter().find(|preset| preset.name() == s) {
            return Ok(*preset);
        }
        let index = s.strip_prefix("map").unwrap_or(&s);
        match index.parse::<usize>() {
            Ok(index) => Self::from_index(index).map_err(|_| GpioError::UnknownPreset(s.clone())),
            Err(_) => Err(GpioError::UnknownPreset(s)),
        }
    }
}

impl Display for PinMapPreset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where the backpack layout comes from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PinMapSource {
    Preset(PinMapPreset),
    /// Role name (`rs`, `rw`, `en`, `bl`, `d4`..`d7`, case-insensitive, optionally prefixed
    /// with `PCF_`) to expander channel.
    Explicit(HashMap<String, usize>),
}

impl Default for PinMapSource {
    fn default() -> Self {
        PinMapSource::Preset(PinMapPreset::default())
    }
}

impl From<PinMapPreset> for PinMapSource {
    fn from(preset: PinMapPreset) -> Self {
        PinMapSource::Preset(preset)
    }
}

const ROLES: [&str; 8] = ["rs", "rw", "en", "bl", "d4", "d5", "d6", "d7"];

/// Resolves the layout into channel numbers.
///
/// Explicit maps must name every role, with distinct channels of the 8-bit expander. Keys that
/// are not a role are ignored.
pub fn resolve_pin_map(source: &PinMapSource) -> GpioResult<PcfPinMap> {
    let entries = match source {
        PinMapSource::Preset(preset) => return Ok(preset.pin_map()),
        PinMapSource::Explicit(entries) => entries,
    };

    let mut channels = [None; 8];
    for (key, &channel) in entries {
        let role = key.to_ascii_lowercase();
        let role = role.strip_prefix("pcf_").unwrap_or(&role);
        match ROLES.iter().position(|&name| name == role) {
            Some(index) => {
                check_channel(channel, 8)?;
                channels[index] = Some(channel);
            }
            None => warn!("Ignoring unknown pin map key: {}", key),
        }
    }

    let mut resolved = [0usize; 8];
    for (index, channel) in channels.iter().enumerate() {
        resolved[index] = channel
            .ok_or_else(|| GpioError::InvalidPinMap(format!("missing role {}", ROLES[index])))?;
    }
    let [rs, rw, en, bl, d4, d5, d6, d7] = resolved;
    let map = PcfPinMap { rs, rw, en, bl, d4, d5, d6, d7 };

    let used = map.channels();
    for (index, channel) in used.iter().enumerate() {
        if used[..index].contains(channel) {
            return Err(GpioError::InvalidPinMap(format!(
                "channel {} assigned to both {} and {}",
                channel,
                ROLES[used[..index].iter().position(|c| c == channel).unwrap_or(0)],
                ROLES[index],
            )));
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explicit(entries: &[(&str, usize)]) -> PinMapSource {
        PinMapSource::Explicit(entries.iter().map(|&(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn presets_match_the_known_boards() {
        let dfrobot = resolve_pin_map(&PinMapPreset::DfRobot.into()).unwrap();
        assert_eq!(dfrobot, PcfPinMap { rs: 0, rw: 1, en: 2, bl: 3, d4: 4, d5: 5, d6: 6, d7: 7 });
        let mjkdz = resolve_pin_map(&PinMapSource::default()).unwrap();
        assert_eq!(mjkdz, PcfPinMap { rs: 6, rw: 5, en: 4, bl: 7, d4: 0, d5: 1, d6: 2, d7: 3 });
        assert_eq!(PinMapPreset::Map4.pin_map().lcd_pins(), LcdPins { rs: 4, en: 6, d4: 2, d5: 1, d6: 0, d7: 3 });
    }

    #[test]
    fn every_preset_uses_each_channel_once() {
        for preset in PinMapPreset::ALL {
            let mut channels = preset.pin_map().channels();
            channels.sort();
            assert_eq!(channels, [0, 1, 2, 3, 4, 5, 6, 7], "{}", preset);
        }
    }

    #[test]
    fn presets_parse_by_name_or_index() {
        assert_eq!("mjkdz".parse::<PinMapPreset>(), Ok(PinMapPreset::Mjkdz));
        assert_eq!("DFRobot-Swapped".parse::<PinMapPreset>(), Ok(PinMapPreset::DfRobotSwapped));
        assert_eq!("0".parse::<PinMapPreset>(), Ok(PinMapPreset::DfRobot));
        assert_eq!("map3".parse::<PinMapPreset>(), Ok(PinMapPreset::MjkdzSwapped));
        assert_eq!(PinMapPreset::from_index(4), Ok(PinMapPreset::Map4));
    }

    #[test]
    fn unknown_presets_are_configuration_errors() {
        let err = "map5".parse::<PinMapPreset>().unwrap_err();
        assert_eq!(err, GpioError::UnknownPreset("map5".to_string()));
        assert!(err.is_configuration());
        assert!("sainsmart-blue".parse::<PinMapPreset>().is_err());
        assert!(PinMapPreset::from_index(5).is_err());
    }

    #[test]
    fn explicit_map_accepts_prefixed_keys() {
        let source = explicit(&[
            ("PCF_RS", 1), ("PCF_RW", 0), ("PCF_EN", 2), ("PCF_BL", 3),
            ("d4", 7), ("d5", 6), ("D6", 5), ("d7", 4), ("PCF_LED", 9),
        ]);
        let map = resolve_pin_map(&source).unwrap();
        assert_eq!(map, PcfPinMap { rs: 1, rw: 0, en: 2, bl: 3, d4: 7, d5: 6, d6: 5, d7: 4 });
    }

    #[test]
    fn explicit_map_must_be_complete_and_distinct() {
        let missing = explicit(&[("rs", 0), ("rw", 1), ("en", 2), ("bl", 3), ("d4", 4), ("d5", 5), ("d6", 6)]);
        assert_eq!(
            resolve_pin_map(&missing),
            Err(GpioError::InvalidPinMap("missing role d7".to_string()))
        );

        let duplicate = explicit(&[("rs", 0), ("rw", 1), ("en", 2), ("bl", 3), ("d4", 4), ("d5", 5), ("d6", 6), ("d7", 0)]);
        assert!(matches!(resolve_pin_map(&duplicate), Err(GpioError::InvalidPinMap(_))));

        let out_of_range = explicit(&[("rs", 8)]);
        assert!(matches!(resolve_pin_map(&out_of_range), Err(GpioError::InvalidChannel { .. })));
    }
}
