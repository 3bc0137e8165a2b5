use charlcd_gpio::lcd::backlight::{Backlight, BacklightMode, Color};
use charlcd_gpio::lcd::pin_map::{PinMapPreset, PinMapSource};
use charlcd_gpio::{GpioActiveLevel, GpioResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum Config {
    /// Display behind a PCF8574 backpack on `/dev/i2c-<bus>`.
    Pcf8574 {
        #[serde(default = "default_bus")]
        bus: u8,
        #[serde(default = "default_address")]
        address: u8,
        #[serde(default = "default_cols")]
        cols: u8,
        #[serde(default = "default_lines")]
        lines: u8,
        #[serde(default)]
        pin_map: PinMapConfig,
        #[serde(default = "default_intensity")]
        backlight: f32,
    },
    /// Display wired straight to the Raspberry Pi header, BCM numbering.
    Direct {
        rs: usize,
        en: usize,
        d4: usize,
        d5: usize,
        d6: usize,
        d7: usize,
        #[serde(default = "default_cols")]
        cols: u8,
        #[serde(default = "default_lines")]
        lines: u8,
        #[serde(default)]
        backlight: Option<BacklightConfig>,
    },
}

fn default_bus() -> u8 {
    1
}

fn default_address() -> u8 {
    0x3F
}

fn default_cols() -> u8 {
    16
}

fn default_lines() -> u8 {
    2
}

fn default_intensity() -> f32 {
    1.0
}

/// A preset name or index, or an explicit role to channel map.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum PinMapConfig {
    Index(usize),
    Preset(String),
    Explicit(HashMap<String, usize>),
}

impl Default for PinMapConfig {
    fn default() -> Self {
        PinMapConfig::Preset(PinMapPreset::default().name().to_string())
    }
}

impl PinMapConfig {
    pub fn to_source(&self) -> GpioResult<PinMapSource> {
        Ok(match self {
            PinMapConfig::Index(index) => PinMapPreset::from_index(*index)?.into(),
            PinMapConfig::Preset(name) => name.parse::<PinMapPreset>()?.into(),
            PinMapConfig::Explicit(entries) => PinMapSource::Explicit(entries.clone()),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BacklightConfig {
    /// One pin, or red, green and blue.
    pub pins: Vec<usize>,
    #[serde(default)]
    pub invert_polarity: bool,
    /// Sysfs PWM chip whose outputs 0, 1, 2 drive `pins` in order. Switched on/off when absent.
    #[serde(default)]
    pub pwm_chip: Option<usize>,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

impl BacklightConfig {
    pub fn backlight(&self) -> eyre::Result<Backlight> {
        let backlight = match self.pins[..] {
            [pin] => Backlight::single(pin),
            [red, green, blue] => Backlight::rgb(red, green, blue),
            _ => eyre::bail!("backlight needs 1 or 3 pins, got {}", self.pins.len()),
        };
        let mode = if self.pwm_chip.is_some() { BacklightMode::Pwm } else { BacklightMode::Digital };
        Ok(backlight
            .with_mode(mode)
            .with_polarity(GpioActiveLevel::from_inverted(self.invert_polarity))
            .with_initial(Color::gray(self.intensity)))
    }
}

impl Config {
    /// Loads the file named by `CHARLCD_CONFIG` (`charlcd.json` by default). A missing file gives
    /// the default configuration.
    pub fn load() -> eyre::Result<Self> {
        let config_str = var_os("CHARLCD_CONFIG");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("charlcd.json"));
        let config_path = Path::new(config_str);
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let file = std::fs::File::open(config_path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::Pcf8574 {
            bus: default_bus(),
            address: default_address(),
            cols: default_cols(),
            lines: default_lines(),
            pin_map: PinMapConfig::default(),
            backlight: default_intensity(),
        }
    }
}
