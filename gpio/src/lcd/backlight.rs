//! LCD backlight, on one channel or on three RGB channels.
//!
//! The backlight is either switched (digital) or dimmed with PWM, chosen once. The polarity of the
//! wiring is fixed too: with [GpioActiveLevel::Low] an "on" request drives the line low and a
//! duty cycle of `d` percent is emitted as `100 - d`.

use crate::{GpioActiveLevel, GpioChannels, GpioError, GpioResult};
use log::debug;

/// Backlight intensity per colour component, `0.0..=1.0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Color {
    pub const WHITE: Color = Color::gray(1.0);
    pub const BLACK: Color = Color::gray(0.0);

    pub const fn new(red: f32, green: f32, blue: f32) -> Self {
        Color { red, green, blue }
    }

    /// The same intensity on all three components.
    pub const fn gray(intensity: f32) -> Self {
        Color { red: intensity, green: intensity, blue: intensity }
    }

    pub fn clamped(&self) -> Self {
        Color {
            red: self.red.clamp(0.0, 1.0),
            green: self.green.clamp(0.0, 1.0),
            blue: self.blue.clamp(0.0, 1.0),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BacklightChannels {
    None,
    Single(usize),
    Rgb { red: usize, green: usize, blue: usize },
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum BacklightMode {
    /// Zero is off, anything else is on.
    #[default]
    Digital,
    /// Intensity maps linearly to a `0..=100` duty cycle.
    Pwm,
}

/// Backlight wiring and its last applied colour.
///
/// A new backlight is digital, active-high and starts fully on. Boards that switch the LED through
/// a PNP transistor are active-low and need `with_polarity(GpioActiveLevel::Low)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Backlight {
    channels: BacklightChannels,
    mode: BacklightMode,
    polarity: GpioActiveLevel,
    initial: Color,
    color: Color,
}

impl Backlight {
    fn with_channels(channels: BacklightChannels) -> Self {
        Backlight {
            channels,
            mode: BacklightMode::Digital,
            polarity: GpioActiveLevel::High,
            initial: Color::WHITE,
            color: Color::BLACK,
        }
    }

    /// No controllable backlight. Setting it does nothing.
    pub fn none() -> Self {
        Self::with_channels(BacklightChannels::None)
    }

    pub fn single(channel: usize) -> Self {
        Self::with_channels(BacklightChannels::Single(channel))
    }

    pub fn rgb(red: usize, green: usize, blue: usize) -> Self {
        Self::with_channels(BacklightChannels::Rgb { red, green, blue })
    }

    pub fn with_mode(mut self, mode: BacklightMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_polarity(mut self, polarity: GpioActiveLevel) -> Self {
        self.polarity = polarity;
        self
    }

    /// Intensity applied by [Backlight::init]. A single channel uses the red component.
    pub fn with_initial(mut self, initial: Color) -> Self {
        self.initial = initial;
        self
    }

    pub fn channels(&self) -> BacklightChannels {
        self.channels
    }

    pub fn mode(&self) -> BacklightMode {
        self.mode
    }

    pub fn polarity(&self) -> GpioActiveLevel {
        self.polarity
    }

    /// Gets the last intensity written to each channel. A single channel reports it on all
    /// three components.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Converts an intensity to the duty cycle emitted on the line, honouring the polarity.
    pub fn duty_cycle(&self, intensity: f32) -> f32 {
        let duty = 100.0 * intensity.clamp(0.0, 1.0);
        match self.polarity {
            GpioActiveLevel::High => duty,
            GpioActiveLevel::Low => 100.0 - duty,
        }
    }

    /// Converts an intensity to the level driven on the line in digital mode.
    pub fn level(&self, intensity: f32) -> bool {
        self.polarity.get_state(intensity != 0.0)
    }

    /// Prepares the channels and applies the initial intensity.
    pub fn init<G: GpioChannels + ?Sized>(&mut self, gpio: &mut G) -> GpioResult<()> {
        debug!("Initializing backlight {:?} ({:?}, active {:?})", self.channels, self.mode, self.polarity);
        match self.channels {
            BacklightChannels::None => Ok(()),
            BacklightChannels::Single(channel) => {
                if self.mode == BacklightMode::Digital {
                    gpio.configure_as_output(channel)?;
                }
                self.set_backlight(gpio, self.initial.red)
            }
            BacklightChannels::Rgb { red, green, blue } => {
                if self.mode == BacklightMode::Digital {
                    for channel in [red, green, blue] {
                        gpio.configure_as_output(channel)?;
                    }
                }
                self.set_color(gpio, self.initial)
            }
        }
    }

    /// Sets the backlight intensity. On an RGB backlight this sets all three components, which
    /// gives white.
    pub fn set_backlight<G: GpioChannels + ?Sized>(&mut self, gpio: &mut G, intensity: f32) -> GpioResult<()> {
        match self.channels {
            BacklightChannels::None => Ok(()),
            BacklightChannels::Single(channel) => {
                match self.mode {
                    BacklightMode::Digital => gpio.set(channel, self.level(intensity))?,
                    BacklightMode::Pwm => gpio.start_pwm(channel, self.duty_cycle(intensity))?,
                }
                self.color = Color::gray(intensity.clamp(0.0, 1.0));
                Ok(())
            }
            BacklightChannels::Rgb { .. } => self.set_color(gpio, Color::gray(intensity)),
        }
    }

    /// Sets the colour of an RGB backlight. Components are clamped to `0.0..=1.0`.
    ///
    /// # Errors
    /// - `GpioError::NotSupported` on a single-channel backlight.
    pub fn set_color<G: GpioChannels + ?Sized>(&mut self, gpio: &mut G, color: Color) -> GpioResult<()> {
        let (red, green, blue) = match self.channels {
            BacklightChannels::None => return Ok(()),
            BacklightChannels::Single(_) => return Err(GpioError::NotSupported),
            BacklightChannels::Rgb { red, green, blue } => (red, green, blue),
        };
        let color = color.clamped();
        match self.mode {
            BacklightMode::Digital => gpio.set_many(&[
                (red, self.level(color.red)),
                (green, self.level(color.green)),
                (blue, self.level(color.blue)),
            ])?,
            BacklightMode::Pwm => {
                gpio.start_pwm(red, self.duty_cycle(color.red))?;
                gpio.start_pwm(green, self.duty_cycle(color.green))?;
                gpio.start_pwm(blue, self.duty_cycle(color.blue))?;
            }
        }
        self.color = color;
        Ok(())
    }
}
