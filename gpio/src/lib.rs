//! Driver stack for HD44780 character LCDs on a 4-bit bus.
//!
//! The pins can come from the Raspberry Pi GPIO directly ([raw::RawGpioDriver]) or from a
//! PCF8574/PCF8574A I2C expander ([expander::pcf8574::Pcf8574]). Both implement the
//! [GpioChannels] capability, which is all the [LCD driver](lcd::char_lcd::CharLcd) needs.
//!
//! Nothing in this crate locks internally. Every mutating operation takes `&mut self`, so sharing
//! a display between threads needs an external `Mutex` around it.
pub mod delay;
pub mod expander;
pub mod lcd;
pub mod pwm;
pub mod raw;

#[cfg(test)]
pub(crate) mod mock;

use std::any::Any;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("channel {channel} out of range, device has {count} channels")]
    InvalidChannel { channel: usize, count: usize },
    #[error("bad address for PCF8574(A): 0x{0:02X} not in range [0x20..0x27, 0x38..0x3F]")]
    InvalidAddress(u8),
    #[error("unknown pin map preset: {0}")]
    UnknownPreset(String),
    #[error("invalid pin map: {0}")]
    InvalidPinMap(String),
    #[error("unsupported display size {cols}x{lines}")]
    InvalidDimensions { cols: u8, lines: u8 },
    #[error("invalid argument")]
    InvalidArgument,
    #[error("the feature is not supported on this backend")]
    NotSupported,
    #[error("I2C error: {0}")]
    I2c(I2cBusError),
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl GpioError {
    /// Whether the error comes from a bad construction-time configuration, as opposed to a bad
    /// call argument or a transport failure.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GpioError::InvalidAddress(_)
                | GpioError::UnknownPreset(_)
                | GpioError::InvalidPinMap(_)
                | GpioError::InvalidDimensions { .. }
        )
    }
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Error returned by the I2C bus driver, kept as it was raised.
///
/// The concrete error can be recovered with [I2cBusError::downcast_ref], e.g. to get the errno of
/// a Linux `I2cdev`.
#[derive(Clone)]
pub struct I2cBusError {
    kind: embedded_hal::i2c::ErrorKind,
    description: String,
    error: Arc<dyn Any + Send + Sync>,
}

impl I2cBusError {
    pub fn new<E: embedded_hal::i2c::Error + Send + Sync + 'static>(error: E) -> Self {
        I2cBusError {
            kind: error.kind(),
            description: format!("{:?}", error),
            error: Arc::new(error),
        }
    }

    /// Gets the bus-independent classification of the error.
    pub fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        self.kind
    }

    pub fn downcast_ref<E: Any>(&self) -> Option<&E> {
        self.error.downcast_ref()
    }
}

impl Debug for I2cBusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)
    }
}

impl Display for I2cBusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?})", self.description, self.kind)
    }
}

/// Two errors are equal when they are the same error, or have the same kind and description.
impl PartialEq for I2cBusError {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.error, &other.error)
            || (self.kind == other.kind && self.description == other.description)
    }
}

impl Eq for I2cBusError {}

/// Specifies the active level of a line.
///
/// By default, the active level is high. With [GpioActiveLevel::Low], a logical "on" is driven
/// as a low signal.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioActiveLevel {
    #[default] High,
    Low,
}

impl GpioActiveLevel {
    /// Gets the real state that will be outputted on the line based on the active level and the value.
    pub fn get_state(&self, value: bool) -> bool {
        match self {
            GpioActiveLevel::High => value,
            GpioActiveLevel::Low => !value,
        }
    }

    /// Active-low when `invert` is set, active-high otherwise.
    pub fn from_inverted(invert: bool) -> Self {
        if invert { GpioActiveLevel::Low } else { GpioActiveLevel::High }
    }
}

/// Specifies the bias of an input line.
///
/// You can use this to enable pull-up or pull-down resistors, where the backend has them.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioBias {
    #[default] None,
    PullUp,
    PullDown,
}

/// A set of binary lines addressed by channel number.
///
/// This is the only thing the LCD driver and the backlight need from the hardware. Every
/// implementation validates the channel against [GpioChannels::count] before touching the device
/// and fails with [GpioError::InvalidChannel] otherwise.
pub trait GpioChannels: Debug {
    /// Gets the amount of channels available.
    fn count(&self) -> usize;

    /// Sets the channel function to output.
    fn configure_as_output(&mut self, channel: usize) -> GpioResult<()>;

    /// Sets the channel function to input, with the given bias.
    fn configure_as_input(&mut self, channel: usize, bias: GpioBias) -> GpioResult<()>;

    /// Drives the channel high or low.
    fn set(&mut self, channel: usize, value: bool) -> GpioResult<()>;

    /// Reads the level of the channel.
    fn get(&mut self, channel: usize) -> GpioResult<bool>;

    /// Writes several channels at once.
    ///
    /// Backends that can update all the lines in one transfer override this, the default just
    /// calls [GpioChannels::set] in order.
    fn set_many(&mut self, values: &[(usize, bool)]) -> GpioResult<()> {
        for &(channel, value) in values {
            self.set(channel, value)?;
        }
        Ok(())
    }

    /// Starts PWM output on the channel with a duty cycle in percent (`0.0..=100.0`).
    ///
    /// # Errors
    /// - `GpioError::NotSupported` if the backend has no PWM.
    fn start_pwm(&mut self, _channel: usize, _duty_cycle: f32) -> GpioResult<()> {
        Err(GpioError::NotSupported)
    }
}

/// Fails with [GpioError::InvalidChannel] unless `channel < count`.
pub fn check_channel(channel: usize, count: usize) -> GpioResult<()> {
    if channel >= count {
        return Err(GpioError::InvalidChannel { channel, count });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_level_inverts_only_when_low() {
        assert!(GpioActiveLevel::High.get_state(true));
        assert!(!GpioActiveLevel::High.get_state(false));
        assert!(!GpioActiveLevel::Low.get_state(true));
        assert!(GpioActiveLevel::Low.get_state(false));
        assert_eq!(GpioActiveLevel::from_inverted(true), GpioActiveLevel::Low);
    }

    #[test]
    fn channel_check_rejects_out_of_range() {
        assert_eq!(check_channel(7, 8), Ok(()));
        assert_eq!(
            check_channel(8, 8),
            Err(GpioError::InvalidChannel { channel: 8, count: 8 })
        );
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(GpioError::InvalidAddress(0x30).is_configuration());
        assert!(GpioError::UnknownPreset("foo".into()).is_configuration());
        assert!(!GpioError::InvalidChannel { channel: 9, count: 8 }.is_configuration());
        assert!(!GpioError::NotSupported.is_configuration());
    }
}
