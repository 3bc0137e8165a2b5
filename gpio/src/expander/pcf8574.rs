//! PCF8574 and PCF8574A 8-bit I2C GPIO expanders.
//!
//! The chip has no registers besides the port itself: writing a byte sets the latches, reading
//! returns the line levels. Its lines are quasi-bidirectional, a latch written as `1` only drives
//! weakly high, so an external device can pull it low and the line can be read back as an input.
//! There is no way to read the latches, so the driver keeps two shadow bytes and always writes
//! them combined.

use crate::{GpioBias, GpioChannels, GpioError, GpioResult, I2cBusError, check_channel};
use embedded_hal::i2c::I2c;
use log::{debug, trace};
use std::fmt::{Debug, Formatter};
use std::ops::RangeInclusive;

/// Which chip an address belongs to. The two only differ in their address range.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Pcf8574Variant {
    Pcf8574,
    Pcf8574A,
}

impl Pcf8574Variant {
    pub const PCF8574_ADDRESSES: RangeInclusive<u8> = 0x20..=0x27;
    pub const PCF8574A_ADDRESSES: RangeInclusive<u8> = 0x38..=0x3F;

    /// Gets the variant for a 7-bit I2C address.
    ///
    /// # Errors
    /// - `GpioError::InvalidAddress` if the address belongs to neither chip.
    pub fn from_address(address: u8) -> GpioResult<Self> {
        if Self::PCF8574_ADDRESSES.contains(&address) {
            Ok(Pcf8574Variant::Pcf8574)
        } else if Self::PCF8574A_ADDRESSES.contains(&address) {
            Ok(Pcf8574Variant::Pcf8574A)
        } else {
            Err(GpioError::InvalidAddress(address))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Pcf8574Variant::Pcf8574 => "PCF8574",
            Pcf8574Variant::Pcf8574A => "PCF8574A",
        }
    }
}

/// Driver exposing the 8 expander lines as [GpioChannels].
pub struct Pcf8574<I2C> {
    i2c: I2C,
    address: u8,
    variant: Pcf8574Variant,
    /// Bit set = input. Inputs are always written as `1` so they float high.
    direction: u8,
    /// Bit set = driven high.
    output: u8,
}

impl<I2C: I2c> Pcf8574<I2C>
where
    I2C::Error: Send + Sync + 'static,
{
    pub const CHANNEL_COUNT: usize = 8;

    /// Creates the driver and writes the initial state: every line an input.
    ///
    /// # Errors
    /// - `GpioError::InvalidAddress` if the address is not a PCF8574(A) address.
    /// - `GpioError::I2c` if the initial write fails.
    pub fn new(i2c: I2C, address: u8) -> GpioResult<Self> {
        let variant = Pcf8574Variant::from_address(address)?;
        let mut driver = Pcf8574 {
            i2c,
            address,
            variant,
            direction: 0xFF,
            output: 0x00,
        };
        driver.write_pins()?;
        debug!("{:?} initialized.", driver);
        Ok(driver)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn variant(&self) -> Pcf8574Variant {
        self.variant
    }

    pub fn device_name(&self) -> &'static str {
        self.variant.name()
    }

    /// Gets the direction shadow. Bit set = input.
    pub fn direction(&self) -> u8 {
        self.direction
    }

    /// Gets the output shadow. Bit set = driven high.
    pub fn output(&self) -> u8 {
        self.output
    }

    pub fn i2c(&self) -> &I2C {
        &self.i2c
    }

    /// Releases the underlying bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_pins(&mut self) -> GpioResult<()> {
        let byte = self.output | self.direction;
        trace!("{:?} write {:08b}", self, byte);
        self.i2c
            .write(self.address, &[byte])
            .map_err(|err| GpioError::I2c(I2cBusError::new(err)))
    }

    fn read_pins(&mut self) -> GpioResult<u8> {
        let mut buffer = [0u8];
        self.i2c
            .read(self.address, &mut buffer)
            .map_err(|err| GpioError::I2c(I2cBusError::new(err)))?;
        trace!("{:?} read {:08b}", self, buffer[0]);
        Ok(buffer[0])
    }
}

fn with_bit(byte: u8, bit: usize, value: bool) -> u8 {
    if value {
        byte | (1 << bit)
    } else {
        byte & !(1 << bit)
    }
}

impl<I2C> Debug for Pcf8574<I2C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(0x{:02X})", self.variant.name(), self.address)
    }
}

impl<I2C: I2c> GpioChannels for Pcf8574<I2C>
where
    I2C::Error: Send + Sync + 'static,
{
    fn count(&self) -> usize {
        Self::CHANNEL_COUNT
    }

    fn configure_as_output(&mut self, channel: usize) -> GpioResult<()> {
        check_channel(channel, Self::CHANNEL_COUNT)?;
        self.direction = with_bit(self.direction, channel, false);
        self.write_pins()
    }

    /// The chip only has weak pull-ups, which are always on for inputs.
    fn configure_as_input(&mut self, channel: usize, bias: GpioBias) -> GpioResult<()> {
        check_channel(channel, Self::CHANNEL_COUNT)?;
        if bias == GpioBias::PullDown {
            return Err(GpioError::NotSupported);
        }
        self.direction = with_bit(self.direction, channel, true);
        self.write_pins()
    }

    fn set(&mut self, channel: usize, value: bool) -> GpioResult<()> {
        check_channel(channel, Self::CHANNEL_COUNT)?;
        self.output = with_bit(self.output, channel, value);
        self.write_pins()
    }

    /// Inputs report the line level, outputs report their own latch value.
    fn get(&mut self, channel: usize) -> GpioResult<bool> {
        check_channel(channel, Self::CHANNEL_COUNT)?;
        let input = self.read_pins()? & self.direction;
        let levels = input | (self.output & !self.direction);
        Ok(levels & (1 << channel) != 0)
    }

    /// Updates all the latches with a single I2C write.
    fn set_many(&mut self, values: &[(usize, bool)]) -> GpioResult<()> {
        for &(channel, _) in values {
            check_channel(channel, Self::CHANNEL_COUNT)?;
        }
        self.output = values
            .iter()
            .fold(self.output, |byte, &(channel, value)| with_bit(byte, channel, value));
        self.write_pins()
    }
}
