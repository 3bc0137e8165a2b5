use crate::lcd::hd44780::driver::HD44780Driver;
use crate::lcd::hd44780::{ENABLE_PULSE_US, WRITE_DELAY_US};
use crate::{GpioChannels, GpioResult};
use embedded_hal::delay::DelayNs;
use log::trace;
use std::fmt::Debug;

/// Channels wired to the controller in 4-bit mode. RW is expected to be tied low.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LcdPins {
    pub rs: usize,
    pub en: usize,
    pub d4: usize,
    pub d5: usize,
    pub d6: usize,
    pub d7: usize,
}

impl LcdPins {
    pub fn all(&self) -> [usize; 6] {
        [self.rs, self.en, self.d4, self.d5, self.d6, self.d7]
    }

    pub fn data(&self) -> [usize; 4] {
        [self.d4, self.d5, self.d6, self.d7]
    }
}

/// HD44780 transport over six [GpioChannels] lines, using 4-bit mode.
#[derive(Debug)]
pub struct GpioHD44780Driver<G, D> {
    gpio: G,
    pins: LcdPins,
    delay: D,
}

impl<G: GpioChannels, D: DelayNs + Debug> GpioHD44780Driver<G, D> {
    /// Configures all six pins as outputs.
    ///
    /// # Errors
    /// - `GpioError::InvalidChannel` if a pin does not exist on `gpio`.
    pub fn new(mut gpio: G, pins: LcdPins, delay: D) -> GpioResult<Self> {
        for pin in pins.all() {
            gpio.configure_as_output(pin)?;
        }
        Ok(GpioHD44780Driver { gpio, pins, delay })
    }

    pub fn pins(&self) -> &LcdPins {
        &self.pins
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    pub fn into_inner(self) -> G {
        self.gpio
    }

    fn pulse_enable(&mut self) -> GpioResult<()> {
        self.gpio.set(self.pins.en, false)?;
        self.delay.delay_us(ENABLE_PULSE_US);
        self.gpio.set(self.pins.en, true)?;
        self.delay.delay_us(ENABLE_PULSE_US);
        self.gpio.set(self.pins.en, false)
    }

    fn write_nibble(&mut self, nibble: u8) -> GpioResult<()> {
        trace!("Writing nibble: {:04b}", nibble);
        let [d4, d5, d6, d7] = self.pins.data();
        self.gpio.set_many(&[
            (d4, nibble & 0b0001 != 0),
            (d5, nibble & 0b0010 != 0),
            (d6, nibble & 0b0100 != 0),
            (d7, nibble & 0b1000 != 0),
        ])?;
        self.pulse_enable()
    }
}

impl<G: GpioChannels, D: DelayNs + Debug> HD44780Driver for GpioHD44780Driver<G, D> {
    fn write_byte(&mut self, value: u8, char_mode: bool) -> GpioResult<()> {
        self.delay.delay_us(WRITE_DELAY_US);
        trace!("Sending byte: {:08b}, RS: {}", value, char_mode);

        self.gpio.set(self.pins.rs, char_mode)?;
        self.write_nibble(value >> 4)?;
        self.write_nibble(value & 0x0F)
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}
