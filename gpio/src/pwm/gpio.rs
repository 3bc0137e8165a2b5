use crate::pwm::PwmPin;
use crate::{GpioBias, GpioChannels, GpioError, GpioResult, check_channel};
use log::debug;
use std::collections::HashMap;

/// Adds hardware PWM to a [GpioChannels] backend.
///
/// [GpioChannels::start_pwm] on a routed channel drives the attached [PwmPin]; every other call
/// goes to the wrapped backend unchanged. The pin has to be muxed to its PWM function outside of
/// this driver (e.g. with the `pwm` device tree overlay on a Raspberry Pi).
#[derive(Debug)]
pub struct PwmGpio<G> {
    gpio: G,
    outputs: HashMap<usize, Box<dyn PwmPin>>,
    period_ns: u32,
}

impl<G: GpioChannels> PwmGpio<G> {
    /// 1 kHz, well above visible flicker.
    pub const DEFAULT_PERIOD_NS: u32 = 1_000_000;

    pub fn new(gpio: G) -> Self {
        PwmGpio {
            gpio,
            outputs: HashMap::new(),
            period_ns: Self::DEFAULT_PERIOD_NS,
        }
    }

    pub fn with_period_ns(mut self, period_ns: u32) -> Self {
        self.period_ns = period_ns;
        self
    }

    /// Sends PWM requests for `channel` to `pin`.
    pub fn route(&mut self, channel: usize, pin: Box<dyn PwmPin>) -> GpioResult<()> {
        check_channel(channel, self.gpio.count())?;
        debug!("Routing channel {} to {:?}", channel, pin);
        self.outputs.insert(channel, pin);
        Ok(())
    }

    pub fn is_routed(&self, channel: usize) -> bool {
        self.outputs.contains_key(&channel)
    }

    /// Disables the PWM output of a routed channel.
    ///
    /// # Errors
    /// - `GpioError::NotSupported` if the channel is not routed.
    pub fn stop_pwm(&mut self, channel: usize) -> GpioResult<()> {
        let pin = self.outputs.get_mut(&channel).ok_or(GpioError::NotSupported)?;
        pin.disable()
    }

    pub fn inner(&self) -> &G {
        &self.gpio
    }

    pub fn into_inner(self) -> G {
        self.gpio
    }
}

impl<G: GpioChannels> GpioChannels for PwmGpio<G> {
    fn count(&self) -> usize {
        self.gpio.count()
    }

    fn configure_as_output(&mut self, channel: usize) -> GpioResult<()> {
        self.gpio.configure_as_output(channel)
    }

    fn configure_as_input(&mut self, channel: usize, bias: GpioBias) -> GpioResult<()> {
        self.gpio.configure_as_input(channel, bias)
    }

    fn set(&mut self, channel: usize, value: bool) -> GpioResult<()> {
        self.gpio.set(channel, value)
    }

    fn get(&mut self, channel: usize) -> GpioResult<bool> {
        self.gpio.get(channel)
    }

    fn set_many(&mut self, values: &[(usize, bool)]) -> GpioResult<()> {
        self.gpio.set_many(values)
    }

    /// # Errors
    /// - `GpioError::InvalidArgument` if the duty cycle is outside `0.0..=100.0`.
    fn start_pwm(&mut self, channel: usize, duty_cycle: f32) -> GpioResult<()> {
        if !(0.0..=100.0).contains(&duty_cycle) {
            return Err(GpioError::InvalidArgument);
        }
        let Some(pin) = self.outputs.get_mut(&channel) else {
            return self.gpio.start_pwm(channel, duty_cycle);
        };

        if pin.period_ns()? != self.period_ns {
            // The duty time may not exceed the period at any point.
            pin.set_duty_ns(0)?;
            pin.set_period_ns(self.period_ns)?;
        }
        let duty_ns = (self.period_ns as f64 * duty_cycle as f64 / 100.0).round() as u32;
        pin.set_duty_ns(duty_ns)?;
        if !pin.is_enabled()? {
            pin.enable()?;
        }
        Ok(())
    }
}
