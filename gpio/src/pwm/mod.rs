//! Hardware PWM outputs and their routing into [GpioChannels](crate::GpioChannels).

mod gpio;
mod sysfs;

use crate::GpioResult;
use std::fmt::Debug;
pub use gpio::*;
pub use sysfs::*;

/// A PWM controller with a fixed amount of outputs.
pub trait PwmDriver: Debug {
    fn count(&self) -> GpioResult<usize>;

    /// Claims an output. The returned pin owns its handle and outlives the driver.
    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn PwmPin>>;
}

/// A single PWM output. Times are in nanoseconds, the duty time never exceeds the period.
pub trait PwmPin: Debug {
    fn period_ns(&self) -> GpioResult<u32>;
    fn set_period_ns(&mut self, period_ns: u32) -> GpioResult<()>;

    fn duty_ns(&self) -> GpioResult<u32>;
    fn set_duty_ns(&mut self, duty_ns: u32) -> GpioResult<()>;

    fn is_enabled(&self) -> GpioResult<bool>;
    fn enable(&mut self) -> GpioResult<()>;
    fn disable(&mut self) -> GpioResult<()>;
}
