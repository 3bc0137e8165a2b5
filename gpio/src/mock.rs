//! Test doubles shared by the unit tests.

use crate::lcd::hd44780::driver::LcdPins;
use crate::pwm::PwmPin;
use crate::{GpioBias, GpioChannels, GpioError, GpioResult, check_channel};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Event {
    Output(usize),
    Input(usize, GpioBias),
    Set(usize, bool),
    Pwm(usize, f32),
    Delay(u32),
}

pub type Recorder = Rc<RefCell<Vec<Event>>>;

pub fn recorder() -> Recorder {
    Rc::new(RefCell::new(Vec::new()))
}

/// GPIO capability that remembers levels and logs every call.
#[derive(Debug)]
pub struct MockGpio {
    levels: Vec<bool>,
    pwm: bool,
    log: Recorder,
}

impl MockGpio {
    pub fn new(count: usize, log: Recorder) -> Self {
        Self { levels: vec![false; count], pwm: false, log }
    }

    pub fn with_pwm(mut self) -> Self {
        self.pwm = true;
        self
    }

    pub fn level(&self, channel: usize) -> bool {
        self.levels[channel]
    }
}

impl GpioChannels for MockGpio {
    fn count(&self) -> usize {
        self.levels.len()
    }

    fn configure_as_output(&mut self, channel: usize) -> GpioResult<()> {
        check_channel(channel, self.count())?;
        self.log.borrow_mut().push(Event::Output(channel));
        Ok(())
    }

    fn configure_as_input(&mut self, channel: usize, bias: GpioBias) -> GpioResult<()> {
        check_channel(channel, self.count())?;
        self.log.borrow_mut().push(Event::Input(channel, bias));
        Ok(())
    }

    fn set(&mut self, channel: usize, value: bool) -> GpioResult<()> {
        check_channel(channel, self.count())?;
        self.levels[channel] = value;
        self.log.borrow_mut().push(Event::Set(channel, value));
        Ok(())
    }

    fn get(&mut self, channel: usize) -> GpioResult<bool> {
        check_channel(channel, self.count())?;
        Ok(self.levels[channel])
    }

    fn start_pwm(&mut self, channel: usize, duty_cycle: f32) -> GpioResult<()> {
        if !self.pwm {
            return Err(GpioError::NotSupported);
        }
        check_channel(channel, self.count())?;
        self.log.borrow_mut().push(Event::Pwm(channel, duty_cycle));
        Ok(())
    }
}

/// Delay that returns immediately and logs the requested duration in microseconds.
#[derive(Debug)]
pub struct MockDelay {
    log: Recorder,
}

impl MockDelay {
    pub fn new(log: Recorder) -> Self {
        Self { log }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.borrow_mut().push(Event::Delay(ns.div_ceil(1000)));
    }

    fn delay_us(&mut self, us: u32) {
        self.log.borrow_mut().push(Event::Delay(us));
    }
}

/// Replays the pin log and returns every byte latched by the controller, with its RS level.
///
/// A nibble is latched on each rising edge of EN; two nibbles make a byte, high nibble first.
pub fn decode_bytes(events: &[Event], pins: &LcdPins) -> Vec<(u8, bool)> {
    let mut levels = [false; 64];
    let mut nibbles = Vec::new();
    for event in events {
        if let Event::Set(channel, value) = *event {
            let rising = channel == pins.en && value && !levels[channel];
            levels[channel] = value;
            if rising {
                let nibble = [pins.d4, pins.d5, pins.d6, pins.d7]
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (bit, &pin)| acc | ((levels[pin] as u8) << bit));
                nibbles.push((nibble, levels[pins.rs]));
            }
        }
    }
    nibbles
        .chunks(2)
        .filter(|pair| pair.len() == 2)
        .map(|pair| ((pair[0].0 << 4) | pair[1].0, pair[0].1))
        .collect()
}

/// Bus error carrying an errno, like the Linux I2C driver reports.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MockBusError {
    pub errno: i32,
    pub kind: ErrorKind,
}

impl embedded_hal::i2c::Error for MockBusError {
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// I2C bus with a single PCF8574-like device.
///
/// The expander lines are quasi-bidirectional: a line reads high only if the last written byte
/// left it high and nothing external pulls it low.
#[derive(Debug)]
pub struct MockI2c {
    pub writes: Vec<(u8, u8)>,
    pub external: u8,
    /// Every transaction fails once this many bytes have been written.
    pub fail: Option<(usize, MockBusError)>,
    latched: u8,
}

impl MockI2c {
    pub fn new() -> Self {
        Self { writes: Vec::new(), external: 0xFF, fail: None, latched: 0xFF }
    }

    pub fn failing_after(writes: usize, error: MockBusError) -> Self {
        Self { fail: Some((writes, error)), ..Self::new() }
    }

    pub fn last_write(&self) -> Option<u8> {
        self.writes.last().map(|&(_, byte)| byte)
    }
}

impl ErrorType for MockI2c {
    type Error = MockBusError;
}

impl I2c for MockI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), MockBusError> {
        if let Some((after, error)) = self.fail {
            if self.writes.len() >= after {
                return Err(error);
            }
        }
        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        self.writes.push((address, byte));
                        self.latched = byte;
                    }
                }
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = self.latched & self.external;
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct PwmState {
    pub period_ns: u32,
    pub duty_ns: u32,
    pub enabled: bool,
}

/// PWM output that keeps its attributes in shared state, so a test can inspect a pin it handed
/// out as a `Box<dyn PwmPin>`.
#[derive(Clone, Debug, Default)]
pub struct MockPwmPin {
    state: Rc<RefCell<PwmState>>,
}

impl MockPwmPin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PwmPin for MockPwmPin {
    fn period_ns(&self) -> GpioResult<u32> {
        Ok(self.state.borrow().period_ns)
    }

    fn set_period_ns(&mut self, period_ns: u32) -> GpioResult<()> {
        let mut state = self.state.borrow_mut();
        if state.duty_ns > period_ns {
            return Err(GpioError::InvalidArgument);
        }
        state.period_ns = period_ns;
        Ok(())
    }

    fn duty_ns(&self) -> GpioResult<u32> {
        Ok(self.state.borrow().duty_ns)
    }

    fn set_duty_ns(&mut self, duty_ns: u32) -> GpioResult<()> {
        let mut state = self.state.borrow_mut();
        if duty_ns > state.period_ns {
            return Err(GpioError::InvalidArgument);
        }
        state.duty_ns = duty_ns;
        Ok(())
    }

    fn is_enabled(&self) -> GpioResult<bool> {
        Ok(self.state.borrow().enabled)
    }

    fn enable(&mut self) -> GpioResult<()> {
        self.state.borrow_mut().enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> GpioResult<()> {
        self.state.borrow_mut().enabled = false;
        Ok(())
    }
}
