//! Busy-wait delays.
//!
//! The LCD protocol needs pauses of a few microseconds, far below what the OS scheduler can
//! deliver with `thread::sleep`, so the delays spin on a monotonic clock instead.

use embedded_hal::delay::DelayNs;
use std::hint::spin_loop;
use std::time::{Duration, Instant};

/// [DelayNs] implementation that spins on [Instant] until the deadline passes.
#[derive(Copy, Clone, Debug, Default)]
pub struct SpinDelay;

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        let deadline = Instant::now() + Duration::from_nanos(ns.into());
        while Instant::now() < deadline {
            spin_loop();
        }
    }
}
