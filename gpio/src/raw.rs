//! Memory-mapped GPIO of the Raspberry Pi (BCM2837/BCM2711).

use crate::{GpioBias, GpioChannels, GpioResult, check_channel};
use bitvec::vec::BitVec;
use log::{debug, trace};
use memmap2::{MmapOptions, MmapRaw};
use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;

// Register offsets in bytes from the start of the GPIO block.
const GPFSEL: usize = 0x00;
const GPSET: usize = 0x1C;
const GPCLR: usize = 0x28;
const GPLEV: usize = 0x34;
const GPIO_PUP_PDN_CNTRL: usize = 0xE4;

const FUNCTION_INPUT: u32 = 0b000;
const FUNCTION_OUTPUT: u32 = 0b001;

/// Direct access to the GPIO registers, one channel per BCM pin number.
///
/// Pins touched through [GpioChannels::configure_as_output] or
/// [GpioChannels::configure_as_input] are reset to unbiased inputs when the driver is dropped.
pub struct RawGpioDriver {
    mmap: MmapRaw,
    claimed: BitVec,
}

impl RawGpioDriver {
    /// Physical base of the GPIO block on BCM2835-BCM2837 (Pi 1-3).
    pub const GPIO_BASE_BCM2837: u64 = 0x3F20_0000;
    /// Physical base of the GPIO block on BCM2711 (Pi 4).
    pub const GPIO_BASE_BCM2711: u64 = 0xFE20_0000;

    pub const PIN_COUNT: usize = 58;

    fn create(path: &str, offset: u64) -> GpioResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let mmap = MmapOptions::new().offset(offset).len(4096).map_raw(&file)?;
        let driver = RawGpioDriver {
            mmap,
            claimed: BitVec::repeat(false, Self::PIN_COUNT),
        };
        debug!("{:?} mapped from {}", driver, path);
        Ok(driver)
    }

    /// Maps `/dev/gpiomem`, which only exposes the GPIO block and needs no root privileges.
    pub fn new_gpiomem() -> GpioResult<Self> {
        Self::create("/dev/gpiomem", 0)
    }

    /// Maps the GPIO block at `base` through `/dev/mem`. Requires root privileges.
    pub fn new_mem(base: u64) -> GpioResult<Self> {
        Self::create("/dev/mem", base)
    }

    fn register(&self, offset: usize, index: usize) -> *mut u32 {
        let base = self.mmap.as_mut_ptr() as *mut u32;
        // SAFETY: every offset used here stays below 0xF0, inside the 4096 byte mapping.
        unsafe { base.add(offset / 4 + index) }
    }

    fn read_register(&self, offset: usize, index: usize) -> u32 {
        // SAFETY: see `register`; the mapping is device memory, hence the volatile access.
        unsafe { self.register(offset, index).read_volatile() }
    }

    fn write_register(&mut self, offset: usize, index: usize, value: u32) {
        // SAFETY: see `register`.
        unsafe { self.register(offset, index).write_volatile(value) }
    }

    fn update_field(&mut self, offset: usize, (index, shift, mask): (usize, usize, u32), value: u32) {
        let mut register = self.read_register(offset, index);
        register &= !(mask << shift);
        register |= (value & mask) << shift;
        self.write_register(offset, index, register);
    }

    fn set_function(&mut self, pin: usize, function: u32) {
        self.update_field(GPFSEL, function_field(pin), function);
    }

    fn set_bias(&mut self, pin: usize, bias: GpioBias) {
        let value = match bias {
            GpioBias::None => 0b00,
            GpioBias::PullUp => 0b01,
            GpioBias::PullDown => 0b10,
        };
        self.update_field(GPIO_PUP_PDN_CNTRL, bias_field(pin), value);
    }

    fn claim(&mut self, pin: usize) {
        if !self.claimed[pin] {
            self.claimed.set(pin, true);
            trace!("{:?} claimed pin {}", self, pin);
        }
    }
}

/// Register index, bit shift and mask of a pin's function select field.
fn function_field(pin: usize) -> (usize, usize, u32) {
    (pin / 10, (pin % 10) * 3, 0b111)
}

/// Register index, bit shift and mask of a pin's pull-up/down field.
fn bias_field(pin: usize) -> (usize, usize, u32) {
    (pin / 16, (pin % 16) * 2, 0b11)
}

/// GPSET and GPCLR masks for both banks of 32 pins. A pin listed twice keeps its last value.
fn bank_masks(values: &[(usize, bool)]) -> [(u32, u32); 2] {
    let mut masks = [(0u32, 0u32); 2];
    for &(pin, value) in values {
        let (set, clear) = &mut masks[pin / 32];
        let bit = 1 << (pin % 32);
        if value {
            *set |= bit;
            *clear &= !bit;
        } else {
            *clear |= bit;
            *set &= !bit;
        }
    }
    masks
}

impl Debug for RawGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawGpioDriver({:#x})", self.mmap.as_ptr().addr())
    }
}

impl GpioChannels for RawGpioDriver {
    fn count(&self) -> usize {
        Self::PIN_COUNT
    }

    fn configure_as_output(&mut self, channel: usize) -> GpioResult<()> {
        check_channel(channel, Self::PIN_COUNT)?;
        self.claim(channel);
        self.set_bias(channel, GpioBias::None);
        self.set_function(channel, FUNCTION_OUTPUT);
        Ok(())
    }

    fn configure_as_input(&mut self, channel: usize, bias: GpioBias) -> GpioResult<()> {
        check_channel(channel, Self::PIN_COUNT)?;
        self.claim(channel);
        self.set_function(channel, FUNCTION_INPUT);
        self.set_bias(channel, bias);
        Ok(())
    }

    fn set(&mut self, channel: usize, value: bool) -> GpioResult<()> {
        self.set_many(&[(channel, value)])
    }

    fn get(&mut self, channel: usize) -> GpioResult<bool> {
        check_channel(channel, Self::PIN_COUNT)?;
        Ok(self.read_register(GPLEV, channel / 32) & (1 << (channel % 32)) != 0)
    }

    /// Changes every pin of a bank with one GPSET and one GPCLR write.
    fn set_many(&mut self, values: &[(usize, bool)]) -> GpioResult<()> {
        for &(channel, _) in values {
            check_channel(channel, Self::PIN_COUNT)?;
        }
        for (bank, (set, clear)) in bank_masks(values).into_iter().enumerate() {
            if set != 0 {
                self.write_register(GPSET, bank, set);
            }
            if clear != 0 {
                self.write_register(GPCLR, bank, clear);
            }
        }
        Ok(())
    }
}

impl Drop for RawGpioDriver {
    fn drop(&mut self) {
        let claimed: Vec<usize> = self.claimed.iter_ones().collect();
        for pin in claimed {
            self.set_function(pin, FUNCTION_INPUT);
            self.set_bias(pin, GpioBias::None);
        }
    }
}
