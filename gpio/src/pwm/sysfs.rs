use crate::pwm::{PwmDriver, PwmPin};
use crate::{GpioError, GpioResult};
use log::debug;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};

const SYSFS_PWM_PATH: &str = "/sys/class/pwm";

fn read_attribute(path: &Path) -> GpioResult<u32> {
    let content = std::fs::read_to_string(path)?;
    content
        .trim()
        .parse()
        .map_err(|_| GpioError::Other(format!("parsing {} failed", path.display())))
}

fn write_attribute(path: &Path, value: u32) -> GpioResult<()> {
    std::fs::write(path, value.to_string())?;
    Ok(())
}

/// PWM chip exposed by the kernel under `/sys/class/pwm/pwmchipN`.
pub struct SysfsPwmDriver {
    base_path: PathBuf,
}

impl SysfsPwmDriver {
    pub fn count_chips() -> GpioResult<usize> {
        let path = Path::new(SYSFS_PWM_PATH);
        Ok((0..)
            .take_while(|index| path.join(format!("pwmchip{}", index)).exists())
            .count())
    }

    /// Opens `/sys/class/pwm/pwmchip<index>`.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the chip does not exist.
    pub fn get_chip(index: usize) -> GpioResult<Self> {
        Self::from_path(Path::new(SYSFS_PWM_PATH).join(format!("pwmchip{}", index)))
    }

    /// Opens a chip directory at an arbitrary path.
    pub fn from_path(path: impl Into<PathBuf>) -> GpioResult<Self> {
        let base_path = path.into();
        if !base_path.is_dir() {
            return Err(GpioError::InvalidArgument);
        }
        Ok(SysfsPwmDriver { base_path })
    }
}

impl Debug for SysfsPwmDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SysfsPwmDriver({:?})", self.base_path)
    }
}

impl PwmDriver for SysfsPwmDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(read_attribute(&self.base_path.join("npwm"))? as usize)
    }

    /// Exports the output unless it already is.
    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn PwmPin>> {
        if index >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }
        let path = self.base_path.join(format!("pwm{}", index));
        if !path.exists() {
            write_attribute(&self.base_path.join("export"), index as u32)?;
            if !path.exists() {
                return Err(GpioError::Other(format!("exporting {} failed", path.display())));
            }
        }
        debug!("Using PWM output {:?}", path);
        Ok(Box::new(SysfsPwmPin { base_path: path }))
    }
}

pub struct SysfsPwmPin {
    base_path: PathBuf,
}

impl Debug for SysfsPwmPin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SysfsPwmPin({:?})", self.base_path)
    }
}

impl PwmPin for SysfsPwmPin {
    fn period_ns(&self) -> GpioResult<u32> {
        read_attribute(&self.base_path.join("period"))
    }

    fn set_period_ns(&mut self, period_ns: u32) -> GpioResult<()> {
        write_attribute(&self.base_path.join("period"), period_ns)
    }

    fn duty_ns(&self) -> GpioResult<u32> {
        read_attribute(&self.base_path.join("duty_cycle"))
    }

    fn set_duty_ns(&mut self, duty_ns: u32) -> GpioResult<()> {
        write_attribute(&self.base_path.join("duty_cycle"), duty_ns)
    }

    fn is_enabled(&self) -> GpioResult<bool> {
        match read_attribute(&self.base_path.join("enable"))? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(GpioError::Other("parsing PWM enabled state failed".to_string())),
        }
    }

    fn enable(&mut self) -> GpioResult<()> {
        write_attribute(&self.base_path.join("enable"), 1)
    }

    fn disable(&mut self) -> GpioResult<()> {
        write_attribute(&self.base_path.join("enable"), 0)
    }
}
