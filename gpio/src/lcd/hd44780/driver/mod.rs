mod gpio;

use crate::lcd::hd44780::{command, flags, SLOW_COMMAND_DELAY_US};
use crate::{GpioError, GpioResult};
pub use gpio::*;
use std::fmt::Debug;

/// Low-level command layer of the HD44780 controller.
///
/// Implementations only provide the byte transport ([HD44780Driver::write_byte]) and a delay, the
/// instructions are built on top of them. The controller is never read back, whatever state the
/// caller needs has to be kept on the host side (see [CharLcd](crate::lcd::char_lcd::CharLcd)).
pub trait HD44780Driver: Debug {
    /// Writes a full byte to the controller.
    /// `char_mode` selects display data (RS high) instead of an instruction (RS low).
    fn write_byte(&mut self, value: u8, char_mode: bool) -> GpioResult<()>;

    /// Waits for the given amount of microseconds.
    fn delay_us(&mut self, us: u32);

    /// Sends an instruction to the HD44780 controller.
    fn send_command(&mut self, command: u8) -> GpioResult<()> {
        self.write_byte(command, false)
    }

    /// Sends display data to the HD44780 controller.
    fn send_data(&mut self, data: u8) -> GpioResult<()> {
        self.write_byte(data, true)
    }

    /// Clears the display and sets the cursor to the home position.
    fn clear_display(&mut self) -> GpioResult<()> {
        self.send_command(command::CLEAR_DISPLAY)?;
        self.delay_us(SLOW_COMMAND_DELAY_US);
        Ok(())
    }

    /// Sets the cursor to the home position.
    fn return_home(&mut self) -> GpioResult<()> {
        self.send_command(command::RETURN_HOME)?;
        self.delay_us(SLOW_COMMAND_DELAY_US);
        Ok(())
    }

    /// Sets the entry mode register. `mode` is a combination of the entry mode [flags].
    fn set_entry_mode(&mut self, mode: u8) -> GpioResult<()> {
        self.send_command(command::ENTRY_MODE_SET | mode)
    }

    /// Sets the display control register. `control` is a combination of the display control [flags].
    fn set_display_control(&mut self, control: u8) -> GpioResult<()> {
        self.send_command(command::DISPLAY_CONTROL | control)
    }

    /// Moves the cursor or shifts the display.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) -> GpioResult<()> {
        let mut command = command::CURSOR_SHIFT;
        if display_shift {
            command |= flags::DISPLAY_MOVE;
        }
        if direction == CursorDirection::Right {
            command |= flags::MOVE_RIGHT;
        }
        self.send_command(command)
    }

    /// Sets the function set register. `function` is a combination of the function set [flags].
    fn function_set(&mut self, function: u8) -> GpioResult<()> {
        self.send_command(command::FUNCTION_SET | function)
    }

    /// Sets the CGRAM address.
    fn set_cgram_address(&mut self, address: u8) -> GpioResult<()> {
        if address > 0b00111111 {
            return Err(GpioError::InvalidArgument);
        }
        self.send_command(command::SET_CGRAM_ADDRESS | address)
    }

    /// Sets the DDRAM address.
    fn set_ddram_address(&mut self, address: u8) -> GpioResult<()> {
        if address > 0b01111111 {
            return Err(GpioError::InvalidArgument);
        }
        self.send_command(command::SET_DDRAM_ADDRESS | address)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    Left,
    Right,
}
