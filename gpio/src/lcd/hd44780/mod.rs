//! HD44780 LCD module.
//!
//! Command bytes and flags of the HD44780 instruction set, plus the timings the driver uses.
//! See [driver::HD44780Driver] for the command layer and [driver::GpioHD44780Driver] for the
//! 4-bit transport over [GpioChannels](crate::GpioChannels).

pub mod driver;

/// Instruction codes. Flags from [flags] are OR-ed into them.
pub mod command {
    pub const CLEAR_DISPLAY: u8 = 0b00000001;
    pub const RETURN_HOME: u8 = 0b00000010;
    pub const ENTRY_MODE_SET: u8 = 0b00000100;
    pub const DISPLAY_CONTROL: u8 = 0b00001000;
    pub const CURSOR_SHIFT: u8 = 0b00010000;
    pub const FUNCTION_SET: u8 = 0b00100000;
    pub const SET_CGRAM_ADDRESS: u8 = 0b01000000;
    pub const SET_DDRAM_ADDRESS: u8 = 0b10000000;
}

pub mod flags {
    // Entry mode
    pub const ENTRY_LEFT: u8 = 0b00000010;
    pub const ENTRY_SHIFT_INCREMENT: u8 = 0b00000001;

    // Display control
    pub const DISPLAY_ON: u8 = 0b00000100;
    pub const CURSOR_ON: u8 = 0b00000010;
    pub const BLINK_ON: u8 = 0b00000001;

    // Cursor shift
    pub const DISPLAY_MOVE: u8 = 0b00001000;
    pub const MOVE_RIGHT: u8 = 0b00000100;

    // Function set, 4-bit mode and 5x8 dots are the zero bits
    pub const TWO_LINE: u8 = 0b00001000;
}

/// DDRAM address of the first column of each row. Rows 2 and 3 continue rows 0 and 1 in memory.
pub const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Maximum number of rows addressable through [ROW_OFFSETS].
pub const MAX_LINES: u8 = ROW_OFFSETS.len() as u8;

/// Pause before every byte, long enough for any regular instruction to finish.
pub const WRITE_DELAY_US: u32 = 1000;

/// Extra settle time after clear display and return home.
pub const SLOW_COMMAND_DELAY_US: u32 = 3000;

/// Half-period of the enable pulse. The datasheet wants more than 450 ns.
pub const ENABLE_PULSE_US: u32 = 1;

/// Sent before anything else. Split into nibbles these are three 8-bit function sets followed by
/// the switch to 4-bit mode, which brings the controller into 4-bit mode from any state.
pub const INIT_SEQUENCE: [u8; 2] = [0x33, 0x32];
