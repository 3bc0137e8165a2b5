//! High-level character LCD driver.
//!
//! [CharLcd] keeps the HD44780 configuration registers (display control, function set and entry
//! mode) in memory, since the controller cannot be read back, and re-sends a whole register
//! whenever one of its bits changes. Pins come from any [GpioChannels], the backlight is described
//! by a [Backlight].
//!
//! ```no_run
//! # use charlcd_gpio::delay::SpinDelay;
//! # use charlcd_gpio::lcd::char_lcd::{CharLcd, Pcf8574LcdConfig};
//! # fn run<I2C: embedded_hal::i2c::I2c>(i2c: I2C) -> charlcd_gpio::GpioResult<()>
//! # where
//! #     I2C::Error: Send + Sync + 'static,
//! # {
//! let mut lcd = CharLcd::pcf8574(i2c, Pcf8574LcdConfig::default(), SpinDelay)?;
//! lcd.write_text("Hello\nworld")?;
//! # Ok(())
//! # }
//! ```

use crate::delay::SpinDelay;
use crate::expander::pcf8574::Pcf8574;
use crate::lcd::backlight::{Backlight, Color};
use crate::lcd::hd44780::driver::{CursorDirection, GpioHD44780Driver, HD44780Driver, LcdPins};
use crate::lcd::hd44780::{flags, INIT_SEQUENCE, MAX_LINES, ROW_OFFSETS};
use crate::lcd::pin_map::{resolve_pin_map, PinMapSource};
use crate::{GpioChannels, GpioError, GpioResult};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, warn};
use std::fmt::Debug;

/// Longest line the controller can address.
pub const MAX_COLUMNS: u8 = 40;

/// Geometry and backlight of a display.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CharLcdConfig {
    pub cols: u8,
    pub lines: u8,
    pub backlight: Backlight,
}

impl Default for CharLcdConfig {
    fn default() -> Self {
        CharLcdConfig {
            cols: 16,
            lines: 2,
            backlight: Backlight::none(),
        }
    }
}

/// Configuration of a display behind a PCF8574 backpack.
#[derive(Clone, Debug, PartialEq)]
pub struct Pcf8574LcdConfig {
    pub address: u8,
    pub cols: u8,
    pub lines: u8,
    pub pin_map: PinMapSource,
    pub initial_backlight: f32,
}

impl Default for Pcf8574LcdConfig {
    fn default() -> Self {
        Pcf8574LcdConfig {
            address: 0x3F,
            cols: 16,
            lines: 2,
            pin_map: PinMapSource::default(),
            initial_backlight: 1.0,
        }
    }
}

#[derive(Debug)]
pub struct CharLcd<G, D = SpinDelay> {
    driver: GpioHD44780Driver<G, D>,
    cols: u8,
    lines: u8,
    display_control: u8,
    display_function: u8,
    entry_mode: u8,
    backlight: Backlight,
}

impl<G: GpioChannels, D: DelayNs + Debug> CharLcd<G, D> {
    /// Sets up the pins and the backlight, then runs the initialization sequence and clears the
    /// display.
    ///
    /// # Errors
    /// - `GpioError::InvalidDimensions` unless there are 1 to 40 columns and 1 to 4 lines.
    /// - `GpioError::InvalidChannel` if a pin does not exist on `gpio`.
    pub fn new(gpio: G, pins: LcdPins, config: CharLcdConfig, delay: D) -> GpioResult<Self> {
        let CharLcdConfig { cols, lines, backlight } = config;
        if !(1..=MAX_COLUMNS).contains(&cols) || !(1..=MAX_LINES).contains(&lines) {
            return Err(GpioError::InvalidDimensions { cols, lines });
        }

        let mut driver = GpioHD44780Driver::new(gpio, pins, delay)?;
        let mut backlight = backlight;
        backlight.init(driver.gpio_mut())?;

        let mut lcd = CharLcd {
            driver,
            cols,
            lines,
            display_control: flags::DISPLAY_ON,
            display_function: flags::TWO_LINE,
            entry_mode: flags::ENTRY_LEFT,
            backlight,
        };
        lcd.init()?;
        debug!("{:?} initialized.", lcd);
        Ok(lcd)
    }

    fn init(&mut self) -> GpioResult<()> {
        for byte in INIT_SEQUENCE {
            self.driver.send_command(byte)?;
        }
        self.driver.function_set(self.display_function)?;
        self.driver.set_display_control(self.display_control)?;
        self.driver.set_entry_mode(self.entry_mode)?;
        self.driver.clear_display()
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn lines(&self) -> u8 {
        self.lines
    }

    pub fn display_control(&self) -> u8 {
        self.display_control
    }

    pub fn display_function(&self) -> u8 {
        self.display_function
    }

    pub fn entry_mode(&self) -> u8 {
        self.entry_mode
    }

    pub fn backlight(&self) -> &Backlight {
        &self.backlight
    }

    pub fn pins(&self) -> &LcdPins {
        self.driver.pins()
    }

    pub fn gpio(&self) -> &G {
        self.driver.gpio()
    }

    /// Releases the pin source.
    pub fn into_inner(self) -> G {
        self.driver.into_inner()
    }

    /// Clears the display and moves the cursor home.
    pub fn clear_display(&mut self) -> GpioResult<()> {
        self.driver.clear_display()
    }

    /// Moves the cursor to the first column of the first line.
    pub fn return_home(&mut self) -> GpioResult<()> {
        self.driver.return_home()
    }

    /// Moves the cursor. Rows past the last line land on the last line.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the resulting address is outside DDRAM.
    pub fn set_cursor(&mut self, col: u8, row: u8) -> GpioResult<()> {
        let row = row.min(self.lines - 1);
        let address = col
            .checked_add(ROW_OFFSETS[row as usize])
            .ok_or(GpioError::InvalidArgument)?;
        self.driver.set_ddram_address(address)
    }

    pub fn set_display_enabled(&mut self, enabled: bool) -> GpioResult<()> {
        self.update_display_control(flags::DISPLAY_ON, enabled)
    }

    pub fn set_cursor_visible(&mut self, visible: bool) -> GpioResult<()> {
        self.update_display_control(flags::CURSOR_ON, visible)
    }

    pub fn set_cursor_blink(&mut self, blink: bool) -> GpioResult<()> {
        self.update_display_control(flags::BLINK_ON, blink)
    }

    fn update_display_control(&mut self, flag: u8, value: bool) -> GpioResult<()> {
        self.display_control = with_flag(self.display_control, flag, value);
        self.driver.set_display_control(self.display_control)
    }

    /// Shifts the whole display content one position to the left.
    pub fn shift_display_left(&mut self) -> GpioResult<()> {
        self.driver.cursor_shift(true, CursorDirection::Left)
    }

    /// Shifts the whole display content one position to the right.
    pub fn shift_display_right(&mut self) -> GpioResult<()> {
        self.driver.cursor_shift(true, CursorDirection::Right)
    }

    pub fn set_text_direction(&mut self, left_to_right: bool) -> GpioResult<()> {
        self.update_entry_mode(flags::ENTRY_LEFT, left_to_right)
    }

    /// With autoscroll on, the display shifts on every character instead of the cursor, which
    /// right-justifies the text at the cursor.
    pub fn set_autoscroll(&mut self, enabled: bool) -> GpioResult<()> {
        self.update_entry_mode(flags::ENTRY_SHIFT_INCREMENT, enabled)
    }

    fn update_entry_mode(&mut self, flag: u8, value: bool) -> GpioResult<()> {
        self.entry_mode = with_flag(self.entry_mode, flag, value);
        self.driver.set_entry_mode(self.entry_mode)
    }

    fn is_left_to_right(&self) -> bool {
        self.entry_mode & flags::ENTRY_LEFT != 0
    }

    /// Writes text at the cursor.
    ///
    /// A newline moves to the start of the next line, which is the last column when writing
    /// right to left. Lines are not wrapped. Characters up to U+00FF are sent as their code point,
    /// anything above is shown as `?`.
    pub fn write_text(&mut self, text: &str) -> GpioResult<()> {
        let mut line = 0u8;
        for c in text.chars() {
            if c == '\n' {
                line = line.saturating_add(1);
                let col = if self.is_left_to_right() { 0 } else { self.cols - 1 };
                self.set_cursor(col, line)?;
            } else {
                let byte = u8::try_from(c).unwrap_or_else(|_| {
                    warn!("Character {} has no LCD code", c);
                    b'?'
                });
                self.driver.send_data(byte)?;
            }
        }
        Ok(())
    }

    /// Writes raw character codes at the cursor, e.g. custom glyphs or symbols of the ROM's upper half.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> GpioResult<()> {
        for &byte in bytes {
            self.driver.send_data(byte)?;
        }
        Ok(())
    }

    /// Stores a 5x8 glyph in one of the 8 CGRAM slots. It is then shown by character code `slot`.
    ///
    /// Only the lower 3 bits of `slot` are used, so slot 9 is slot 1. The first 8 bytes of
    /// `pattern` are the rows, top to bottom. The address counter is left in CGRAM, so call
    /// [CharLcd::set_cursor] before writing text again.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `pattern` is shorter than 8 bytes.
    pub fn define_custom_glyph(&mut self, slot: u8, pattern: &[u8]) -> GpioResult<()> {
        let Some(rows) = pattern.get(..8) else {
            return Err(GpioError::InvalidArgument);
        };
        let slot = slot & 0b111;
        self.driver.set_cgram_address(slot << 3)?;
        for &row in rows {
            self.driver.send_data(row)?;
        }
        Ok(())
    }

    /// Sets the backlight intensity. See [Backlight::set_backlight].
    pub fn set_backlight(&mut self, intensity: f32) -> GpioResult<()> {
        self.backlight.set_backlight(self.driver.gpio_mut(), intensity)
    }

    /// Sets the colour of an RGB backlight. See [Backlight::set_color].
    pub fn set_color(&mut self, color: Color) -> GpioResult<()> {
        self.backlight.set_color(self.driver.gpio_mut(), color)
    }
}

impl<I2C: I2c, D: DelayNs + Debug> CharLcd<Pcf8574<I2C>, D>
where
    I2C::Error: Send + Sync + 'static,
{
    /// Sets up a display behind a PCF8574 backpack.
    ///
    /// RW is driven low for the whole lifetime of the driver, and the backlight is a single,
    /// active-high, switched channel.
    ///
    /// # Errors
    /// - `GpioError::InvalidAddress` if the address is not a PCF8574(A) address.
    /// - `GpioError::InvalidPinMap` or `GpioError::InvalidChannel` for a bad explicit pin map.
    pub fn pcf8574(i2c: I2C, config: Pcf8574LcdConfig, delay: D) -> GpioResult<Self> {
        let map = resolve_pin_map(&config.pin_map)?;
        let mut expander = Pcf8574::new(i2c, config.address)?;
        expander.configure_as_output(map.rw)?;
        expander.set(map.rw, false)?;

        let backlight = Backlight::single(map.bl).with_initial(Color::gray(config.initial_backlight));
        CharLcd::new(
            expander,
            map.lcd_pins(),
            CharLcdConfig {
                cols: config.cols,
                lines: config.lines,
                backlight,
            },
            delay,
        )
    }
}

fn with_flag(register: u8, flag: u8, value: bool) -> u8 {
    if value { register | flag } else { register & !flag }
}
