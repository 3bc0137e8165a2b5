//! Character LCD support.

pub mod backlight;
pub mod char_lcd;
pub mod hd44780;
pub mod pin_map;
