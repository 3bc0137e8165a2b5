mod config;

use crate::config::Config;
use charlcd_gpio::delay::SpinDelay;
use charlcd_gpio::lcd::backlight::{Backlight, BacklightChannels};
use charlcd_gpio::lcd::char_lcd::{CharLcd, CharLcdConfig, Pcf8574LcdConfig};
use charlcd_gpio::lcd::hd44780::driver::LcdPins;
use charlcd_gpio::pwm::{PwmDriver, PwmGpio, SysfsPwmDriver};
use charlcd_gpio::raw::RawGpioDriver;
use charlcd_gpio::{GpioChannels, GpioResult};
use dotenv::dotenv;
use linux_embedded_hal::I2cdev;
use log::{debug, info};

/// Joins the arguments with spaces. A literal `\n` starts a new line.
fn message_from_args(args: impl IntoIterator<Item = String>) -> String {
    let message = args.into_iter().collect::<Vec<_>>().join(" ");
    if message.is_empty() {
        "Hello\nworld".to_string()
    } else {
        message.replace("\\n", "\n")
    }
}

fn show<G: GpioChannels>(lcd: &mut CharLcd<G>, message: &str) -> GpioResult<()> {
    lcd.clear_display()?;
    lcd.write_text(message)
}

/// Routes each backlight pin to the output of the same position on the PWM chip.
fn route_backlight<G: GpioChannels>(gpio: &mut PwmGpio<G>, backlight: &Backlight, chip: usize) -> GpioResult<()> {
    let pins = match backlight.channels() {
        BacklightChannels::None => vec![],
        BacklightChannels::Single(pin) => vec![pin],
        BacklightChannels::Rgb { red, green, blue } => vec![red, green, blue],
    };
    let driver = SysfsPwmDriver::get_chip(chip)?;
    for (output, pin) in pins.into_iter().enumerate() {
        gpio.route(pin, driver.get_pin(output)?)?;
    }
    Ok(())
}

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    let config = Config::load()?;
    info!("Using {:?}", config);
    let message = message_from_args(std::env::args().skip(1));

    match config {
        Config::Pcf8574 { bus, address, cols, lines, pin_map, backlight } => {
            let i2c = I2cdev::new(format!("/dev/i2c-{}", bus))?;
            let lcd_config = Pcf8574LcdConfig {
                address,
                cols,
                lines,
                pin_map: pin_map.to_source()?,
                initial_backlight: backlight,
            };
            let mut lcd = CharLcd::pcf8574(i2c, lcd_config, SpinDelay)?;
            show(&mut lcd, &message)?;
        }
        Config::Direct { rs, en, d4, d5, d6, d7, cols, lines, backlight } => {
            let mut gpio = PwmGpio::new(RawGpioDriver::new_gpiomem()?);
            let backlight = match backlight {
                Some(backlight_config) => {
                    let backlight = backlight_config.backlight()?;
                    if let Some(chip) = backlight_config.pwm_chip {
                        debug!("Routing backlight to PWM chip {}", chip);
                        route_backlight(&mut gpio, &backlight, chip)?;
                    }
                    backlight
                }
                None => Backlight::none(),
            };

            let pins = LcdPins { rs, en, d4, d5, d6, d7 };
            let mut lcd = CharLcd::new(gpio, pins, CharLcdConfig { cols, lines, backlight }, SpinDelay)?;
            show(&mut lcd, &message)?;
        }
    }

    info!("Done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_defaults_to_greeting() {
        assert_eq!(message_from_args(Vec::new()), "Hello\nworld");
    }

    #[test]
    fn message_joins_arguments_and_escapes_newlines() {
        let args = ["Hi", "there\\nfriend"].map(String::from);
        assert_eq!(message_from_args(args), "Hi there\nfriend");
    }
}
