//! I2C GPIO expanders.

pub mod pcf8574;
