//! Bus and panel parameters for the M5Stack Core (Basic).
//!
//! Pins themselves are typed peripherals taken by number in `main`
//! (`peripherals.pins.gpioN`), so the map lives here as reference only:
//!
//! | Peripheral                  | GPIO                                |
//! |-----------------------------|-------------------------------------|
//! | LCD SPI (ILI9342C)          | SCLK 18, MOSI 23, CS 14             |
//! | LCD control                 | DC 27, RST 33, backlight 32 (high)  |
//! | Buttons A/B/C (active low)  | 39, 38, 37                          |
//! | Grove port A (I2C)          | SDA 21, SCL 22                      |

/// Panel geometry in landscape orientation.
pub const LCD_WIDTH: u16 = 320;
pub const LCD_HEIGHT: u16 = 240;
/// SPI clock for the panel.
pub const LCD_SPI_HZ: u32 = 40_000_000;

/// Grove port A: ENV unit + PbHub, standard mode.
pub const I2C_FREQ_HZ: u32 = 100_000;
