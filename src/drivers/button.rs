//! Polled, debounced button driver.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up (the M5Stack front buttons on
//! GPIO 39/38/37).  The main loop samples the pin once per iteration via
//! [`ButtonDriver::poll`]; no interrupt is needed at that rate.
//!
//! ## Debounce
//!
//! A level change is accepted immediately, then further changes are
//! ignored for [`DEBOUNCE_MS`].  This works at any poll rate, including
//! the 500 ms main loop where a sample-twice debounce would demand a
//! half-second hold.
//!
//! | Query            | Meaning                                     |
//! |------------------|---------------------------------------------|
//! | `was_pressed()`  | a press edge happened; consumed on read     |
//! | `is_released()`  | the debounced level is "up"                 |

use embedded_hal::digital::InputPin;

use crate::error::SensorError;

pub const DEBOUNCE_MS: u64 = 50;

pub struct ButtonDriver<P> {
    pin: P,
    /// Debounced level.
    pressed: bool,
    /// Time of the last accepted level change.
    last_change_ms: Option<u64>,
    /// Press edge not yet consumed by `was_pressed`.
    press_latched: bool,
}

impl<P: InputPin> ButtonDriver<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            pressed: false,
            last_change_ms: None,
            press_latched: false,
        }
    }

    /// Sample the pin.  `now_ms` is the current monotonic time.
    pub fn poll(&mut self, now_ms: u64) -> Result<(), SensorError> {
        let raw_pressed = self.pin.is_low().map_err(|_| SensorError::GpioFailed)?;
        if raw_pressed == self.pressed {
            return Ok(());
        }

        let settled = self
            .last_change_ms
            .is_none_or(|t| now_ms.saturating_sub(t) >= DEBOUNCE_MS);
        if settled {
            self.pressed = raw_pressed;
            self.last_change_ms = Some(now_ms);
            if raw_pressed {
                self.press_latched = true;
            }
        }
        Ok(())
    }

    /// `true` once for every accepted press.
    pub fn was_pressed(&mut self) -> bool {
        core::mem::take(&mut self.press_latched)
    }

    pub fn is_released(&self) -> bool {
        !self.pressed
    }
}
