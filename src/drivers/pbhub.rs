//! M5Stack PbHub (6-channel I/O hub) driver, analog reads only.
//!
//! The hub is an STM32F0 behind I2C address `0x61`.  Each channel owns a
//! register block at `0x40 + ch * 0x10`; the low nibble selects the
//! operation.  An analog read writes the register byte, then reads two
//! bytes, little-endian.

use embedded_hal::i2c::I2c;

use crate::error::SensorError;

pub const PBHUB_ADDR: u8 = 0x61;
pub const CHANNEL_COUNT: u8 = 6;

const CHANNEL_BASE: u8 = 0x40;
const CHANNEL_STRIDE: u8 = 0x10;
const OP_ANALOG_READ: u8 = 0x06;

/// Register byte for an analog read of `channel`.
pub const fn analog_register(channel: u8) -> u8 {
    (CHANNEL_BASE + channel * CHANNEL_STRIDE) | OP_ANALOG_READ
}

#[derive(Debug, Clone, Copy)]
pub struct PbHub {
    address: u8,
}

impl PbHub {
    pub const fn new() -> Self {
        Self {
            address: PBHUB_ADDR,
        }
    }

    /// One raw analog sample (12-bit ADC, 0..=4095) from `channel`.
    pub fn analog_read<I: I2c>(&self, i2c: &mut I, channel: u8) -> Result<u16, SensorError> {
        if channel >= CHANNEL_COUNT {
            return Err(SensorError::NotReady);
        }
        let mut buf = [0u8; 2];
        i2c.write(self.address, &[analog_register(channel)])
            .map_err(|_| SensorError::BusFailed)?;
        i2c.read(self.address, &mut buf)
            .map_err(|_| SensorError::BusFailed)?;
        Ok(u16::from_le_bytes(buf))
    }
}

impl Default for PbHub {
    fn default() -> Self {
        Self::new()
    }
}
