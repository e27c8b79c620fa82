//! M5Stack ENV IV unit: SHT40 (temperature, humidity) + BMP280 (pressure).
//!
//! Both chips sit on the same Grove I2C port, each behind its own bus
//! handle.  The chip protocols live in the `sht4x` and `bme280` crates;
//! this wrapper only routes an [`EnvAttribute`] to the right chip.
//!
//! | Chip   | Addr   | Driver                        |
//! |--------|--------|-------------------------------|
//! | SHT40  | `0x44` | `sht4x::Sht4x`, high precision |
//! | BMP280 | `0x76` | `bme280::i2c::BME280` primary  |
//!
//! The BMP280 is brought up on the first pressure read, not at
//! construction, so a node without the unit still boots.

use bme280::i2c::BME280;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{error, info};
use sht4x::{Precision, Sht4x};

use crate::error::SensorError;
use crate::sensors::EnvAttribute;

pub const SHT40_ADDR: u8 = 0x44;
pub const BMP280_ADDR: u8 = 0x76;

pub struct EnvUnit<I, D> {
    climate: Sht4x<I, D>,
    barometer: BME280<I>,
    barometer_ready: bool,
    delay: D,
}

impl<I: I2c, D: DelayNs> EnvUnit<I, D> {
    /// `climate_i2c` and `barometer_i2c` are two handles onto the same port.
    pub fn new(climate_i2c: I, barometer_i2c: I, delay: D) -> Self {
        Self {
            climate: Sht4x::new(climate_i2c),
            barometer: BME280::new_primary(barometer_i2c),
            barometer_ready: false,
            delay,
        }
    }

    pub fn read(&mut self, attribute: EnvAttribute) -> Result<f32, SensorError> {
        match attribute {
            EnvAttribute::Temperature => self.read_climate().map(|(t, _)| t),
            EnvAttribute::Humidity => self.read_climate().map(|(_, rh)| rh),
            EnvAttribute::Pressure => self.read_pressure(),
        }
    }

    /// `(°C, %RH)` from one SHT40 measurement.
    fn read_climate(&mut self) -> Result<(f32, f32), SensorError> {
        let m = self
            .climate
            .measure(Precision::High, &mut self.delay)
            .map_err(|e| {
                error!("SHT40 measurement failed: {:?}", e);
                SensorError::BusFailed
            })?;
        Ok((
            m.temperature_celsius().to_num::<f32>(),
            m.humidity_percent().to_num::<f32>(),
        ))
    }

    fn read_pressure(&mut self) -> Result<f32, SensorError> {
        if !self.barometer_ready {
            self.barometer.init(&mut self.delay).map_err(|e| {
                error!("BMP280 init failed: {:?}", e);
                SensorError::BusFailed
            })?;
            self.barometer_ready = true;
            info!("ENV unit: BMP280 initialised");
        }
        let m = self.barometer.measure(&mut self.delay).map_err(|e| {
            error!("BMP280 measurement failed: {:?}", e);
            SensorError::BusFailed
        })?;
        Ok(m.pressure)
    }
}
