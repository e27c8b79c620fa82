//! Peripheral drivers: front buttons, the I2C sensor units and the
//! publish timer.

pub mod button;
pub mod env_unit;
pub mod hw_timer;
pub mod pbhub;

#[cfg(test)]
pub(crate) mod i2c_mock;
