//! Sensor definitions and the single [`read`] entry point.
//!
//! Every configured sensor names one backend.  [`read`] dispatches on the
//! backend tag and returns one `f32` per sensor, whatever the hardware
//! behind it looks like:
//!
//! | Backend        | Source                         | Post-processing         |
//! |----------------|--------------------------------|-------------------------|
//! | `Attribute`    | ENV unit (SHT40 + BMP280)      | none                    |
//! | `MuxChannel`   | PbHub analog channel           | [`mux_filter`] smoothing|

pub mod mux_filter;

use serde::{Deserialize, Serialize};

use crate::app::ports::SensorPort;
use crate::display::presenter::SensorWidgets;
use crate::error::SensorError;

/// Named value exposed by the ENV unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvAttribute {
    /// Degrees Celsius.
    Temperature,
    /// Relative humidity, percent.
    Humidity,
    /// Pascal.
    Pressure,
}

/// Where a sensor's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorBackend {
    /// Read a named attribute directly.
    Attribute { attribute: EnvAttribute },
    /// Read a noisy analog channel of the multiplexer hub, filtered.
    MuxChannel { address: u8 },
}

/// Static description of one sensor, loaded from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDefinition {
    /// Topic segment, e.g. `"temperature"`.
    pub name: String,
    pub active: bool,
    /// Display caption, e.g. `"Temperature"`.
    pub label: String,
    /// Measurement unit shown next to the caption.
    pub unit: String,
    pub backend: SensorBackend,
}

impl SensorDefinition {
    pub fn attribute(name: &str, label: &str, unit: &str, attribute: EnvAttribute) -> Self {
        Self {
            name: name.into(),
            active: true,
            label: label.into(),
            unit: unit.into(),
            backend: SensorBackend::Attribute { attribute },
        }
    }

    pub fn mux_channel(name: &str, label: &str, unit: &str, address: u8) -> Self {
        Self {
            name: name.into(),
            active: true,
            label: label.into(),
            unit: unit.into(),
            backend: SensorBackend::MuxChannel { address },
        }
    }

    /// Caption text, `"{label} [{unit}]"`.
    pub fn caption(&self) -> String {
        format!("{} [{}]", self.label, self.unit)
    }
}

/// A sensor bound to its screen slot.  Built once at startup for every
/// active definition, in configuration order.
#[derive(Debug, Clone)]
pub struct ActiveSensor {
    pub definition: SensorDefinition,
    pub widgets: SensorWidgets,
    /// Last value rendered, used to repaint after the config screen.
    pub last_value: Option<f32>,
}

impl ActiveSensor {
    pub fn new(definition: SensorDefinition, widgets: SensorWidgets) -> Self {
        Self {
            definition,
            widgets,
            last_value: None,
        }
    }
}

/// Read one sensor through the hardware port.
///
/// Bus failures propagate unchanged; the caller treats them as fatal.
pub fn read(hw: &mut impl SensorPort, backend: &SensorBackend) -> Result<f32, SensorError> {
    match *backend {
        SensorBackend::Attribute { attribute } => hw.read_attribute(attribute),
        SensorBackend::MuxChannel { address } => mux_filter::read_filtered(hw, address),
    }
}
