//! Node configuration parameters
//!
//! All tunable parameters for the IoT Home sensor node.
//! Values can be overridden via NVS (non-volatile storage) or a JSON
//! provisioning document.

use serde::{Deserialize, Serialize};

use crate::display::Color;
use crate::error::ConfigError;
use crate::sensors::{EnvAttribute, SensorBackend, SensorDefinition};

/// Screen slots available for sensor readings.
pub const MAX_ACTIVE_SENSORS: usize = 6;
/// Highest analog channel on the PbHub.
pub const MAX_MUX_ADDRESS: u8 = 5;
/// Topic segments are capped so `home/{core}/{sensor}` fits a 96-byte topic.
pub const MAX_SEGMENT_LEN: usize = 32;

/// MQTT broker connection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub keepalive_secs: u16,
    /// Empty means anonymous.
    pub username: String,
    pub password: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.12".into(),
            port: 1883,
            keepalive_secs: 300,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Station credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Colour of captions and values.
    pub default_color: Color,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_color: Color(0xEE_EEEE),
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Identity ---
    /// Node identifier, used as MQTT client id and topic segment
    pub core_id: String,

    // --- Network ---
    pub broker: BrokerConfig,
    pub wifi: WifiConfig,

    // --- Timing ---
    /// Publish cycles per second
    pub send_frequency_hz: f32,
    /// Backlight idle timeout (milliseconds)
    pub screen_timeout_ms: u64,
    /// Main loop sleep between iterations (milliseconds)
    pub loop_interval_ms: u32,
    /// Publish once right after boot instead of waiting a full period
    pub publish_on_startup: bool,

    // --- Presentation ---
    pub ui: UiConfig,
    /// Sensors in screen order
    pub sensors: Vec<SensorDefinition>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            core_id: "inside".into(),
            broker: BrokerConfig::default(),
            wifi: WifiConfig::default(),

            send_frequency_hz: 0.1, // every 10 s
            screen_timeout_ms: 60_000,
            loop_interval_ms: 500,
            publish_on_startup: true,

            ui: UiConfig::default(),
            sensors: vec![
                SensorDefinition::attribute("humidity", "Humidity", "AH", EnvAttribute::Humidity),
                SensorDefinition::attribute(
                    "temperature",
                    "Temperature",
                    "C",
                    EnvAttribute::Temperature,
                ),
                SensorDefinition::attribute("pressure", "Pressure", "Pa", EnvAttribute::Pressure),
                SensorDefinition::mux_channel("earth", "Earth", "mg/L", 0),
                SensorDefinition::mux_channel("light", "Light", "lux", 1),
            ],
        }
    }
}

impl NodeConfig {
    /// Parse a JSON provisioning document.  Missing fields are an error;
    /// the document must be complete.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Timer period between publish ticks.
    pub fn publish_period_ms(&self) -> u64 {
        (1000.0 / f64::from(self.send_frequency_hz)).round() as u64
    }

    /// Active sensor definitions in configuration order.
    pub fn active_sensors(&self) -> impl Iterator<Item = &SensorDefinition> {
        self.sensors.iter().filter(|s| s.active)
    }

    /// Range-check every field.  Called before a config is accepted from
    /// storage or provisioning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.core_id.is_empty() {
            return Err(ConfigError::ValidationFailed("core_id must not be empty"));
        }
        if !is_topic_segment(&self.core_id) {
            return Err(ConfigError::ValidationFailed(
                "core_id must be a printable topic segment",
            ));
        }

        if self.broker.host.is_empty() || !is_printable_ascii(&self.broker.host) {
            return Err(ConfigError::ValidationFailed("broker host is invalid"));
        }
        if self.broker.port == 0 {
            return Err(ConfigError::ValidationFailed("broker port must be non-zero"));
        }

        if self.wifi.ssid.len() > 32 || !is_printable_ascii(&self.wifi.ssid) {
            return Err(ConfigError::ValidationFailed("wifi ssid is invalid"));
        }
        if self.wifi.password.len() > 64 || !is_printable_ascii(&self.wifi.password) {
            return Err(ConfigError::ValidationFailed("wifi password is invalid"));
        }

        if !self.send_frequency_hz.is_finite()
            || self.send_frequency_hz <= 0.0
            || self.send_frequency_hz > 10.0
        {
            return Err(ConfigError::ValidationFailed(
                "send frequency must be in (0, 10] Hz",
            ));
        }
        if self.screen_timeout_ms < 1000 {
            return Err(ConfigError::ValidationFailed(
                "screen timeout must be at least 1000 ms",
            ));
        }
        if !(10..=5000).contains(&self.loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "loop interval must be 10..=5000 ms",
            ));
        }

        self.validate_sensors()
    }

    fn validate_sensors(&self) -> Result<(), ConfigError> {
        if self.active_sensors().count() > MAX_ACTIVE_SENSORS {
            return Err(ConfigError::ValidationFailed("too many active sensors"));
        }

        for (i, sensor) in self.sensors.iter().enumerate() {
            if !is_topic_segment(&sensor.name) {
                return Err(ConfigError::ValidationFailed(
                    "sensor name must be a printable topic segment",
                ));
            }
            if self.sensors[..i].iter().any(|s| s.name == sensor.name) {
                return Err(ConfigError::ValidationFailed("sensor names must be unique"));
            }
            if let SensorBackend::MuxChannel { address } = sensor.backend
                && address > MAX_MUX_ADDRESS
            {
                return Err(ConfigError::ValidationFailed("mux address out of range"));
            }
        }
        Ok(())
    }
}

/// Space through tilde only.
pub(crate) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Non-empty printable ASCII without MQTT separators or wildcards.
fn is_topic_segment(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_SEGMENT_LEN
        && is_printable_ascii(s)
        && !s.contains(['/', '+', '#', ' '])
}
