//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                   |
//! |----------------|--------------------|-------------------------------|
//! | `hardware`     | SensorPort         | ENV unit + PbHub over I2C     |
//! |                | ButtonPort         | Front buttons (GPIO)          |
//! | `log_sink`     | EventSink          | Serial log output             |
//! | `mqtt`         | PublishPort        | ESP-IDF MQTT client           |
//! | `nvs`          | ConfigPort         | NVS / in-memory store         |
//! | `time`         | ClockPort          | esp_timer + SNTP wall clock   |
//! | `wifi`         | (used by `mqtt`)   | ESP-IDF WiFi STA              |
//!
//! The display adapter lives in [`crate::display::graphics`].

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod time;
pub mod wifi;
