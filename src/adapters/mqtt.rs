//! MQTT publish adapter.
//!
//! Implements [`PublishPort`] on top of `EspMqttClient`.  The client is
//! created on the first cycle that finds WiFi up, and its connection is
//! drained on its own thread, which tracks broker connectivity in an
//! `AtomicBool`.  Publishing itself is QoS 0 without retain.
//!
//! | Call               | Effect                                              |
//! |--------------------|-----------------------------------------------------|
//! | `ensure_connected` | reconnect WiFi if down, create client, need broker  |
//! | `publish`          | fire-and-forget, no explicit timeout                |

use crate::config::BrokerConfig;

/// `mqtt://host:port` for the ESP-IDF client.
pub fn broker_url(cfg: &BrokerConfig) -> String {
    format!("mqtt://{}:{}", cfg.host, cfg.port)
}

/// Empty credentials mean anonymous.
pub fn credential(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(target_os = "espidf")]
pub use esp_impl::MqttLink;

#[cfg(target_os = "espidf")]
mod esp_impl {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
    use log::{error, info, warn};

    use super::{broker_url, credential};
    use crate::adapters::time::wait_for;
    use crate::adapters::wifi::WifiLink;
    use crate::app::ports::PublishPort;
    use crate::config::NodeConfig;
    use crate::error::CommsError;

    pub struct MqttLink {
        wifi: WifiLink,
        url: String,
        core_id: String,
        username: String,
        password: String,
        keep_alive: Duration,
        client: Option<EspMqttClient<'static>>,
        connected: Arc<AtomicBool>,
    }

    impl MqttLink {
        pub fn new(wifi: WifiLink, cfg: &NodeConfig) -> Self {
            Self {
                wifi,
                url: broker_url(&cfg.broker),
                core_id: cfg.core_id.clone(),
                username: cfg.broker.username.clone(),
                password: cfg.broker.password.clone(),
                keep_alive: Duration::from_secs(u64::from(cfg.broker.keepalive_secs)),
                client: None,
                connected: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Create the client (client id = core id) and start the
        /// connection thread.
        fn start_client(&mut self) -> Result<(), CommsError> {
            let conf = MqttClientConfiguration {
                client_id: Some(self.core_id.as_str()),
                username: credential(&self.username),
                password: credential(&self.password),
                keep_alive_interval: Some(self.keep_alive),
                ..Default::default()
            };
            let (client, mut connection) = EspMqttClient::new(&self.url, &conf).map_err(|e| {
                error!("MQTT: client init failed: {}", e);
                CommsError::MqttConnectFailed
            })?;

            let flag = self.connected.clone();
            std::thread::Builder::new()
                .name("mqtt-conn".into())
                .stack_size(6000)
                .spawn(move || {
                    while let Ok(event) = connection.next() {
                        match event.payload() {
                            EventPayload::Connected(_) => {
                                flag.store(true, Ordering::Release);
                                info!("MQTT: connected");
                            }
                            EventPayload::Disconnected => {
                                flag.store(false, Ordering::Release);
                                warn!("MQTT: disconnected");
                            }
                            EventPayload::Error(e) => error!("MQTT: {:?}", e),
                            _ => {}
                        }
                    }
                    flag.store(false, Ordering::Release);
                    info!("MQTT: connection closed");
                })
                .map_err(|_| CommsError::MqttConnectFailed)?;

            info!("MQTT: client started for {}", self.url);
            self.client = Some(client);
            Ok(())
        }

        /// Block until the broker accepts the connection or `timeout` passes.
        /// Returns at once when no client has been started.
        pub fn wait_connected(&self, timeout: Duration) -> bool {
            if self.client.is_none() {
                return false;
            }
            let connected = &self.connected;
            wait_for(
                timeout,
                || connected.load(Ordering::Acquire),
                || FreeRtos::delay_ms(100),
            )
        }
    }

    impl PublishPort for MqttLink {
        fn ensure_connected(&mut self) -> Result<(), CommsError> {
            self.wifi.ensure_up()?;
            if self.client.is_none() {
                self.start_client()?;
            }
            if self.connected.load(Ordering::Acquire) {
                Ok(())
            } else {
                Err(CommsError::MqttConnectFailed)
            }
        }

        fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
            let client = self.client.as_mut().ok_or(CommsError::MqttConnectFailed)?;
            client
                .publish(topic, QoS::AtMostOnce, false, payload)
                .map(|_| ())
                .map_err(|_| CommsError::MqttPublishFailed)
        }
    }
}
