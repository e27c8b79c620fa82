//! WiFi station-mode adapter.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: [`WifiLink`] drives
//!   `BlockingWifi<EspWifi>` from `esp_idf_svc::wifi` through
//!   [`StationLink`].
//! - **all other targets**: the credential helpers and [`StationLink`],
//!   exercised against a fake [`Station`].
//!
//! ## Reconnection policy
//!
//! No background reconnect and no halting.  [`StationLink::ensure_up`]
//! is called before every publish cycle and issues one blocking connect
//! if the link is down; a failure skips that cycle and the next tick
//! tries again.  Missing credentials fail every cycle without touching
//! the radio.

use log::{info, warn};

use crate::config::WifiConfig;
use crate::error::CommsError;

/// An empty password means an open network.
pub fn is_open_network(cfg: &WifiConfig) -> bool {
    cfg.password.is_empty()
}

/// Credentials must be present before bring-up.
pub fn check_credentials(cfg: &WifiConfig) -> Result<(), CommsError> {
    if cfg.ssid.is_empty() {
        return Err(CommsError::WifiConnectFailed);
    }
    if !is_open_network(cfg) && cfg.password.len() < 8 {
        return Err(CommsError::WifiConnectFailed);
    }
    Ok(())
}

/// The radio, as far as the reconnect policy cares.
pub trait Station {
    fn is_connected(&self) -> bool;

    /// Associate and wait for an IP.  Blocks.
    fn connect(&mut self) -> Result<(), CommsError>;
}

/// Reconnect policy around a [`Station`].
pub struct StationLink<S> {
    station: S,
    credentials: Result<(), CommsError>,
    reconnects: u32,
}

impl<S: Station> StationLink<S> {
    pub fn new(station: S, cfg: &WifiConfig) -> Self {
        let credentials = check_credentials(cfg);
        if credentials.is_err() {
            warn!("WiFi: no usable credentials for '{}'", cfg.ssid);
        }
        Self {
            station,
            credentials,
            reconnects: 0,
        }
    }

    /// Connect if the link is down.
    pub fn ensure_up(&mut self) -> Result<(), CommsError> {
        self.credentials?;
        if self.station.is_connected() {
            return Ok(());
        }

        self.reconnects = self.reconnects.wrapping_add(1);
        warn!("WiFi: link down, connecting (attempt {})", self.reconnects);
        self.station
            .connect()
            .map_err(|_| CommsError::WifiDisconnected)?;
        info!("WiFi: connected");
        Ok(())
    }

    pub fn reconnects(&self) -> u32 {
        self.reconnects
    }
}

#[cfg(target_os = "espidf")]
pub use esp_impl::{EspStation, WifiLink};

#[cfg(target_os = "espidf")]
mod esp_impl {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::{info, warn};

    use super::{Station, StationLink, is_open_network};
    use crate::config::WifiConfig;
    use crate::error::{CommsError, Error};

    pub struct EspStation {
        wifi: BlockingWifi<EspWifi<'static>>,
    }

    impl Station for EspStation {
        fn is_connected(&self) -> bool {
            self.wifi.is_connected().unwrap_or_else(|e| {
                warn!("WiFi: health check error: {}", e);
                false
            })
        }

        fn connect(&mut self) -> Result<(), CommsError> {
            self.wifi.connect().map_err(|e| {
                warn!("WiFi: connect failed: {}", e);
                CommsError::WifiConnectFailed
            })?;
            self.wifi
                .wait_netif_up()
                .map_err(|_| CommsError::WifiConnectFailed)
        }
    }

    pub type WifiLink = StationLink<EspStation>;

    impl StationLink<EspStation> {
        /// Bring up the driver in station mode and make one connection
        /// attempt.  Only a driver failure is an error; a network that
        /// is not there yet is left to [`StationLink::ensure_up`].
        pub fn start(
            modem: Modem,
            sys_loop: EspSystemEventLoop,
            nvs: EspDefaultNvsPartition,
            cfg: &WifiConfig,
        ) -> Result<Self, Error> {
            let esp_wifi = EspWifi::new(modem, sys_loop.clone(), Some(nvs))
                .map_err(|_| Error::Init("wifi"))?;
            let mut wifi = BlockingWifi::wrap(esp_wifi, sys_loop).map_err(|_| Error::Init("wifi"))?;

            let client = ClientConfiguration {
                ssid: cfg.ssid.as_str().try_into().unwrap_or_default(),
                password: cfg.password.as_str().try_into().unwrap_or_default(),
                auth_method: if is_open_network(cfg) {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                },
                ..Default::default()
            };
            wifi.set_configuration(&Configuration::Client(client))
                .map_err(|_| Error::Init("wifi"))?;
            wifi.start().map_err(|_| Error::Init("wifi"))?;
            info!("WiFi: station started for '{}'", cfg.ssid);

            let mut link = StationLink::new(EspStation { wifi }, cfg);
            if let Err(e) = link.ensure_up() {
                warn!("WiFi: not connected at boot ({}), will retry", e);
            }
            Ok(link)
        }
    }
}
