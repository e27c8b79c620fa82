//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] for the node.  The whole [`NodeConfig`] is
//! stored as one `postcard` blob under `iothome::nodecfg`.
//!
//! - Validation: every save runs [`NodeConfig::validate`] first.
//! - Fallback: a missing or undecodable blob loads as the defaults.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//!
//! The simulation backend keeps the blob in memory.

use log::{info, warn};

use crate::app::ports::ConfigPort;
use crate::config::NodeConfig;
use crate::error::ConfigError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const CONFIG_NAMESPACE: &str = "iothome";
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const CONFIG_KEY: &str = "nodecfg";

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const MAX_BLOB_SIZE: usize = 2048;

pub struct NvsConfigStore {
    #[cfg(target_os = "espidf")]
    nvs: EspNvs<NvsDefault>,
    #[cfg(not(target_os = "espidf"))]
    blob: Option<Vec<u8>>,
}

impl NvsConfigStore {
    /// Open the config namespace on the default NVS partition.  The
    /// partition handle is shared with the Wi-Fi driver.
    #[cfg(target_os = "espidf")]
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, ConfigError> {
        let nvs = EspNvs::new(partition, CONFIG_NAMESPACE, true).map_err(|e| {
            warn!("NvsConfigStore: open '{}' failed: {}", CONFIG_NAMESPACE, e);
            ConfigError::IoError
        })?;
        info!("NvsConfigStore: namespace '{}' open", CONFIG_NAMESPACE);
        Ok(Self { nvs })
    }

    /// Empty in-memory store.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, ConfigError> {
        info!("NvsConfigStore: simulation backend");
        Ok(Self { blob: None })
    }

    /// In-memory store preloaded with a raw blob.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_blob(blob: Vec<u8>) -> Self {
        Self { blob: Some(blob) }
    }

    /// Parse a JSON document, validate it and persist it.
    pub fn provision_json(&mut self, json: &str) -> Result<NodeConfig, ConfigError> {
        let config = NodeConfig::from_json(json)?;
        self.save(&config)?;
        Ok(config)
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let mut buf = vec![0u8; MAX_BLOB_SIZE];
        match self.nvs.get_blob(CONFIG_KEY, &mut buf) {
            Ok(Some(bytes)) => Ok(Some(bytes.to_vec())),
            Ok(None) => Ok(None),
            Err(e) => {
                warn!("NvsConfigStore: NVS read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        Ok(self.blob.clone())
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::ValidationFailed("config blob too large"));
        }
        self.nvs.set_blob(CONFIG_KEY, bytes).map_err(|e| {
            warn!("NvsConfigStore: NVS write error {}", e);
            ConfigError::IoError
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        self.blob = Some(bytes.to_vec());
        Ok(())
    }
}

impl ConfigPort for NvsConfigStore {
    fn load(&self) -> Result<NodeConfig, ConfigError> {
        let Some(bytes) = self.read_blob()? else {
            info!("NvsConfigStore: no stored config, using defaults");
            return Ok(NodeConfig::default());
        };
        match postcard::from_bytes::<NodeConfig>(&bytes) {
            Ok(cfg) if cfg.validate().is_ok() => {
                info!("NvsConfigStore: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            Ok(_) => {
                warn!("NvsConfigStore: stored config invalid, using defaults");
                Ok(NodeConfig::default())
            }
            Err(_) => {
                warn!("NvsConfigStore: stored config corrupted, using defaults");
                Ok(NodeConfig::default())
            }
        }
    }

    fn save(&mut self, config: &NodeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.write_blob(&bytes)?;
        info!("NvsConfigStore: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
