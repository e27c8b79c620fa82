//! MQTT topic and payload encoding.
//!
//! Topic: `home/{core_id}/{sensor_name}`.  Payload: UTF-8 JSON
//! `{"timestamp": <ms since epoch>, "value": <float>}`.

use core::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::config::MAX_SEGMENT_LEN;
use crate::error::CommsError;

/// `"home/"` plus two segments and a separator.
pub const MAX_TOPIC_LEN: usize = 5 + 2 * MAX_SEGMENT_LEN + 1;

pub type Topic = heapless::String<96>;

/// One published reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: u64,
    pub value: f32,
}

impl Reading {
    pub fn encode(&self) -> Result<Vec<u8>, CommsError> {
        serde_json::to_vec(self).map_err(|_| CommsError::PayloadEncode)
    }
}

pub fn topic(core_id: &str, sensor_name: &str) -> Result<Topic, CommsError> {
    let mut topic = Topic::new();
    write!(topic, "home/{core_id}/{sensor_name}").map_err(|_| CommsError::PayloadEncode)?;
    Ok(topic)
}

/// Prefix shared by every topic of this node, used when the whole cycle
/// fails before a sensor topic exists.
pub fn node_topic(core_id: &str) -> Result<Topic, CommsError> {
    let mut topic = Topic::new();
    write!(topic, "home/{core_id}").map_err(|_| CommsError::PayloadEncode)?;
    Ok(topic)
}
