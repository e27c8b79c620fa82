//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every [`NodeEvent`] to the
//! ESP-IDF logger (UART in production, stderr on the host).

use log::{error, info, warn};

use crate::app::events::NodeEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`NodeEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &NodeEvent) {
        match event {
            NodeEvent::Started { core_id, sensors } => {
                info!("START | core_id={} | sensors={}", core_id, sensors);
            }
            NodeEvent::StatusChanged { from, to } => {
                info!("STATUS | {} -> {}", from, to);
            }
            NodeEvent::Published { topic, value } => {
                info!("PUBLISH | {} = {:.2}", topic, value);
            }
            NodeEvent::PublishFailed { topic, error } => {
                warn!("PUBLISH | {} failed: {}", topic, error);
            }
            NodeEvent::ScreenPower(on) => {
                info!("SCREEN | {}", if *on { "on" } else { "off" });
            }
            NodeEvent::ConfigScreen(visible) => {
                info!("CONFIG | {}", if *visible { "shown" } else { "hidden" });
            }
            NodeEvent::LocalRefresh => {
                info!("REFRESH | local re-read");
            }
            NodeEvent::Fatal(e) => {
                error!("FATAL | {}", e);
            }
        }
    }
}
