//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService (domain)
//! ```
//!
//! Driven adapters (sensor units, buttons, panel, network link, clock,
//! event sinks, storage) implement these traits.  The
//! [`NodeService`](super::service::NodeService) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! ## Error contract
//!
//! - **SensorPort**, **DisplayPort** errors are hardware faults: fatal.
//! - **PublishPort** errors are transient: the cycle is skipped.
//! - **ConfigPort** implementations MUST validate before persisting.

use crate::config::NodeConfig;
use crate::display::{Color, IndicatorWidget, Redraw, TextWidget};
use crate::error::{CommsError, ConfigError, DisplayError, SensorError};
use crate::sensors::EnvAttribute;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain raw sensor data.
pub trait SensorPort {
    /// Read a named attribute of the ENV unit.
    fn read_attribute(&mut self, attribute: EnvAttribute) -> Result<f32, SensorError>;

    /// One raw analog read from a multiplexer channel.
    fn read_channel(&mut self, address: u8) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Button port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// The three front-panel buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Left: local refresh.
    A,
    /// Middle: config screen while held.
    B,
    /// Right: wake only.
    C,
}

impl Button {
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];
}

/// Non-blocking button access.
pub trait ButtonPort {
    /// Sample the buttons.  Call once per loop iteration before querying.
    /// A failed GPIO read is a hardware error.
    fn poll(&mut self, now_ms: u64) -> Result<(), SensorError>;

    /// `true` once per press; the edge is consumed by the read.
    fn was_pressed(&mut self, button: Button) -> bool;

    /// `true` while the button is up.
    fn is_released(&self, button: Button) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → panel)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the panel.  Every call may fail with a hardware
/// error.
pub trait DisplayPort {
    /// Fill the whole screen with the background colour.
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Draw `text` into the widget's region.  With [`Redraw::IfChanged`]
    /// an identical string is skipped.
    fn set_text(&mut self, widget: &TextWidget, text: &str, redraw: Redraw)
    -> Result<(), DisplayError>;

    /// Repaint an indicator lamp.
    fn set_colors(
        &mut self,
        widget: &IndicatorWidget,
        fill: Color,
        border: Color,
    ) -> Result<(), DisplayError>;

    /// Drive the backlight.
    fn set_screen_power(&mut self, on: bool) -> Result<(), DisplayError>;
}

// ───────────────────────────────────────────────────────────────
// Publish port (driven adapter: domain → network)
// ───────────────────────────────────────────────────────────────

/// Network link to the MQTT broker.
pub trait PublishPort {
    /// Reconnect the link if it dropped.  Called before every cycle.
    fn ensure_connected(&mut self) -> Result<(), CommsError>;

    /// Fire-and-forget publish (QoS 0, no retain).
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Milliseconds since boot, monotonic.
    fn uptime_ms(&self) -> u64;

    /// Milliseconds since the Unix epoch.  Only meaningful after time sync.
    fn epoch_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`NodeEvent`](super::events::NodeEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::NodeEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists node configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid values are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`NodeConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<NodeConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &NodeConfig) -> Result<(), ConfigError>;
}
