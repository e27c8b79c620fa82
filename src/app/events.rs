//! Outbound application events.
//!
//! The [`NodeService`](super::service::NodeService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them.

use crate::display::status::Status;
use crate::error::{CommsError, Error};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// The service has started (carries core id and sensor count).
    Started { core_id: String, sensors: usize },

    /// The status line changed.
    StatusChanged { from: Status, to: Status },

    /// One reading reached the broker.
    Published { topic: String, value: f32 },

    /// The network failed; the rest of the cycle was skipped.
    PublishFailed { topic: String, error: CommsError },

    /// Backlight switched.
    ScreenPower(bool),

    /// Config screen shown (`true`) or hidden (`false`).
    ConfigScreen(bool),

    /// Button A re-read every sensor without publishing.
    LocalRefresh,

    /// A hardware error stopped the main loop.
    Fatal(Error),
}
