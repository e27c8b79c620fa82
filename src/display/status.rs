//! Node status and its on-screen representation.

use core::fmt;

use super::Color;

/// Runtime phase surfaced on the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Boot, before the main loop runs.
    Starting,
    Waiting,
    Sending,
    Error,
    /// Label that matched none of the known statuses.
    Undefined,
}

impl Status {
    /// Map a free-form status label onto a status.  Matching is by prefix,
    /// so `"waiting for broker"` is still `Waiting`.
    pub fn from_label(label: &str) -> Self {
        if label.starts_with("starting") {
            Self::Starting
        } else if label.starts_with("waiting") {
            Self::Waiting
        } else if label.starts_with("sending") {
            Self::Sending
        } else if label.starts_with("error") {
            Self::Error
        } else {
            Self::Undefined
        }
    }

    /// Lamp colour and status-line text.  `detail` is only shown for
    /// [`Status::Error`], and only when non-empty.
    pub fn view(self, detail: &str) -> StatusView {
        match self {
            Self::Starting => StatusView::new(Color::GREY, "starting".into()),
            Self::Waiting => StatusView::new(Color::GREY, "waiting".into()),
            Self::Sending => StatusView::new(Color::GREEN, "sending".into()),
            Self::Error if detail.is_empty() => StatusView::new(Color::RED, "error".into()),
            Self::Error => StatusView::new(Color::RED, format!("error: {detail}")),
            Self::Undefined => StatusView::new(Color::GREY, "undefined status".into()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starting => "starting",
            Self::Waiting => "waiting",
            Self::Sending => "sending",
            Self::Error => "error",
            Self::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

/// What the status lamp and status line show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub color: Color,
    pub text: String,
}

impl StatusView {
    fn new(color: Color, text: String) -> Self {
        Self { color, text }
    }
}
