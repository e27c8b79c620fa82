//! Display subsystem: widget descriptors, status rendering and the drawing
//! adapter.
//!
//! The [`Presenter`](presenter::Presenter) decides *what* is on screen and
//! talks to the panel only through the
//! [`DisplayPort`](crate::app::ports::DisplayPort) trait.
//! [`GraphicsDisplay`](graphics::GraphicsDisplay) is the concrete port
//! implementation on top of `embedded-graphics`.

pub mod graphics;
pub mod presenter;
pub mod status;

use serde::{Deserialize, Serialize};

/// 24-bit `0xRRGGBB` colour, the format used in the node configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Self = Self(0x00_0000);
    pub const GREY: Self = Self(0xAA_AAAA);
    pub const GREEN: Self = Self(0x2A_CF22);
    pub const RED: Self = Self(0xD4_0707);

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }
}

/// Top-left anchored screen coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Text sizes available on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSize {
    /// Captions (sensor labels, config labels).
    Small,
    /// Status line.
    Medium,
    /// Sensor values.
    Large,
}

/// Stable identity of a text region so the display adapter can erase and
/// redraw it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetId {
    StatusText,
    SensorLabel(u8),
    SensorValue(u8),
    ConfigLabel(u8),
    ConfigValue(u8),
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextWidget {
    pub id: WidgetId,
    pub position: Position,
    pub font: FontSize,
    pub color: Color,
}

/// Filled circle used as the status lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorWidget {
    pub center: Position,
    pub radius: u32,
}

/// Whether a text write may be skipped when the text is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    IfChanged,
    Force,
}
