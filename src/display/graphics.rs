//! [`DisplayPort`] on top of `embedded-graphics`.
//!
//! Generic over any `DrawTarget<Color = Rgb565>` plus a backlight pin, so
//! the same code drives the ILI9342C panel on the device and an in-memory
//! target in tests.
//!
//! Text widgets are erased and redrawn in place: the adapter remembers
//! the bounding box of what it last drew for every [`WidgetId`].

use std::collections::HashMap;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, ascii};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyleBuilder, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use embedded_hal::digital::OutputPin;

use super::{Color, FontSize, IndicatorWidget, Redraw, TextWidget, WidgetId};
use crate::app::ports::DisplayPort;
use crate::error::DisplayError;

impl From<Color> for Rgb565 {
    fn from(c: Color) -> Self {
        Rgb565::new(c.r() >> 3, c.g() >> 2, c.b() >> 3)
    }
}

impl FontSize {
    pub fn font(self) -> &'static MonoFont<'static> {
        match self {
            Self::Small => &ascii::FONT_6X10,
            Self::Medium => &ascii::FONT_9X18,
            Self::Large => &ascii::FONT_10X20,
        }
    }
}

/// What is currently drawn for one text widget.
struct DrawnText {
    text: String,
    bounds: Rectangle,
}

pub struct GraphicsDisplay<D, BL> {
    target: D,
    backlight: BL,
    background: Rgb565,
    drawn: HashMap<WidgetId, DrawnText>,
}

impl<D, BL> GraphicsDisplay<D, BL>
where
    D: DrawTarget<Color = Rgb565>,
    BL: OutputPin,
{
    pub fn new(target: D, backlight: BL) -> Self {
        Self {
            target,
            backlight,
            background: Rgb565::BLACK,
            drawn: HashMap::new(),
        }
    }

    /// Borrow the underlying draw target.
    pub fn target(&self) -> &D {
        &self.target
    }

    fn fill(&mut self, area: Rectangle) -> Result<(), DisplayError> {
        self.target
            .fill_solid(&area, self.background)
            .map_err(|_| DisplayError::DrawFailed)
    }
}

impl<D, BL> DisplayPort for GraphicsDisplay<D, BL>
where
    D: DrawTarget<Color = Rgb565>,
    BL: OutputPin,
{
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.drawn.clear();
        self.target
            .clear(self.background)
            .map_err(|_| DisplayError::DrawFailed)
    }

    fn set_text(
        &mut self,
        widget: &TextWidget,
        text: &str,
        redraw: Redraw,
    ) -> Result<(), DisplayError> {
        if redraw == Redraw::IfChanged
            && self.drawn.get(&widget.id).is_some_and(|d| d.text == text)
        {
            return Ok(());
        }

        if let Some(previous) = self.drawn.remove(&widget.id) {
            self.fill(previous.bounds)?;
        }

        let style = MonoTextStyle::new(widget.font.font(), widget.color.into());
        let origin = Point::new(widget.position.x, widget.position.y);
        let item = Text::with_baseline(text, origin, style, Baseline::Top);
        let bounds = item.bounding_box();
        item.draw(&mut self.target)
            .map_err(|_| DisplayError::DrawFailed)?;

        self.drawn.insert(
            widget.id,
            DrawnText {
                text: text.to_owned(),
                bounds,
            },
        );
        Ok(())
    }

    fn set_colors(
        &mut self,
        widget: &IndicatorWidget,
        fill: Color,
        border: Color,
    ) -> Result<(), DisplayError> {
        let style = PrimitiveStyleBuilder::new()
            .fill_color(fill.into())
            .stroke_color(border.into())
            .stroke_width(1)
            .build();
        let center = Point::new(widget.center.x, widget.center.y);
        Circle::with_center(center, widget.radius * 2 + 1)
            .into_styled(style)
            .draw(&mut self.target)
            .map_err(|_| DisplayError::DrawFailed)
    }

    fn set_screen_power(&mut self, on: bool) -> Result<(), DisplayError> {
        let result = if on {
            self.backlight.set_high()
        } else {
            self.backlight.set_low()
        };
        result.map_err(|_| DisplayError::BacklightFailed)
    }
}
