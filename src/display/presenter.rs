//! Display presenter.
//!
//! Owns the screen layout and decides what is drawn.  All drawing goes
//! through [`DisplayPort`]; the presenter never touches the panel.
//!
//! ```text
//!  x=10                 x=170
//!  ┌────────────────────┬────────────────────┐  y=10
//!  │ 45.20              │ 21.30              │  value (Large)
//!  │ Humidity [AH]      │ Temperature [C]    │  label (Small), y+30
//!  ├────────────────────┼────────────────────┤  y=75
//!  │ ...                │ ...                │
//!  ├────────────────────┴────────────────────┤
//!  │ ● waiting                               │  lamp (20,215) r=10, text (40,207)
//!  └─────────────────────────────────────────┘
//! ```
//!
//! Every sensor and status write passes [`Redraw::Force`], so the panel
//! is refreshed even when the text did not change.

use log::info;

use super::status::Status;
use super::{Color, FontSize, IndicatorWidget, Position, Redraw, TextWidget, WidgetId};
use crate::app::ports::DisplayPort;
use crate::config::NodeConfig;
use crate::error::DisplayError;
use crate::sensors::ActiveSensor;

// ═══════════════════════════════════════════════════════════════
//  Layout
// ═══════════════════════════════════════════════════════════════

const LEFT_COLUMN_X: i32 = 10;
const RIGHT_COLUMN_X: i32 = 170;
const FIRST_ROW_Y: i32 = 10;
const ROW_HEIGHT: i32 = 65;
/// Caption sits below the value.
const LABEL_OFFSET_Y: i32 = 30;

const STATUS_LAMP: IndicatorWidget = IndicatorWidget {
    center: Position::new(20, 215),
    radius: 10,
};
const STATUS_TEXT_POS: Position = Position::new(40, 207);

/// Placeholder value shown before the first reading.
const NO_VALUE: &str = "-";

const CONFIG_ROWS: [&str; 3] = ["Core ID", "MQTT Host", "Send Frequency [Hz]"];

/// Label and value widgets of one sensor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorWidgets {
    pub label: TextWidget,
    pub value: TextWidget,
}

impl SensorWidgets {
    /// Slot `index` in the two-column grid, filled left to right then
    /// top to bottom.
    pub fn for_slot(index: u8, color: Color) -> Self {
        let x = if index % 2 == 0 {
            LEFT_COLUMN_X
        } else {
            RIGHT_COLUMN_X
        };
        let y = FIRST_ROW_Y + ROW_HEIGHT * i32::from(index / 2);
        Self {
            value: TextWidget {
                id: WidgetId::SensorValue(index),
                position: Position::new(x, y),
                font: FontSize::Large,
                color,
            },
            label: TextWidget {
                id: WidgetId::SensorLabel(index),
                position: Position::new(x, y + LABEL_OFFSET_Y),
                font: FontSize::Small,
                color,
            },
        }
    }
}

fn config_row(index: u8, color: Color) -> (TextWidget, TextWidget) {
    let y = FIRST_ROW_Y + ROW_HEIGHT * i32::from(index);
    let value = TextWidget {
        id: WidgetId::ConfigValue(index),
        position: Position::new(LEFT_COLUMN_X, y),
        font: FontSize::Large,
        color,
    };
    let label = TextWidget {
        id: WidgetId::ConfigLabel(index),
        position: Position::new(LEFT_COLUMN_X, y + LABEL_OFFSET_Y),
        font: FontSize::Small,
        color,
    };
    (label, value)
}

/// Value text with exactly two decimals.
pub fn format_value(value: f32) -> String {
    format!("{value:.2}")
}

// ═══════════════════════════════════════════════════════════════
//  Idle timer
// ═══════════════════════════════════════════════════════════════

/// Tracks the last user interaction; the screen is on while the elapsed
/// time is below the timeout.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    last_interaction_ms: u64,
    timeout_ms: u64,
}

impl IdleTimer {
    pub fn new(now_ms: u64, timeout_ms: u64) -> Self {
        Self {
            last_interaction_ms: now_ms,
            timeout_ms,
        }
    }

    /// Record a user interaction.
    pub fn touch(&mut self, now_ms: u64) {
        self.last_interaction_ms = now_ms;
    }

    pub fn screen_on(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_interaction_ms) < self.timeout_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  Presenter
// ═══════════════════════════════════════════════════════════════

pub struct Presenter {
    text_color: Color,
    status_text: TextWidget,
    /// Last status rendered (or requested while the config screen is up).
    status: Status,
    status_detail: String,
    config_visible: bool,
    /// Backlight state last sent to the panel; `None` before the first write.
    screen_on: Option<bool>,
}

impl Presenter {
    pub fn new(text_color: Color) -> Self {
        Self {
            text_color,
            status_text: TextWidget {
                id: WidgetId::StatusText,
                position: STATUS_TEXT_POS,
                font: FontSize::Medium,
                color: text_color,
            },
            status: Status::Starting,
            status_detail: String::new(),
            config_visible: false,
            screen_on: None,
        }
    }

    /// Clear the panel, switch the backlight on and draw the sensor grid
    /// with placeholder values and the `starting` status.
    pub fn init_screen(
        &mut self,
        display: &mut impl DisplayPort,
        sensors: &[ActiveSensor],
    ) -> Result<(), DisplayError> {
        display.clear()?;
        self.set_screen_power(display, true)?;
        self.draw_sensor_grid(display, sensors)?;
        self.draw_status(display)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_config_visible(&self) -> bool {
        self.config_visible
    }

    pub fn is_screen_on(&self) -> bool {
        self.screen_on.unwrap_or(false)
    }

    /// Show `status` on the lamp and status line.  While the config screen
    /// is up the status is only remembered.
    pub fn render_status(
        &mut self,
        display: &mut impl DisplayPort,
        status: Status,
        detail: &str,
    ) -> Result<(), DisplayError> {
        self.status = status;
        self.status_detail.clear();
        self.status_detail.push_str(detail);
        if self.config_visible {
            return Ok(());
        }
        self.draw_status(display)
    }

    /// Show a fresh reading and remember it for later repaints.
    pub fn render_sensor(
        &mut self,
        display: &mut impl DisplayPort,
        sensor: &mut ActiveSensor,
        value: f32,
    ) -> Result<(), DisplayError> {
        sensor.last_value = Some(value);
        if self.config_visible {
            return Ok(());
        }
        self.draw_sensor(display, sensor)
    }

    /// Drive the backlight.  Returns `true` when the state changed.
    pub fn set_screen_power(
        &mut self,
        display: &mut impl DisplayPort,
        on: bool,
    ) -> Result<bool, DisplayError> {
        if self.screen_on == Some(on) {
            return Ok(false);
        }
        display.set_screen_power(on)?;
        self.screen_on = Some(on);
        Ok(true)
    }

    /// Replace the screen with core id, broker host and send frequency.
    pub fn show_config_screen(
        &mut self,
        display: &mut impl DisplayPort,
        config: &NodeConfig,
    ) -> Result<(), DisplayError> {
        display.clear()?;
        self.config_visible = true;

        let frequency = config.send_frequency_hz.to_string();
        let values = [
            config.core_id.as_str(),
            config.broker.host.as_str(),
            frequency.as_str(),
        ];
        for (i, (caption, value)) in CONFIG_ROWS.iter().zip(values).enumerate() {
            let (label_widget, value_widget) = config_row(i as u8, self.text_color);
            display.set_text(&label_widget, caption, Redraw::Force)?;
            display.set_text(&value_widget, value, Redraw::Force)?;
        }
        info!("Display: config screen shown");
        Ok(())
    }

    /// Leave the config screen and repaint the grid from cached values.
    pub fn hide_config_screen(
        &mut self,
        display: &mut impl DisplayPort,
        sensors: &[ActiveSensor],
    ) -> Result<(), DisplayError> {
        display.clear()?;
        self.config_visible = false;
        self.draw_sensor_grid(display, sensors)?;
        self.draw_status(display)?;
        info!("Display: config screen hidden");
        Ok(())
    }

    /// Clear the panel and show the fatal message in red at the top left.
    pub fn render_fatal(
        &mut self,
        display: &mut impl DisplayPort,
        message: &str,
    ) -> Result<(), DisplayError> {
        display.clear()?;
        self.config_visible = false;
        self.set_screen_power(display, true)?;
        let widget = TextWidget {
            id: WidgetId::Message,
            position: Position::new(0, 0),
            font: FontSize::Small,
            color: Color::RED,
        };
        display.set_text(
            &widget,
            &format!("Oops, an error occurred! {message}"),
            Redraw::Force,
        )
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn draw_status(&self, display: &mut impl DisplayPort) -> Result<(), DisplayError> {
        let view = self.status.view(&self.status_detail);
        display.set_colors(&STATUS_LAMP, view.color, view.color)?;
        display.set_text(&self.status_text, &view.text, Redraw::Force)
    }

    fn draw_sensor(
        &self,
        display: &mut impl DisplayPort,
        sensor: &ActiveSensor,
    ) -> Result<(), DisplayError> {
        let value = sensor
            .last_value
            .map_or_else(|| NO_VALUE.to_string(), format_value);
        display.set_text(&sensor.widgets.label, &sensor.definition.caption(), Redraw::Force)?;
        display.set_text(&sensor.widgets.value, &value, Redraw::Force)
    }

    fn draw_sensor_grid(
        &self,
        display: &mut impl DisplayPort,
        sensors: &[ActiveSensor],
    ) -> Result<(), DisplayError> {
        sensors.iter().try_for_each(|s| self.draw_sensor(display, s))
    }
}
