//! Mock adapters for integration tests.
//!
//! Every mock records what the service asked of it so tests can assert on
//! the full call history without touching real I2C, GPIO or network.

use std::cell::Cell;
use std::collections::HashMap;

use iothome::app::events::NodeEvent;
use iothome::app::ports::{
    Button, ButtonPort, ClockPort, DisplayPort, EventSink, PublishPort, SensorPort,
};
use iothome::display::{Color, IndicatorWidget, Redraw, TextWidget, WidgetId};
use iothome::error::{CommsError, DisplayError, SensorError};
use iothome::sensors::EnvAttribute;

// ── MockHardware: sensors + buttons ───────────────────────────

#[derive(Default, Clone, Copy)]
struct ButtonState {
    latched: bool,
    held: bool,
}

pub struct MockHardware {
    pub attributes: HashMap<EnvAttribute, f32>,
    /// Raw value returned for every read of a channel.
    pub channels: HashMap<u8, u16>,
    pub fail_sensors: bool,
    pub attribute_reads: usize,
    pub channel_reads: usize,
    buttons: HashMap<Button, ButtonState>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        let attributes = HashMap::from([
            (EnvAttribute::Humidity, 45.2),
            (EnvAttribute::Temperature, 21.3),
            (EnvAttribute::Pressure, 100_653.27),
        ]);
        Self {
            attributes,
            channels: HashMap::from([(0, 740), (1, 700)]),
            fail_sensors: false,
            attribute_reads: 0,
            channel_reads: 0,
            buttons: HashMap::new(),
        }
    }

    /// Press and keep holding.
    pub fn press(&mut self, button: Button) {
        let state = self.buttons.entry(button).or_default();
        state.latched = true;
        state.held = true;
    }

    pub fn release(&mut self, button: Button) {
        self.buttons.entry(button).or_default().held = false;
    }

    /// Press and release between two polls.
    pub fn tap(&mut self, button: Button) {
        self.press(button);
        self.release(button);
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_attribute(&mut self, attribute: EnvAttribute) -> Result<f32, SensorError> {
        if self.fail_sensors {
            return Err(SensorError::BusFailed);
        }
        self.attribute_reads += 1;
        self.attributes
            .get(&attribute)
            .copied()
            .ok_or(SensorError::NotReady)
    }

    fn read_channel(&mut self, address: u8) -> Result<u16, SensorError> {
        if self.fail_sensors {
            return Err(SensorError::BusFailed);
        }
        self.channel_reads += 1;
        self.channels
            .get(&address)
            .copied()
            .ok_or(SensorError::BusFailed)
    }
}

impl ButtonPort for MockHardware {
    fn poll(&mut self, _now_ms: u64) -> Result<(), SensorError> {
        Ok(())
    }

    fn was_pressed(&mut self, button: Button) -> bool {
        let state = self.buttons.entry(button).or_default();
        std::mem::take(&mut state.latched)
    }

    fn is_released(&self, button: Button) -> bool {
        !self.buttons.get(&button).is_some_and(|s| s.held)
    }
}

// ── MockDisplay ───────────────────────────────────────────────

pub struct MockDisplay {
    /// Current text of every widget.
    pub texts: HashMap<WidgetId, String>,
    pub lamp: Option<Color>,
    pub backlight: Option<bool>,
    pub clears: usize,
    pub writes: usize,
    pub fail_draw: bool,
}

#[allow(dead_code)]
impl MockDisplay {
    pub fn new() -> Self {
        Self {
            texts: HashMap::new(),
            lamp: None,
            backlight: None,
            clears: 0,
            writes: 0,
            fail_draw: false,
        }
    }

    pub fn text(&self, id: WidgetId) -> Option<&str> {
        self.texts.get(&id).map(String::as_str)
    }

    pub fn status_text(&self) -> Option<&str> {
        self.text(WidgetId::StatusText)
    }
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayPort for MockDisplay {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.clears += 1;
        self.texts.clear();
        self.lamp = None;
        Ok(())
    }

    fn set_text(
        &mut self,
        widget: &TextWidget,
        text: &str,
        _redraw: Redraw,
    ) -> Result<(), DisplayError> {
        if self.fail_draw {
            return Err(DisplayError::DrawFailed);
        }
        self.writes += 1;
        self.texts.insert(widget.id, text.to_string());
        Ok(())
    }

    fn set_colors(
        &mut self,
        _widget: &IndicatorWidget,
        fill: Color,
        _border: Color,
    ) -> Result<(), DisplayError> {
        self.lamp = Some(fill);
        Ok(())
    }

    fn set_screen_power(&mut self, on: bool) -> Result<(), DisplayError> {
        self.backlight = Some(on);
        Ok(())
    }
}

// ── MockLink ──────────────────────────────────────────────────

pub struct MockLink {
    pub connected: bool,
    /// Returned by `ensure_connected` while not connected.
    pub down_error: CommsError,
    pub fail_publish: bool,
    /// Fail after this many successful publishes.
    pub fail_after: Option<usize>,
    pub published: Vec<(String, Vec<u8>)>,
    pub connect_checks: usize,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self {
            connected: true,
            down_error: CommsError::WifiDisconnected,
            fail_publish: false,
            fail_after: None,
            published: Vec::new(),
            connect_checks: 0,
        }
    }

    pub fn topics(&self) -> Vec<&str> {
        self.published.iter().map(|(t, _)| t.as_str()).collect()
    }

    pub fn payload_json(&self, index: usize) -> serde_json::Value {
        serde_json::from_slice(&self.published[index].1).unwrap()
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishPort for MockLink {
    fn ensure_connected(&mut self) -> Result<(), CommsError> {
        self.connect_checks += 1;
        if self.connected {
            Ok(())
        } else {
            Err(self.down_error)
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if self.fail_publish || self.fail_after.is_some_and(|n| self.published.len() >= n) {
            return Err(CommsError::MqttPublishFailed);
        }
        self.published.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}

// ── ManualClock ───────────────────────────────────────────────

pub const EPOCH_BASE_MS: u64 = 1_700_000_000_000;

/// Clock the test advances by hand.
pub struct ManualClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self { now: Cell::new(0) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl ClockPort for ManualClock {
    fn uptime_ms(&self) -> u64 {
        self.now.get()
    }

    fn epoch_ms(&self) -> u64 {
        EPOCH_BASE_MS + self.now.get()
    }
}

// ── LogSink ───────────────────────────────────────────────────

/// Sink that stores every event.
#[derive(Default)]
pub struct LogSink {
    pub events: Vec<NodeEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&NodeEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &NodeEvent) {
        self.events.push(event.clone());
    }
}
