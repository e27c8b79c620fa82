//! Integration tests for the NodeService → FSM → ports pipeline.
//!
//! These run on the host (x86_64) and drive the main loop iteration by
//! iteration against mock adapters and a hand-advanced clock.

use super::mock_hw::{EPOCH_BASE_MS, LogSink, ManualClock, MockDisplay, MockHardware, MockLink};

use iothome::app::events::NodeEvent;
use iothome::app::ports::{Button, ClockPort};
use iothome::app::service::NodeService;
use iothome::config::NodeConfig;
use iothome::display::status::Status;
use iothome::display::{Color, WidgetId};
use iothome::error::{CommsError, Error, SensorError};
use iothome::fsm::StateId;
use iothome::scheduler::{PendingPublishes, PublishTicker};

const LOOP_MS: u64 = 500;

struct Rig {
    node: NodeService,
    hw: MockHardware,
    display: MockDisplay,
    link: MockLink,
    clock: ManualClock,
    sink: LogSink,
    pending: PendingPublishes,
}

impl Rig {
    fn new(config: NodeConfig) -> Self {
        let pending = PendingPublishes::startup(config.publish_on_startup);
        let mut rig = Self {
            node: NodeService::new(config, pending.clone()).unwrap(),
            hw: MockHardware::new(),
            display: MockDisplay::new(),
            link: MockLink::new(),
            clock: ManualClock::new(),
            sink: LogSink::new(),
            pending,
        };
        rig.node
            .start(&mut rig.display, &rig.clock, &mut rig.sink)
            .unwrap();
        rig
    }

    fn quiet() -> Self {
        let config = NodeConfig {
            publish_on_startup: false,
            ..NodeConfig::default()
        };
        Self::new(config)
    }

    fn step(&mut self) -> Result<(), Error> {
        self.clock.advance(LOOP_MS);
        self.node.run_iteration(
            &mut self.hw,
            &mut self.display,
            &mut self.link,
            &self.clock,
            &mut self.sink,
        )
    }

    fn value(&self, slot: u8) -> Option<&str> {
        self.display.text(WidgetId::SensorValue(slot))
    }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_draws_grid_and_waits() {
    let rig = Rig::quiet();

    assert_eq!(rig.node.state(), StateId::Waiting);
    assert_eq!(rig.node.status(), Status::Waiting);
    assert_eq!(rig.display.status_text(), Some("waiting"));
    assert_eq!(rig.display.lamp, Some(Color::GREY));
    assert_eq!(rig.display.backlight, Some(true));
    assert_eq!(
        rig.display.text(WidgetId::SensorLabel(0)),
        Some("Humidity [AH]")
    );
    assert_eq!(rig.display.text(WidgetId::SensorLabel(4)), Some("Light [lux]"));
    assert_eq!(rig.value(0), Some("-"));
    assert!(rig.sink.events.contains(&NodeEvent::Started {
        core_id: "inside".into(),
        sensors: 5,
    }));
}

#[test]
fn startup_tick_publishes_every_sensor_once() {
    let mut rig = Rig::new(NodeConfig::default());
    assert_eq!(rig.pending.pending(), 1);

    rig.step().unwrap();

    assert_eq!(
        rig.link.topics(),
        [
            "home/inside/humidity",
            "home/inside/temperature",
            "home/inside/pressure",
            "home/inside/earth",
            "home/inside/light",
        ]
    );
    assert_eq!(rig.pending.pending(), 0);
    assert_eq!(rig.node.state(), StateId::Waiting);
    assert_eq!(rig.display.status_text(), Some("waiting"));
    assert_eq!(rig.value(0), Some("45.20"));
    assert_eq!(rig.value(3), Some("9.56"));
    assert_eq!(rig.value(4), Some("68.27"));

    let sent = rig.link.payload_json(4);
    assert_eq!(sent["timestamp"].as_u64(), Some(EPOCH_BASE_MS + LOOP_MS));
    assert!((sent["value"].as_f64().unwrap() - 68.27).abs() < 1e-4);

    // sending was shown on the way through
    assert!(rig.sink.events.contains(&NodeEvent::StatusChanged {
        from: Status::Waiting,
        to: Status::Sending,
    }));
}

#[test]
fn nothing_happens_without_pending_ticks() {
    let mut rig = Rig::quiet();
    for _ in 0..10 {
        rig.step().unwrap();
    }
    assert!(rig.link.published.is_empty());
    assert_eq!(rig.link.connect_checks, 0);
    assert_eq!(rig.hw.attribute_reads, 0);
}

// ── Scheduling ────────────────────────────────────────────────

#[test]
fn one_cycle_per_ten_seconds_at_point_one_hz() {
    let mut rig = Rig::quiet();
    let period = rig.node.config().publish_period_ms();
    assert_eq!(period, 10_000);
    let mut ticker = PublishTicker::new(period, 0);

    // 100 s of loop iterations at 2 Hz
    for _ in 0..200 {
        ticker.advance(rig.clock.uptime_ms() + LOOP_MS, &rig.pending);
        rig.step().unwrap();
    }

    assert_eq!(rig.node.context().cycles_completed, 10);
    assert_eq!(rig.link.published.len(), 10 * 5);
    assert_eq!(rig.pending.pending(), 0);
}

#[test]
fn accumulated_ticks_drain_one_per_iteration() {
    let mut rig = Rig::quiet();
    for _ in 0..3 {
        rig.pending.record_tick();
    }

    rig.step().unwrap();
    assert_eq!(rig.pending.pending(), 2);
    rig.step().unwrap();
    rig.step().unwrap();
    assert_eq!(rig.pending.pending(), 0);
    rig.step().unwrap();

    assert_eq!(rig.node.context().cycles_completed, 3);
    assert_eq!(rig.link.published.len(), 15);
}

// ── Network failures ──────────────────────────────────────────

#[test]
fn publish_failure_skips_rest_of_cycle() {
    let mut rig = Rig::new(NodeConfig::default());
    rig.link.fail_after = Some(2);

    rig.step().unwrap();

    assert_eq!(rig.link.published.len(), 2);
    assert_eq!(rig.pending.pending(), 0, "failed cycle still consumes its tick");
    assert_eq!(rig.node.state(), StateId::Error);
    assert_eq!(
        rig.display.status_text(),
        Some("error: MQTT publish failed")
    );
    assert_eq!(rig.display.lamp, Some(Color::RED));
    assert_eq!(
        rig.sink.count(|e| matches!(e, NodeEvent::PublishFailed { .. })),
        1
    );
    assert!(rig.sink.events.contains(&NodeEvent::PublishFailed {
        topic: "home/inside/pressure".into(),
        error: CommsError::MqttPublishFailed,
    }));
    // the failed sensor was still read and shown, the ones after it were not
    assert_eq!(rig.display.text(WidgetId::SensorValue(2)), Some("100653.27"));
    assert_eq!(rig.value(3), Some("-"));
}

#[test]
fn error_persists_until_next_successful_cycle() {
    let mut rig = Rig::new(NodeConfig::default());
    rig.link.fail_publish = true;
    rig.step().unwrap();
    assert_eq!(rig.node.state(), StateId::Error);

    // idle iterations keep the error on screen
    rig.link.fail_publish = false;
    rig.step().unwrap();
    rig.step().unwrap();
    assert_eq!(rig.node.state(), StateId::Error);

    rig.pending.record_tick();
    rig.step().unwrap();
    assert_eq!(rig.node.state(), StateId::Waiting);
    assert_eq!(rig.display.status_text(), Some("waiting"));
    assert_eq!(rig.node.context().cycles_failed, 1);
    assert_eq!(rig.node.context().cycles_completed, 1);
}

#[test]
fn wifi_down_skips_sensor_reads() {
    let mut rig = Rig::new(NodeConfig::default());
    rig.link.connected = false;

    rig.step().unwrap();

    assert_eq!(rig.hw.attribute_reads, 0);
    assert!(rig.link.published.is_empty());
    assert_eq!(rig.display.status_text(), Some("error: WiFi disconnected"));
    assert!(rig.sink.events.contains(&NodeEvent::PublishFailed {
        topic: "home/inside".into(),
        error: CommsError::WifiDisconnected,
    }));
}

#[test]
fn node_without_network_at_boot_keeps_running_and_recovers() {
    // First boot: no credentials yet, so the link never comes up.
    let mut rig = Rig::new(NodeConfig::default());
    rig.link.connected = false;
    rig.link.down_error = CommsError::WifiConnectFailed;

    rig.step().unwrap();
    assert_eq!(rig.node.state(), StateId::Error);
    assert_eq!(rig.display.status_text(), Some("error: WiFi connect failed"));

    for _ in 0..3 {
        rig.pending.record_tick();
        rig.step().unwrap();
        assert_eq!(rig.node.state(), StateId::Error);
    }
    assert_eq!(rig.link.connect_checks, 4, "one connect attempt per cycle");
    assert_eq!(rig.hw.attribute_reads, 0);

    rig.link.connected = true;
    rig.pending.record_tick();
    rig.step().unwrap();
    assert_eq!(rig.node.state(), StateId::Waiting);
    assert_eq!(rig.display.status_text(), Some("waiting"));
    assert!(!rig.link.published.is_empty());
    assert_eq!(rig.node.context().cycles_failed, 4);
}

// ── Hardware failures ─────────────────────────────────────────

#[test]
fn sensor_failure_is_fatal() {
    let mut rig = Rig::new(NodeConfig::default());
    rig.hw.fail_sensors = true;

    let err = rig.step().unwrap_err();
    assert_eq!(err, Error::Sensor(SensorError::BusFailed));
    assert!(!err.is_transient());

    rig.node.halt(&mut rig.display, &err, &mut rig.sink);
    assert_eq!(
        rig.display.text(WidgetId::Message),
        Some("Oops, an error occurred! sensor: I2C bus read failed")
    );
    assert_eq!(rig.display.backlight, Some(true));
    assert!(rig.sink.events.contains(&NodeEvent::Fatal(err)));
}

#[test]
fn display_failure_is_fatal() {
    let mut rig = Rig::new(NodeConfig::default());
    rig.display.fail_draw = true;
    assert!(matches!(rig.step(), Err(Error::Display(_))));
}

// ── Buttons and backlight ─────────────────────────────────────

#[test]
fn screen_turns_off_exactly_at_timeout() {
    let config = NodeConfig {
        publish_on_startup: false,
        screen_timeout_ms: 5_000,
        ..NodeConfig::default()
    };
    let mut rig = Rig::new(config);

    // 9 iterations = 4.5 s: still on
    for _ in 0..9 {
        rig.step().unwrap();
    }
    assert!(rig.node.is_screen_on());

    // 10th iteration lands on 5.0 s
    rig.step().unwrap();
    assert!(!rig.node.is_screen_on());
    assert_eq!(rig.display.backlight, Some(false));
    assert_eq!(rig.sink.count(|e| *e == NodeEvent::ScreenPower(false)), 1);

    // further idle iterations do not toggle again
    rig.step().unwrap();
    assert_eq!(rig.sink.count(|e| *e == NodeEvent::ScreenPower(false)), 1);
}

#[test]
fn any_press_wakes_screen_and_resets_timer() {
    let config = NodeConfig {
        publish_on_startup: false,
        screen_timeout_ms: 2_000,
        ..NodeConfig::default()
    };
    let mut rig = Rig::new(config);
    for _ in 0..4 {
        rig.step().unwrap();
    }
    assert!(!rig.node.is_screen_on());

    rig.hw.tap(Button::C);
    rig.step().unwrap();
    assert!(rig.node.is_screen_on());
    assert_eq!(rig.sink.count(|e| *e == NodeEvent::ScreenPower(true)), 1);

    // timer restarted from the press
    for _ in 0..3 {
        rig.step().unwrap();
    }
    assert!(rig.node.is_screen_on());
    rig.step().unwrap();
    assert!(!rig.node.is_screen_on());
}

#[test]
fn button_a_refreshes_without_publishing() {
    let mut rig = Rig::quiet();
    rig.hw.tap(Button::A);

    rig.step().unwrap();

    assert_eq!(rig.value(1), Some("21.30"));
    assert_eq!(rig.value(4), Some("68.27"));
    assert!(rig.link.published.is_empty());
    assert_eq!(rig.node.state(), StateId::Waiting);
    assert!(rig.sink.events.contains(&NodeEvent::LocalRefresh));
}

#[test]
fn config_screen_while_b_is_held() {
    let mut rig = Rig::quiet();
    rig.hw.press(Button::B);
    rig.step().unwrap();

    assert!(rig.node.is_config_visible());
    assert_eq!(rig.display.text(WidgetId::ConfigLabel(0)), Some("Core ID"));
    assert_eq!(rig.display.text(WidgetId::ConfigValue(0)), Some("inside"));
    assert_eq!(
        rig.display.text(WidgetId::ConfigValue(1)),
        Some("192.168.1.12")
    );
    assert_eq!(rig.display.text(WidgetId::ConfigValue(2)), Some("0.1"));
    assert_eq!(rig.display.status_text(), None);

    // a cycle while held publishes but leaves the config screen alone
    rig.pending.record_tick();
    rig.step().unwrap();
    assert!(rig.node.is_config_visible());
    assert_eq!(rig.link.published.len(), 5);
    assert_eq!(rig.value(0), None);

    rig.hw.release(Button::B);
    rig.step().unwrap();
    assert!(!rig.node.is_config_visible());
    assert_eq!(rig.value(0), Some("45.20"), "grid repainted from cached values");
    assert_eq!(rig.display.status_text(), Some("waiting"));
    assert_eq!(
        rig.sink.count(|e| matches!(e, NodeEvent::ConfigScreen(_))),
        2
    );
}

#[test]
fn short_b_tap_shows_config_for_one_iteration() {
    let mut rig = Rig::quiet();
    rig.hw.tap(Button::B);

    rig.step().unwrap();
    assert!(rig.node.is_config_visible());

    rig.step().unwrap();
    assert!(!rig.node.is_config_visible());
}
