//! Application service: the hexagonal core.
//!
//! [`NodeService`] owns the status FSM, the presenter, the idle timer and
//! the bound sensors.  It exposes a clean, hardware-agnostic API.  All
//! I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!  ButtonPort ──▶ │      NodeService        │ ──▶ PublishPort
//!   ClockPort ──▶ │  FSM · Presenter · Idle │ ──▶ DisplayPort
//!                 └────────────────────────┘
//! ```
//!
//! ## Error policy
//!
//! Hardware errors (sensor bus, GPIO, display) propagate out of
//! [`NodeService::run_iteration`]; the caller shows them with
//! [`NodeService::halt`] and stops.  Network errors end the current
//! cycle in the `Error` state and the next tick retries.

use log::{info, warn};

use crate::config::NodeConfig;
use crate::display::presenter::{IdleTimer, Presenter, SensorWidgets};
use crate::display::status::Status;
use crate::error::{CommsError, Error};
use crate::fsm::context::{CycleOutcome, FsmContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::scheduler::PendingPublishes;
use crate::sensors::{self, ActiveSensor};

use super::events::NodeEvent;
use super::payload::{self, Reading};
use super::ports::{Button, ButtonPort, ClockPort, DisplayPort, EventSink, PublishPort, SensorPort};

// ───────────────────────────────────────────────────────────────
// NodeService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct NodeService {
    fsm: Fsm,
    ctx: FsmContext,
    config: NodeConfig,
    presenter: Presenter,
    idle: IdleTimer,
    sensors: Vec<ActiveSensor>,
    pending: PendingPublishes,
}

impl NodeService {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** touch the screen or start the FSM; call [`start`]
    /// next.  `pending` is the counter the publish timer ticks.
    ///
    /// [`start`]: Self::start
    pub fn new(config: NodeConfig, pending: PendingPublishes) -> Result<Self, Error> {
        config.validate()?;
        let color = config.ui.default_color;
        let sensors = config
            .active_sensors()
            .enumerate()
            .map(|(i, def)| ActiveSensor::new(def.clone(), SensorWidgets::for_slot(i as u8, color)))
            .collect();

        Ok(Self {
            fsm: Fsm::new(build_state_table(), StateId::Waiting),
            ctx: FsmContext::new(),
            presenter: Presenter::new(color),
            idle: IdleTimer::new(0, config.screen_timeout_ms),
            sensors,
            pending,
            config,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Draw the initial screen and enter `Waiting`.
    pub fn start(
        &mut self,
        display: &mut impl DisplayPort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        self.idle = IdleTimer::new(clock.uptime_ms(), self.config.screen_timeout_ms);
        self.presenter.init_screen(display, &self.sensors)?;
        self.fsm.start(&mut self.ctx);
        self.sync_status(display, sink)?;
        sink.emit(&NodeEvent::Started {
            core_id: self.config.core_id.clone(),
            sensors: self.sensors.len(),
        });
        info!(
            "NodeService started: core_id={} sensors={} period={}ms",
            self.config.core_id,
            self.sensors.len(),
            self.config.publish_period_ms()
        );
        Ok(())
    }

    /// Show a fatal error on screen.  The main loop stops afterwards.
    pub fn halt(&mut self, display: &mut impl DisplayPort, error: &Error, sink: &mut impl EventSink) {
        sink.emit(&NodeEvent::Fatal(*error));
        if let Err(e) = self.presenter.render_fatal(display, &error.to_string()) {
            warn!("NodeService: fatal message not shown: {}", e);
        }
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// One pass of the main loop: buttons → idle timeout → publish cycle.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ButtonPort`], avoiding a double mutable borrow while keeping the
    /// port boundary explicit.
    pub fn run_iteration(
        &mut self,
        hw: &mut (impl SensorPort + ButtonPort),
        display: &mut impl DisplayPort,
        link: &mut impl PublishPort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        let now = clock.uptime_ms();

        // 1. Buttons
        let interacted = self.handle_buttons(hw, display, now, sink)?;

        // 2. Backlight
        if interacted {
            self.idle.touch(now);
            self.switch_screen(display, true, sink)?;
        } else if !self.idle.screen_on(now) {
            self.switch_screen(display, false, sink)?;
        }

        // 3. Status FSM, at most one cycle per iteration
        self.ctx.pending = self.pending.pending();
        self.fsm.tick(&mut self.ctx);
        self.sync_status(display, sink)?;

        if self.fsm.current_state() == StateId::Sending {
            let outcome = self.publish_cycle(hw, display, link, clock, sink)?;
            self.pending.complete_one();
            self.ctx.pending = self.pending.pending();
            self.ctx.cycle = Some(outcome);
            self.fsm.tick(&mut self.ctx);
            self.sync_status(display, sink)?;
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn status(&self) -> Status {
        self.ctx.status
    }

    pub fn context(&self) -> &FsmContext {
        &self.ctx
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn sensors(&self) -> &[ActiveSensor] {
        &self.sensors
    }

    pub fn pending(&self) -> &PendingPublishes {
        &self.pending
    }

    pub fn is_screen_on(&self) -> bool {
        self.presenter.is_screen_on()
    }

    pub fn is_config_visible(&self) -> bool {
        self.presenter.is_config_visible()
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// Returns `true` if any button was pressed.
    fn handle_buttons(
        &mut self,
        hw: &mut (impl SensorPort + ButtonPort),
        display: &mut impl DisplayPort,
        now: u64,
        sink: &mut impl EventSink,
    ) -> Result<bool, Error> {
        hw.poll(now)?;

        let mut interacted = false;
        let mut config_pressed = false;
        for button in Button::ALL {
            if !hw.was_pressed(button) {
                continue;
            }
            interacted = true;
            match button {
                Button::A => self.refresh_sensors(hw, display, sink)?,
                Button::B => {
                    config_pressed = true;
                    if !self.presenter.is_config_visible() {
                        self.presenter.show_config_screen(display, &self.config)?;
                        sink.emit(&NodeEvent::ConfigScreen(true));
                    }
                }
                Button::C => {}
            }
        }

        // Held for at least one iteration: leave on release.
        if self.presenter.is_config_visible() && !config_pressed && hw.is_released(Button::B) {
            self.presenter.hide_config_screen(display, &self.sensors)?;
            sink.emit(&NodeEvent::ConfigScreen(false));
        }
        Ok(interacted)
    }

    /// Re-read and re-render every sensor without publishing.
    fn refresh_sensors(
        &mut self,
        hw: &mut impl SensorPort,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        for sensor in &mut self.sensors {
            let value = sensors::read(hw, &sensor.definition.backend)?;
            self.presenter.render_sensor(display, sensor, value)?;
        }
        sink.emit(&NodeEvent::LocalRefresh);
        Ok(())
    }

    /// Read, render and publish every active sensor.
    ///
    /// `Ok(Failed)` means the network dropped; hardware errors are `Err`.
    fn publish_cycle(
        &mut self,
        hw: &mut impl SensorPort,
        display: &mut impl DisplayPort,
        link: &mut impl PublishPort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<CycleOutcome, Error> {
        let core_id = self.config.core_id.as_str();

        if let Err(e) = link.ensure_connected() {
            let topic = payload::node_topic(core_id).unwrap_or_default();
            return Ok(Self::cycle_failed(topic.as_str(), e, sink));
        }

        for sensor in &mut self.sensors {
            let value = sensors::read(hw, &sensor.definition.backend)?;
            self.presenter.render_sensor(display, sensor, value)?;

            let topic = match payload::topic(core_id, &sensor.definition.name) {
                Ok(t) => t,
                Err(e) => return Ok(Self::cycle_failed(&sensor.definition.name, e, sink)),
            };
            let reading = Reading {
                timestamp: clock.epoch_ms(),
                value,
            };
            let sent = reading
                .encode()
                .and_then(|bytes| link.publish(topic.as_str(), &bytes));
            if let Err(e) = sent {
                return Ok(Self::cycle_failed(topic.as_str(), e, sink));
            }
            sink.emit(&NodeEvent::Published {
                topic: topic.as_str().into(),
                value,
            });
        }
        Ok(CycleOutcome::Completed)
    }

    fn cycle_failed(topic: &str, error: CommsError, sink: &mut impl EventSink) -> CycleOutcome {
        warn!("NodeService: cycle skipped at {}: {}", topic, error);
        sink.emit(&NodeEvent::PublishFailed {
            topic: topic.into(),
            error,
        });
        CycleOutcome::Failed(error)
    }

    fn switch_screen(
        &mut self,
        display: &mut impl DisplayPort,
        on: bool,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        if self.presenter.set_screen_power(display, on)? {
            sink.emit(&NodeEvent::ScreenPower(on));
        }
        Ok(())
    }

    /// Push the FSM's status to the screen when it changed.
    fn sync_status(
        &mut self,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        let from = self.presenter.status();
        let to = self.ctx.status;
        if from == to {
            return Ok(());
        }
        self.presenter
            .render_status(display, to, &self.ctx.status_detail)?;
        sink.emit(&NodeEvent::StatusChanged { from, to });
        Ok(())
    }
}
