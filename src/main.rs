//! IoT Home sensor node: main entry point.
//!
//! Hexagonal architecture with a cooperative main loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UnitBus+FrontPanel  GraphicsDisplay  MqttLink   SystemClock   │
//! │  (Sensor+Button)     (DisplayPort)    (Publish)  (ClockPort)   │
//! │  NvsConfigStore      LogEventSink                              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │             NodeService (pure logic)                   │    │
//! │  │  FSM · Presenter · Idle timer                          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Publish timer (esp_timer task) ──▶ PendingPublishes (atomic)  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::cell::RefCell;
use std::time::Duration;

use anyhow::Result;
use embedded_hal_bus::i2c::RefCellDevice;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::config::Config as SpiConfig;
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::timer::EspTaskTimerService;
use log::{error, info, warn};
use mipidsi::interface::SpiInterface;
use mipidsi::models::ILI9342CRgb565;
use mipidsi::options::{ColorInversion, ColorOrder};
use mipidsi::Builder;

use iothome::adapters::hardware::{FrontPanel, NodeHardware, UnitBus};
use iothome::adapters::log_sink::LogEventSink;
use iothome::adapters::mqtt::MqttLink;
use iothome::adapters::nvs::NvsConfigStore;
use iothome::adapters::time::{self, SystemClock};
use iothome::adapters::wifi::WifiLink;
use iothome::drivers::env_unit::EnvUnit;
use iothome::app::ports::{ConfigPort, PublishPort};
use iothome::app::service::NodeService;
use iothome::config::NodeConfig;
use iothome::display::graphics::GraphicsDisplay;
use iothome::drivers::hw_timer;
use iothome::pins;
use iothome::scheduler::PendingPublishes;

/// How long bring-up waits for the first broker connection.
const MQTT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// How long bring-up waits for the first SNTP sync.
const SNTP_SYNC_TIMEOUT: Duration = Duration::from_secs(15);

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  IoT Home node v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = load_config(nvs_partition.clone());

    // ── 3. Display (pin map in `pins`) ────────────────────────
    let spi = SpiDriver::new(
        peripherals.spi2,
        peripherals.pins.gpio18,
        peripherals.pins.gpio23,
        None::<AnyIOPin>,
        &SpiDriverConfig::new(),
    )?;
    let spi_device = SpiDeviceDriver::new(
        spi,
        Some(peripherals.pins.gpio14),
        &SpiConfig::new().baudrate(Hertz(pins::LCD_SPI_HZ)),
    )?;
    let dc = PinDriver::output(peripherals.pins.gpio27)?;
    let rst = PinDriver::output(peripherals.pins.gpio33)?;
    let mut spi_buffer = [0u8; 512];
    let di = SpiInterface::new(spi_device, dc, &mut spi_buffer);
    let panel = Builder::new(ILI9342CRgb565, di)
        .display_size(pins::LCD_WIDTH, pins::LCD_HEIGHT)
        .color_order(ColorOrder::Bgr)
        .invert_colors(ColorInversion::Inverted)
        .reset_pin(rst)
        .init(&mut FreeRtos)
        .map_err(|e| anyhow::anyhow!("display init failed: {:?}", e))?;
    let backlight = PinDriver::output(peripherals.pins.gpio32)?;
    let mut display = GraphicsDisplay::new(panel, backlight);

    // ── 4. Construct app service ──────────────────────────────
    let clock = SystemClock::new();
    let mut sink = LogEventSink::new();
    let pending = PendingPublishes::startup(config.publish_on_startup);
    let mut node = NodeService::new(config.clone(), pending.clone())?;
    node.start(&mut display, &clock, &mut sink)?;

    // ── 5. Sensors and buttons ────────────────────────────────
    // Grove port A, SDA 21 / SCL 22.  Units are probed on first read.
    let i2c = RefCell::new(I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )?);
    let env = EnvUnit::new(RefCellDevice::new(&i2c), RefCellDevice::new(&i2c), Ets);
    let units = UnitBus::new(env, RefCellDevice::new(&i2c));
    let buttons = FrontPanel::new(
        PinDriver::input(peripherals.pins.gpio39)?,
        PinDriver::input(peripherals.pins.gpio38)?,
        PinDriver::input(peripherals.pins.gpio37)?,
    );
    let mut hw = NodeHardware {
        sensors: units,
        panel: buttons,
    };

    // ── 6. Network + wall clock ───────────────────────────────
    // Only a radio driver failure halts; an absent network or broker is
    // shown as the error status and retried every cycle.
    let wifi = match WifiLink::start(peripherals.modem, sys_loop, nvs_partition, &config.wifi) {
        Ok(w) => w,
        Err(e) => {
            node.halt(&mut display, &e, &mut sink);
            park();
        }
    };
    let _sntp = match time::sync_wall_clock(SNTP_SYNC_TIMEOUT) {
        Ok((sntp, _)) => Some(sntp),
        Err(e) => {
            warn!("SNTP unavailable ({}), timestamps follow the RTC", e);
            None
        }
    };
    let mut link = MqttLink::new(wifi, &config);
    if let Err(e) = link.ensure_connected()
        && !link.wait_connected(MQTT_CONNECT_TIMEOUT)
    {
        warn!("Network not ready at boot ({}), retrying every cycle", e);
    }

    // ── 7. Publish timer ──────────────────────────────────────
    let timer_service = EspTaskTimerService::new()?;
    let _timer =
        hw_timer::start_publish_timer(&timer_service, config.publish_period_ms(), pending)?;

    info!("System ready. Entering main loop.");

    // ── 8. Main loop ──────────────────────────────────────────
    loop {
        if let Err(e) = node.run_iteration(&mut hw, &mut display, &mut link, &clock, &mut sink) {
            error!("Main loop stopped: {}", e);
            node.halt(&mut display, &e, &mut sink);
            park();
        }
        FreeRtos::delay_ms(config.loop_interval_ms);
    }
}

/// Stored config, optionally overwritten by a JSON document baked in at
/// build time through `IOTHOME_CONFIG_JSON`.
fn load_config(partition: EspDefaultNvsPartition) -> NodeConfig {
    let mut store = match NvsConfigStore::new(partition) {
        Ok(s) => s,
        Err(e) => {
            warn!("NVS open failed ({}), running with defaults", e);
            return NodeConfig::default();
        }
    };

    if let Some(json) = option_env!("IOTHOME_CONFIG_JSON") {
        match store.provision_json(json) {
            Ok(_) => info!("Config provisioned from build-time JSON"),
            Err(e) => warn!("Build-time config rejected: {}", e),
        }
    }

    store.load().unwrap_or_else(|e| {
        warn!("NVS config load failed ({}), using defaults", e);
        NodeConfig::default()
    })
}

/// The fatal message stays on screen; no self-restart.
fn park() -> ! {
    loop {
        FreeRtos::delay_ms(1000);
    }
}
