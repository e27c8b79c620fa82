//! Hardware adapter: bridges the I2C units and front buttons to the
//! domain port traits.
//!
//! [`UnitBus`] holds handles onto the Grove I2C bus shared by the ENV
//! unit and the PbHub and exposes both through [`SensorPort`].  Neither
//! unit is probed at construction; a missing unit shows up as a read
//! error on the first sensor that uses it.  [`FrontPanel`] owns
//! the three button drivers and exposes them through [`ButtonPort`].
//! Both are generic over `embedded-hal` traits so host tests can swap in
//! mock buses and pins.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use embedded_hal::i2c::I2c;

use crate::app::ports::{Button, ButtonPort, SensorPort};
use crate::drivers::button::ButtonDriver;
use crate::drivers::env_unit::EnvUnit;
use crate::drivers::pbhub::PbHub;
use crate::error::SensorError;
use crate::sensors::EnvAttribute;

/// Every I2C sensor unit on the Grove port.
pub struct UnitBus<I, D> {
    env: EnvUnit<I, D>,
    hub: PbHub,
    hub_i2c: I,
}

impl<I: I2c, D: DelayNs> UnitBus<I, D> {
    pub fn new(env: EnvUnit<I, D>, hub_i2c: I) -> Self {
        Self {
            env,
            hub: PbHub::new(),
            hub_i2c,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I: I2c, D: DelayNs> SensorPort for UnitBus<I, D> {
    fn read_attribute(&mut self, attribute: EnvAttribute) -> Result<f32, SensorError> {
        self.env.read(attribute)
    }

    fn read_channel(&mut self, address: u8) -> Result<u16, SensorError> {
        self.hub.analog_read(&mut self.hub_i2c, address)
    }
}

/// The three front buttons, left to right.
pub struct FrontPanel<A, B, C> {
    a: ButtonDriver<A>,
    b: ButtonDriver<B>,
    c: ButtonDriver<C>,
}

impl<A: InputPin, B: InputPin, C: InputPin> FrontPanel<A, B, C> {
    pub fn new(a: A, b: B, c: C) -> Self {
        Self {
            a: ButtonDriver::new(a),
            b: ButtonDriver::new(b),
            c: ButtonDriver::new(c),
        }
    }
}

// ── ButtonPort implementation ─────────────────────────────────

impl<A: InputPin, B: InputPin, C: InputPin> ButtonPort for FrontPanel<A, B, C> {
    fn poll(&mut self, now_ms: u64) -> Result<(), SensorError> {
        self.a.poll(now_ms)?;
        self.b.poll(now_ms)?;
        self.c.poll(now_ms)
    }

    fn was_pressed(&mut self, button: Button) -> bool {
        match button {
            Button::A => self.a.was_pressed(),
            Button::B => self.b.was_pressed(),
            Button::C => self.c.was_pressed(),
        }
    }

    fn is_released(&self, button: Button) -> bool {
        match button {
            Button::A => self.a.is_released(),
            Button::B => self.b.is_released(),
            Button::C => self.c.is_released(),
        }
    }
}

/// Sensor units and buttons behind one value, the shape the main loop
/// hands to the service.
pub struct NodeHardware<S, P> {
    pub sensors: S,
    pub panel: P,
}

impl<S: SensorPort, P> SensorPort for NodeHardware<S, P> {
    fn read_attribute(&mut self, attribute: EnvAttribute) -> Result<f32, SensorError> {
        self.sensors.read_attribute(attribute)
    }

    fn read_channel(&mut self, address: u8) -> Result<u16, SensorError> {
        self.sensors.read_channel(address)
    }
}

impl<S, P: ButtonPort> ButtonPort for NodeHardware<S, P> {
    fn poll(&mut self, now_ms: u64) -> Result<(), SensorError> {
        self.panel.poll(now_ms)
    }

    fn was_pressed(&mut self, button: Button) -> bool {
        self.panel.was_pressed(button)
    }

    fn is_released(&self, button: Button) -> bool {
        self.panel.is_released(button)
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;
    use core::convert::Infallible;

    use embedded_hal_bus::i2c::RefCellDevice;

    use super::*;
    use crate::drivers::env_unit::tests::{add_bmp280, add_sht40};
    use crate::drivers::i2c_mock::{MockBus, NoDelay};
    use crate::drivers::pbhub::{PBHUB_ADDR, analog_register};

    struct Level(bool);

    impl embedded_hal::digital::ErrorType for Level {
        type Error = Infallible;
    }

    impl InputPin for Level {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(self.0)
        }
    }

    fn hub_only_bus() -> MockBus {
        let mut bus = MockBus::default();
        bus.set(PBHUB_ADDR, analog_register(1), &700u16.to_le_bytes());
        bus
    }

    fn units(bus: &RefCell<MockBus>) -> UnitBus<RefCellDevice<'_, MockBus>, NoDelay> {
        let env = EnvUnit::new(RefCellDevice::new(bus), RefCellDevice::new(bus), NoDelay);
        UnitBus::new(env, RefCellDevice::new(bus))
    }

    #[test]
    fn unit_bus_routes_attributes_and_channels() {
        let mut mock = hub_only_bus();
        add_sht40(&mut mock);
        add_bmp280(&mut mock);
        let bus = RefCell::new(mock);
        let mut units = units(&bus);

        let h = units.read_attribute(EnvAttribute::Humidity).unwrap();
        assert!((h - 45.2).abs() < 0.01);
        let pa = units.read_attribute(EnvAttribute::Pressure).unwrap();
        assert!((pa - 100_653.27).abs() < 1.0);
        assert_eq!(units.read_channel(1), Ok(700));
    }

    #[test]
    fn hub_only_node_reads_channels_without_env_unit() {
        let bus = RefCell::new(hub_only_bus());
        let mut units = units(&bus);

        assert_eq!(units.read_channel(1), Ok(700));
        assert_eq!(
            units.read_attribute(EnvAttribute::Pressure),
            Err(SensorError::BusFailed)
        );
        assert_eq!(
            units.read_attribute(EnvAttribute::Temperature),
            Err(SensorError::BusFailed)
        );
        assert_eq!(units.read_channel(1), Ok(700), "hub unaffected by ENV errors");
    }

    #[test]
    fn front_panel_reports_per_button() {
        let mut panel = FrontPanel::new(Level(false), Level(true), Level(false));
        panel.poll(0).unwrap();
        assert!(!panel.was_pressed(Button::A));
        assert!(panel.was_pressed(Button::B));
        assert!(!panel.is_released(Button::B));
        assert!(panel.is_released(Button::C));
    }
}
