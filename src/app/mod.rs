//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the rules of the sensor node: the sample and
//! publish cycle, button handling and status transitions.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod payload;
pub mod ports;
pub mod service;
