//! Register-file I2C bus for driver unit tests.
//!
//! Each device is a 256-byte register file.  A write sets the register
//! pointer (and stores any trailing bytes); a read returns bytes from the
//! pointer onwards, wrapping past `0xFF`.  Addresses that were never
//! populated NACK.

use std::collections::HashMap;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

#[derive(Default)]
pub struct MockBus {
    devices: HashMap<u8, Device>,
}

struct Device {
    regs: [u8; 256],
    pointer: u8,
}

impl MockBus {
    /// Populate `bytes` starting at `reg` of device `addr`.
    pub fn set(&mut self, addr: u8, reg: u8, bytes: &[u8]) {
        let dev = self.devices.entry(addr).or_insert(Device {
            regs: [0; 256],
            pointer: 0,
        });
        dev.store(reg, bytes);
    }
}

impl Device {
    fn store(&mut self, reg: u8, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            self.regs[(usize::from(reg) + i) % 256] = *b;
        }
    }

    fn load(&self, buf: &mut [u8]) {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.regs[(usize::from(self.pointer) + i) % 256];
        }
    }
}

/// Delay that returns immediately.
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

impl ErrorType for MockBus {
    type Error = ErrorKind;
}

impl I2c for MockBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let dev = self
            .devices
            .get_mut(&address)
            .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))?;
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some((&reg, data)) = bytes.split_first() {
                        dev.pointer = reg;
                        dev.store(reg, data);
                    }
                }
                Operation::Read(buf) => dev.load(buf),
            }
        }
        Ok(())
    }
}
