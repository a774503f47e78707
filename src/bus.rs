//! The shared data bus.

use std::cell::Cell;
use std::fmt;

/// A single 8-bit value cell through which the registers exchange data.
///
/// Registers hold a shared handle to the bus and write to it through `&self`, so the value is
/// kept in a [Cell]. Nothing arbitrates between writers: the last write of a cycle wins.
#[derive(Debug, Default)]
pub struct Bus {
    value: Cell<u8>,
}

impl Bus {
    pub fn new() -> Bus {
        Bus::default()
    }

    pub fn read(&self) -> u8 {
        self.value.get()
    }

    /// Overwrites the value currently on the bus.
    pub fn write(&self, value: u8) {
        self.value.set(value);
    }
}

impl fmt::Display for Bus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = self.read();
        write!(f, "<Bus {:08b} : 0x{:02X}>", value, value)
    }
}
