//! General purpose registers and their clocked bus interface.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::bus::Bus;

/// Names of the registers of the machine. `C` doubles as the accumulator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RegisterName {
    A,
    B,
    C,
}

impl RegisterName {
    /// All registers in the order they are clocked.
    pub const ALL: [RegisterName; 3] = [RegisterName::A, RegisterName::B, RegisterName::C];

    pub fn index(&self) -> usize {
        match self {
            RegisterName::A => 0,
            RegisterName::B => 1,
            RegisterName::C => 2,
        }
    }
}

impl FromStr for RegisterName {
    type Err = ();

    fn from_str(input: &str) -> Result<RegisterName, ()> {
        match input {
            "A" | "a" => Ok(RegisterName::A),
            "B" | "b" => Ok(RegisterName::B),
            "C" | "c" => Ok(RegisterName::C),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RegisterName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RegisterName::A => write!(f, "A"),
            RegisterName::B => write!(f, "B"),
            RegisterName::C => write!(f, "C"),
        }
    }
}

/// An 8-bit register attached to the bus.
///
/// Bus transfers are requested with [Register::set_load_pending] and
/// [Register::set_enable_pending] and happen on the next call to [Register::tick].
#[derive(Debug)]
pub struct Register {
    name: RegisterName,
    value: u8,
    bus: Rc<Bus>,

    /// Read the bus into the register on the next tick.
    load: bool,

    /// Write the register onto the bus on the next tick.
    enable: bool,
}

impl Register {
    pub fn new(name: RegisterName, bus: Rc<Bus>) -> Register {
        Register {
            name,
            value: 0,
            bus,
            load: false,
            enable: false,
        }
    }

    pub fn name(&self) -> RegisterName {
        self.name
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Sets the value directly, without going through the bus.
    pub fn set_value(&mut self, value: u8) {
        self.value = value;
    }

    pub fn set_load_pending(&mut self) {
        self.load = true;
    }

    pub fn set_enable_pending(&mut self) {
        self.enable = true;
    }

    pub fn is_load_pending(&self) -> bool {
        self.load
    }

    pub fn is_enable_pending(&self) -> bool {
        self.enable
    }

    /// Resolves the pending transfers.
    ///
    /// Load is resolved before enable, so a register with both flags set takes the value from
    /// the bus and then drives that same value back onto it.
    pub fn tick(&mut self) {
        if self.load {
            self.value = self.bus.read();
            self.load = false;
        }

        if self.enable {
            self.bus.write(self.value);
            self.enable = false;
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<Register{}:{:08b} : 0x{:02x}>", self.name, self.value, self.value)
    }
}
