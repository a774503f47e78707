//! Machine configuration.

use std::fmt;
use std::str::FromStr;

/// What `add` and `sub` do when the result does not fit in 8 bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Overflow {
    /// Wrap around modulo 256, like a plain 8-bit adder.
    Wrapping,

    /// Clamp the result to `0..=255`.
    Saturating,
}

impl Overflow {
    pub fn add(&self, a: u8, b: u8) -> u8 {
        match self {
            Overflow::Wrapping => a.wrapping_add(b),
            Overflow::Saturating => a.saturating_add(b),
        }
    }

    pub fn sub(&self, a: u8, b: u8) -> u8 {
        match self {
            Overflow::Wrapping => a.wrapping_sub(b),
            Overflow::Saturating => a.saturating_sub(b),
        }
    }
}

impl Default for Overflow {
    fn default() -> Overflow {
        Overflow::Wrapping
    }
}

impl FromStr for Overflow {
    type Err = String;

    fn from_str(input: &str) -> Result<Overflow, String> {
        match input.to_lowercase().as_ref() {
            "wrapping" | "wrap" => Ok(Overflow::Wrapping),
            "saturating" | "saturate" => Ok(Overflow::Saturating),
            other => Err(format!("unknown overflow mode '{}'", other)),
        }
    }
}

impl fmt::Display for Overflow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Overflow::Wrapping => write!(f, "wrapping"),
            Overflow::Saturating => write!(f, "saturating"),
        }
    }
}

/// Options that change how the machine executes a program.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub overflow: Overflow,
}
