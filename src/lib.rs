//! A crate for emulating a minimal 8-bit teaching CPU at the level of its bus and registers.
//!
//! The machine has three registers (`A`, `B` and the accumulator `C`) that exchange data over a
//! single shared bus. Instructions do not move data directly: they raise a register's *load* or
//! *enable* flag, and the transfer happens when the registers are clocked at the end of the
//! cycle.
//!
//! Currently this crate provides the functionality to:
//! - Read program source into [ProgramMemory](memory::ProgramMemory).
//! - Execute programs one cycle at a time or until they halt.
//! - Observe the machine state through [events](event).
//!
//! # Example
//! ```
//! use bus8::{
//!     memory::ProgramMemory,
//!     machine::Machine,
//!     register::RegisterName,
//! };
//!
//! // Adds two and three together in the accumulator.
//! let source = r#"
//!     REM two plus three
//!     00 mov 0x02,C
//!     01 mov 0x03,A
//!     02 add A
//!     03 hlt
//! "#;
//!
//! let memory = ProgramMemory::parse(source).unwrap();
//!
//! let mut machine = Machine::new(memory);
//!
//! machine.run()
//!     .expect("an error occured while running the program");
//!
//! assert_eq!(machine.register(RegisterName::C).value(), 5);
//! ```
//!
//! # Executables
//!
//! ## `bus8run`
//!
//! Runs a program file, printing the bus, the registers and the program counter after every
//! cycle.
//!
//! ```text
//! $ bus8run --clock 0 countdown.txt
//! ```
pub mod bus;
pub mod config;
pub mod error;
pub mod event;
pub mod instruction;
pub mod machine;
pub mod memory;
pub mod register;
