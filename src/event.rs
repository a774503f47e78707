//! Event handling.
//!
//! The [Machine](crate::machine::Machine) reports what happens during each cycle as [Events](Event)
//! so that a front end can render the machine state without polling it. [EventListeners](EventListener)
//! are registered with [add_listener](crate::machine::Machine::add_listener).
//!
//! A blanket implementation of [EventListener] for all `Fn(&Event)` is provided.

use crate::instruction::Instruction;
use crate::register::RegisterName;

/// Represents an event that occurred while executing a program.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An instruction was fetched and is about to be executed.
    Fetch {
        address: String,
        instruction: Instruction,
    },

    /// The value on the bus changed during the cycle.
    BusChange {
        value: u8,
    },

    /// The value of a register changed during the cycle.
    RegisterChange {
        register: RegisterName,
        value: u8,
    },

    /// A jump instruction redirected execution.
    Jump {
        target: String,
    },

    /// The machine halted.
    Halt,
}

/// Trait for consuming events.
pub trait EventListener {
    /// Called whenever a new event has been created.
    fn event(&mut self, event: &Event);
}

impl<F> EventListener for F where F: Fn(&Event) {
    fn event(&mut self, event: &Event) {
        self(event)
    }
}

pub(crate) struct EventDispatcher {
    listeners: Vec<Box<dyn EventListener>>,
}

impl EventDispatcher {
    pub fn new() -> EventDispatcher {
        EventDispatcher {
            listeners: Vec::new(),
        }
    }

    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener) as Box<dyn EventListener>)
    }

    pub fn dispatch(&mut self, event: Event) {
        for listener in &mut self.listeners {
            listener.event(&event);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "EventDispatcher({} listeners)", self.listeners.len())
    }
}
