//! [Machine] for executing programs stored in [ProgramMemory].

use std::fmt;
use std::rc::Rc;

use slog::{debug, o, trace, Discard, Logger};

use crate::bus::Bus;
use crate::config::Config;
use crate::error::ExecutionError;
use crate::event::{Event, EventDispatcher, EventListener};
use crate::instruction::Operation;
use crate::memory::ProgramMemory;
use crate::register::{Register, RegisterName};

/// Execution state of the machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
}

/// Values of the bus and the registers, used to detect changes over a cycle.
type Snapshot = (u8, [u8; 3]);

/// The execution unit. Owns the bus, the registers and the program and runs the
/// fetch-execute-tick cycle.
#[derive(Debug)]
pub struct Machine {
    bus: Rc<Bus>,

    /// Registers A, B and C, in the order they are clocked.
    registers: [Register; 3],

    memory: ProgramMemory,

    /// Address of the next instruction. `None` once execution has run past the last instruction.
    address: Option<String>,

    state: State,
    cycles: u64,
    config: Config,
    logger: Logger,
    events: EventDispatcher,
}

impl Machine {
    /// Create a new machine with the default configuration.
    ///
    /// Execution starts from the first address of `memory`. An empty program starts out halted.
    pub fn new(memory: ProgramMemory) -> Machine {
        Machine::with_logger(memory, Config::default(), None)
    }

    pub fn with_config(memory: ProgramMemory, config: Config) -> Machine {
        Machine::with_logger(memory, config, None)
    }

    pub fn with_logger<L>(memory: ProgramMemory, config: Config, logger: L) -> Machine
    where
        L: Into<Option<Logger>>,
    {
        let logger = logger
            .into()
            .unwrap_or(Logger::root(Discard, o!()))
            .new(o!("stage" => "execution"));

        let bus = Rc::new(Bus::new());

        let registers = [
            Register::new(RegisterName::A, bus.clone()),
            Register::new(RegisterName::B, bus.clone()),
            Register::new(RegisterName::C, bus.clone()),
        ];

        let address = memory.first_address().map(String::from);

        let state = match address {
            Some(_) => State::Running,
            None => State::Halted,
        };

        Machine {
            bus,
            registers,
            memory,
            address,
            state,
            cycles: 0,
            config,
            logger,
            events: EventDispatcher::new(),
        }
    }

    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.events.add_listener(listener);
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn register(&self, name: RegisterName) -> &Register {
        &self.registers[name.index()]
    }

    pub fn register_mut(&mut self, name: RegisterName) -> &mut Register {
        &mut self.registers[name.index()]
    }

    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    pub fn memory(&self) -> &ProgramMemory {
        &self.memory
    }

    /// Address of the instruction the next [step](Machine::step) will execute.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    /// Number of cycles executed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Executes one cycle: fetch and execute the current instruction, then tick every register.
    ///
    /// Does nothing on a halted machine.
    ///
    /// # Errors
    /// Returns an [ExecutionError] if the current address is not in the program or the operands
    /// of the instruction are malformed. The machine is halted after an error.
    pub fn step(&mut self) -> Result<State, ExecutionError> {
        let address = match self.address.clone() {
            Some(address) if !self.is_halted() => address,
            _ => return Ok(State::Halted),
        };

        if let Err(err) = self.cycle(address) {
            debug!(self.logger, "fatal error"; "error" => %err, "cycles" => self.cycles);
            self.halt();
            return Err(err);
        }

        Ok(self.state)
    }

    /// Executes the program until it halts.
    ///
    /// # Returns
    /// The total number of cycles executed.
    pub fn run(&mut self) -> Result<u64, ExecutionError> {
        while !self.is_halted() {
            self.step()?;
        }

        Ok(self.cycles)
    }

    /// Executes at most `max_cycles` cycles. Used for programs that might never halt.
    pub fn run_for(&mut self, max_cycles: u64) -> Result<State, ExecutionError> {
        for _ in 0..max_cycles {
            if self.step()? == State::Halted {
                break;
            }
        }

        Ok(self.state)
    }

    fn cycle(&mut self, address: String) -> Result<(), ExecutionError> {
        let instruction = self.memory.get(&address)?.clone();
        let operation = instruction.decode()?;

        trace!(self.logger, "fetch"; "address" => address.as_str(), "instruction" => %instruction);

        self.events.dispatch(Event::Fetch {
            address: address.clone(),
            instruction,
        });

        let before = self.snapshot();

        self.execute(&address, operation);
        self.tick();
        self.cycles += 1;

        self.report_changes(before);

        if self.address.is_none() {
            trace!(self.logger, "end of program"; "last" => address.as_str());
            self.halt();
        }

        Ok(())
    }

    fn execute(&mut self, address: &str, operation: Operation) {
        match operation {
            Operation::Move { value, target } => {
                self.bus.write(value);
                self.register_mut(target).set_load_pending();
                self.advance(address);
            },

            // Leaves the address alone, so the instruction is executed again on the next cycle.
            Operation::MoveC { target } => {
                let value = self.register(RegisterName::C).value();
                self.register_mut(target).set_value(value);
            },

            Operation::Add { source } => {
                let c = self.register(RegisterName::C).value();
                let other = self.register(source).value();
                let result = self.config.overflow.add(c, other);
                self.register_mut(RegisterName::C).set_value(result);
                self.advance(address);
            },

            Operation::Subtract { source } => {
                let c = self.register(RegisterName::C).value();
                let other = self.register(source).value();
                let result = self.config.overflow.sub(c, other);
                self.register_mut(RegisterName::C).set_value(result);
                self.advance(address);
            },

            Operation::Copy { source } => {
                self.register_mut(source).set_enable_pending();
                self.register_mut(RegisterName::C).set_load_pending();
                self.advance(address);
            },

            Operation::Jump { target } => self.jump(target),

            Operation::JumpIf { condition, value, target } => {
                let c = self.register(RegisterName::C).value();
                let taken = condition.holds(c, value);

                trace!(self.logger, "conditional jump";
                    "condition" => ?condition, "c" => c, "value" => value, "taken" => taken);

                if taken {
                    self.jump(target);
                } else {
                    self.advance(address);
                }
            },

            Operation::Halt => self.halt(),
        }
    }

    fn advance(&mut self, address: &str) {
        self.address = self.memory.next_address(address).map(String::from);
    }

    fn jump(&mut self, target: String) {
        self.events.dispatch(Event::Jump { target: target.clone() });
        self.address = Some(target);
    }

    fn halt(&mut self) {
        if self.state == State::Halted {
            return;
        }

        debug!(self.logger, "halt"; "cycles" => self.cycles);
        self.state = State::Halted;
        self.events.dispatch(Event::Halt);
    }

    /// Clocks every register once, in order A, B, C.
    fn tick(&mut self) {
        for register in self.registers.iter_mut() {
            register.tick();
        }

        trace!(self.logger, "tick";
            "bus" => self.bus.read(),
            "a" => self.registers[0].value(),
            "b" => self.registers[1].value(),
            "c" => self.registers[2].value());
    }

    fn snapshot(&self) -> Snapshot {
        (
            self.bus.read(),
            [self.registers[0].value(), self.registers[1].value(), self.registers[2].value()],
        )
    }

    fn report_changes(&mut self, (bus, registers): Snapshot) {
        if self.bus.read() != bus {
            self.events.dispatch(Event::BusChange { value: self.bus.read() });
        }

        for name in RegisterName::ALL.iter() {
            let value = self.register(*name).value();

            if value != registers[name.index()] {
                self.events.dispatch(Event::RegisterChange { register: *name, value });
            }
        }
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", "-".repeat(60))?;
        writeln!(f, "{}", self.bus)?;

        for register in self.registers.iter() {
            writeln!(f, "{}", register)?;
        }

        match self.address {
            Some(ref address) => writeln!(f, "Prog Counter {}", address)?,
            None => writeln!(f, "Prog Counter -")?,
        }

        write!(f, "{}", "-".repeat(60))
    }
}
