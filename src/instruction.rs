//! Types for representing instructions, their operands and their decoded form.

use std::fmt;
use std::str::FromStr;

use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::hex_digit1,
    combinator::{all_consuming, map_res, opt},
    sequence::preceded,
};

use crate::error::{FormatError, FormatErrorKind};
use crate::register::RegisterName;

/// The instruction mnemonics understood by the machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Writes an immediate value to the bus and latches it into a register on the next tick.
    Move,

    /// Copies the value of register C directly into another register.
    MoveC,

    /// Adds the value of a register into register C.
    Add,

    /// Subtracts the value of a register from register C.
    Subtract,

    /// Transfers the value of a register into register C over the bus.
    Copy,

    /// Unconditional jump.
    Jump,

    /// Jump if register C is less than a value.
    JumpLess,

    /// Jump if register C is greater than a value.
    JumpGreater,

    /// Jump if register C is equal to a value.
    JumpEqual,

    /// Stops the machine.
    Halt,
}

impl OpCode {
    /// Every opcode, in the order they are listed in error messages.
    pub const ALL: [OpCode; 10] = [
        OpCode::Move,
        OpCode::MoveC,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Copy,
        OpCode::Jump,
        OpCode::JumpLess,
        OpCode::JumpGreater,
        OpCode::JumpEqual,
        OpCode::Halt,
    ];

    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::Move => "mov",
            OpCode::MoveC => "mvc",
            OpCode::Add => "add",
            OpCode::Subtract => "sub",
            OpCode::Copy => "cop",
            OpCode::Jump => "jmp",
            OpCode::JumpLess => "jml",
            OpCode::JumpGreater => "jmg",
            OpCode::JumpEqual => "jme",
            OpCode::Halt => "hlt",
        }
    }

    /// Whether a source line using this opcode needs an operand field.
    pub fn takes_operands(&self) -> bool {
        *self != OpCode::Halt
    }

    /// Finds the known mnemonic closest to `mnemonic`, for use in error messages.
    pub fn suggest(mnemonic: &str) -> Option<OpCode> {
        let mnemonic = mnemonic.to_lowercase();

        OpCode::ALL.iter()
            .map(|op| (edit_distance::edit_distance(&mnemonic, op.mnemonic()), *op))
            .filter(|(distance, _)| *distance <= 2)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, op)| op)
    }
}

impl FromStr for OpCode {
    type Err = ();

    fn from_str(input: &str) -> Result<OpCode, ()> {
        OpCode::ALL.iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(input))
            .copied()
            .ok_or(())
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Predicate of a conditional jump, comparing register C against an immediate value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JumpCondition {
    /// `jml`
    Less,

    /// `jmg`
    Greater,

    /// `jme`
    Equal,
}

impl JumpCondition {
    pub fn holds(&self, accumulator: u8, value: u8) -> bool {
        match self {
            JumpCondition::Less => accumulator < value,
            JumpCondition::Greater => accumulator > value,
            JumpCondition::Equal => accumulator == value,
        }
    }
}

/// An instruction with its operands decoded.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    Move { value: u8, target: RegisterName },
    MoveC { target: RegisterName },
    Add { source: RegisterName },
    Subtract { source: RegisterName },
    Copy { source: RegisterName },
    Jump { target: String },
    JumpIf { condition: JumpCondition, value: u8, target: String },
    Halt,
}

/// An instruction as stored in program memory: an opcode and its raw operand string.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub operands: String,
}

fn hex_u8(input: &str) -> IResult<&str, u8> {
    all_consuming(preceded(
        opt(alt((tag("0x"), tag("0X")))),
        map_res(hex_digit1, |digits| u8::from_str_radix(digits, 16)),
    ))(input)
}

impl Instruction {
    pub fn new<S: Into<String>>(opcode: OpCode, operands: S) -> Instruction {
        Instruction {
            opcode,
            operands: operands.into(),
        }
    }

    fn error(&self, kind: FormatErrorKind) -> FormatError {
        FormatError {
            opcode: self.opcode,
            operands: self.operands.clone(),
            kind,
        }
    }

    /// Splits the operand string into exactly `expected` comma separated fields.
    fn fields(&self, expected: usize) -> Result<Vec<&str>, FormatError> {
        let fields: Vec<&str> = match self.operands.trim() {
            "" => Vec::new(),
            operands => operands.split(',').map(str::trim).collect(),
        };

        if fields.len() != expected {
            return Err(self.error(FormatErrorKind::FieldCount {
                expected,
                found: fields.len(),
            }));
        }

        Ok(fields)
    }

    fn hex(&self, field: &str) -> Result<u8, FormatError> {
        hex_u8(field)
            .map(|(_, value)| value)
            .map_err(|_| self.error(FormatErrorKind::InvalidHex(field.to_string())))
    }

    fn register(&self, field: &str) -> Result<RegisterName, FormatError> {
        field.parse()
            .map_err(|_| self.error(FormatErrorKind::UnknownRegister(field.to_string())))
    }

    fn label(&self, field: &str) -> Result<String, FormatError> {
        if field.is_empty() {
            return Err(self.error(FormatErrorKind::EmptyLabel));
        }

        Ok(field.to_string())
    }

    /// Parses the operand string according to the opcode.
    pub fn decode(&self) -> Result<Operation, FormatError> {
        let operation = match self.opcode {
            OpCode::Move => {
                let fields = self.fields(2)?;
                Operation::Move {
                    value: self.hex(fields[0])?,
                    target: self.register(fields[1])?,
                }
            },
            OpCode::MoveC => Operation::MoveC { target: self.register(self.fields(1)?[0])? },
            OpCode::Add => Operation::Add { source: self.register(self.fields(1)?[0])? },
            OpCode::Subtract => Operation::Subtract { source: self.register(self.fields(1)?[0])? },
            OpCode::Copy => Operation::Copy { source: self.register(self.fields(1)?[0])? },
            OpCode::Jump => Operation::Jump { target: self.label(self.fields(1)?[0])? },
            OpCode::JumpLess | OpCode::JumpGreater | OpCode::JumpEqual => {
                let condition = match self.opcode {
                    OpCode::JumpLess => JumpCondition::Less,
                    OpCode::JumpGreater => JumpCondition::Greater,
                    _ => JumpCondition::Equal,
                };

                let fields = self.fields(2)?;

                Operation::JumpIf {
                    condition,
                    value: self.hex(fields[0])?,
                    target: self.label(fields[1])?,
                }
            },
            OpCode::Halt => {
                self.fields(0)?;
                Operation::Halt
            },
        };

        Ok(operation)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.operands.is_empty() {
            write!(f, "{}", self.opcode)
        } else {
            write!(f, "{} {}", self.opcode, self.operands)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_move() {
        let ins = Instruction::new(OpCode::Move, "0x05,A");
        assert_eq!(ins.decode(), Ok(Operation::Move { value: 0x05, target: RegisterName::A }));

        let ins = Instruction::new(OpCode::Move, "ff,c");
        assert_eq!(ins.decode(), Ok(Operation::Move { value: 0xFF, target: RegisterName::C }));
    }

    #[test]
    fn test_decode_conditional_jump() {
        let ins = Instruction::new(OpCode::JumpGreater, "0x0B,L1");
        assert_eq!(ins.decode(), Ok(Operation::JumpIf {
            condition: JumpCondition::Greater,
            value: 0x0B,
            target: "L1".to_string(),
        }));
    }

    #[test]
    fn test_decode_rejects_bad_hex() {
        let err = Instruction::new(OpCode::Move, "0xZZ,A").decode().unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::InvalidHex("0xZZ".to_string()));

        let err = Instruction::new(OpCode::JumpEqual, "100,L1").decode().unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::InvalidHex("100".to_string()));
    }

    #[test]
    fn test_decode_rejects_field_count() {
        let err = Instruction::new(OpCode::Move, "0x05").decode().unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::FieldCount { expected: 2, found: 1 });

        let err = Instruction::new(OpCode::Halt, "A").decode().unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::FieldCount { expected: 0, found: 1 });
    }

    #[test]
    fn test_decode_rejects_unknown_register() {
        let err = Instruction::new(OpCode::Add, "D").decode().unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::UnknownRegister("D".to_string()));
    }

    #[test]
    fn test_opcode_suggestion() {
        assert_eq!("JMP".parse::<OpCode>(), Ok(OpCode::Jump));
        assert_eq!(OpCode::suggest("hlat"), Some(OpCode::Halt));
        assert_eq!(OpCode::suggest("zzzz"), None);
    }
}
