//! Error types for loading and executing programs.

use std::fmt::{self, Display};

use itertools::Itertools;

use crate::instruction::OpCode;

/// Reason why a line of program source could not be loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// The line did not have the `ADDRESS OPCODE [OPERANDS]` shape.
    FieldCount {
        /// Number of whitespace separated fields on the line.
        found: usize,
    },

    /// The opcode field is not one of the known mnemonics.
    UnknownOpcode {
        mnemonic: String,
        /// Closest known mnemonic, if any is close enough to be a likely typo.
        suggestion: Option<OpCode>,
    },

    /// The address label was already used by an earlier line.
    DuplicateAddress {
        address: String,
    },

    /// The line contained a character that cannot be part of any field.
    UnexpectedCharacter,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseErrorKind::FieldCount { found } =>
                write!(f, "expected 'ADDRESS OPCODE [OPERANDS]', found {} fields", found),
            ParseErrorKind::UnknownOpcode { mnemonic, suggestion: Some(suggestion) } =>
                write!(f, "unknown opcode '{}', did you mean '{}'?", mnemonic, suggestion),
            ParseErrorKind::UnknownOpcode { mnemonic, suggestion: None } =>
                write!(f, "unknown opcode '{}', expected one of: {}", mnemonic, OpCode::ALL.iter().join(", ")),
            ParseErrorKind::DuplicateAddress { address } =>
                write!(f, "address '{}' is defined more than once", address),
            ParseErrorKind::UnexpectedCharacter =>
                write!(f, "unexpected character"),
        }
    }
}

/// Error produced while parsing program source, with the location of the offending line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// The line number of the error location, starting from 1.
    pub line: usize,
    /// The column number of the error location, starting from 1.
    pub column: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: usize, column: usize, kind: ParseErrorKind) -> ParseError {
        ParseError { line, column, kind }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "at line {} col {}: {}", self.line, self.column, self.kind)
    }
}

impl std::error::Error for ParseError {}

/// Error returned when reading a program from a file.
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Parse(ParseError),
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> LoadError {
        LoadError::Io(e)
    }
}

impl From<ParseError> for LoadError {
    fn from(e: ParseError) -> LoadError {
        LoadError::Parse(e)
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "could not read program: {}", e),
            LoadError::Parse(e) => write!(f, "could not parse program: {}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::Parse(e) => Some(e),
        }
    }
}

/// The program tried to fetch an instruction from an address that does not exist.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressError {
    pub address: String,
}

impl Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "nothing in memory address '{}'", self.address)
    }
}

impl std::error::Error for AddressError {}

/// Reason why an operand string could not be decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatErrorKind {
    /// Wrong number of comma separated operand fields.
    FieldCount {
        expected: usize,
        found: usize,
    },

    /// A numeric operand was not a hexadecimal number that fits in 8 bits.
    InvalidHex(String),

    /// A register operand did not name one of the registers.
    UnknownRegister(String),

    /// A jump target label was empty.
    EmptyLabel,
}

impl fmt::Display for FormatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FormatErrorKind::FieldCount { expected, found } =>
                write!(f, "expected {} operands, found {}", expected, found),
            FormatErrorKind::InvalidHex(value) =>
                write!(f, "'{}' is not an 8-bit hexadecimal value", value),
            FormatErrorKind::UnknownRegister(name) =>
                write!(f, "no such register '{}'", name),
            FormatErrorKind::EmptyLabel =>
                write!(f, "empty jump target"),
        }
    }
}

/// The operand string of an instruction is malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatError {
    pub opcode: OpCode,
    pub operands: String,
    pub kind: FormatErrorKind,
}

impl Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid operands '{}' for {}: {}", self.operands, self.opcode, self.kind)
    }
}

impl std::error::Error for FormatError {}

/// Fatal error raised while executing a program.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionError {
    Address(AddressError),
    Format(FormatError),
}

impl From<AddressError> for ExecutionError {
    fn from(e: AddressError) -> ExecutionError {
        ExecutionError::Address(e)
    }
}

impl From<FormatError> for ExecutionError {
    fn from(e: FormatError) -> ExecutionError {
        ExecutionError::Format(e)
    }
}

impl Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExecutionError::Address(e) => Display::fmt(e, f),
            ExecutionError::Format(e) => Display::fmt(e, f),
        }
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecutionError::Address(e) => Some(e),
            ExecutionError::Format(e) => Some(e),
        }
    }
}
