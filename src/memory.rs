//! Read-only program memory and the loader for program source text.
//!
//! A program is a list of lines of the form `ADDRESS OPCODE OPERANDS`:
//!
//! ```text
//! REM count down from three
//! 00 mov 0x03,C
//! 01 mov 0x01,B
//! 02 sub B
//! 03 jmg 0x00,02
//! 04 hlt
//! ```
//!
//! Blank lines and lines starting with `REM` are ignored. The addresses are plain labels: the
//! order of the lines, not the value of the labels, decides which instruction comes next.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::path::Path;

use logos::Logos;
use slog::{o, trace, Discard, Logger};

use crate::error::{AddressError, FormatError, LoadError, ParseError, ParseErrorKind};
use crate::instruction::{Instruction, OpCode};

/// First field of a comment line.
const COMMENT_MARKER: &str = "REM";

/// Fields are separated by any Unicode whitespace. Other control characters are rejected.
#[derive(Logos, Debug, Clone, PartialEq)]
enum Token<'t> {
    #[error]
    #[regex(r"\s+", logos::skip)]
    Error,

    #[regex(r"[^\s\p{Cc}]+")]
    Field(&'t str),
}

/// Splits a line into its whitespace separated fields and their spans.
fn split_fields(line: &str, line_number: usize) -> Result<Vec<(&str, Range<usize>)>, ParseError> {
    let mut lex = Token::lexer(line);
    let mut fields = Vec::new();

    while let Some(token) = lex.next() {
        match token {
            Token::Field(field) => fields.push((field, lex.span())),
            Token::Error => return Err(ParseError::new(
                line_number,
                lex.span().start + 1,
                ParseErrorKind::UnexpectedCharacter,
            )),
        }
    }

    Ok(fields)
}

/// Ordered mapping from address labels to instructions.
#[derive(Debug, Clone, Default)]
pub struct ProgramMemory {
    entries: Vec<(String, Instruction)>,
    index: HashMap<String, usize>,
}

impl ProgramMemory {
    pub fn new() -> ProgramMemory {
        ProgramMemory::default()
    }

    /// Parses program source text.
    pub fn parse(source: &str) -> Result<ProgramMemory, ParseError> {
        ProgramMemory::parse_with_logger(source, None)
    }

    pub fn parse_with_logger<L>(source: &str, logger: L) -> Result<ProgramMemory, ParseError>
    where
        L: Into<Option<Logger>>,
    {
        let logger = logger
            .into()
            .unwrap_or(Logger::root(Discard, o!()))
            .new(o!("stage" => "loading"));

        let mut memory = ProgramMemory::new();

        for (line_index, line) in source.lines().enumerate() {
            let line_number = line_index + 1;
            let fields = split_fields(line, line_number)?;

            let (address, address_span) = match fields.first() {
                None => continue,
                Some((field, _)) if *field == COMMENT_MARKER => {
                    trace!(logger, "skip comment"; "line" => line_number);
                    continue;
                },
                Some((field, span)) => (*field, span.clone()),
            };

            if fields.len() < 2 || fields.len() > 3 {
                let column = match fields.get(3) {
                    Some((_, span)) => span.start + 1,
                    None => address_span.start + 1,
                };

                return Err(ParseError::new(
                    line_number,
                    column,
                    ParseErrorKind::FieldCount { found: fields.len() },
                ));
            }

            let (mnemonic, opcode_span) = fields[1].clone();
            let opcode: OpCode = mnemonic.parse().map_err(|_| ParseError::new(
                line_number,
                opcode_span.start + 1,
                ParseErrorKind::UnknownOpcode {
                    mnemonic: mnemonic.to_string(),
                    suggestion: OpCode::suggest(mnemonic),
                },
            ))?;

            let operands = match fields.get(2) {
                Some((operands, _)) => *operands,
                None if opcode.takes_operands() => return Err(ParseError::new(
                    line_number,
                    opcode_span.end + 1,
                    ParseErrorKind::FieldCount { found: fields.len() },
                )),
                None => "",
            };

            if memory.index.contains_key(address) {
                return Err(ParseError::new(
                    line_number,
                    address_span.start + 1,
                    ParseErrorKind::DuplicateAddress { address: address.to_string() },
                ));
            }

            trace!(logger, "load instruction";
                "line" => line_number, "address" => address, "opcode" => %opcode, "operands" => operands);

            memory.index.insert(address.to_string(), memory.entries.len());
            memory.entries.push((address.to_string(), Instruction::new(opcode, operands)));
        }

        Ok(memory)
    }

    /// Reads and parses the program stored in the file at `path`.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<ProgramMemory, LoadError> {
        let source = std::fs::read_to_string(path)?;
        Ok(ProgramMemory::parse(&source)?)
    }

    /// Fetches the instruction stored at `address`.
    pub fn get(&self, address: &str) -> Result<&Instruction, AddressError> {
        self.index.get(address)
            .map(|&i| &self.entries[i].1)
            .ok_or_else(|| AddressError { address: address.to_string() })
    }

    /// Returns the address that follows `address` in program order, or `None` if `address` is
    /// the last one (or is not in the program at all).
    pub fn next_address(&self, address: &str) -> Option<&str> {
        let i = *self.index.get(address)?;

        self.entries.get(i + 1)
            .map(|(next, _)| next.as_str())
    }

    pub fn first_address(&self) -> Option<&str> {
        self.entries.first()
            .map(|(address, _)| address.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the addresses and instructions in program order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Instruction)> {
        self.entries.iter()
            .map(|(address, ins)| (address.as_str(), ins))
    }

    /// Decodes the operands of every instruction and returns the first malformed one.
    pub fn check(&self) -> Result<(), (String, FormatError)> {
        for (address, ins) in self.iter() {
            ins.decode()
                .map_err(|err| (address.to_string(), err))?;
        }

        Ok(())
    }
}

/// Renders the program as an `ADDR INST OPS` listing.
impl fmt::Display for ProgramMemory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "ADDR\tINST\tOPS")?;
        write!(f, "{}", "-".repeat(60))?;

        for (address, ins) in self.iter() {
            write!(f, "\n{}\t{}\t{}", address, ins.opcode, ins.operands)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatErrorKind;

    const COUNTDOWN: &str = r#"
REM count down from three
00 mov 0x03,C
01 mov 0x01,B

02 sub B
03 jmg 0x00,02
04 hlt
"#;

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let memory = ProgramMemory::parse(COUNTDOWN).unwrap();

        assert_eq!(memory.len(), 5);
        assert_eq!(memory.first_address(), Some("00"));
        assert_eq!(memory.get("02"), Ok(&Instruction::new(OpCode::Subtract, "B")));
        assert_eq!(memory.get("04"), Ok(&Instruction::new(OpCode::Halt, "")));
    }

    #[test]
    fn test_next_address_follows_insertion_order() {
        let memory = ProgramMemory::parse("b hlt\na hlt\nc hlt\n").unwrap();

        assert_eq!(memory.first_address(), Some("b"));
        assert_eq!(memory.next_address("b"), Some("a"));
        assert_eq!(memory.next_address("a"), Some("c"));
        assert_eq!(memory.next_address("c"), None);
        assert_eq!(memory.next_address("nope"), None);
    }

    #[test]
    fn test_get_missing_address() {
        let memory = ProgramMemory::parse(COUNTDOWN).unwrap();

        assert_eq!(memory.get("05"), Err(AddressError { address: "05".to_string() }));
    }

    #[test]
    fn test_parse_rejects_field_count() {
        let err = ProgramMemory::parse("00 mov 0x01,A extra\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 15);
        assert_eq!(err.kind, ParseErrorKind::FieldCount { found: 4 });

        let err = ProgramMemory::parse("REM ok\n00\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, ParseErrorKind::FieldCount { found: 1 });

        let err = ProgramMemory::parse("00 mov\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::FieldCount { found: 2 });
    }

    #[test]
    fn test_parse_rejects_unknown_opcode() {
        let err = ProgramMemory::parse("00 mob 0x01,A\n").unwrap_err();

        assert_eq!(err.column, 4);
        assert_eq!(err.kind, ParseErrorKind::UnknownOpcode {
            mnemonic: "mob".to_string(),
            suggestion: Some(OpCode::Move),
        });
    }

    #[test]
    fn test_parse_rejects_duplicate_address() {
        let err = ProgramMemory::parse("00 hlt\n00 hlt\n").unwrap_err();

        assert_eq!(err.line, 2);
        assert_eq!(err.kind, ParseErrorKind::DuplicateAddress { address: "00".to_string() });
    }

    #[test]
    fn test_parse_splits_on_any_whitespace() {
        let memory = ProgramMemory::parse("00 mov\u{b}0x01,A\n01\u{a0}hlt\n").unwrap();

        assert_eq!(memory.get("00"), Ok(&Instruction::new(OpCode::Move, "0x01,A")));
        assert_eq!(memory.get("01"), Ok(&Instruction::new(OpCode::Halt, "")));
    }

    #[test]
    fn test_parse_rejects_control_characters() {
        let err = ProgramMemory::parse("00 hlt\n01 \0 hlt\n").unwrap_err();

        assert_eq!(err.line, 2);
        assert_eq!(err.column, 4);
        assert_eq!(err.kind, ParseErrorKind::UnexpectedCharacter);
    }

    #[test]
    fn test_listing() {
        let memory = ProgramMemory::parse("00 mov 0x03,C\nend hlt\n").unwrap();

        assert_eq!(memory.to_string(), format!(
            "ADDR\tINST\tOPS\n{}\n00\tmov\t0x03,C\nend\thlt\t",
            "-".repeat(60),
        ));
    }

    #[test]
    fn test_check_reports_malformed_operands() {
        let memory = ProgramMemory::parse("00 mov 0x01,A\n01 add Q\n").unwrap();
        let (address, err) = memory.check().unwrap_err();

        assert_eq!(address, "01");
        assert_eq!(err.kind, FormatErrorKind::UnknownRegister("Q".to_string()));
        assert!(ProgramMemory::parse(COUNTDOWN).unwrap().check().is_ok());
    }
}
