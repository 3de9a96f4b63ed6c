//! bfir defines the flat instruction sequence that BF source compiles
//! to. Loops are a pair of jump instructions holding each other's index,
//! so the whole program runs off a single program counter.
//!
//! It also provides functions for generating instruction sequences from
//! source code, producing good error messages on malformed inputs, and
//! for turning a sequence back into source.

use self::Instruction::*;
use crate::diagnostics::Position;
use itertools::Itertools;
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
use pretty_assertions::assert_eq;

/// `Instruction` is a single step of a compiled BF program.
///
/// Consecutive `+`/`-` and `>`/`<` in the source are folded into one
/// `AddValue` or `MovePointer`. Nothing else is optimised.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Instruction {
    /// Add to the current cell, wrapping at 256.
    AddValue(u8),
    /// Move the pointer. The amount is a two's complement displacement,
    /// so a single `<` is `usize::MAX`.
    MovePointer(usize),
    Write,
    Read,
    /// `end` is the index of the matching `LoopEnd`.
    LoopStart { end: usize },
    /// `start` is the index of the matching `LoopStart`.
    LoopEnd { start: usize },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AddValue(amount) => write!(f, "AddValue({})", amount),
            MovePointer(amount) => write!(f, "MovePointer({})", amount as isize),
            Write => write!(f, "Write"),
            Read => write!(f, "Read"),
            LoopStart { end } => write!(f, "LoopStart -> {}", end),
            LoopEnd { start } => write!(f, "LoopEnd -> {}", start),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ParseError {
    #[error("This ] has no matching [")]
    UnmatchedCloseBracket { position: Position },
    #[error("This [ has no matching ]")]
    UnmatchedOpenBracket { position: Position },
}

impl ParseError {
    /// The offending bracket in the source.
    pub fn position(&self) -> Position {
        match *self {
            ParseError::UnmatchedCloseBracket { position } => position,
            ParseError::UnmatchedOpenBracket { position } => position,
        }
    }
}

/// Given BF source code, parse and return the compiled instruction
/// sequence. Any byte that isn't a BF operator is a comment. If parsing
/// fails, return a `ParseError` pointing at the unbalanced bracket.
pub fn parse(source: &[u8]) -> Result<Vec<Instruction>, ParseError> {
    let mut instructions = vec![];
    // Indices of currently open `LoopStart`s, with the source offset of
    // their `[` for error reporting.
    let mut loop_start_stack: Vec<(usize, usize)> = vec![];

    for (index, byte) in source.iter().enumerate() {
        match *byte {
            b'+' => add_value(&mut instructions, 1),
            b'-' => add_value(&mut instructions, u8::MAX),
            b'>' => move_pointer(&mut instructions, 1),
            b'<' => move_pointer(&mut instructions, usize::MAX),
            b'.' => instructions.push(Write),
            b',' => instructions.push(Read),
            b'[' => {
                loop_start_stack.push((instructions.len(), index));
                instructions.push(LoopStart { end: 0 });
            }
            b']' => {
                let (start, _) =
                    loop_start_stack
                        .pop()
                        .ok_or(ParseError::UnmatchedCloseBracket {
                            position: Position {
                                start: index,
                                end: index,
                            },
                        })?;
                let end = instructions.len();
                instructions[start] = LoopStart { end };
                instructions.push(LoopEnd { start });
            }
            _ => (),
        }
    }

    if let Some(&(_, open_index)) = loop_start_stack.last() {
        return Err(ParseError::UnmatchedOpenBracket {
            position: Position {
                start: open_index,
                end: open_index,
            },
        });
    }

    debug!(
        source_len = source.len(),
        instructions = instructions.len(),
        "parsed program"
    );
    Ok(instructions)
}

fn add_value(instructions: &mut Vec<Instruction>, amount: u8) {
    match instructions.last_mut() {
        Some(AddValue(value)) => *value = value.wrapping_add(amount),
        _ => instructions.push(AddValue(amount)),
    }
}

fn move_pointer(instructions: &mut Vec<Instruction>, amount: usize) {
    match instructions.last_mut() {
        Some(MovePointer(value)) => *value = value.wrapping_add(amount),
        _ => instructions.push(MovePointer(amount)),
    }
}

/// Given an instruction sequence, decompile it back into BF source
/// code. Parsing the result gives back the same sequence.
pub fn decompile(instrs: &[Instruction]) -> String {
    instrs.iter().map(decompile_instruction).join("")
}

fn decompile_instruction(instr: &Instruction) -> String {
    match *instr {
        // An empty string would let the neighbours fold together.
        AddValue(0) => "+-".to_owned(),
        AddValue(amount) if amount <= 128 => "+".repeat(usize::from(amount)),
        AddValue(amount) => "-".repeat(256 - usize::from(amount)),
        MovePointer(0) => "><".to_owned(),
        MovePointer(amount) => {
            let displacement = amount as isize;
            if displacement > 0 {
                ">".repeat(amount)
            } else {
                "<".repeat(displacement.unsigned_abs())
            }
        }
        Write => ".".to_owned(),
        Read => ",".to_owned(),
        LoopStart { .. } => "[".to_owned(),
        LoopEnd { .. } => "]".to_owned(),
    }
}

#[test]
fn parse_increment() {
    assert_eq!(parse(b"+").unwrap(), [AddValue(1)]);
    assert_eq!(parse(b"+++").unwrap(), [AddValue(3)]);
}

#[test]
fn parse_decrement() {
    assert_eq!(parse(b"-").unwrap(), [AddValue(255)]);
    assert_eq!(parse(b"--").unwrap(), [AddValue(254)]);
}

#[test]
fn parse_increment_wraps() {
    let source = "+".repeat(257);
    assert_eq!(parse(source.as_bytes()).unwrap(), [AddValue(1)]);
    assert_eq!(parse(b"+-").unwrap(), [AddValue(0)]);
}

#[test]
fn parse_pointer_increment() {
    assert_eq!(parse(b">").unwrap(), [MovePointer(1)]);
    assert_eq!(parse(b">>>").unwrap(), [MovePointer(3)]);
}

#[test]
fn parse_pointer_decrement() {
    assert_eq!(parse(b"<").unwrap(), [MovePointer(usize::MAX)]);
    assert_eq!(parse(b"<<").unwrap(), [MovePointer(usize::MAX - 1)]);
    assert_eq!(parse(b"<>").unwrap(), [MovePointer(0)]);
}

#[test]
fn parse_read() {
    assert_eq!(parse(b",").unwrap(), [Read]);
    assert_eq!(parse(b",,").unwrap(), [Read, Read]);
}

#[test]
fn parse_write() {
    assert_eq!(parse(b"..").unwrap(), [Write, Write]);
}

#[test]
fn parse_folds_only_adjacent() {
    assert_eq!(
        parse(b"+>+").unwrap(),
        [AddValue(1), MovePointer(1), AddValue(1)]
    );
    assert_eq!(
        parse(b"+[]+").unwrap(),
        [AddValue(1), LoopStart { end: 2 }, LoopEnd { start: 1 }, AddValue(1)]
    );
}

#[test]
fn parse_empty_loop() {
    assert_eq!(
        parse(b"[]").unwrap(),
        [LoopStart { end: 1 }, LoopEnd { start: 0 }]
    );
}

#[test]
fn parse_complex_loop() {
    assert_eq!(
        parse(b"++><<>>>[.,]++---").unwrap(),
        [
            AddValue(2),
            MovePointer(2),
            LoopStart { end: 5 },
            Write,
            Read,
            LoopEnd { start: 2 },
            AddValue(255),
        ]
    );
}

#[test]
fn parse_nested_and_sequential_loops() {
    assert_eq!(
        parse(b"[[-]][.]").unwrap(),
        [
            LoopStart { end: 4 },
            LoopStart { end: 3 },
            AddValue(255),
            LoopEnd { start: 1 },
            LoopEnd { start: 0 },
            LoopStart { end: 7 },
            Write,
            LoopEnd { start: 5 },
        ]
    );
}

#[test]
fn parse_empty() {
    assert_eq!(parse(b"").unwrap(), Vec::<Instruction>::new());
}

#[test]
fn parse_comment() {
    assert_eq!(parse(b"foo! ").unwrap(), Vec::<Instruction>::new());
    assert_eq!(parse(b"\xc3\xa9+\xff").unwrap(), [AddValue(1)]);
}

#[test]
fn parse_unbalanced_loop() {
    assert!(parse(b"[").is_err());
    assert!(parse(b"]").is_err());
    assert!(parse(b"][").is_err());
    assert!(parse(b"[][").is_err());
}

#[test]
fn parse_unmatched_close_position() {
    assert_eq!(
        parse(b"+]").unwrap_err(),
        ParseError::UnmatchedCloseBracket {
            position: Position { start: 1, end: 1 }
        }
    );
    // Fails at the `]`, before the later `[` is seen.
    assert_eq!(
        parse(b"][").unwrap_err(),
        ParseError::UnmatchedCloseBracket {
            position: Position { start: 0, end: 0 }
        }
    );
}

#[test]
fn parse_unmatched_open_position() {
    let err = parse(b"[ [+]").unwrap_err();
    assert_eq!(
        err,
        ParseError::UnmatchedOpenBracket {
            position: Position { start: 0, end: 0 }
        }
    );
    assert_eq!(err.position(), Position { start: 0, end: 0 });
}

#[test]
fn decompile_simple() {
    assert_eq!(
        decompile(&[AddValue(2), MovePointer(usize::MAX - 2), Write, Read]),
        "++<<<.,"
    );
}

#[test]
fn decompile_wrapped_values() {
    assert_eq!(decompile(&[AddValue(255)]), "-");
    assert_eq!(decompile(&[AddValue(128)]), "+".repeat(128));
    assert_eq!(decompile(&[AddValue(129)]), "-".repeat(127));
}

#[test]
fn decompile_zero_amounts() {
    let instrs = [AddValue(1), MovePointer(0), AddValue(1)];
    assert_eq!(decompile(&instrs), "+><+");
    assert_eq!(parse(decompile(&instrs).as_bytes()).unwrap(), instrs);
}

#[test]
fn decompile_loop() {
    let instrs = parse(b"+[->+<]").unwrap();
    assert_eq!(decompile(&instrs), "+[->+<]");
}

#[test]
fn display_instruction() {
    assert_eq!(format!("{}", AddValue(3)), "AddValue(3)");
    assert_eq!(format!("{}", MovePointer(usize::MAX)), "MovePointer(-1)");
    assert_eq!(format!("{}", LoopStart { end: 5 }), "LoopStart -> 5");
    assert_eq!(format!("{}", LoopEnd { start: 2 }), "LoopEnd -> 2");
}
