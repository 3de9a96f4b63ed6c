#![warn(trivial_numeric_casts)]

//! bfrun compiles BF source into a flat instruction sequence, folding runs
//! of repeated operators, and executes it on a fixed, cyclic byte tape.
//! The IR and diagnostics descend from [bfc](https://github.com/Wilfred/bfc).

pub use bfir::{decompile, parse, Instruction, ParseError};
pub use diagnostics::{Diagnostic, Position};
pub use execution::{execute, ByteSink, ByteSource, Runtime, RuntimeError, TAPE_SIZE};

mod bfir;
mod diagnostics;
mod execution;

#[cfg(test)]
mod soundness_tests;
