//! Executes a compiled instruction sequence on a fixed-size byte tape.
//!
//! The tape is cyclic: moving left of cell 0 lands on the last cell and
//! moving right of the last cell lands on cell 0. Cells wrap at 256.

use crate::bfir::Instruction;
use std::io;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// The number of cells on the tape.
pub const TAPE_SIZE: usize = 30_000;

/// Something the program can read bytes from. End of input is an error.
pub trait ByteSource {
    fn read_byte(&mut self) -> io::Result<u8>;
}

/// Something the program can write bytes to.
pub trait ByteSink {
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;
}

impl<R: io::Read> ByteSource for R {
    fn read_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }
}

impl<W: io::Write> ByteSink for W {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.write_all(&[byte])
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("I/O failure while running program: {0}")]
    Io(#[from] io::Error),
}

/// The state of a single run of a program.
pub struct Runtime<'a, R, W> {
    instructions: &'a [Instruction],
    index: usize,
    tape: Box<[u8]>,
    pointer: usize,
    steps: u64,
    input: R,
    output: W,
}

impl<'a, R: ByteSource, W: ByteSink> Runtime<'a, R, W> {
    pub fn new(instructions: &'a [Instruction], input: R, output: W) -> Self {
        Runtime {
            instructions,
            index: 0,
            tape: vec![0; TAPE_SIZE].into_boxed_slice(),
            pointer: 0,
            steps: 0,
            input,
            output,
        }
    }

    pub fn tape(&self) -> &[u8] {
        &self.tape
    }

    pub fn tape_mut(&mut self) -> &mut [u8] {
        &mut self.tape
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// The index of the next instruction to execute.
    pub fn index(&self) -> usize {
        self.index
    }

    /// How many instructions have been dispatched so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_done(&self) -> bool {
        self.index >= self.instructions.len()
    }

    /// Execute the instruction at `index`. Returns `false` if the
    /// program had already finished.
    pub fn step(&mut self) -> Result<bool, RuntimeError> {
        let instr = match self.instructions.get(self.index) {
            Some(instr) => *instr,
            None => return Ok(false),
        };
        trace!(index = self.index, pointer = self.pointer, %instr);

        let cell = &mut self.tape[self.pointer];
        match instr {
            Instruction::AddValue(amount) => {
                *cell = cell.wrapping_add(amount);
            }
            Instruction::MovePointer(amount) => {
                self.pointer = move_cyclic(self.pointer, amount);
            }
            Instruction::Write => {
                self.output.write_byte(*cell)?;
            }
            Instruction::Read => {
                *cell = self.input.read_byte()?;
            }
            Instruction::LoopStart { end } => {
                if *cell == 0 {
                    self.index = end;
                }
            }
            Instruction::LoopEnd { start } => {
                if *cell != 0 {
                    self.index = start;
                }
            }
        }

        // After a jump this lands on the instruction following the
        // matching bracket.
        self.index += 1;
        self.steps += 1;
        Ok(true)
    }
}

/// Move `pointer` by the two's complement displacement `amount`, wrapping
/// around the tape.
fn move_cyclic(pointer: usize, amount: usize) -> usize {
    let offset = (amount as isize).rem_euclid(TAPE_SIZE as isize) as usize;
    (pointer + offset) % TAPE_SIZE
}

/// Run the program to completion, or until reading or writing fails.
pub fn execute<R: ByteSource, W: ByteSink>(
    runtime: &mut Runtime<'_, R, W>,
) -> Result<(), RuntimeError> {
    debug!(
        instructions = runtime.instructions.len(),
        "starting execution"
    );

    loop {
        match runtime.step() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                warn!(index = runtime.index, steps = runtime.steps, error = %e, "execution aborted");
                return Err(e);
            }
        }
    }

    debug!(
        steps = runtime.steps,
        pointer = runtime.pointer,
        "execution finished"
    );
    Ok(())
}
