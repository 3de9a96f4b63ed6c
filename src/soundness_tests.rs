use crate::bfir::Instruction::*;
use crate::bfir::{decompile, parse, Instruction};
use crate::execution::{execute, Runtime};
use quickcheck::{quickcheck, TestResult};
use std::io;

const OPERATORS: &[u8] = b"+-<>.,[] ";

/// Turn arbitrary bytes into BF source, dropping any `]` that would be
/// unmatched and closing any loops left open, so it always parses.
fn balanced_source(bytes: &[u8]) -> Vec<u8> {
    let mut source = vec![];
    let mut depth = 0;
    for byte in bytes {
        let op = OPERATORS[usize::from(*byte) % OPERATORS.len()];
        match op {
            b'[' => depth += 1,
            b']' if depth == 0 => continue,
            b']' => depth -= 1,
            _ => {}
        }
        source.push(op);
    }
    source.extend(std::iter::repeat(b']').take(depth));
    source
}

/// Remove I/O so a program can run without any input.
fn without_io(source: Vec<u8>) -> Vec<u8> {
    source
        .into_iter()
        .filter(|b| *b != b',' && *b != b'.')
        .collect()
}

fn run_to_tape(instrs: &[Instruction]) -> (Vec<u8>, usize) {
    let mut runtime = Runtime::new(instrs, io::empty(), io::sink());
    execute(&mut runtime).unwrap();
    (runtime.tape().to_vec(), runtime.pointer())
}

fn loop_pairs_are_bijective(instrs: &[Instruction]) -> bool {
    instrs.iter().enumerate().all(|(index, instr)| match *instr {
        LoopStart { end } => instrs.get(end) == Some(&LoopEnd { start: index }),
        LoopEnd { start } => instrs.get(start) == Some(&LoopStart { end: index }),
        _ => true,
    })
}

quickcheck! {
    fn parse_balanced_never_fails(bytes: Vec<u8>) -> bool {
        parse(&balanced_source(&bytes)).is_ok()
    }

    fn loop_pairing_is_bijection(bytes: Vec<u8>) -> bool {
        let instrs = parse(&balanced_source(&bytes)).unwrap();
        loop_pairs_are_bijective(&instrs)
    }

    fn reparse_decompiled_is_identity(bytes: Vec<u8>) -> bool {
        let instrs = parse(&balanced_source(&bytes)).unwrap();
        parse(decompile(&instrs).as_bytes()).unwrap() == instrs
    }

    fn no_adjacent_foldable_instructions(bytes: Vec<u8>) -> bool {
        let instrs = parse(&balanced_source(&bytes)).unwrap();
        instrs.windows(2).all(|pair| match pair {
            [AddValue(_), AddValue(_)] => false,
            [MovePointer(_), MovePointer(_)] => false,
            _ => true,
        })
    }

    fn unbalanced_close_is_rejected(bytes: Vec<u8>) -> bool {
        let mut source = balanced_source(&bytes);
        source.push(b']');
        parse(&source).is_err()
    }

    fn unbalanced_open_is_rejected(bytes: Vec<u8>) -> bool {
        let mut source = vec![b'['];
        source.extend(balanced_source(&bytes));
        parse(&source).is_err()
    }

    fn folded_add_matches_wrapped_count(increments: u16, decrements: u16) -> bool {
        let mut source = "+".repeat(usize::from(increments));
        source.push_str(&"-".repeat(usize::from(decrements)));

        let expected = (i64::from(increments) - i64::from(decrements)).rem_euclid(256) as u8;
        let instrs = parse(source.as_bytes()).unwrap();
        let (tape, _) = run_to_tape(&instrs);
        tape[0] == expected
    }

    fn folding_preserves_behaviour(bytes: Vec<u8>) -> TestResult {
        // Loops may not terminate, so only straight-line code.
        let source: Vec<u8> = without_io(balanced_source(&bytes))
            .into_iter()
            .filter(|b| *b != b'[' && *b != b']')
            .collect();
        let folded = parse(&source).unwrap();

        // One instruction per operator, as if nothing were folded.
        let unfolded: Vec<Instruction> = source
            .iter()
            .filter_map(|b| match b {
                b'+' => Some(AddValue(1)),
                b'-' => Some(AddValue(255)),
                b'>' => Some(MovePointer(1)),
                b'<' => Some(MovePointer(usize::MAX)),
                _ => None,
            })
            .collect();

        TestResult::from_bool(run_to_tape(&folded) == run_to_tape(&unfolded))
    }
}
