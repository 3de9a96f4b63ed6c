//! Human-readable warnings and errors for the CLI.

use crate::bfir::ParseError;
use colored::Colorize;
use std::fmt;

/// An inclusive range used for tracking positions in source code.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// An error tied to a location in a source file, rendered with the
/// offending line and a caret underneath.
#[derive(Debug)]
pub struct Diagnostic<'a> {
    pub message: String,
    pub position: Position,
    pub filename: &'a str,
    pub source: &'a [u8],
}

impl<'a> Diagnostic<'a> {
    pub fn from_parse_error(error: &ParseError, filename: &'a str, source: &'a [u8]) -> Self {
        Diagnostic {
            message: error.to_string(),
            position: error.position(),
            filename,
            source,
        }
    }

    /// 1-indexed line and column of the start of `position`. Columns
    /// count bytes.
    fn line_and_column(&self) -> (usize, usize) {
        let start = self.position.start.min(self.source.len());
        let before = &self.source[..start];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let column = start - line_start(before) + 1;
        (line, column)
    }

    fn source_line(&self) -> String {
        let start = self.position.start.min(self.source.len());
        let line_begin = line_start(&self.source[..start]);
        let line_end = self.source[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.source.len(), |offset| start + offset);
        String::from_utf8_lossy(&self.source[line_begin..line_end]).into_owned()
    }
}

fn line_start(before: &[u8]) -> usize {
    before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |newline| newline + 1)
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (line, column) = self.line_and_column();
        let gutter = " ".repeat(line.to_string().len());
        let width = self.position.end.saturating_sub(self.position.start) + 1;

        writeln!(f, "{} {}", "error:".red().bold(), self.message.bold())?;
        writeln!(
            f,
            "{}{} {}:{}:{}",
            gutter,
            "-->".blue().bold(),
            self.filename,
            line,
            column
        )?;
        writeln!(f, "{} {}", gutter, "|".blue().bold())?;
        writeln!(
            f,
            "{} {} {}",
            line.to_string().blue().bold(),
            "|".blue().bold(),
            self.source_line()
        )?;
        write!(
            f,
            "{} {} {}{}",
            gutter,
            "|".blue().bold(),
            " ".repeat(column - 1),
            "^".repeat(width).red().bold()
        )
    }
}
