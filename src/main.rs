//! Command line entry point: compile a BF file and run it against
//! stdin and stdout.

use anyhow::Context;
use bfrun::{execute, parse, Diagnostic, Runtime};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the BF source file.
    path: PathBuf,
}

/// Logs go to stderr so they never mix with program output. Use
/// `RUST_LOG` to override the default filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    let source = std::fs::read(&cli.path)
        .with_context(|| format!("could not read {}", cli.path.display()))?;

    let instructions = match parse(&source) {
        Ok(instructions) => instructions,
        Err(e) => {
            let filename = cli.path.to_string_lossy();
            eprintln!("{}", Diagnostic::from_parse_error(&e, &filename, &source));
            return Ok(ExitCode::FAILURE);
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    let mut runtime = Runtime::new(&instructions, stdin.lock(), &mut stdout);
    let result = execute(&mut runtime);
    drop(runtime);

    stdout.flush().context("could not flush stdout")?;
    result.context("execution failed")?;
    Ok(ExitCode::SUCCESS)
}
