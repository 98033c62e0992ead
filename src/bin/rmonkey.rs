//! Monkey interpreter command-line.
//!
//! When called without argument it drops into an interactive read-evaluate-print loop.
//!
//! When called with arguments, it interprets the corresponding files in a single interpreter
//! session (so code and data sharing is possible).

use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use rmonkey::interpreter::Interpreter;
use rmonkey::value::Value;

#[derive(Debug, Parser)]
#[command(name = "rmonkey", version, about = "Tree-walking interpreter for the Monkey language")]
struct Args {
    /// Script files, run in order in one session.
    files: Vec<PathBuf>,

    /// Evaluate SOURCE after the files and print its value.
    #[arg(short, long, value_name = "SOURCE")]
    eval: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if args.files.is_empty() && args.eval.is_none() {
        run_prompt()
    } else {
        run_all(&args)
    }
}

fn run_all(args: &Args) -> Result<()> {
    let mut interp_stdout = io::stdout();
    let mut interp = Interpreter::new(&mut interp_stdout);

    for p in &args.files {
        debug!(path = %p.display(), "running script");
        let source =
            fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))?;
        interp
            .eval(&source)
            .with_context(|| format!("failed to run {}", p.display()))?;
    }

    if let Some(source) = &args.eval {
        let value = interp.eval(source)?;
        print_value(&value);
    }

    Ok(())
}

fn print_value(value: &Value) {
    if *value != Value::Null {
        println!("{}", value);
    }
}

fn run_prompt() -> Result<()> {
    let mut interp_stdout = io::stdout();
    let mut interp = Interpreter::new(&mut interp_stdout);
    let mut rl = DefaultEditor::new().context("could not initialize line editor")?;

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line == ":env" {
                    println!("{}", interp.env().names().join(" "));
                    continue;
                }

                match interp.eval(line) {
                    Ok(value) => print_value(&value),
                    Err(e) => eprintln!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        }
    }

    Ok(())
}
