//! Monkey interpreter command-line.
//!
//! When called without arguments it drops into an interactive
//! read-evaluate-print loop.
//!
//! When called with arguments, it interprets the corresponding files in a
//! single interpreter session (so code and data sharing is possible).

use std::fs;
use std::path::PathBuf;

use anyhow::{self, Context};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use rmonkey::interpreter::Interpreter;

/// Tree-walking interpreter for the Monkey programming language.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Script files to run in one session; omit to open a REPL.
    files: Vec<PathBuf>,
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    if args.files.is_empty() {
        run_prompt()
    } else {
        run_files(&args.files)
    }
}

fn run_files(paths: &[PathBuf]) -> Result<(), anyhow::Error> {
    let mut interp = Interpreter::new();
    for path in paths {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        evaluate_and_print(&mut interp, &source);
    }
    Ok(())
}

fn run_prompt() -> Result<(), anyhow::Error> {
    println!("This is the Monkey programming language.");

    let mut editor = DefaultEditor::new()?;
    let mut interp = Interpreter::new();
    loop {
        match editor.readline(">> ") {
            Ok(line) => {
                editor.add_history_entry(&line)?;
                evaluate_and_print(&mut interp, &line);
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(error) => return Err(error.into()),
        }
    }
    Ok(())
}

fn evaluate_and_print(interp: &mut Interpreter, source: &str) {
    match interp.run(source) {
        Ok(Some(value)) => println!("{}", value),
        Ok(None) => {}
        Err(errors) => {
            for message in errors.messages() {
                println!("\t{}", message);
            }
        }
    }
}
