//! Run a given Logo program, printing its output and its final result to
//! standard output.
//!
//! Example usage:
//!
//!     cargo run -- --src-filepath programs/factorial.logo
//!     cargo run -- --pretty < programs/factorial.logo

use std::process::ExitCode;

use clap::Parser;
use rust_logo_interp::end_to_end::{init_tracing, run_interpreter, InterpreterConfig};

fn main() -> ExitCode {
    let interpreter_config = InterpreterConfig::parse();
    init_tracing(interpreter_config.verbose);

    let interpreter_result = run_interpreter(&interpreter_config);

    match interpreter_result {
        Ok(Some(execution_result)) => {
            println!("{}", execution_result);
            return ExitCode::SUCCESS;
        }

        Ok(None) => {
            return ExitCode::SUCCESS;
        }

        Err(run_error) => {
            eprintln!("{}", run_error);
            return ExitCode::FAILURE;
        }
    }
}
