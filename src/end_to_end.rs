//! Code to configure and run the interpreter on a Logo source file.

use std::cell::RefCell;
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::rc::Rc;

use clap::Parser;

use crate::builtin_procedures::input_output::{InputGenerator, OutputObserver};
use crate::builtin_procedures::load_standard_library;
use crate::environment::{Environment, EvalError, DEFAULT_MAX_CALL_DEPTH};
use crate::program_representation::Node;

/// Config for the interpreter. Instantiate via `InterpreterConfig::parse()`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct InterpreterConfig {
    /// The input filepath to run on. The program is read from standard
    /// input when absent.
    #[arg(short, long)]
    pub src_filepath: Option<String>,

    /// Maximum number of nested procedure calls.
    #[arg(short, long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    pub max_call_depth: usize,

    /// Print the parse tree instead of running the program.
    #[arg(short, long)]
    pub pretty: bool,

    /// Log at debug level regardless of `RUST_LOG`.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Errors that may be thrown when running the interpreter.
#[derive(Debug)]
pub enum RunError {
    InputFileError(std::io::Error),
    EvalError(EvalError),
}

/// Display trait implementation for RunError.
impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputFileError(io_err) => {
                return write!(f, "Input file error: {}", io_err);
            }

            Self::EvalError(eval_err) => {
                return write!(f, "Evaluation error: {}", eval_err);
            }
        }
    }
}

/// Type conversions for errors.
impl From<std::io::Error> for RunError {
    fn from(value: std::io::Error) -> Self {
        return Self::InputFileError(value);
    }
}

impl From<EvalError> for RunError {
    fn from(value: EvalError) -> Self {
        return Self::EvalError(value);
    }
}

/// Writes program output straight to standard output.
pub struct StdoutObserver;

impl OutputObserver for StdoutObserver {
    fn inform(&mut self, output: &str) {
        let mut stdout = io::stdout();
        // `type` output has no newline, so flush explicitly.
        if let Err(io_err) = stdout.write_all(output.as_bytes()).and_then(|_| stdout.flush()) {
            tracing::warn!(error = %io_err, "failed to write to stdout");
        }
    }
}

/// Reads program input from standard input, one line per request.
pub struct StdinInput;

impl InputGenerator for StdinInput {
    fn request(&mut self) -> String {
        let mut line = String::new();
        if let Err(io_err) = io::stdin().lock().read_line(&mut line) {
            tracing::warn!(error = %io_err, "failed to read from stdin");
        }

        return line.trim_end_matches(['\r', '\n']).to_string();
    }

    fn request_line(&mut self) -> String {
        return self.request();
    }
}

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG`, or at debug
/// level when `verbose` is set. Only the binary calls this.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true).with_level(true))
        .with(filter)
        .try_init();
}

fn read_program(config: &InterpreterConfig) -> Result<String, RunError> {
    match &config.src_filepath {
        Some(src_filepath) => return Ok(fs::read_to_string(src_filepath)?),
        None => {
            let mut program_string = String::new();
            io::stdin().read_to_string(&mut program_string)?;
            return Ok(program_string);
        }
    }
}

/// Builds an environment with the standard library wired to the console.
pub fn console_environment(config: &InterpreterConfig) -> Environment {
    let mut env = Environment::new().with_max_call_depth(config.max_call_depth);
    load_standard_library(
        &mut env,
        Rc::new(RefCell::new(StdoutObserver)),
        Rc::new(RefCell::new(StdinInput)),
    );

    return env;
}

/// Run the interpreter (i.e. the lexer, parser, and evaluation) given an
/// interpreter config. Returns the text to print after the program's own
/// output, if any.
pub fn run_interpreter(config: &InterpreterConfig) -> Result<Option<String>, RunError> {
    // Read the input program into a string.
    let program_string = read_program(config)?;
    let mut env = console_environment(config);

    if config.pretty {
        return Ok(Some(env.pretty(program_string.as_str())?));
    }

    // Execute the program.
    let result = env.eval(program_string.as_str())?;
    tracing::debug!(result = %result, "program finished");

    match result {
        Node::Nil | Node::None => return Ok(None),
        other => return Ok(Some(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // Writes `program_str` to a scratch file and returns a config for it.
    fn config_for(file_name: &str, program_str: &str, pretty: bool) -> InterpreterConfig {
        let mut src_filepath = std::env::temp_dir();
        src_filepath.push(file_name);
        fs::write(&src_filepath, program_str).expect("unable to write scratch program");

        return InterpreterConfig {
            src_filepath: Some(src_filepath.to_string_lossy().into_owned()),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            pretty,
            verbose: false,
        };
    }

    #[test]
    fn test_run_file() {
        let config = config_for(
            "rust_logo_interp_run.logo",
            "to double :n\noutput :n * 2\nend\ndouble 21",
            false,
        );

        assert_eq!(
            run_interpreter(&config).expect("run returned unexpected error"),
            Some(String::from("42"))
        );
    }

    // Test if nil results print nothing.
    #[test]
    fn test_nil_result() {
        let config = config_for("rust_logo_interp_nil.logo", "make \"x 1\nstop", false);

        assert_eq!(run_interpreter(&config).expect("run returned unexpected error"), None);
    }

    #[test]
    fn test_pretty_mode() {
        let config = config_for("rust_logo_interp_pretty.logo", "add 1 2", true);

        assert_eq!(
            run_interpreter(&config).expect("run returned unexpected error"),
            Some(String::from("add/2 =>\n  1\n  2\n"))
        );
    }

    #[test]
    fn test_errors() {
        let missing = InterpreterConfig {
            src_filepath: Some(String::from("/nonexistent/program.logo")),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            pretty: false,
            verbose: false,
        };
        assert!(matches!(run_interpreter(&missing), Err(RunError::InputFileError(_))));

        let config = config_for("rust_logo_interp_error.logo", "div 1 0", false);
        assert!(matches!(
            run_interpreter(&config),
            Err(RunError::EvalError(EvalError::DivisionByZero))
        ));
    }

    // Test if the console environment takes its call depth limit from the
    // config.
    #[test]
    fn test_console_environment_depth_limit() {
        let mut config = config_for("rust_logo_interp_depth.logo", "", false);
        config.max_call_depth = 7;

        assert_eq!(console_environment(&config).max_call_depth(), 7);
    }

    #[test]
    fn test_config_parsing() {
        let config = InterpreterConfig::parse_from([
            "rust-logo-interp",
            "--src-filepath",
            "program.logo",
            "--max-call-depth",
            "50",
            "--pretty",
        ]);

        assert_eq!(config.src_filepath, Some(String::from("program.logo")));
        assert_eq!(config.max_call_depth, 50);
        assert!(config.pretty);
        assert!(!config.verbose);
    }
}
