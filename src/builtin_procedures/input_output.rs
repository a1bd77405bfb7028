//! Console builtins. Output goes to an `OutputObserver` and input comes from
//! an `InputGenerator`, so hosts and tests can swap both ends.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::builtin_procedures::ProcedureProvider;
use crate::environment::{Environment, EvalError};
use crate::program_representation::{Node, Procedure};
use crate::recursive_descent_parsing::read_list_literal;

/// Receives every piece of text the program writes.
pub trait OutputObserver {
    fn inform(&mut self, output: &str);
}

/// Supplies the text the program reads.
pub trait InputGenerator {
    fn request(&mut self) -> String;
    fn request_line(&mut self) -> String;
}

/// Keeps every output in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub outputs: Vec<String>,
}

impl OutputObserver for RecordingObserver {
    fn inform(&mut self, output: &str) {
        self.outputs.push(output.to_string());
    }
}

/// Hands out a fixed sequence of lines, then empty strings.
#[derive(Debug, Default)]
pub struct CannedInput {
    lines: VecDeque<String>,
}

impl CannedInput {
    pub fn new(lines: &[&str]) -> CannedInput {
        CannedInput {
            lines: lines.iter().map(|line| line.to_string()).collect(),
        }
    }
}

impl InputGenerator for CannedInput {
    fn request(&mut self) -> String {
        return self.lines.pop_front().unwrap_or_default();
    }

    fn request_line(&mut self) -> String {
        return self.request();
    }
}

// `print` and `type` drop the outer brackets of a list argument.
fn print_form(args: &[Node]) -> String {
    let mut words = Vec::with_capacity(args.len());

    for arg in args {
        match arg {
            Node::List(children) => {
                words.extend(children.iter().map(|child| child.to_string()));
            }
            other => words.push(other.to_string()),
        }
    }

    return words.join(" ");
}

fn show_form(args: &[Node]) -> String {
    return args.iter().map(|arg| arg.to_string()).collect::<Vec<String>>().join(" ");
}

pub struct InputOutput {
    observer: Rc<RefCell<dyn OutputObserver>>,
    generator: Rc<RefCell<dyn InputGenerator>>,
}

impl InputOutput {
    pub fn new(
        observer: Rc<RefCell<dyn OutputObserver>>,
        generator: Rc<RefCell<dyn InputGenerator>>,
    ) -> InputOutput {
        InputOutput {
            observer,
            generator,
        }
    }

    // Defines a procedure that formats its arguments and writes them out.
    fn writer(&self, name: &str, format: fn(&[Node]) -> String, newline: bool) -> Procedure {
        let observer = Rc::clone(&self.observer);

        let write = move |_: &mut Environment, args: &[Node]| -> Result<Node, EvalError> {
            let mut text = format(args);
            if newline {
                text.push('\n');
            }
            observer.borrow_mut().inform(text.as_str());

            return Ok(Node::Nil);
        };

        return Procedure::native(name, &["output"], Rc::new(write));
    }
}

impl ProcedureProvider for InputOutput {
    fn register_procedures(&self, env: &mut Environment) {
        env.define(self.writer("print", print_form, true));
        env.define(self.writer("show", show_form, true));
        env.define(self.writer("type", print_form, false));

        let generator = Rc::clone(&self.generator);
        let readword = move |_: &mut Environment, _: &[Node]| -> Result<Node, EvalError> {
            return Ok(Node::Quoted(generator.borrow_mut().request_line()));
        };
        env.define(Procedure::native("readword", &[], Rc::new(readword)));

        let generator = Rc::clone(&self.generator);
        let readlist = move |_: &mut Environment, _: &[Node]| -> Result<Node, EvalError> {
            let line = generator.borrow_mut().request_line();
            tracing::debug!(line = line.as_str(), "readlist");

            return Ok(read_list_literal(line.as_str())?);
        };
        env.define(Procedure::native("readlist", &[], Rc::new(readlist)));
    }
}
