//! Procedure providers that register the builtin procedures into an
//! `Environment`.

pub mod arithmetic;
pub mod control;
pub mod data;
pub mod input_output;
pub mod logic;
pub mod template;

use std::cell::RefCell;
use std::rc::Rc;

use crate::environment::{Environment, EvalError};
use crate::program_representation::{Node, NodeType, Procedure};

use self::input_output::{InputGenerator, InputOutput, OutputObserver};

/// Host function signature shared by the stateless builtins.
pub type Builtin = fn(&mut Environment, &[Node]) -> Result<Node, EvalError>;

/// Something that contributes procedures to an environment.
pub trait ProcedureProvider {
    fn register_procedures(&self, env: &mut Environment);
}

/// A native builtin: runs in its own scope frame.
pub(crate) fn native(name: &str, params: &[&str], builtin: Builtin) -> Procedure {
    return Procedure::native(name, params, Rc::new(builtin));
}

/// A macro builtin: runs in the caller's scope frame.
pub(crate) fn macro_procedure(name: &str, params: &[&str], builtin: Builtin) -> Procedure {
    return Procedure::macro_procedure(name, params, Rc::new(builtin));
}

/// Text of a word argument used as a name. Quoted words and bare symbols
/// are accepted.
pub(crate) fn name_argument(node: &Node) -> Result<&str, EvalError> {
    match node.word_text() {
        Some(name) => return Ok(name),
        None => return Err(EvalError::type_mismatch(node, &[NodeType::Symbol, NodeType::Quote])),
    }
}

/// Registers every builtin except input/output.
pub fn load_core_library(env: &mut Environment) {
    let providers: [&dyn ProcedureProvider; 5] = [
        &control::Control,
        &arithmetic::Arithmetic,
        &logic::Logic,
        &data::Data,
        &template::Template,
    ];

    for provider in providers {
        provider.register_procedures(env);
    }
}

/// Registers every builtin, wiring `print`/`show`/`type` to `observer` and
/// `readword`/`readlist` to `generator`.
pub fn load_standard_library(
    env: &mut Environment,
    observer: Rc<RefCell<dyn OutputObserver>>,
    generator: Rc<RefCell<dyn InputGenerator>>,
) {
    load_core_library(env);
    InputOutput::new(observer, generator).register_procedures(env);

    tracing::debug!(procedures = env.procedures().names().len(), "standard library loaded");
}

/// Environment with the standard library, a recording output sink and
/// canned input lines.
#[cfg(test)]
pub(crate) fn test_environment(
    input_lines: &[&str],
) -> (Environment, Rc<RefCell<input_output::RecordingObserver>>) {
    let observer = Rc::new(RefCell::new(input_output::RecordingObserver::default()));
    let generator = Rc::new(RefCell::new(input_output::CannedInput::new(input_lines)));

    let mut env = Environment::new();
    load_standard_library(&mut env, observer.clone(), generator);

    return (env, observer);
}
