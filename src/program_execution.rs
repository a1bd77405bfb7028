//! Evaluates Logo programs: per-node evaluation, parameter binding, user
//! procedure bodies and the re-entrant runner for deferred blocks.

use crate::environment::{Environment, EvalError};
use crate::lexical_analysis::run_lexical_analysis;
use crate::program_representation::{render_block, Call, Node, NodeType};
use crate::recursive_descent_parsing::Reader;

impl Environment {
    /// Lexes, parses and evaluates `program_str` against the current scope.
    /// Returns the result of the last top-level statement, or `none` for an
    /// empty program.
    pub fn eval(&mut self, program_str: &str) -> Result<Node, EvalError> {
        let tokens = run_lexical_analysis(program_str, true);
        let program = Reader::new(&tokens, &mut self.procedures).parse(false)?;

        let mut result = Node::None;

        for statement in program.iter() {
            result = self.evaluate_node(statement)?;

            if self.exit_requested() {
                break;
            }
        }

        return Ok(result);
    }

    /// Evaluates one node. Words and lists evaluate to themselves,
    /// references resolve through the scope stack and calls are dispatched.
    pub fn evaluate_node(&mut self, node: &Node) -> Result<Node, EvalError> {
        match node {
            Node::Reference(name) => return Ok(self.resolve(name)),
            Node::Call(call) => return self.evaluate_call(call),
            Node::Procedure(_) => return Ok(Node::None),
            other => return Ok(other.clone()),
        }
    }

    /// Evaluates the arguments of `call` left to right and applies it.
    ///
    /// Each argument within the callee's declared arity is also bound to its
    /// parameter name with `make`, before the callee's frame exists. This
    /// holds for every callee, native and macro procedures included.
    pub fn evaluate_call(&mut self, call: &Call) -> Result<Node, EvalError> {
        let procedure = self.procedures.lookup(call.name.as_str())?;

        let mut args = Vec::with_capacity(call.args.len());

        for (idx, arg) in call.args.iter().enumerate() {
            let value = self.evaluate_node(arg)?;

            if idx < procedure.arity() {
                self.make(procedure.params[idx].as_str(), value.clone());
            }

            args.push(value);
        }

        return self.apply(call, args);
    }

    /// Runs the statements of a user procedure body. Stops after an
    /// `output` or `stop` statement, or once a nested block asked to exit.
    pub(crate) fn evaluate_body(&mut self, statements: &[Node]) -> Result<Node, EvalError> {
        let mut result = Node::Nil;

        for statement in statements {
            let call = match statement {
                Node::Call(call) => call,
                other => return Err(EvalError::type_mismatch(other, &[NodeType::Call])),
            };

            let is_last = call.name == "output" || call.name == "stop";
            result = self.evaluate_call(call)?;

            if is_last || self.exit_requested() {
                break;
            }
        }

        return Ok(result);
    }

    /// Executes a deferred block by rendering it back to source text and
    /// evaluating that text as fresh input.
    pub fn run_block(&mut self, block: &Node) -> Result<Node, EvalError> {
        match block {
            Node::List(children) => {
                let source = render_block(children);
                tracing::trace!(block = %source, "re-entering block");
                return self.eval(source.as_str());
            }

            other => return Err(EvalError::type_mismatch(other, &[NodeType::List])),
        }
    }
}
