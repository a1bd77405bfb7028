//! The interpreter state: procedure table, dynamic scope stack, and the
//! dispatch protocol that runs native, macro and user-defined procedures.

use crate::dynamic_scoping::{Scope, ScopeStack};
use crate::procedure_table::{ProcedureNotFound, ProcedureTable};
use crate::program_representation::{Call, Node, NodeType, Procedure, ProcedureBody};
use crate::recursive_descent_parsing::ParseError;

/// Default limit on nested procedure frames.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

// Stack growth parameters: keep 100KB free before every dispatch and grow by
// 1MB segments when it runs low.
const RED_ZONE: usize = 100 * 1024;
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Errors raised while evaluating a program.
#[derive(Debug, PartialEq, Clone)]
pub enum EvalError {
    ProcedureNotFound {
        procedure_name: String,
    },
    NodeTypeMismatch {
        node: String,
        found: NodeType,
        expected: Vec<NodeType>,
    },
    NotEnoughInputs {
        procedure_name: String,
        expected: usize,
        found: usize,
    },
    DivisionByZero,
    StackExhaustion {
        max_call_depth: usize,
    },
    Parse(ParseError),
}

impl EvalError {
    /// Builds a `NodeTypeMismatch` for `node`.
    pub fn type_mismatch(node: &Node, expected: &[NodeType]) -> EvalError {
        return EvalError::NodeTypeMismatch {
            node: node.to_source(),
            found: node.node_type(),
            expected: expected.to_vec(),
        };
    }
}

/// Display trait implementation for EvalError.
impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProcedureNotFound { procedure_name } => {
                return write!(f, "I don't know how to {}", procedure_name);
            }

            Self::NodeTypeMismatch {
                node,
                found,
                expected,
            } => {
                return write!(
                    f,
                    "Type mismatch for {}. Expected one of {:?}, found: {:?}.",
                    node, expected, found
                );
            }

            Self::NotEnoughInputs {
                procedure_name,
                expected,
                found,
            } => {
                return write!(
                    f,
                    "Not enough inputs to {}. Expected: {}, found: {}.",
                    procedure_name, expected, found
                );
            }

            Self::DivisionByZero => {
                return write!(f, "Division by zero.");
            }

            Self::StackExhaustion { max_call_depth } => {
                return write!(
                    f,
                    "Stack exhausted: more than {} nested procedure calls.",
                    max_call_depth
                );
            }

            Self::Parse(parse_error) => {
                return write!(f, "{}", parse_error);
            }
        }
    }
}

/// Type conversions for errors.
impl From<ProcedureNotFound> for EvalError {
    fn from(value: ProcedureNotFound) -> Self {
        return Self::ProcedureNotFound {
            procedure_name: value.procedure_name,
        };
    }
}

impl From<ParseError> for EvalError {
    fn from(value: ParseError) -> Self {
        return Self::Parse(value);
    }
}

/// One interpreter instance. Owns every procedure and every scope frame;
/// parsing and evaluation both borrow it mutably.
#[derive(Debug)]
pub struct Environment {
    pub(crate) procedures: ProcedureTable,
    pub(crate) scopes: ScopeStack,
    max_call_depth: usize,
    // Number of user procedure bodies currently running.
    active_bodies: usize,
    // Set by `output`/`stop` inside a body; cleared when that body returns.
    exit_requested: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl Environment {
    /// An environment with an empty procedure table and only the global
    /// frame on the scope stack.
    pub fn new() -> Environment {
        Environment {
            procedures: ProcedureTable::new(),
            scopes: ScopeStack::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            active_bodies: 0,
            exit_requested: false,
        }
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Environment {
        self.max_call_depth = max_call_depth;
        return self;
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    pub fn procedures(&self) -> &ProcedureTable {
        &self.procedures
    }

    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    /// Number of procedure frames above the global frame.
    pub fn call_depth(&self) -> usize {
        self.scopes.depth() - 1
    }

    pub fn define(&mut self, procedure: Procedure) {
        self.procedures.define(procedure);
    }

    pub fn alias(&mut self, original: &str, alias: &str) -> Result<(), EvalError> {
        self.procedures.alias(original, alias)?;
        return Ok(());
    }

    pub fn make(&mut self, name: &str, value: Node) {
        self.scopes.make(name, value);
    }

    pub fn local(&mut self, name: &str) {
        self.scopes.local(name);
    }

    pub fn resolve(&self, name: &str) -> Node {
        self.scopes.resolve(name)
    }

    pub fn resolveable(&self, name: &str) -> bool {
        self.scopes.resolveable(name)
    }

    /// Asks the innermost running procedure body to stop after the current
    /// statement. Outside any body this is a no-op.
    pub fn request_exit(&mut self) {
        if self.active_bodies > 0 {
            self.exit_requested = true;
        }
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Dispatches `call` with its already evaluated arguments.
    ///
    /// Non-macro procedures run inside a fresh scope frame named after the
    /// procedure. The frame is popped on every exit path, including errors.
    pub fn apply(&mut self, call: &Call, args: Vec<Node>) -> Result<Node, EvalError> {
        let procedure = self.procedures.lookup(call.name.as_str())?;

        if args.len() < procedure.arity() {
            return Err(EvalError::NotEnoughInputs {
                procedure_name: procedure.name.clone(),
                expected: procedure.arity(),
                found: args.len(),
            });
        }

        if procedure.is_macro() {
            return self.dispatch(&procedure, &args);
        }

        if self.call_depth() >= self.max_call_depth {
            tracing::debug!(
                procedure = %procedure.name,
                depth = self.call_depth(),
                "call depth limit reached"
            );
            return Err(EvalError::StackExhaustion {
                max_call_depth: self.max_call_depth,
            });
        }

        self.scopes.push(Scope::new(procedure.name.as_str()));
        let result = self.dispatch(&procedure, &args);
        self.scopes.pop();

        return result;
    }

    fn dispatch(&mut self, procedure: &Procedure, args: &[Node]) -> Result<Node, EvalError> {
        tracing::trace!(
            procedure = %procedure.name,
            args = args.len(),
            depth = self.call_depth(),
            "dispatch"
        );

        return ensure_sufficient_stack(|| match &procedure.body {
            ProcedureBody::Native(native_fn) | ProcedureBody::Macro(native_fn) => {
                native_fn.as_ref()(self, args)
            }

            // An exit already requested in the caller's body must survive
            // this nested body.
            ProcedureBody::UserDefined(statements) => {
                let caller_exit_requested = self.exit_requested;
                self.exit_requested = false;
                self.active_bodies += 1;
                let result = self.evaluate_body(statements.as_slice());
                self.active_bodies -= 1;
                self.exit_requested = caller_exit_requested;
                result
            }
        });
    }
}

// Grows the host stack on demand so deep Logo recursion hits the call depth
// limit instead of overflowing.
#[inline]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::program_representation::NativeFn;

    // Native procedure that records the name of the scope it runs in.
    fn scope_name_procedure(name: &str, is_macro: bool) -> Procedure {
        let native_fn: NativeFn = Rc::new(|env: &mut Environment, _: &[Node]| {
            return Ok(Node::Quoted(String::from(env.scopes().peek().scope_name())));
        });

        match is_macro {
            true => Procedure::macro_procedure(name, &[], native_fn),
            false => Procedure::native(name, &[], native_fn),
        }
    }

    // Test if apply pushes a frame for natives and not for macros, and pops
    // it again.
    #[test]
    fn test_apply_scope_frames() {
        let mut env = Environment::new();
        env.define(scope_name_procedure("whereami", false));
        env.define(scope_name_procedure("whereamimacro", true));

        let result = env.apply(&Call::new("whereami", 0, vec![]), vec![]);
        assert_eq!(result, Ok(Node::Quoted(String::from("whereami"))));

        let result = env.apply(&Call::new("whereamimacro", 0, vec![]), vec![]);
        assert_eq!(result, Ok(Node::Quoted(String::from("global"))));

        assert_eq!(env.call_depth(), 0);
    }

    #[test]
    fn test_apply_unknown_procedure() {
        let mut env = Environment::new();

        assert_eq!(
            env.apply(&Call::new("nothing", 0, vec![]), vec![]),
            Err(EvalError::ProcedureNotFound {
                procedure_name: String::from("nothing")
            })
        );
    }

    // Test that the frame is popped when the host function fails.
    #[test]
    fn test_apply_pops_frame_on_error() {
        let mut env = Environment::new();
        let failing: NativeFn =
            Rc::new(|_: &mut Environment, _: &[Node]| Err(EvalError::DivisionByZero));
        env.define(Procedure::native("fail", &[], failing));

        assert_eq!(
            env.apply(&Call::new("fail", 0, vec![]), vec![]),
            Err(EvalError::DivisionByZero)
        );
        assert_eq!(env.call_depth(), 0);
    }

    #[test]
    fn test_apply_not_enough_inputs() {
        let mut env = Environment::new();
        let identity: NativeFn =
            Rc::new(|_: &mut Environment, args: &[Node]| Ok(args[0].clone()));
        env.define(Procedure::native("identity", &["value"], identity));

        assert_eq!(
            env.apply(&Call::new("identity", 1, vec![]), vec![]),
            Err(EvalError::NotEnoughInputs {
                procedure_name: String::from("identity"),
                expected: 1,
                found: 0,
            })
        );
        assert_eq!(
            env.apply(&Call::new("identity", 1, vec![]), vec![Node::Integer(7)]),
            Ok(Node::Integer(7))
        );
    }

    #[test]
    fn test_call_depth_limit() {
        let mut env = Environment::new().with_max_call_depth(0);
        env.define(scope_name_procedure("whereami", false));

        assert_eq!(env.max_call_depth(), 0);
        assert_eq!(Environment::new().max_call_depth(), DEFAULT_MAX_CALL_DEPTH);

        assert_eq!(
            env.apply(&Call::new("whereami", 0, vec![]), vec![]),
            Err(EvalError::StackExhaustion { max_call_depth: 0 })
        );
    }

    #[test]
    fn test_alias_through_environment() {
        let mut env = Environment::new();
        env.define(scope_name_procedure("whereami", false));

        assert_eq!(env.alias("whereami", "here"), Ok(()));
        assert_eq!(
            env.alias("missing", "other"),
            Err(EvalError::ProcedureNotFound {
                procedure_name: String::from("missing")
            })
        );

        // The alias shares the entry, so the frame keeps the original name.
        let result = env.apply(&Call::new("here", 0, vec![]), vec![]);
        assert_eq!(result, Ok(Node::Quoted(String::from("whereami"))));
    }

    #[test]
    fn test_request_exit_outside_body_is_ignored() {
        let mut env = Environment::new();
        env.request_exit();

        assert!(!env.exit_requested());
    }
}
