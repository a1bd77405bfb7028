//! Template iteration: `map`, `filter` and `find` run a template block once
//! per element, with `?` standing for the element.

use crate::builtin_procedures::{native, ProcedureProvider};
use crate::environment::{Environment, EvalError};
use crate::program_representation::{Node, NodeType};

/// Placeholder replaced by the current element.
const SLOT: &str = "?";

pub struct Template;

impl ProcedureProvider for Template {
    fn register_procedures(&self, env: &mut Environment) {
        env.define(native("map", &["template", "values"], map));
        env.define(native("filter", &["template", "values"], filter));
        env.define(native("find", &["template", "values"], find));
    }
}

// Copies `template` with every `?` symbol replaced by `value`, nested lists
// included.
fn substitute(template: &Node, value: &Node) -> Node {
    match template {
        Node::Symbol(symbol) if symbol == SLOT => value.clone(),
        Node::List(children) => {
            Node::List(children.iter().map(|child| substitute(child, value)).collect())
        }
        other => other.clone(),
    }
}

fn require_template(node: &Node) -> Result<&Node, EvalError> {
    match node {
        Node::List(_) => return Ok(node),
        other => return Err(EvalError::type_mismatch(other, &[NodeType::List])),
    }
}

fn values_mismatch(node: &Node) -> EvalError {
    return EvalError::type_mismatch(node, &[NodeType::List, NodeType::Quote]);
}

fn run_template(env: &mut Environment, template: &Node, value: &Node) -> Result<Node, EvalError> {
    return env.run_block(&substitute(template, value));
}

// Template results used as predicates must be booleans.
fn run_predicate(env: &mut Environment, template: &Node, value: &Node) -> Result<bool, EvalError> {
    match run_template(env, template, value)? {
        Node::Boolean(flag) => return Ok(flag),
        other => return Err(EvalError::type_mismatch(&other, &[NodeType::Boolean])),
    }
}

fn map(env: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let template = require_template(&args[0])?;

    match &args[1] {
        Node::List(values) => {
            let mut results = Vec::with_capacity(values.len());
            for value in values {
                let result = run_template(env, template, value)?;
                results.push(Node::Symbol(result.to_string()));
            }
            return Ok(Node::List(results));
        }

        Node::Quoted(word) => {
            let mut results = String::new();
            for c in word.chars() {
                let result = run_template(env, template, &Node::Quoted(c.to_string()))?;
                results.push_str(result.to_string().as_str());
            }
            return Ok(Node::Quoted(results));
        }

        other => return Err(values_mismatch(other)),
    }
}

fn filter(env: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let template = require_template(&args[0])?;

    match &args[1] {
        Node::List(values) => {
            let mut kept = Vec::new();
            for value in values {
                if run_predicate(env, template, value)? {
                    kept.push(value.clone());
                }
            }
            return Ok(Node::List(kept));
        }

        Node::Quoted(word) => {
            let mut kept = String::new();
            for c in word.chars() {
                if run_predicate(env, template, &Node::Quoted(c.to_string()))? {
                    kept.push(c);
                }
            }
            return Ok(Node::Quoted(kept));
        }

        other => return Err(values_mismatch(other)),
    }
}

fn find(env: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let template = require_template(&args[0])?;

    match &args[1] {
        Node::List(values) => {
            for value in values {
                if run_predicate(env, template, value)? {
                    return Ok(value.clone());
                }
            }
        }

        Node::Quoted(word) => {
            for c in word.chars() {
                let value = Node::Quoted(c.to_string());
                if run_predicate(env, template, &value)? {
                    return Ok(value);
                }
            }
        }

        other => return Err(values_mismatch(other)),
    }

    return Ok(Node::Nil);
}
