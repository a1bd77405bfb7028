//! Word and list construction and selection.

use crate::builtin_procedures::arithmetic::{to_number, Number};
use crate::builtin_procedures::{native, ProcedureProvider};
use crate::environment::{Environment, EvalError};
use crate::program_representation::{Node, NodeType};

pub struct Data;

impl ProcedureProvider for Data {
    fn register_procedures(&self, env: &mut Environment) {
        env.define(native("list", &["a", "b"], list));
        env.define(native("sentence", &["a", "b"], sentence));
        env.define(native("first", &["thing"], first));
        env.define(native("last", &["thing"], last));
        env.define(native("butfirst", &["thing"], butfirst));
        env.define(native("butlast", &["thing"], butlast));
        env.define(native("count", &["thing"], count));
        env.define(native("item", &["index", "thing"], item));
        env.define(native("fput", &["thing", "list"], fput));
        env.define(native("lput", &["thing", "list"], lput));
        env.define(native("word", &["a", "b"], word));
        env.define(native("empty?", &["thing"], empty));
        env.define(native("uppercase", &["word"], uppercase));
        env.define(native("lowercase", &["word"], lowercase));
    }
}

// A list or the characters of a word, the two shapes selectors work on.
enum Sequence<'a> {
    Elements(&'a [Node]),
    Characters(Vec<char>),
}

fn word_text(node: &Node) -> Result<String, EvalError> {
    match node {
        Node::Quoted(text) | Node::Symbol(text) => return Ok(text.clone()),
        Node::Integer(_) | Node::Float(_) | Node::Boolean(_) => return Ok(node.to_string()),
        other => {
            return Err(EvalError::type_mismatch(other, &[NodeType::Quote, NodeType::Symbol]))
        }
    }
}

fn to_sequence(node: &Node) -> Result<Sequence<'_>, EvalError> {
    match node {
        Node::List(children) => return Ok(Sequence::Elements(children.as_slice())),
        other => return Ok(Sequence::Characters(word_text(other)?.chars().collect())),
    }
}

fn char_word(c: char) -> Node {
    return Node::Quoted(c.to_string());
}

fn require_list(node: &Node) -> Result<&Vec<Node>, EvalError> {
    match node {
        Node::List(children) => return Ok(children),
        other => return Err(EvalError::type_mismatch(other, &[NodeType::List])),
    }
}

fn list(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    return Ok(Node::List(args.to_vec()));
}

fn flatten_into(node: &Node, out: &mut Vec<Node>) {
    match node {
        Node::List(children) => children.iter().for_each(|child| flatten_into(child, out)),
        other => out.push(other.clone()),
    }
}

fn sentence(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let mut out = Vec::new();
    for arg in args {
        flatten_into(arg, &mut out);
    }

    return Ok(Node::List(out));
}

// Empty lists and words have no first or last element.
fn first(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    match to_sequence(&args[0])? {
        Sequence::Elements(elements) => {
            return Ok(elements.first().cloned().unwrap_or(Node::Nil));
        }
        Sequence::Characters(chars) => {
            return Ok(chars.first().map_or(Node::Nil, |c| char_word(*c)));
        }
    }
}

fn last(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    match to_sequence(&args[0])? {
        Sequence::Elements(elements) => return Ok(elements.last().cloned().unwrap_or(Node::Nil)),
        Sequence::Characters(chars) => return Ok(chars.last().map_or(Node::Nil, |c| char_word(*c))),
    }
}

fn butfirst(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    match to_sequence(&args[0])? {
        Sequence::Elements(elements) => {
            return Ok(Node::List(elements.iter().skip(1).cloned().collect()))
        }
        Sequence::Characters(chars) => return Ok(Node::Quoted(chars.iter().skip(1).collect())),
    }
}

fn butlast(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    match to_sequence(&args[0])? {
        Sequence::Elements(elements) => {
            let keep = elements.len().saturating_sub(1);
            return Ok(Node::List(elements[..keep].to_vec()));
        }
        Sequence::Characters(chars) => {
            let keep = chars.len().saturating_sub(1);
            return Ok(Node::Quoted(chars[..keep].iter().collect()));
        }
    }
}

fn count(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let length = match to_sequence(&args[0])? {
        Sequence::Elements(elements) => elements.len(),
        Sequence::Characters(chars) => chars.len(),
    };

    return Ok(Node::Integer(length as i64));
}

/// `item n thing` is 1-based; out of range yields `nil`.
fn item(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let index = match to_number(&args[0])? {
        Number::Integer(index) if index >= 1 => (index - 1) as usize,
        Number::Integer(_) => return Ok(Node::Nil),
        Number::Float(_) => {
            return Err(EvalError::type_mismatch(&args[0], &[NodeType::Integer]))
        }
    };

    match to_sequence(&args[1])? {
        Sequence::Elements(elements) => {
            return Ok(elements.get(index).cloned().unwrap_or(Node::Nil));
        }
        Sequence::Characters(chars) => {
            return Ok(chars.get(index).map_or(Node::Nil, |c| char_word(*c)));
        }
    }
}

fn fput(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let mut out = vec![args[0].clone()];
    out.extend(require_list(&args[1])?.iter().cloned());

    return Ok(Node::List(out));
}

fn lput(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let mut out = require_list(&args[1])?.clone();
    out.push(args[0].clone());

    return Ok(Node::List(out));
}

fn word(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let mut out = String::new();
    for arg in args {
        out.push_str(word_text(arg)?.as_str());
    }

    return Ok(Node::Quoted(out));
}

fn empty(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    match &args[0] {
        Node::List(children) => return Ok(Node::Boolean(children.is_empty())),
        Node::Nil | Node::None => return Ok(Node::Boolean(true)),
        other => return Ok(Node::Boolean(word_text(other)?.is_empty())),
    }
}

fn uppercase(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    return Ok(Node::Quoted(word_text(&args[0])?.to_uppercase()));
}

fn lowercase(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    return Ok(Node::Quoted(word_text(&args[0])?.to_lowercase()));
}
