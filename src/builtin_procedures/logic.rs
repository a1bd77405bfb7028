//! Comparisons and boolean connectives.

use crate::builtin_procedures::arithmetic::to_number;
use crate::builtin_procedures::{native, ProcedureProvider};
use crate::environment::{Environment, EvalError};
use crate::program_representation::{Node, NodeType};

pub struct Logic;

impl ProcedureProvider for Logic {
    fn register_procedures(&self, env: &mut Environment) {
        env.define(native("equal?", &["a", "b"], equal));
        env.define(native("notequal?", &["a", "b"], notequal));
        env.define(native("less?", &["a", "b"], less));
        env.define(native("greater?", &["a", "b"], greater));
        env.define(native("lessequal?", &["a", "b"], lessequal));
        env.define(native("greaterequal?", &["a", "b"], greaterequal));
        env.define(native("and", &["a", "b"], and));
        env.define(native("or", &["a", "b"], or));
        env.define(native("not", &["a"], not));
    }
}

/// Logo equality: numbers compare by value, other words case-insensitively
/// by their printed text, lists element by element.
pub fn nodes_equal(a: &Node, b: &Node) -> bool {
    match (a, b) {
        (Node::List(xs), Node::List(ys)) => {
            return xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| nodes_equal(x, y));
        }
        (Node::List(_), _) | (_, Node::List(_)) => return false,
        _ => {}
    }

    match (to_number(a), to_number(b)) {
        (Ok(x), Ok(y)) => return x.as_f64() == y.as_f64(),
        _ => return a.to_string().to_lowercase() == b.to_string().to_lowercase(),
    }
}

fn equal(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    return Ok(Node::Boolean(nodes_equal(&args[0], &args[1])));
}

fn notequal(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    return Ok(Node::Boolean(!nodes_equal(&args[0], &args[1])));
}

fn compare(args: &[Node], predicate: fn(f64, f64) -> bool) -> Result<Node, EvalError> {
    let a = to_number(&args[0])?.as_f64();
    let b = to_number(&args[1])?.as_f64();

    return Ok(Node::Boolean(predicate(a, b)));
}

fn less(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    return compare(args, |a, b| a < b);
}

fn greater(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    return compare(args, |a, b| a > b);
}

fn lessequal(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    return compare(args, |a, b| a <= b);
}

fn greaterequal(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    return compare(args, |a, b| a >= b);
}

fn to_bool(node: &Node) -> Result<bool, EvalError> {
    match node {
        Node::Boolean(flag) => return Ok(*flag),
        other => return Err(EvalError::type_mismatch(other, &[NodeType::Boolean])),
    }
}

fn and(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let mut result = true;
    for arg in args {
        result &= to_bool(arg)?;
    }

    return Ok(Node::Boolean(result));
}

fn or(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let mut result = false;
    for arg in args {
        result |= to_bool(arg)?;
    }

    return Ok(Node::Boolean(result));
}

fn not(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    return Ok(Node::Boolean(!to_bool(&args[0])?));
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::builtin_procedures::test_environment;

    use super::*;

    #[test]
    fn test_equality() {
        let (mut env, _) = test_environment(&[]);

        assert_eq!(env.eval("equal? 2 2"), Ok(Node::Boolean(true)));
        assert_eq!(env.eval("2 == 2.0"), Ok(Node::Boolean(true)));
        assert_eq!(env.eval("\"abc = \"ABC"), Ok(Node::Boolean(true)));
        assert_eq!(env.eval("notequal? \"a \"b"), Ok(Node::Boolean(true)));
        assert_eq!(env.eval("3 != 3"), Ok(Node::Boolean(false)));
    }

    // Test if lists compare element by element, against raw list symbols.
    #[test]
    fn test_list_equality() {
        let (mut env, _) = test_environment(&[]);

        assert_eq!(env.eval("equal? [1 [a b]] [1 [A b]]"), Ok(Node::Boolean(true)));
        assert_eq!(env.eval("equal? [1 2] [1 2 3]"), Ok(Node::Boolean(false)));
        assert_eq!(env.eval("equal? [1] 1"), Ok(Node::Boolean(false)));
        assert_eq!(env.eval("equal? list 1 2 [1 2]"), Ok(Node::Boolean(true)));
    }

    #[test]
    fn test_ordering() {
        let (mut env, _) = test_environment(&[]);

        assert_eq!(env.eval("3 > 2"), Ok(Node::Boolean(true)));
        assert_eq!(env.eval("3 < 2"), Ok(Node::Boolean(false)));
        assert_eq!(env.eval("lessequal? 2 2"), Ok(Node::Boolean(true)));
        assert_eq!(env.eval("greaterequal? 1.5 2"), Ok(Node::Boolean(false)));
        assert!(matches!(
            env.eval("less? \"a 2"),
            Err(EvalError::NodeTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_connectives() {
        let (mut env, _) = test_environment(&[]);

        assert_eq!(env.eval("and true 3 > 2"), Ok(Node::Boolean(true)));
        assert_eq!(env.eval("or false false"), Ok(Node::Boolean(false)));
        assert_eq!(env.eval("(or false false true)"), Ok(Node::Boolean(true)));
        assert_eq!(env.eval("not 1 = 2"), Ok(Node::Boolean(true)));
        assert_eq!(
            env.eval("and true 1"),
            Err(EvalError::NodeTypeMismatch {
                node: String::from("1"),
                found: NodeType::Integer,
                expected: vec![NodeType::Boolean],
            })
        );
    }
}
