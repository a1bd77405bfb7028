//! Numeric builtins. Integer arithmetic stays integral until a float
//! operand appears or an integer operation overflows.

use rand::Rng;

use crate::builtin_procedures::{native, ProcedureProvider};
use crate::environment::{Environment, EvalError};
use crate::program_representation::{Node, NodeType};

pub struct Arithmetic;

impl ProcedureProvider for Arithmetic {
    fn register_procedures(&self, env: &mut Environment) {
        env.define(native("add", &["a", "b"], add));
        env.define(native("sub", &["a", "b"], sub));
        env.define(native("mul", &["a", "b"], mul));
        env.define(native("div", &["a", "b"], div));
        env.define(native("mod", &["a", "b"], modulo));
        env.define(native("random", &["limit"], random));
        env.define(native("minus", &["a"], minus));
        env.define(native("abs", &["a"], abs));
    }
}

/// A numeric operand.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(value) => value as f64,
            Number::Float(value) => value,
        }
    }

    fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }

    fn into_node(self) -> Node {
        match self {
            Number::Integer(value) => Node::Integer(value),
            Number::Float(value) => Node::Float(value),
        }
    }
}

/// Reads `node` as a number. Words holding numeric text are coerced.
pub fn to_number(node: &Node) -> Result<Number, EvalError> {
    let mismatch = || EvalError::type_mismatch(node, &[NodeType::Integer, NodeType::Float]);

    match node {
        Node::Integer(value) => return Ok(Number::Integer(*value)),
        Node::Float(value) => return Ok(Number::Float(*value)),
        Node::Symbol(text) | Node::Quoted(text) => {
            if let Ok(value) = text.parse::<i64>() {
                return Ok(Number::Integer(value));
            }
            return text.parse::<f64>().map(Number::Float).map_err(|_| mismatch());
        }
        _ => return Err(mismatch()),
    }
}

// Applies an integer operation when both sides are integers and it does
// not overflow, the float operation otherwise.
fn combine(
    a: Number,
    b: Number,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Number {
    if let (Number::Integer(x), Number::Integer(y)) = (a, b) {
        if let Some(value) = int_op(x, y) {
            return Number::Integer(value);
        }
    }

    return Number::Float(float_op(a.as_f64(), b.as_f64()));
}

// Folds every argument, so the parenthesized form accepts any count.
fn fold(
    args: &[Node],
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Node, EvalError> {
    let mut acc = to_number(&args[0])?;

    for arg in &args[1..] {
        acc = combine(acc, to_number(arg)?, int_op, float_op);
    }

    return Ok(acc.into_node());
}

fn add(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    return fold(args, i64::checked_add, |x, y| x + y);
}

fn mul(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    return fold(args, i64::checked_mul, |x, y| x * y);
}

fn sub(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let a = to_number(&args[0])?;
    let b = to_number(&args[1])?;

    return Ok(combine(a, b, i64::checked_sub, |x, y| x - y).into_node());
}

fn div(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let a = to_number(&args[0])?;
    let b = to_number(&args[1])?;

    if b.is_zero() {
        return Err(EvalError::DivisionByZero);
    }

    // Exact integer division stays an integer.
    let exact = |x: i64, y: i64| match x.checked_rem(y) {
        Some(0) => x.checked_div(y),
        _ => None,
    };

    return Ok(combine(a, b, exact, |x, y| x / y).into_node());
}

fn modulo(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let a = to_number(&args[0])?;
    let b = to_number(&args[1])?;

    if b.is_zero() {
        return Err(EvalError::DivisionByZero);
    }

    return Ok(combine(a, b, i64::checked_rem, |x, y| x % y).into_node());
}

/// `random n` picks an integer in `0..n`.
fn random(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    match to_number(&args[0])? {
        Number::Integer(limit) if limit > 0 => {
            return Ok(Node::Integer(rand::thread_rng().gen_range(0..limit)));
        }
        _ => return Err(EvalError::type_mismatch(&args[0], &[NodeType::Integer])),
    }
}

fn minus(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    match to_number(&args[0])? {
        Number::Integer(value) => match value.checked_neg() {
            Some(negated) => return Ok(Node::Integer(negated)),
            None => return Ok(Node::Float(-(value as f64))),
        },
        Number::Float(value) => return Ok(Node::Float(-value)),
    }
}

fn abs(_: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    match to_number(&args[0])? {
        Number::Integer(value) => match value.checked_abs() {
            Some(absolute) => return Ok(Node::Integer(absolute)),
            None => return Ok(Node::Float((value as f64).abs())),
        },
        Number::Float(value) => return Ok(Node::Float(value.abs())),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::builtin_procedures::test_environment;

    use super::*;

    #[test]
    fn test_integer_and_float_arithmetic() {
        let (mut env, _) = test_environment(&[]);

        assert_eq!(env.eval("3 + 2"), Ok(Node::Integer(5)));
        assert_eq!(env.eval("3 - 5"), Ok(Node::Integer(-2)));
        assert_eq!(env.eval("1.5 * 2"), Ok(Node::Float(3.0)));
        assert_eq!(env.eval("mul 3 4"), Ok(Node::Integer(12)));
    }

    // Test if division stays integral only when exact.
    #[test]
    fn test_division() {
        let (mut env, _) = test_environment(&[]);

        assert_eq!(env.eval("6 / 3"), Ok(Node::Integer(2)));
        assert_eq!(env.eval("7 / 2"), Ok(Node::Float(3.5)));
        assert_eq!(env.eval("div 1 0"), Err(EvalError::DivisionByZero));
        assert_eq!(env.eval("mod 7 0.0"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_mod_minus_abs() {
        let (mut env, _) = test_environment(&[]);

        assert_eq!(env.eval("mod 7 2"), Ok(Node::Integer(1)));
        assert_eq!(env.eval("mod 7.5 2"), Ok(Node::Float(1.5)));
        assert_eq!(env.eval("minus 4"), Ok(Node::Integer(-4)));
        assert_eq!(env.eval("abs -4.5"), Ok(Node::Float(4.5)));
    }

    // Test if add and mul fold all arguments in the parenthesized form.
    #[test]
    fn test_variadic_fold() {
        let (mut env, _) = test_environment(&[]);

        assert_eq!(env.eval("(add 1 2 3 4)"), Ok(Node::Integer(10)));
        assert_eq!(env.eval("(mul 2 3 0.5)"), Ok(Node::Float(3.0)));
    }

    #[test]
    fn test_numeric_words_are_coerced() {
        let (mut env, _) = test_environment(&[]);

        assert_eq!(env.eval("add \"2 3"), Ok(Node::Integer(5)));
        assert_eq!(
            env.eval("add \"two 3"),
            Err(EvalError::NodeTypeMismatch {
                node: String::from("\"two"),
                found: NodeType::Quote,
                expected: vec![NodeType::Integer, NodeType::Float],
            })
        );
    }

    #[test]
    fn test_overflow_falls_back_to_float() {
        let a = Number::Integer(i64::MAX);
        let b = Number::Integer(1);

        assert_eq!(
            combine(a, b, i64::checked_add, |x, y| x + y),
            Number::Float(i64::MAX as f64 + 1.0)
        );
    }

    #[test]
    fn test_random_range() {
        let (mut env, _) = test_environment(&[]);

        for _ in 0..20 {
            match env.eval("random 5") {
                Ok(Node::Integer(value)) => assert!((0..5).contains(&value)),
                other => panic!("unexpected random result {:?}", other),
            }
        }

        assert!(env.eval("random 0").is_err());
    }
}
