//! Variables, control flow and non-local exit.

use crate::builtin_procedures::{macro_procedure, name_argument, native, ProcedureProvider};
use crate::environment::{Environment, EvalError};
use crate::program_representation::{Node, NodeType};

pub struct Control;

impl ProcedureProvider for Control {
    fn register_procedures(&self, env: &mut Environment) {
        env.define(native("alias", &["original", "alias"], alias));
        env.define(native("thing", &["name"], thing));
        env.define(macro_procedure("make", &["name", "value"], make));
        env.define(macro_procedure("local", &["name"], local));
        env.define(macro_procedure("localmake", &["name", "value"], localmake));
        env.define(macro_procedure("repeat", &["control", "block"], repeat));
        env.define(macro_procedure("run", &["block"], run));
        env.define(native("output", &["value"], output));
        env.define(native("stop", &[], stop));
        env.define(macro_procedure("if", &["condition", "iftrue"], if_expr));
        env.define(macro_procedure(
            "ifelse",
            &["condition", "iftrue", "iffalse"],
            ifelse_expr,
        ));
    }
}

// The reader already applied the alias; repeating it here covers aliases
// built from computed names.
fn alias(env: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let original = name_argument(&args[0])?;
    let alias = name_argument(&args[1])?;
    env.alias(original, alias)?;

    return Ok(Node::Nil);
}

fn thing(env: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let name = name_argument(&args[0])?;
    return Ok(env.resolve(name));
}

fn make(env: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let name = name_argument(&args[0])?;
    env.make(name, args[1].clone());

    return Ok(args[1].clone());
}

fn local(env: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let name = name_argument(&args[0])?;
    env.local(name);

    return Ok(Node::Nil);
}

fn localmake(env: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let name = name_argument(&args[0])?;
    env.local(name);
    env.make(name, args[1].clone());

    return Ok(args[1].clone());
}

// Resolves the count of a repeat. A block is run once to compute it and
// numeric words are read as integers.
fn repeat_count(env: &mut Environment, control: &Node) -> Result<i64, EvalError> {
    let value = match control {
        Node::List(_) => env.run_block(control)?,
        Node::Symbol(text) | Node::Quoted(text) => match text.parse::<i64>() {
            Ok(count) => Node::Integer(count),
            Err(_) => control.clone(),
        },
        other => other.clone(),
    };

    match value {
        Node::Integer(count) => return Ok(count),
        other => return Err(EvalError::type_mismatch(&other, &[NodeType::Integer])),
    }
}

fn repeat(env: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    let count = repeat_count(env, &args[0])?;
    let block = &args[1];

    if !matches!(block, Node::List(_)) {
        return Err(EvalError::type_mismatch(block, &[NodeType::List]));
    }

    let mut result = Node::Nil;

    for _ in 0..count {
        result = env.run_block(block)?;

        if env.exit_requested() {
            break;
        }
    }

    return Ok(result);
}

fn run(env: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    return env.run_block(&args[0]);
}

fn output(env: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    env.request_exit();
    return Ok(args[0].clone());
}

fn stop(env: &mut Environment, _: &[Node]) -> Result<Node, EvalError> {
    env.request_exit();
    return Ok(Node::Nil);
}

// Conditions must be booleans. A block condition is run first.
fn condition(env: &mut Environment, condition: &Node) -> Result<bool, EvalError> {
    let value = match condition {
        Node::List(_) => env.run_block(condition)?,
        other => other.clone(),
    };

    match value {
        Node::Boolean(flag) => return Ok(flag),
        other => return Err(EvalError::type_mismatch(&other, &[NodeType::Boolean])),
    }
}

fn if_expr(env: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    match condition(env, &args[0])? {
        true => {
            tracing::trace!("if: condition is true");
            return env.run_block(&args[1]);
        }
        false => {
            tracing::trace!("if: condition is false");
            return Ok(Node::Nil);
        }
    }
}

fn ifelse_expr(env: &mut Environment, args: &[Node]) -> Result<Node, EvalError> {
    match condition(env, &args[0])? {
        true => return env.run_block(&args[1]),
        false => return env.run_block(&args[2]),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::builtin_procedures::test_environment;

    use super::*;

    #[test]
    fn test_make_with_quote_symbol_and_reference_names() {
        let (mut env, _) = test_environment(&[]);

        env.eval("make \"testit \"someval").expect("eval returned unexpected error");
        env.eval("make \"name \"testvar\nmake :name \"one")
            .expect("eval returned unexpected error");
        env.eval("make varone \"test").expect("eval returned unexpected error");

        assert_eq!(env.resolve("testit"), Node::Quoted(String::from("someval")));
        assert_eq!(env.resolve("testvar"), Node::Quoted(String::from("one")));
        assert_eq!(env.resolve("varone"), Node::Quoted(String::from("test")));
    }

    // Test if blocks run by repeat, if and run write to the caller's scope.
    #[test]
    fn test_block_scope() {
        let (mut env, output) = test_environment(&[]);

        env.eval("make \"count 1\nrepeat :count [make \"fromrepeat \"yes]")
            .expect("eval returned unexpected error");
        env.eval("if true [make \"fromif \"yes]")
            .expect("eval returned unexpected error");
        let result = env
            .eval("run [make \"fromrun \"yes]\nprint :fromrun")
            .expect("eval returned unexpected error");

        assert_eq!(result, Node::Nil);
        assert_eq!(env.resolve("fromrepeat"), Node::Quoted(String::from("yes")));
        assert_eq!(env.resolve("fromif"), Node::Quoted(String::from("yes")));
        assert_eq!(output.borrow().outputs, vec![String::from("yes\n")]);
    }

    #[test]
    fn test_run_returns_block_value() {
        let (mut env, _) = test_environment(&[]);

        assert_eq!(env.eval("run [3 + 2]"), Ok(Node::Integer(5)));
    }

    #[test]
    fn test_repeat_counts() {
        let (mut env, output) = test_environment(&[]);

        assert_eq!(env.eval("repeat 0 [print 1]"), Ok(Node::Nil));
        assert_eq!(env.eval("repeat [1 + 1] [print 2]"), Ok(Node::Nil));
        assert_eq!(
            output.borrow().outputs,
            vec![String::from("2\n"), String::from("2\n")]
        );

        assert_eq!(
            env.eval("repeat \"many [print 3]"),
            Err(EvalError::NodeTypeMismatch {
                node: String::from("\"many"),
                found: NodeType::Quote,
                expected: vec![NodeType::Integer],
            })
        );
    }

    // Test the result of repeat is the last block result.
    #[test]
    fn test_repeat_result() {
        let (mut env, _) = test_environment(&[]);

        assert_eq!(
            env.eval("make \"x 0\nrepeat 4 [make \"x :x + 2]"),
            Ok(Node::Integer(8))
        );
    }

    #[test]
    fn test_if_conditions() {
        let (mut env, output) = test_environment(&[]);

        env.eval("if 3 > 2 [print \"Yes]").expect("eval returned unexpected error");
        assert_eq!(env.eval("if 3 < 2 [print \"No]"), Ok(Node::Nil));
        env.eval("make \"testvar 3 > 2\nif :testvar [print \"Again]")
            .expect("eval returned unexpected error");
        env.eval("if [1 = 1] [print \"Block]").expect("eval returned unexpected error");

        assert_eq!(
            output.borrow().outputs,
            vec![
                String::from("Yes\n"),
                String::from("Again\n"),
                String::from("Block\n")
            ]
        );
    }

    #[test]
    fn test_if_requires_boolean() {
        let (mut env, _) = test_environment(&[]);

        assert_eq!(
            env.eval("if 1 [print \"Yes]"),
            Err(EvalError::NodeTypeMismatch {
                node: String::from("1"),
                found: NodeType::Integer,
                expected: vec![NodeType::Boolean],
            })
        );
    }

    #[test]
    fn test_ifelse() {
        let (mut env, _) = test_environment(&[]);

        assert_eq!(
            env.eval("ifelse 3 > 2 [output Yes] [output No]"),
            Ok(Node::Symbol(String::from("Yes")))
        );
        assert_eq!(
            env.eval("ifelse false [output Yes] [output No]"),
            Ok(Node::Symbol(String::from("No")))
        );
        assert_eq!(
            env.eval("make \"yes \"Yes\nmake \"no \"No\nifelse 3 < 2 [output :yes] [output :no]"),
            Ok(Node::Quoted(String::from("No")))
        );
    }

    #[test]
    fn test_thing() {
        let (mut env, output) = test_environment(&[]);

        env.eval("make \"testvar \"Hello!\n\nprint thing \"testvar")
            .expect("eval returned unexpected error");

        assert_eq!(output.borrow().outputs, vec![String::from("Hello!\n")]);
    }

    #[test]
    fn test_localmake() {
        let (mut env, output) = test_environment(&[]);
        let program_str = concat!(
            "make \"testvar \"Bye!\n",
            "to testfun\nlocalmake \"testvar \"Hello!\nprint :testvar\nend\n",
            "testfun\nprint :testvar",
        );

        env.eval(program_str).expect("eval returned unexpected error");

        assert_eq!(
            output.borrow().outputs,
            vec![String::from("Hello!\n"), String::from("Bye!\n")]
        );
    }

    // Test if output inside a repeat body stops the loop and the procedure.
    #[test]
    fn test_output_inside_repeat() {
        let (mut env, output) = test_environment(&[]);
        let program_str = concat!(
            "to firstbig\nrepeat 10 [print 1 output \"done]\nprint \"unreachable\nend\n",
            "firstbig",
        );

        assert_eq!(env.eval(program_str), Ok(Node::Quoted(String::from("done"))));
        assert_eq!(output.borrow().outputs, vec![String::from("1\n")]);
    }

    #[test]
    fn test_runtime_alias() {
        let (mut env, output) = test_environment(&[]);

        env.eval("make \"target \"echo\nalias \"print :target")
            .expect("eval returned unexpected error");
        assert!(env.procedures().defined("echo"));

        env.eval("echo \"hi").expect("eval returned unexpected error");

        assert_eq!(output.borrow().outputs, vec![String::from("hi\n")]);
    }
}
