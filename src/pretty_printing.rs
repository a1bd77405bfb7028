//! Renders a parsed program as an indented tree without running it.

use crate::environment::{Environment, EvalError};
use crate::lexical_analysis::run_lexical_analysis;
use crate::program_representation::{Node, ProcedureBody};
use crate::recursive_descent_parsing::Reader;

const INDENT: &str = "  ";

// Helper function to append the tree of one statement, one node per line.
fn node_to_tree_helper(node: &Node, depth: usize, string_so_far: &mut String) {
    let indent = INDENT.repeat(depth);

    match node {
        Node::Call(call) => {
            string_so_far.push_str(format!("{}{}/{} =>\n", indent, call.name, call.arity).as_str());

            for arg in &call.args {
                node_to_tree_helper(arg, depth + 1, string_so_far);
            }
        }

        Node::Procedure(procedure) => {
            string_so_far.push_str(format!("{}{}\n", indent, procedure.header()).as_str());

            if let ProcedureBody::UserDefined(statements) = &procedure.body {
                for statement in statements.iter() {
                    node_to_tree_helper(statement, depth + 1, string_so_far);
                }
            }

            string_so_far.push_str(format!("{}end\n", indent).as_str());
        }

        other => {
            string_so_far.push_str(format!("{}{}\n", indent, other.to_source()).as_str());
        }
    }
}

/// Converts a statement to its indented tree form.
pub fn node_to_tree(node: &Node) -> String {
    let mut out_string = String::new();
    node_to_tree_helper(node, 0, &mut out_string);
    return out_string;
}

impl Environment {
    /// Parses `source` against the procedures known so far and renders
    /// every definition and statement. Nothing is evaluated, but the
    /// definitions are registered.
    pub fn pretty(&mut self, source: &str) -> Result<String, EvalError> {
        let tokens = run_lexical_analysis(source, true);
        let statements = Reader::new(&tokens, &mut self.procedures).parse(true)?;

        return Ok(statements.iter().map(node_to_tree).collect::<Vec<String>>().concat());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::builtin_procedures::test_environment;

    use super::*;

    #[test]
    fn test_call_tree() {
        let (mut env, output) = test_environment(&[]);

        let generated_output = env
            .pretty("print 2 + 3 * 4")
            .expect("pretty returned unexpected error");

        assert_eq!(
            generated_output,
            "print/1 =>\n  add/2 =>\n    2\n    mul/2 =>\n      3\n      4\n"
        );
        assert!(output.borrow().outputs.is_empty());
    }

    #[test]
    fn test_procedure_definition() {
        let (mut env, _) = test_environment(&[]);

        let generated_output = env
            .pretty("to square :x\noutput :x * :x\nend\nprint square 3")
            .expect("pretty returned unexpected error");

        assert_eq!(
            generated_output,
            concat!(
                "to square :x\n",
                "  output/1 =>\n",
                "    mul/2 =>\n",
                "      :x\n",
                "      :x\n",
                "end\n",
                "print/1 =>\n",
                "  square/1 =>\n",
                "    3\n",
            )
        );
        assert!(env.procedures().defined("square"));
    }

    // Test if lists and words keep their source spelling.
    #[test]
    fn test_leaves() {
        let (mut env, _) = test_environment(&[]);

        let generated_output = env
            .pretty("(print \"a [b [c]] 1.0)")
            .expect("pretty returned unexpected error");

        assert_eq!(generated_output, "print/1 =>\n  \"a\n  [b [c]]\n  1.0\n");
    }

    #[test]
    fn test_parse_error() {
        let (mut env, _) = test_environment(&[]);

        assert!(matches!(
            env.pretty("to broken\nprint 1"),
            Err(EvalError::Parse(_))
        ));
    }
}
