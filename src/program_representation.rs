//! Data structures that represent Logo programs: words, lists, procedure
//! calls and procedure definitions, plus the two ways of rendering them
//! (print form and source form).

use std::rc::Rc;

use crate::environment::{Environment, EvalError};

/// Host function backing a native or macro procedure. It receives the
/// environment (whose top scope is the caller's, or the procedure's own
/// frame for non-macros) and the already evaluated argument list.
pub type NativeFn = Rc<dyn Fn(&mut Environment, &[Node]) -> Result<Node, EvalError>>;

/// Discriminant of a `Node`, used in type mismatch errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NodeType {
    Integer,
    Float,
    Boolean,
    Nil,
    None,
    Quote,
    Symbol,
    Reference,
    List,
    Call,
    Procedure,
}

/// Represents a Logo AST node. A `List` doubles as literal data and as a
/// deferred block; evaluating it returns it untouched.
#[derive(Debug, PartialEq, Clone)]
pub enum Node {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Nil,
    None,
    Quoted(String),
    Symbol(String),
    Reference(String),
    List(Vec<Node>),
    Call(Call),
    Procedure(Rc<Procedure>),
}

/// Represents a procedure invocation. `arity` is the callee's declared
/// arity at parse time; `args` may hold more or fewer expressions when the
/// call was written in parenthesized form.
#[derive(Debug, PartialEq, Clone)]
pub struct Call {
    pub name: String,
    pub arity: usize,
    pub args: Vec<Node>,
    pub parenthesized: bool,
}

/// How a procedure runs when dispatched.
#[derive(Clone)]
pub enum ProcedureBody {
    Native(NativeFn),
    Macro(NativeFn),
    UserDefined(Rc<Vec<Node>>),
}

/// Represents an entry of the procedure table.
#[derive(Clone, Debug, PartialEq)]
pub struct Procedure {
    pub name: String,
    pub params: Vec<String>,
    pub body: ProcedureBody,
    pub source: Option<String>,
    pub line_num: Option<usize>,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Integer(_) => NodeType::Integer,
            Node::Float(_) => NodeType::Float,
            Node::Boolean(_) => NodeType::Boolean,
            Node::Nil => NodeType::Nil,
            Node::None => NodeType::None,
            Node::Quoted(_) => NodeType::Quote,
            Node::Symbol(_) => NodeType::Symbol,
            Node::Reference(_) => NodeType::Reference,
            Node::List(_) => NodeType::List,
            Node::Call(_) => NodeType::Call,
            Node::Procedure(_) => NodeType::Procedure,
        }
    }

    /// Renders the node back into text the lexer reads as the same node.
    /// Used when a deferred block is re-entered.
    pub fn to_source(&self) -> String {
        match self {
            Node::Quoted(word) => format!("\"{}", word),
            Node::Reference(name) => format!(":{}", name),
            Node::List(children) => format!("[{}]", render_block(children)),
            Node::Procedure(procedure) => procedure.name.clone(),
            other => other.to_string(),
        }
    }

    /// Text of a word usable as a variable or procedure name.
    pub fn word_text(&self) -> Option<&str> {
        match self {
            Node::Quoted(word) | Node::Symbol(word) => Some(word.as_str()),
            _ => None,
        }
    }
}

/// Renders the children of a deferred block as source text, separated by
/// single spaces.
pub fn render_block(children: &[Node]) -> String {
    children
        .iter()
        .map(|child| child.to_source())
        .collect::<Vec<String>>()
        .join(" ")
}

// Floats always keep a decimal point so that printing and re-lexing agree.
fn float_to_string(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        return format!("{:.1}", value);
    }
    return format!("{}", value);
}

/// Print form of a node, as `show` displays it.
impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Integer(value) => write!(f, "{}", value),
            Node::Float(value) => write!(f, "{}", float_to_string(*value)),
            Node::Boolean(value) => write!(f, "{}", value),
            Node::Nil => write!(f, "nil"),
            Node::None => write!(f, "none"),
            Node::Quoted(word) => write!(f, "{}", word),
            Node::Symbol(symbol) => write!(f, "{}", symbol),
            Node::Reference(name) => write!(f, ":{}", name),
            Node::List(children) => {
                let rendered: Vec<String> = children.iter().map(|c| c.to_string()).collect();
                write!(f, "[{}]", rendered.join(" "))
            }
            Node::Call(call) => write!(f, "{}", call),
            Node::Procedure(procedure) => write!(f, "{}", procedure.header()),
        }
    }
}

impl std::fmt::Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.parenthesized {
            write!(f, "(")?;
        }
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if self.parenthesized {
            write!(f, ")")?;
        }
        return Ok(());
    }
}

impl Call {
    pub fn new(name: &str, arity: usize, args: Vec<Node>) -> Call {
        Call {
            name: name.to_lowercase(),
            arity,
            args,
            parenthesized: false,
        }
    }
}

impl Procedure {
    /// A procedure implemented by the host, run in its own scope frame.
    pub fn native(name: &str, params: &[&str], native_fn: NativeFn) -> Procedure {
        Procedure {
            name: name.to_lowercase(),
            params: params.iter().map(|p| p.to_string()).collect(),
            body: ProcedureBody::Native(native_fn),
            source: None,
            line_num: None,
        }
    }

    /// A host procedure run without a scope frame of its own.
    pub fn macro_procedure(name: &str, params: &[&str], native_fn: NativeFn) -> Procedure {
        let mut procedure = Procedure::native(name, params, Rc::clone(&native_fn));
        procedure.body = ProcedureBody::Macro(native_fn);
        return procedure;
    }

    /// A user procedure as registered by the header pass: parameters known,
    /// body still empty.
    pub fn user_defined(name: &str, params: Vec<String>, line_num: usize) -> Procedure {
        Procedure {
            name: name.to_lowercase(),
            params,
            body: ProcedureBody::UserDefined(Rc::new(Vec::new())),
            source: None,
            line_num: Some(line_num),
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_macro(&self) -> bool {
        matches!(self.body, ProcedureBody::Macro(_))
    }

    pub fn is_native(&self) -> bool {
        !matches!(self.body, ProcedureBody::UserDefined(_))
    }

    /// `to name :p1 :p2` header line.
    pub fn header(&self) -> String {
        let mut out = format!("to {}", self.name);
        for param in &self.params {
            out.push_str(format!(" :{}", param).as_str());
        }
        return out;
    }
}

impl std::fmt::Debug for ProcedureBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcedureBody::Native(_) => write!(f, "Native"),
            ProcedureBody::Macro(_) => write!(f, "Macro"),
            ProcedureBody::UserDefined(statements) => {
                f.debug_tuple("UserDefined").field(statements).finish()
            }
        }
    }
}

// Host functions compare by identity, user bodies structurally.
impl PartialEq for ProcedureBody {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ProcedureBody::Native(a), ProcedureBody::Native(b)) => Rc::ptr_eq(a, b),
            (ProcedureBody::Macro(a), ProcedureBody::Macro(b)) => Rc::ptr_eq(a, b),
            (ProcedureBody::UserDefined(a), ProcedureBody::UserDefined(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_print_form() {
        let list = Node::List(vec![
            Node::Symbol(String::from("a")),
            Node::Quoted(String::from("b")),
            Node::List(vec![Node::Integer(3), Node::Float(2.0)]),
        ]);

        assert_eq!(list.to_string(), "[a b [3 2.0]]");
        assert_eq!(Node::Float(2.5).to_string(), "2.5");
        assert_eq!(Node::Boolean(true).to_string(), "true");
        assert_eq!(Node::Nil.to_string(), "nil");
    }

    // Test that the source form keeps quotes, references and brackets.
    #[test]
    fn test_source_form() {
        let block = vec![
            Node::Symbol(String::from("make")),
            Node::Quoted(String::from("x")),
            Node::Reference(String::from("x")),
            Node::Symbol(String::from("+")),
            Node::Integer(1),
            Node::List(vec![Node::Float(3.0)]),
        ];

        assert_eq!(render_block(&block), "make \"x :x + 1 [3.0]");
    }

    // Test if only calls written in parenthesized form print with parens.
    #[test]
    fn test_call_display() {
        let mut inner = Call::new("mul", 2, vec![Node::Integer(3), Node::Integer(4)]);
        inner.parenthesized = true;
        let mut call = Call::new("ADD", 2, vec![Node::Integer(2), Node::Call(inner)]);

        assert_eq!(call.name, "add");
        assert_eq!(call.to_string(), "add 2 (mul 3 4)");

        call.parenthesized = true;
        assert_eq!(call.to_string(), "(add 2 (mul 3 4))");
    }

    #[test]
    fn test_procedure_kinds() {
        let native_fn: NativeFn = Rc::new(|_: &mut Environment, _: &[Node]| Ok(Node::Nil));
        let native = Procedure::native("print", &["output"], Rc::clone(&native_fn));
        let macro_procedure = Procedure::macro_procedure("run", &["block"], native_fn);
        let user = Procedure::user_defined("Square", vec![String::from("size")], 1);

        assert!(native.is_native() && !native.is_macro());
        assert!(macro_procedure.is_native() && macro_procedure.is_macro());
        assert!(!user.is_native());
        assert_eq!(user.arity(), 1);
        assert_eq!(user.header(), "to square :size");
    }
}
