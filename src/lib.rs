//! This crate contains code for a small Logo interpreter: a regex lexer, an
//! arity-directed recursive descent parser and a dynamically scoped
//! evaluator with a library of builtin procedures.

pub mod builtin_procedures;
pub mod dynamic_scoping;
pub mod end_to_end;
pub mod environment;
pub mod lexical_analysis;
pub mod pretty_printing;
pub mod procedure_table;
pub mod program_execution;
pub mod program_representation;
pub mod recursive_descent_parsing;
