//! The table of every procedure the interpreter knows about, keyed by
//! lowercase name. Calls refer to procedures by name only, so the AST never
//! holds a pointer back into this table.

use std::collections::HashMap;
use std::rc::Rc;

use crate::program_representation::Procedure;

/// Raised when a name has no table entry.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ProcedureNotFound {
    pub procedure_name: String,
}

impl std::fmt::Display for ProcedureNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "I don't know how to {}", self.procedure_name);
    }
}

#[derive(Debug, Default)]
pub struct ProcedureTable {
    procedures: HashMap<String, Rc<Procedure>>,
}

impl ProcedureTable {
    pub fn new() -> ProcedureTable {
        ProcedureTable::default()
    }

    /// Registers `procedure`, replacing any entry of the same name.
    pub fn define(&mut self, procedure: Procedure) {
        tracing::trace!(
            procedure = %procedure.name,
            arity = procedure.arity(),
            "defining procedure"
        );
        self.procedures
            .insert(procedure.name.to_lowercase(), Rc::new(procedure));
    }

    pub fn defined(&self, name: &str) -> bool {
        self.procedures.contains_key(name.to_lowercase().as_str())
    }

    pub fn lookup(&self, name: &str) -> Result<Rc<Procedure>, ProcedureNotFound> {
        match self.procedures.get(name.to_lowercase().as_str()) {
            Some(procedure) => return Ok(Rc::clone(procedure)),
            None => {
                return Err(ProcedureNotFound {
                    procedure_name: String::from(name),
                })
            }
        }
    }

    pub fn arity_of(&self, name: &str) -> Option<usize> {
        self.procedures
            .get(name.to_lowercase().as_str())
            .map(|procedure| procedure.arity())
    }

    /// Makes `alias` refer to the same table entry as `original`.
    pub fn alias(&mut self, original: &str, alias: &str) -> Result<(), ProcedureNotFound> {
        let procedure = self.lookup(original)?;
        tracing::debug!(original, alias, "aliasing procedure");
        self.procedures.insert(alias.to_lowercase(), procedure);
        return Ok(());
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.procedures.keys().map(|k| k.as_str()).collect();
        names.sort();
        return names;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_define_and_lookup_case_insensitive() {
        let mut table = ProcedureTable::new();
        table.define(Procedure::user_defined("Square", vec![String::from("size")], 1));

        assert!(table.defined("SQUARE"));
        assert_eq!(table.arity_of("square"), Some(1));
        assert_eq!(table.lookup("sQuArE").map(|p| p.arity()), Ok(1));
    }

    #[test]
    fn test_redefinition_replaces_entry() {
        let mut table = ProcedureTable::new();
        table.define(Procedure::user_defined("f", vec![], 1));
        table.define(Procedure::user_defined("f", vec![String::from("a"), String::from("b")], 4));

        assert_eq!(table.arity_of("f"), Some(2));
    }

    #[test]
    fn test_alias_shares_entry() {
        let mut table = ProcedureTable::new();
        table.define(Procedure::user_defined("greet", vec![String::from("who")], 1));

        assert_eq!(table.alias("greet", "hello"), Ok(()));

        let original = table.lookup("greet").expect("greet should exist");
        let alias = table.lookup("hello").expect("hello should exist");
        assert!(Rc::ptr_eq(&original, &alias));
        assert_eq!(table.names(), vec!["greet", "hello"]);
    }

    #[test]
    fn test_alias_of_unknown_procedure() {
        let mut table = ProcedureTable::new();

        assert_eq!(
            table.alias("nothing", "other"),
            Err(ProcedureNotFound {
                procedure_name: String::from("nothing")
            })
        );
        assert!(!table.defined("other"));
    }
}
