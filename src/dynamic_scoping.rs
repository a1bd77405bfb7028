//! Scope frames and the dynamic scope stack. Variable lookup and assignment
//! walk the live call stack from the innermost frame down to the global
//! frame; names are case-insensitive.

use std::collections::HashMap;

use crate::program_representation::Node;

/// Name of the permanent bottom frame.
pub const GLOBAL_SCOPE_NAME: &str = "global";

/// One activation record.
#[derive(Debug, Clone)]
pub struct Scope {
    scope_name: String,
    members: HashMap<String, Node>,
}

impl Scope {
    pub fn new(scope_name: &str) -> Scope {
        Scope {
            scope_name: String::from(scope_name),
            members: HashMap::new(),
        }
    }

    pub fn scope_name(&self) -> &str {
        self.scope_name.as_str()
    }

    pub fn define(&mut self, name: &str, value: Node) {
        self.members.insert(name.to_lowercase(), value);
    }

    /// Reserves `name` in this frame with a `none` placeholder.
    pub fn local(&mut self, name: &str) {
        self.members.insert(name.to_lowercase(), Node::None);
    }

    pub fn defined(&self, name: &str) -> bool {
        self.members.contains_key(name.to_lowercase().as_str())
    }

    pub fn resolve(&self, name: &str) -> Node {
        match self.members.get(name.to_lowercase().as_str()) {
            Some(value) => value.clone(),
            None => Node::None,
        }
    }
}

/// Stack of scope frames. The global frame sits at index 0 and is never
/// popped.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<Scope>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        ScopeStack::new()
    }
}

impl ScopeStack {
    pub fn new() -> ScopeStack {
        ScopeStack {
            frames: vec![Scope::new(GLOBAL_SCOPE_NAME)],
        }
    }

    pub fn push(&mut self, scope: Scope) {
        tracing::trace!(scope = scope.scope_name(), depth = self.frames.len() + 1, "push scope");
        self.frames.push(scope);
    }

    /// Pops the innermost frame. Returns `None` instead of removing the
    /// global frame.
    pub fn pop(&mut self) -> Option<Scope> {
        if self.frames.len() <= 1 {
            return None;
        }
        let scope = self.frames.pop();
        if let Some(popped) = &scope {
            tracing::trace!(scope = popped.scope_name(), "pop scope");
        }
        return scope;
    }

    pub fn peek(&self) -> &Scope {
        self.frames
            .last()
            .expect("scope stack always holds the global frame")
    }

    pub fn global(&self) -> &Scope {
        &self.frames[0]
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Assigns `value` to the innermost frame that already defines `name`,
    /// or creates the binding in the global frame.
    pub fn make(&mut self, name: &str, value: Node) {
        let target = self
            .frames
            .iter()
            .rposition(|scope| scope.defined(name))
            .unwrap_or(0);

        tracing::debug!(
            variable = name,
            scope = self.frames[target].scope_name(),
            "defining variable"
        );
        self.frames[target].define(name, value);
    }

    /// Shadows `name` in the innermost frame.
    pub fn local(&mut self, name: &str) {
        let last = self.frames.len() - 1;
        tracing::debug!(
            variable = name,
            scope = self.frames[last].scope_name(),
            "reserving local variable"
        );
        self.frames[last].local(name);
    }

    /// Value bound to `name` in the innermost defining frame, or `none`.
    pub fn resolve(&self, name: &str) -> Node {
        match self.frames.iter().rev().find(|scope| scope.defined(name)) {
            Some(scope) => scope.resolve(name),
            None => Node::None,
        }
    }

    pub fn resolveable(&self, name: &str) -> bool {
        self.frames.iter().any(|scope| scope.defined(name))
    }
}
