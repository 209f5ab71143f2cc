//! Scoped symbol table: a stack of name -> symbol maps.
use std::collections::HashMap;

use crate::ast::Type;

/// Opaque storage handle given out at declaration time. Allocated from a
/// per-table monotonic counter, so it is unique for the table's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol<'source> {
    pub name: &'source str,
    pub ty: Type,
    pub slot: Slot,
}

/// Attempted to declare a name that already lives in the innermost scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redeclared;

/// One fresh table is built per compilation run; nothing survives across
/// runs. Scope discipline is the caller's contract: `exit_scope` without a
/// matching `enter_scope` is a bug in the traversal, not a user error, and
/// panics.
#[derive(Debug, Default)]
pub struct SymbolTable<'source> {
    scopes: Vec<HashMap<&'source str, Symbol<'source>>>,
    next_slot: usize,
}

impl<'source> SymbolTable<'source> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        self.scopes
            .pop()
            .expect("scope underflow: exit_scope without a matching enter_scope");
    }

    pub fn declare(&mut self, name: &'source str, ty: Type) -> Result<Symbol<'source>, Redeclared> {
        let scope = self
            .scopes
            .last_mut()
            .expect("declare called with no open scope");
        if scope.contains_key(name) {
            return Err(Redeclared);
        }
        let symbol = Symbol {
            name,
            ty,
            slot: Slot(self.next_slot),
        };
        self.next_slot += 1;
        scope.insert(name, symbol);
        Ok(symbol)
    }

    /// Innermost-to-outermost lookup.
    pub fn resolve(&self, name: &str) -> Option<Symbol<'source>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .copied()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_searches_outer_scopes() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.declare("idade", Type::Int).unwrap();
        table.enter_scope();
        let symbol = table.resolve("idade").expect("visible from inner scope");
        assert_eq!(symbol.ty, Type::Int);
        table.exit_scope();
        table.exit_scope();
    }

    #[test]
    fn symbols_die_with_their_scope() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.enter_scope();
        table.declare("tmp", Type::Bool).unwrap();
        table.exit_scope();
        assert_eq!(table.resolve("tmp"), None);
    }

    #[test]
    fn redeclaration_is_rejected_but_shadowing_is_not() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.declare("x", Type::Int).unwrap();
        assert_eq!(table.declare("x", Type::Bool), Err(Redeclared));
        table.enter_scope();
        let inner = table.declare("x", Type::Bool).expect("shadowing is fine");
        assert_eq!(table.resolve("x"), Some(inner));
    }

    #[test]
    fn slots_are_never_reused() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        let a = table.declare("a", Type::Int).unwrap().slot;
        table.enter_scope();
        let b = table.declare("b", Type::Int).unwrap().slot;
        table.exit_scope();
        let c = table.declare("c", Type::Int).unwrap().slot;
        assert!(a != b && b != c && a != c);
    }

    #[test]
    #[should_panic(expected = "scope underflow")]
    fn unbalanced_exit_is_a_contract_violation() {
        let mut table = SymbolTable::new();
        table.exit_scope();
    }
}
