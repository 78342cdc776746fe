//! Identifier interning
//!
//! Names and strings referenced by instructions are stored once in a table
//! owned by the top-level unit. Operands carry the table index.

use rustc_hash::FxHashMap as HashMap;
use std::fmt;

/// Index into the identifier table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Table index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier table, insertion ordered
#[derive(Debug, Clone, Default)]
pub struct Interner {
    /// Map from string to symbol
    string_to_id: HashMap<String, Symbol>,
    /// Map from symbol to string
    id_to_string: Vec<String>,
}

impl Interner {
    /// Create an empty interner
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its symbol
    #[inline]
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&id) = self.string_to_id.get(s) {
            return id;
        }

        let id = Symbol(self.id_to_string.len() as u32);
        self.id_to_string.push(s.to_string());
        self.string_to_id.insert(s.to_string(), id);
        id
    }

    /// Get the symbol for a string if it's already interned
    #[inline]
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.string_to_id.get(s).copied()
    }

    /// Get the string for a symbol
    #[inline]
    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.id_to_string
            .get(symbol.index())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Number of interned strings
    pub fn len(&self) -> usize {
        self.id_to_string.len()
    }

    /// Whether nothing has been interned
    pub fn is_empty(&self) -> bool {
        self.id_to_string.is_empty()
    }

    /// All strings in symbol order
    pub fn strings(&self) -> &[String] {
        &self.id_to_string
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let mut interner = Interner::new();
        let a = interner.intern("length");
        let b = interner.intern("push");
        assert_ne!(a, b);
        assert_eq!(interner.intern("length"), a);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_insertion_order() {
        let mut interner = Interner::new();
        for name in ["x", "y", "x", "z"] {
            interner.intern(name);
        }
        assert_eq!(interner.strings(), ["x", "y", "z"]);
        assert_eq!(interner.get("z").map(Symbol::index), Some(2));
        assert_eq!(interner.resolve(interner.get("y").unwrap()), "y");
        assert!(interner.get("w").is_none());
    }
}
