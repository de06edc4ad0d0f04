//! A small name -> (type, address) table consulted by the parser and
//! evaluator when an identifier resolves to a target memory location
//! rather than a bare literal.

use std::collections::HashMap;

use crate::value::ValueType;

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: ValueType,
    pub address: u64,
}

/// Resolves identifiers. Lookup by exact name and by the longest-prefix
/// match a non-terminated lexer slice needs (see `lexer.rs`).
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol.name.clone(), symbol);
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Finds a symbol whose name is a prefix of `text`, preferring the
    /// longest match. Used when the lexer hands the parser a maximal
    /// identifier slice that may itself contain a shorter known symbol.
    pub fn lookup_prefix(&self, text: &str) -> Option<&Symbol> {
        (1..=text.len())
            .rev()
            .find_map(|len| text.is_char_boundary(len).then(|| &text[..len]))
            .and_then(|prefix| self.symbols.get(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ScalarType;

    #[test]
    fn exact_lookup_finds_inserted_symbol() {
        let mut table = SymbolTable::new();
        table.insert(Symbol {
            name: "counter".into(),
            ty: ValueType::Scalar(ScalarType::S32),
            address: 0x1000,
        });
        assert_eq!(table.lookup("counter").unwrap().address, 0x1000);
        assert!(table.lookup("missing").is_none());
    }

    #[test]
    fn prefix_lookup_prefers_the_longest_match() {
        let mut table = SymbolTable::new();
        table.insert(Symbol {
            name: "hp".into(),
            ty: ValueType::Scalar(ScalarType::S32),
            address: 1,
        });
        table.insert(Symbol {
            name: "hp_max".into(),
            ty: ValueType::Scalar(ScalarType::S32),
            address: 2,
        });
        assert_eq!(table.lookup_prefix("hp_max+1").unwrap().address, 2);
        assert_eq!(table.lookup_prefix("hp+1").unwrap().address, 1);
    }
}
