use std::{collections::HashMap, fmt};

use indexmap::IndexSet;

use super::{END_MARK, EPSILON};

/// A grammar symbol. `Epsilon` and `EndMarker` are their own variants so that
/// no terminal spelled `ε` or `$` can ever be mistaken for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(String),
    NonTerminal(String),
    Epsilon,
    EndMarker,
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(name) | Symbol::NonTerminal(name) => name.as_str(),
            Symbol::Epsilon => EPSILON,
            Symbol::EndMarker => END_MARK,
        }
    }

    pub fn non_terminal(&self) -> Option<&str> {
        match self {
            Symbol::NonTerminal(name) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind recorded for every named symbol when the grammar is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Terminal,
    NonTerminal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub left: String,
    pub right: Vec<Symbol>,
}

impl Production {
    pub fn new(left: impl Into<String>, right: Vec<Symbol>) -> Self {
        Self {
            left: left.into(),
            right,
        }
    }

    pub fn is_epsilon(&self) -> bool {
        self.right == [Symbol::Epsilon]
    }

    /// Right-hand side without the epsilon marker: empty for `A -> ε`.
    pub fn symbols(&self) -> &[Symbol] {
        if self.is_epsilon() {
            &[]
        } else {
            &self.right
        }
    }

    pub fn is_left_recursive(&self) -> bool {
        self.right.first().and_then(|s| s.non_terminal()) == Some(self.left.as_str())
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.left)?;
        for symbol in &self.right {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

/// A validated context-free grammar. Built by the loader in `parse.rs` and
/// never mutated afterwards; every analysis derives fresh values from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    start_symbol: String,
    non_terminals: IndexSet<String>,
    terminals: IndexSet<String>,
    productions: Vec<Production>,
    symbol_table: HashMap<String, SymbolKind>,
}

impl Grammar {
    /// Collects the declared symbols of already validated productions.
    pub(crate) fn assemble(start_symbol: String, productions: Vec<Production>) -> Self {
        let non_terminals: IndexSet<String> =
            productions.iter().map(|p| p.left.clone()).collect();
        let terminals: IndexSet<String> = productions
            .iter()
            .flat_map(|p| p.right.iter())
            .filter_map(|s| match s {
                Symbol::Terminal(name) => Some(name.clone()),
                _ => None,
            })
            .collect();

        let symbol_table = non_terminals
            .iter()
            .map(|nt| (nt.clone(), SymbolKind::NonTerminal))
            .chain(terminals.iter().map(|t| (t.clone(), SymbolKind::Terminal)))
            .collect();

        Self {
            start_symbol,
            non_terminals,
            terminals,
            productions,
            symbol_table,
        }
    }

    pub fn start_symbol(&self) -> &str {
        &self.start_symbol
    }

    pub fn start(&self) -> Symbol {
        Symbol::NonTerminal(self.start_symbol.clone())
    }

    pub fn terminal_iter(&self) -> impl Iterator<Item = &String> {
        self.terminals.iter()
    }

    pub fn non_terminal_iter(&self) -> impl Iterator<Item = &String> {
        self.non_terminals.iter()
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, index: usize) -> Option<&Production> {
        self.productions.get(index)
    }

    /// Productions of `left` together with their index, in declared order.
    pub fn productions_of<'a>(
        &'a self,
        left: &'a str,
    ) -> impl Iterator<Item = (usize, &'a Production)> + 'a {
        self.productions
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.left == left)
    }

    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        self.symbol_table.get(name).copied()
    }

    pub fn get_symbol_prime_name(&self, mut name: String) -> String {
        while self.symbol_table.contains_key(&name) {
            name.push('\'');
        }
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn production_display_renders_epsilon() {
        let p = Production::new("S", vec![Symbol::Epsilon]);
        assert!(p.is_epsilon());
        assert!(p.symbols().is_empty());
        assert_eq!(p.to_string(), "S -> ε");
    }

    #[test]
    fn left_recursion_is_detected_on_first_symbol() {
        let p = Production::new(
            "E",
            vec![
                Symbol::NonTerminal("E".to_string()),
                Symbol::Terminal("+".to_string()),
            ],
        );
        assert!(p.is_left_recursive());
        assert_eq!(p.to_string(), "E -> E +");
    }

    #[test]
    fn special_symbols_never_equal_terminals() {
        assert_ne!(Symbol::Terminal(EPSILON.to_string()), Symbol::Epsilon);
        assert_ne!(Symbol::Terminal(END_MARK.to_string()), Symbol::EndMarker);
        assert_eq!(Symbol::EndMarker.to_string(), "$");
    }
}
