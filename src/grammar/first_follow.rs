use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::debug;

use super::{grammar::Symbol, Grammar};

/// FIRST(A) for every nonterminal. Sets hold terminals and possibly `ε`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FirstSets(IndexMap<String, BTreeSet<Symbol>>);

impl FirstSets {
    pub fn get(&self, non_terminal: &str) -> Option<&BTreeSet<Symbol>> {
        self.0.get(non_terminal)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<Symbol>)> {
        self.0.iter()
    }

    pub fn is_nullable(&self, non_terminal: &str) -> bool {
        self.get(non_terminal)
            .map_or(false, |first| first.contains(&Symbol::Epsilon))
    }

    pub fn of_symbol(&self, symbol: &Symbol) -> BTreeSet<Symbol> {
        match symbol {
            Symbol::NonTerminal(name) => self.get(name).cloned().unwrap_or_default(),
            other => BTreeSet::from([other.clone()]),
        }
    }

    /// FIRST of a symbol string. Contains `ε` iff every symbol is nullable,
    /// which includes the empty string and `[ε]`.
    pub fn of_sequence(&self, symbols: &[Symbol]) -> BTreeSet<Symbol> {
        let mut first = BTreeSet::new();
        for symbol in symbols {
            if *symbol == Symbol::Epsilon {
                continue;
            }
            let symbol_first = self.of_symbol(symbol);
            let nullable = symbol_first.contains(&Symbol::Epsilon);
            first.extend(symbol_first.into_iter().filter(|s| *s != Symbol::Epsilon));
            if !nullable {
                return first;
            }
        }
        first.insert(Symbol::Epsilon);
        first
    }
}

/// FOLLOW(A) for every nonterminal. Sets hold terminals and possibly `$`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FollowSets(IndexMap<String, BTreeSet<Symbol>>);

impl FollowSets {
    pub fn get(&self, non_terminal: &str) -> Option<&BTreeSet<Symbol>> {
        self.0.get(non_terminal)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<Symbol>)> {
        self.0.iter()
    }
}

impl Grammar {
    fn empty_sets(&self) -> IndexMap<String, BTreeSet<Symbol>> {
        self.non_terminal_iter()
            .map(|nt| (nt.clone(), BTreeSet::new()))
            .collect()
    }

    pub fn compute_first(&self) -> FirstSets {
        let mut first = FirstSets(self.empty_sets());

        let mut passes = 0;
        loop {
            passes += 1;
            let snapshot = first.clone();
            for production in self.productions() {
                let addition = snapshot.of_sequence(&production.right);
                if let Some(set) = first.0.get_mut(&production.left) {
                    set.extend(addition);
                }
            }
            if first == snapshot {
                break;
            }
        }

        debug!("FIRST sets converged after {} passes", passes);
        first
    }

    pub fn compute_follow(&self, first: &FirstSets) -> FollowSets {
        let mut follow = FollowSets(self.empty_sets());
        if let Some(set) = follow.0.get_mut(self.start_symbol()) {
            set.insert(Symbol::EndMarker);
        }

        let mut passes = 0;
        loop {
            passes += 1;
            let snapshot = follow.clone();
            for production in self.productions() {
                for (i, symbol) in production.right.iter().enumerate() {
                    let b = match symbol.non_terminal() {
                        Some(b) => b,
                        None => continue,
                    };

                    let rest = first.of_sequence(&production.right[i + 1..]);
                    let mut addition: BTreeSet<Symbol> = rest
                        .iter()
                        .filter(|s| **s != Symbol::Epsilon)
                        .cloned()
                        .collect();
                    if rest.contains(&Symbol::Epsilon) {
                        if let Some(left_follow) = snapshot.get(&production.left) {
                            addition.extend(left_follow.iter().cloned());
                        }
                    }

                    if let Some(set) = follow.0.get_mut(b) {
                        set.extend(addition);
                    }
                }
            }
            if follow == snapshot {
                break;
            }
        }

        debug!("FOLLOW sets converged after {} passes", passes);
        follow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn t(name: &str) -> Symbol {
        Symbol::Terminal(name.to_string())
    }

    fn set(symbols: &[Symbol]) -> BTreeSet<Symbol> {
        symbols.iter().cloned().collect()
    }

    const EXPRESSION: &str = "E -> T E'
E' -> + T E' | ε
T -> F T'
T' -> * F T' | ε
F -> ( E ) | id";

    #[test]
    fn balanced_first_follow() {
        let g = Grammar::parse("S -> a S b | ε").unwrap();
        let first = g.compute_first();
        let follow = g.compute_follow(&first);
        assert_eq!(first.get("S"), Some(&set(&[t("a"), Symbol::Epsilon])));
        assert_eq!(follow.get("S"), Some(&set(&[t("b"), Symbol::EndMarker])));
    }

    #[test]
    fn expression_grammar() {
        let g = Grammar::parse(EXPRESSION).unwrap();
        let first = g.compute_first();
        let follow = g.compute_follow(&first);

        assert_eq!(first.get("E"), Some(&set(&[t("("), t("id")])));
        assert_eq!(first.get("E'"), Some(&set(&[t("+"), Symbol::Epsilon])));
        assert_eq!(first.get("T'"), Some(&set(&[t("*"), Symbol::Epsilon])));

        assert_eq!(follow.get("E"), Some(&set(&[t(")"), Symbol::EndMarker])));
        assert_eq!(follow.get("E'"), Some(&set(&[t(")"), Symbol::EndMarker])));
        assert_eq!(
            follow.get("T"),
            Some(&set(&[t("+"), t(")"), Symbol::EndMarker]))
        );
        assert_eq!(
            follow.get("F"),
            Some(&set(&[t("+"), t("*"), t(")"), Symbol::EndMarker]))
        );
    }

    #[test]
    fn nullable_chain_propagates() {
        let g = Grammar::parse("S -> A B c\nA -> a | ε\nB -> b | ε").unwrap();
        let first = g.compute_first();
        let follow = g.compute_follow(&first);
        assert_eq!(first.get("S"), Some(&set(&[t("a"), t("b"), t("c")])));
        assert_eq!(follow.get("A"), Some(&set(&[t("b"), t("c")])));
        assert_eq!(follow.get("B"), Some(&set(&[t("c")])));
        assert!(first.is_nullable("A"));
        assert!(!first.is_nullable("S"));
    }

    #[test]
    fn sets_never_hold_non_terminals() {
        for text in [EXPRESSION, "S -> A S | ε\nA -> A a | b", "S -> S S | ( S ) | ε"] {
            let g = Grammar::parse(text).unwrap();
            let first = g.compute_first();
            let follow = g.compute_follow(&first);
            for (_, symbols) in first.iter() {
                assert!(symbols.iter().all(|s| s.non_terminal().is_none()));
                assert!(!symbols.contains(&Symbol::EndMarker));
            }
            for (_, symbols) in follow.iter() {
                assert!(symbols.iter().all(|s| s.non_terminal().is_none()));
                assert!(!symbols.contains(&Symbol::Epsilon));
            }
        }
    }

    #[test]
    fn recomputation_is_idempotent() {
        let g = Grammar::parse(EXPRESSION).unwrap();
        let first = g.compute_first();
        assert_eq!(first, g.compute_first());
        assert_eq!(g.compute_follow(&first), g.compute_follow(&first));
    }

    #[test]
    fn sequence_first() {
        let g = Grammar::parse("S -> A b\nA -> a | ε").unwrap();
        let first = g.compute_first();
        assert_eq!(first.of_sequence(&[]), set(&[Symbol::Epsilon]));
        assert_eq!(first.of_sequence(&[Symbol::Epsilon]), set(&[Symbol::Epsilon]));
        assert_eq!(
            first.of_sequence(&g.productions()[0].right),
            set(&[t("a"), t("b")])
        );
    }
}
