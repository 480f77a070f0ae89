use std::collections::HashSet;

use indexmap::IndexMap;

use super::{
    grammar::{Production, Symbol},
    Grammar,
};

impl Grammar {
    /// Removes direct and indirect left recursion, processing nonterminals in
    /// declared order. `A -> A α | β` becomes `A -> β A'` and
    /// `A' -> α A' | ε`. Assumes the grammar has no cycles `A =>+ A`.
    pub fn eliminate_left_recursion(&self) -> Grammar {
        let order: Vec<String> = self.non_terminal_iter().cloned().collect();
        let mut rules: IndexMap<String, Vec<Vec<Symbol>>> =
            order.iter().map(|nt| (nt.clone(), Vec::new())).collect();
        for production in self.productions() {
            if let Some(rights) = rules.get_mut(&production.left) {
                rights.push(production.symbols().to_vec());
            }
        }

        let mut taken: HashSet<String> = HashSet::new();
        let mut new_rules: Vec<(String, Vec<Vec<Symbol>>)> = Vec::new();

        for (i, current) in order.iter().enumerate() {
            let old_productions = rules
                .get_mut(current)
                .map(std::mem::take)
                .unwrap_or_default();

            let mut expanded: Vec<Vec<Symbol>> = Vec::new();
            for production in old_productions {
                let earlier = production
                    .first()
                    .and_then(|s| s.non_terminal())
                    .filter(|head| order[..i].iter().any(|nt| nt.as_str() == *head))
                    .and_then(|head| rules.get(head));
                match earlier {
                    Some(prefixes) => {
                        for prefix in prefixes {
                            expanded.push(
                                prefix.iter().chain(production.iter().skip(1)).cloned().collect(),
                            );
                        }
                    }
                    None => expanded.push(production),
                }
            }

            let (recursive, mut base): (Vec<_>, Vec<_>) = expanded
                .into_iter()
                .partition(|p| p.first().and_then(|s| s.non_terminal()) == Some(current.as_str()));

            if recursive.is_empty() {
                rules.insert(current.clone(), base);
                continue;
            }

            let mut prime = self.get_symbol_prime_name(current.clone());
            while taken.contains(&prime) {
                prime = self.get_symbol_prime_name(prime + "'");
            }
            taken.insert(prime.clone());
            let prime_symbol = Symbol::NonTerminal(prime.clone());

            if base.is_empty() {
                base.push(Vec::new());
            }
            for production in &mut base {
                production.push(prime_symbol.clone());
            }

            let mut tails: Vec<Vec<Symbol>> = recursive
                .into_iter()
                .filter(|p| p.len() > 1)
                .map(|p| {
                    let mut tail = p[1..].to_vec();
                    tail.push(prime_symbol.clone());
                    tail
                })
                .collect();
            tails.push(Vec::new());

            rules.insert(current.clone(), base);
            new_rules.push((prime, tails));
        }

        let productions = rules
            .into_iter()
            .chain(new_rules)
            .flat_map(|(left, rights)| {
                rights.into_iter().map(move |right| {
                    if right.is_empty() {
                        Production::new(left.clone(), vec![Symbol::Epsilon])
                    } else {
                        Production::new(left.clone(), right)
                    }
                })
            })
            .collect();

        Grammar::assemble(self.start_symbol().to_string(), productions)
    }
}
