use std::collections::BTreeSet;

use log::debug;

use super::{
    first_follow::{FirstSets, FollowSets},
    grammar::Symbol,
    ll1_parsing_table::ParseTable,
    Grammar,
};

/// Two productions of the same nonterminal whose FIRST sets overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstFirstConflict {
    pub non_terminal: String,
    pub productions: (usize, usize),
    pub intersection: BTreeSet<Symbol>,
    pub suggestion: String,
}

/// A nullable nonterminal whose FIRST and FOLLOW sets overlap.
/// `first` excludes `ε`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstFollowConflict {
    pub non_terminal: String,
    pub first: BTreeSet<Symbol>,
    pub follow: BTreeSet<Symbol>,
    pub intersection: BTreeSet<Symbol>,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousCell {
    pub non_terminal: String,
    pub lookahead: Symbol,
    pub productions: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConflictReport {
    pub first_first: Vec<FirstFirstConflict>,
    pub first_follow: Vec<FirstFollowConflict>,
    pub ambiguous_cells: Vec<AmbiguousCell>,
}

impl ConflictReport {
    pub fn is_ll1(&self) -> bool {
        self.ambiguous_cells.is_empty() && self.first_follow.is_empty()
    }
}

fn join_symbols(symbols: &BTreeSet<Symbol>) -> String {
    symbols
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn without_epsilon(symbols: BTreeSet<Symbol>) -> BTreeSet<Symbol> {
    symbols
        .into_iter()
        .filter(|s| *s != Symbol::Epsilon)
        .collect()
}

impl Grammar {
    pub fn is_ll1(
        &self,
        first: &FirstSets,
        follow: &FollowSets,
        table: &ParseTable,
    ) -> (bool, ConflictReport) {
        let report = ConflictReport {
            first_first: self.first_first_conflicts(first),
            first_follow: self.first_follow_conflicts(first, follow),
            ambiguous_cells: table
                .ambiguous_cells()
                .map(|(nt, lookahead, cell)| AmbiguousCell {
                    non_terminal: nt.to_string(),
                    lookahead: lookahead.clone(),
                    productions: cell.productions().to_vec(),
                })
                .collect(),
        };

        debug!(
            "{} FIRST/FIRST, {} FIRST/FOLLOW conflicts, {} ambiguous cells",
            report.first_first.len(),
            report.first_follow.len(),
            report.ambiguous_cells.len()
        );
        (report.is_ll1(), report)
    }

    fn first_first_conflicts(&self, first: &FirstSets) -> Vec<FirstFirstConflict> {
        let mut conflicts = Vec::new();
        for nt in self.non_terminal_iter() {
            let alternatives: Vec<(usize, BTreeSet<Symbol>)> = self
                .productions_of(nt)
                .map(|(idx, p)| (idx, without_epsilon(first.of_sequence(&p.right))))
                .collect();

            for (i, (a, first_a)) in alternatives.iter().enumerate() {
                for (b, first_b) in &alternatives[i + 1..] {
                    let intersection: BTreeSet<Symbol> =
                        first_a.intersection(first_b).cloned().collect();
                    if intersection.is_empty() {
                        continue;
                    }

                    let left_recursive = [*a, *b]
                        .iter()
                        .filter_map(|&idx| self.production(idx))
                        .find(|p| p.is_left_recursive());
                    let suggestion = match left_recursive {
                        Some(p) => format!(
                            "Eliminate the left recursion in `{}`; it makes every production of {} compete on {}.",
                            p,
                            nt,
                            join_symbols(&intersection)
                        ),
                        None => format!(
                            "Factor out the common prefix of the productions of {} that begin with {}.",
                            nt,
                            join_symbols(&intersection)
                        ),
                    };

                    conflicts.push(FirstFirstConflict {
                        non_terminal: nt.clone(),
                        productions: (*a, *b),
                        intersection,
                        suggestion,
                    });
                }
            }
        }
        conflicts
    }

    fn first_follow_conflicts(
        &self,
        first: &FirstSets,
        follow: &FollowSets,
    ) -> Vec<FirstFollowConflict> {
        let mut conflicts = Vec::new();
        for nt in self.non_terminal_iter() {
            if !first.is_nullable(nt) {
                continue;
            }
            let nt_first = without_epsilon(first.of_symbol(&Symbol::NonTerminal(nt.clone())));
            let nt_follow = follow.get(nt).cloned().unwrap_or_default();
            let intersection: BTreeSet<Symbol> =
                nt_first.intersection(&nt_follow).cloned().collect();
            if intersection.is_empty() {
                continue;
            }

            let suggestion = format!(
                "Reconsider whether {} should derive ε: FIRST({}) and FOLLOW({}) share {}.",
                nt,
                nt,
                nt,
                join_symbols(&intersection)
            );
            conflicts.push(FirstFollowConflict {
                non_terminal: nt.clone(),
                first: nt_first,
                follow: nt_follow,
                intersection,
                suggestion,
            });
        }
        conflicts
    }
}
