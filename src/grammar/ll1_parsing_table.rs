use std::collections::HashMap;

use log::debug;

use super::{
    first_follow::{FirstSets, FollowSets},
    grammar::Symbol,
    Grammar,
};

/// Productions (by index into the grammar) applicable at one table cell.
/// Capacity is fixed to the number of productions of the row's nonterminal,
/// and a production is stored at most once, so the cell never reallocates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    productions: Vec<usize>,
}

impl TableCell {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            productions: Vec::with_capacity(capacity),
        }
    }

    fn insert(&mut self, production: usize) {
        if !self.productions.contains(&production) {
            debug_assert!(self.productions.len() < self.productions.capacity());
            self.productions.push(production);
        }
    }

    pub fn productions(&self) -> &[usize] {
        &self.productions
    }

    /// The production chosen when the cell is ambiguous: first in declared order.
    pub fn first(&self) -> Option<usize> {
        self.productions.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.productions.len() > 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTable {
    terminals: Vec<Symbol>,
    columns: HashMap<Symbol, usize>,
    rows: Vec<(String, Vec<TableCell>)>,
    row_index: HashMap<String, usize>,
}

impl ParseTable {
    /// Column headers: the grammar's terminals followed by `$`.
    pub fn terminals(&self) -> &[Symbol] {
        &self.terminals
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &[TableCell])> {
        self.rows
            .iter()
            .map(|(left, cells)| (left.as_str(), cells.as_slice()))
    }

    pub fn get(&self, non_terminal: &str, lookahead: &Symbol) -> Option<&TableCell> {
        let row = self.row_index.get(non_terminal)?;
        let col = self.columns.get(lookahead)?;
        Some(&self.rows[*row].1[*col])
    }

    pub fn ambiguous_cells(&self) -> impl Iterator<Item = (&str, &Symbol, &TableCell)> {
        self.rows.iter().flat_map(move |(left, cells)| {
            cells
                .iter()
                .zip(self.terminals.iter())
                .filter(|(cell, _)| cell.is_ambiguous())
                .map(move |(cell, terminal)| (left.as_str(), terminal, cell))
        })
    }
}

impl Grammar {
    pub fn build_ll1_table(&self, first: &FirstSets, follow: &FollowSets) -> ParseTable {
        let terminals: Vec<Symbol> = self
            .terminal_iter()
            .map(|t| Symbol::Terminal(t.clone()))
            .chain(std::iter::once(Symbol::EndMarker))
            .collect();
        let columns: HashMap<Symbol, usize> = terminals
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        let mut rows: Vec<(String, Vec<TableCell>)> = Vec::new();
        for nt in self.non_terminal_iter() {
            let capacity = self.productions_of(nt).count();
            let mut row: Vec<TableCell> = (0..terminals.len())
                .map(|_| TableCell::with_capacity(capacity))
                .collect();

            for (idx, production) in self.productions_of(nt) {
                let production_first = first.of_sequence(&production.right);
                for symbol in &production_first {
                    if let Some(&col) = columns.get(symbol) {
                        row[col].insert(idx);
                    }
                }

                if production_first.contains(&Symbol::Epsilon) {
                    for symbol in follow.get(nt).into_iter().flatten() {
                        if let Some(&col) = columns.get(symbol) {
                            row[col].insert(idx);
                        }
                    }
                }
            }

            rows.push((nt.clone(), row));
        }

        let row_index = rows
            .iter()
            .enumerate()
            .map(|(i, (left, _))| (left.clone(), i))
            .collect();

        let table = ParseTable {
            terminals,
            columns,
            rows,
            row_index,
        };
        debug!(
            "LL(1) table has {} rows, {} columns, {} ambiguous cells",
            table.rows.len(),
            table.terminals.len(),
            table.ambiguous_cells().count()
        );
        table
    }
}
