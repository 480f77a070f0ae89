use super::{
    conflict::ConflictReport,
    first_follow::{FirstSets, FollowSets},
    ll1_parsing_table::ParseTable,
    trace::Trace,
    Grammar,
};

/// Everything derived from one grammar: FIRST, FOLLOW, the predictive table
/// and its conflicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis<'g> {
    pub grammar: &'g Grammar,
    pub first: FirstSets,
    pub follow: FollowSets,
    pub table: ParseTable,
    pub conflicts: ConflictReport,
}

impl Grammar {
    pub fn analyze(&self) -> Analysis<'_> {
        let first = self.compute_first();
        let follow = self.compute_follow(&first);
        let table = self.build_ll1_table(&first, &follow);
        let (_, conflicts) = self.is_ll1(&first, &follow, &table);
        Analysis {
            grammar: self,
            first,
            follow,
            table,
            conflicts,
        }
    }
}

impl Analysis<'_> {
    pub fn is_ll1(&self) -> bool {
        self.conflicts.is_ll1()
    }

    pub fn trace(&self, input: &str, max_steps: usize) -> Trace {
        self.grammar.trace(&self.table, input, max_steps)
    }
}

#[cfg(test)]
mod tests {
    use crate::Grammar;
    use pretty_assertions::assert_eq;

    #[test]
    fn analysis_is_repeatable() {
        let g = Grammar::parse("S -> ( S ) S | ε").unwrap();
        let a = g.analyze();
        assert!(a.is_ll1());
        assert_eq!(a, g.analyze());
        assert!(a.trace("( ( ) ) ( )", 100).success());
    }
}
