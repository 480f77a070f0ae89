use indexmap::IndexSet;

use super::{
    error::GrammarSyntaxError,
    grammar::{Production, Symbol},
    input::GrammarInput,
    Grammar, END_MARK, EPSILON, EPSILON_ALIAS,
};

/// A left side and its alternatives, still as raw tokens.
type RawRule<'a> = (&'a str, Vec<Vec<&'a str>>);

pub fn is_epsilon_literal(token: &str) -> bool {
    token == EPSILON || token == EPSILON_ALIAS
}

/// Nonterminals are written starting with an uppercase letter. Digits and
/// punctuation never are, so `(`, `+` or `0` stay terminals.
pub fn is_non_terminal_name(token: &str) -> bool {
    token.chars().next().map_or(false, |c| c.is_uppercase())
}

fn split_alternatives(rights: &str) -> impl Iterator<Item = Vec<&str>> {
    rights
        .split('|')
        .map(|right| right.split_whitespace().collect())
}

impl Grammar {
    /// Parses `A -> x y | z` lines. The start symbol is the first left side.
    pub fn parse(grammar: &str) -> Result<Self, GrammarSyntaxError> {
        Self::parse_with_start(grammar, None)
    }

    pub fn parse_with_start(
        grammar: &str,
        start_symbol: Option<&str>,
    ) -> Result<Self, GrammarSyntaxError> {
        let mut raw_productions: Vec<(&str, &str)> = Vec::new();

        let mut previous_left: Option<&str> = None;
        for (i, line) in grammar.lines().enumerate() {
            if line.chars().all(|c| c.is_whitespace()) {
                continue;
            }
            let parts: Vec<&str> = line.split("->").collect();
            if parts.len() > 2 {
                return Err(GrammarSyntaxError::TooManyArrows { line: i + 1 });
            }
            let (left, rights) = if parts.len() == 2 {
                let left_str = parts[0].trim();
                if left_str.is_empty() {
                    return Err(GrammarSyntaxError::EmptyLeftSide { line: i + 1 });
                } else if left_str.split_whitespace().count() != 1 {
                    return Err(GrammarSyntaxError::LeftSideContainsWhitespace { line: i + 1 });
                }
                (left_str, parts[1].trim())
            } else {
                match (previous_left, parts[0].trim().strip_prefix('|')) {
                    (Some(left), Some(rights)) => (left, rights.trim()),
                    _ => return Err(GrammarSyntaxError::MissingLeftSide { line: i + 1 }),
                }
            };

            previous_left = Some(left);
            raw_productions.push((left, rights));
        }

        let rules: Vec<RawRule> = raw_productions
            .into_iter()
            .map(|(left, rights)| (left, split_alternatives(rights).collect()))
            .collect();

        let start = match (start_symbol, rules.first()) {
            (Some(start), _) => start,
            (None, Some((left, _))) => *left,
            (None, None) => return Err(GrammarSyntaxError::EmptyGrammar),
        };

        Self::load(&rules, start)
    }

    /// Builds a grammar from the structured request form.
    pub fn from_input(input: &GrammarInput) -> Result<Self, GrammarSyntaxError> {
        let rules: Vec<RawRule> = input
            .grammar
            .iter()
            .map(|rule| {
                let alternatives = rule
                    .rhs
                    .iter()
                    .flat_map(|right| split_alternatives(right))
                    .collect();
                (rule.lhs.trim(), alternatives)
            })
            .collect();

        Self::load(&rules, input.start_symbol.trim())
    }

    /// Classifies every token once and validates the result. An empty
    /// alternative is read as `ε`.
    fn load(rules: &[RawRule], start_symbol: &str) -> Result<Self, GrammarSyntaxError> {
        if rules.iter().all(|(_, alternatives)| alternatives.is_empty()) {
            return Err(GrammarSyntaxError::EmptyGrammar);
        }

        // A left side with no alternatives declares nothing.
        let mut defined: IndexSet<&str> = IndexSet::new();
        for (left, alternatives) in rules {
            if is_epsilon_literal(left) {
                return Err(GrammarSyntaxError::EpsilonOnLeftSide);
            }
            if !is_non_terminal_name(left) {
                return Err(GrammarSyntaxError::InvalidLeftSide(left.to_string()));
            }
            if !alternatives.is_empty() {
                defined.insert(*left);
            }
        }

        if !defined.contains(start_symbol) {
            return Err(GrammarSyntaxError::UndeclaredStartSymbol(
                start_symbol.to_string(),
            ));
        }

        let mut productions = Vec::new();
        for (left, alternatives) in rules {
            for right in alternatives {
                productions.push(Production::new(*left, Self::classify(left, right, &defined)?));
            }
        }

        Ok(Self::assemble(start_symbol.to_string(), productions))
    }

    fn classify(
        left: &str,
        right: &[&str],
        defined: &IndexSet<&str>,
    ) -> Result<Vec<Symbol>, GrammarSyntaxError> {
        if right.is_empty() {
            return Ok(vec![Symbol::Epsilon]);
        }
        if right.len() > 1 && right.iter().any(|s| is_epsilon_literal(s)) {
            return Err(GrammarSyntaxError::MixedEpsilon {
                left: left.to_string(),
                right: right.join(" "),
            });
        }

        right
            .iter()
            .map(|&token| {
                if is_epsilon_literal(token) {
                    Ok(Symbol::Epsilon)
                } else if is_non_terminal_name(token) {
                    if defined.contains(token) {
                        Ok(Symbol::NonTerminal(token.to_string()))
                    } else {
                        Err(GrammarSyntaxError::UndefinedNonTerminal {
                            name: token.to_string(),
                            left: left.to_string(),
                        })
                    }
                } else if token == END_MARK {
                    Err(GrammarSyntaxError::ReservedTerminal(token.to_string()))
                } else {
                    Ok(Symbol::Terminal(token.to_string()))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{input::RuleInput, SymbolKind};
    use pretty_assertions::assert_eq;

    fn t(name: &str) -> Symbol {
        Symbol::Terminal(name.to_string())
    }

    fn nt(name: &str) -> Symbol {
        Symbol::NonTerminal(name.to_string())
    }

    fn rule(lhs: &str, rhs: &[&str]) -> RuleInput {
        RuleInput {
            lhs: lhs.to_string(),
            rhs: rhs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn punctuation_and_digits_are_terminals() {
        let g = Grammar::parse("E -> ( E ) | 0 | id").unwrap();
        assert_eq!(g.productions()[0].right, vec![t("("), nt("E"), t(")")]);
        assert_eq!(g.productions()[1].right, vec![t("0")]);
        assert_eq!(g.kind_of("("), Some(SymbolKind::Terminal));
        assert_eq!(g.kind_of("E"), Some(SymbolKind::NonTerminal));
        assert_eq!(g.kind_of("F"), None);
    }

    #[test]
    fn continuation_lines_extend_previous_left() {
        let g = Grammar::parse("S -> A b\n | c\nA -> a\n   | ε").unwrap();
        let rendered: Vec<String> = g.productions().iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, vec!["S -> A b", "S -> c", "A -> a", "A -> ε"]);
        assert_eq!(g.start_symbol(), "S");
    }

    #[test]
    fn epsilon_alias_and_empty_alternative_load_as_epsilon() {
        let g = Grammar::parse("S -> a | ϵ |").unwrap();
        assert_eq!(g.productions()[1].right, vec![Symbol::Epsilon]);
        assert_eq!(g.productions()[2].right, vec![Symbol::Epsilon]);
    }

    #[test]
    fn explicit_start_symbol_is_used() {
        let g = Grammar::parse_with_start("A -> a\nS -> A", Some("S")).unwrap();
        assert_eq!(g.start_symbol(), "S");
    }

    #[test]
    fn mixed_epsilon_is_rejected() {
        assert_eq!(
            Grammar::parse("S -> a ε"),
            Err(GrammarSyntaxError::MixedEpsilon {
                left: "S".to_string(),
                right: "a ε".to_string()
            })
        );
    }

    #[test]
    fn undefined_non_terminal_is_rejected() {
        assert_eq!(
            Grammar::parse("S -> a B"),
            Err(GrammarSyntaxError::UndefinedNonTerminal {
                name: "B".to_string(),
                left: "S".to_string()
            })
        );
    }

    #[test]
    fn undeclared_start_symbol_is_rejected() {
        assert_eq!(
            Grammar::parse_with_start("S -> a", Some("X")),
            Err(GrammarSyntaxError::UndeclaredStartSymbol("X".to_string()))
        );
    }

    #[test]
    fn empty_grammar_is_rejected() {
        assert_eq!(Grammar::parse("  \n  "), Err(GrammarSyntaxError::EmptyGrammar));
        let input = GrammarInput {
            grammar: Vec::new(),
            start_symbol: "S".to_string(),
        };
        assert_eq!(Grammar::from_input(&input), Err(GrammarSyntaxError::EmptyGrammar));
    }

    #[test]
    fn lowercase_left_side_is_rejected() {
        assert_eq!(
            Grammar::parse("s -> a"),
            Err(GrammarSyntaxError::InvalidLeftSide("s".to_string()))
        );
        assert_eq!(Grammar::parse("ε -> a"), Err(GrammarSyntaxError::EpsilonOnLeftSide));
    }

    #[test]
    fn end_marker_is_reserved() {
        assert_eq!(
            Grammar::parse("S -> a $ | ε"),
            Err(GrammarSyntaxError::ReservedTerminal("$".to_string()))
        );
        let input = GrammarInput {
            grammar: vec![rule("S", &["$"])],
            start_symbol: "S".to_string(),
        };
        assert_eq!(
            Grammar::from_input(&input),
            Err(GrammarSyntaxError::ReservedTerminal("$".to_string()))
        );
    }

    #[test]
    fn rule_without_alternatives_declares_nothing() {
        let input = GrammarInput {
            grammar: vec![rule("S", &["X a"]), rule("X", &[])],
            start_symbol: "S".to_string(),
        };
        assert_eq!(
            Grammar::from_input(&input),
            Err(GrammarSyntaxError::UndefinedNonTerminal {
                name: "X".to_string(),
                left: "S".to_string()
            })
        );

        let input = GrammarInput {
            grammar: vec![rule("S", &["a"]), rule("X", &[])],
            start_symbol: "X".to_string(),
        };
        assert_eq!(
            Grammar::from_input(&input),
            Err(GrammarSyntaxError::UndeclaredStartSymbol("X".to_string()))
        );

        let input = GrammarInput {
            grammar: vec![rule("S", &["a"]), rule("X", &[])],
            start_symbol: "S".to_string(),
        };
        let g = Grammar::from_input(&input).unwrap();
        assert_eq!(g.non_terminal_iter().count(), 1);
        assert_eq!(g.kind_of("X"), None);
    }

    #[test]
    fn blank_structured_alternative_is_epsilon() {
        let input = GrammarInput {
            grammar: vec![rule("S", &["a A"]), rule("A", &["  ", "b"])],
            start_symbol: "S".to_string(),
        };
        let g = Grammar::from_input(&input).unwrap();
        assert_eq!(g.productions()[1].right, vec![Symbol::Epsilon]);
        assert_eq!(g.productions()[2].right, vec![t("b")]);
        assert_eq!(g, Grammar::parse("S -> a A\nA -> ε | b").unwrap());
    }

    #[test]
    fn structured_input_matches_text() {
        let input = GrammarInput {
            grammar: vec![
                RuleInput {
                    lhs: "S".to_string(),
                    rhs: vec!["a S b".to_string(), "ε".to_string()],
                },
                RuleInput {
                    lhs: "T".to_string(),
                    rhs: vec!["x | y".to_string()],
                },
            ],
            start_symbol: "S".to_string(),
        };
        let from_input = Grammar::from_input(&input).unwrap();
        let from_text = Grammar::parse("S -> a S b | ε\nT -> x | y").unwrap();
        assert_eq!(from_input, from_text);
    }
}
