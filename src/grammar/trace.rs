use log::trace;
use serde::Serialize;
use thiserror::Error;

use super::{grammar::Symbol, ll1_parsing_table::ParseTable, Grammar};

pub const DEFAULT_MAX_STEPS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraceStatus {
    Accepted,
    Rejected,
    StepLimitExceeded,
}

/// Why a trace was rejected. Carried inside the trace, never returned as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceFailure {
    #[error("expected `{expected}` but found `{found}`")]
    UnexpectedToken { expected: Symbol, found: Symbol },

    #[error("no production for `{non_terminal}` on lookahead `{token}`")]
    NoApplicableProduction { non_terminal: String, token: Symbol },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceAction {
    Match(Symbol),
    /// `ambiguous` is set when the cell held more than one production and the
    /// first one in declared order was taken.
    Apply { production: usize, ambiguous: bool },
    Accept,
    Reject(TraceFailure),
}

/// Parser state before `action` was taken. `stack` is bottom first, so its
/// last element is the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    pub stack: Vec<Symbol>,
    pub input: Vec<Symbol>,
    pub action: TraceAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub status: TraceStatus,
    pub steps: Vec<TraceStep>,
}

impl Trace {
    pub fn success(&self) -> bool {
        self.status == TraceStatus::Accepted
    }

    pub fn failure(&self) -> Option<&TraceFailure> {
        match self.steps.last().map(|step| &step.action) {
            Some(TraceAction::Reject(failure)) => Some(failure),
            _ => None,
        }
    }
}

impl Grammar {
    /// Runs the predictive parser over whitespace-separated `input`, taking at
    /// most `max_steps` steps.
    pub fn trace(&self, table: &ParseTable, input: &str, max_steps: usize) -> Trace {
        let tokens: Vec<Symbol> = input
            .split_whitespace()
            .map(|t| Symbol::Terminal(t.to_string()))
            .chain(std::iter::once(Symbol::EndMarker))
            .collect();

        let mut stack = vec![Symbol::EndMarker, self.start()];
        let mut cursor = 0;
        let mut steps: Vec<TraceStep> = Vec::new();

        for _ in 0..max_steps {
            let lookahead = tokens[cursor].clone();
            let top = stack.last().cloned().unwrap_or(Symbol::EndMarker);

            let (action, status) = match &top {
                Symbol::Terminal(_) if top == lookahead => (TraceAction::Match(top.clone()), None),
                Symbol::Terminal(_) => (
                    TraceAction::Reject(TraceFailure::UnexpectedToken {
                        expected: top.clone(),
                        found: lookahead.clone(),
                    }),
                    Some(TraceStatus::Rejected),
                ),
                Symbol::EndMarker if lookahead == Symbol::EndMarker => {
                    (TraceAction::Accept, Some(TraceStatus::Accepted))
                }
                Symbol::EndMarker => (
                    TraceAction::Reject(TraceFailure::UnexpectedToken {
                        expected: Symbol::EndMarker,
                        found: lookahead.clone(),
                    }),
                    Some(TraceStatus::Rejected),
                ),
                Symbol::NonTerminal(name) => {
                    match table.get(name, &lookahead).and_then(|cell| {
                        cell.first().map(|production| (production, cell.is_ambiguous()))
                    }) {
                        Some((production, ambiguous)) => {
                            (TraceAction::Apply { production, ambiguous }, None)
                        }
                        None => (
                            TraceAction::Reject(TraceFailure::NoApplicableProduction {
                                non_terminal: name.clone(),
                                token: lookahead.clone(),
                            }),
                            Some(TraceStatus::Rejected),
                        ),
                    }
                }
                Symbol::Epsilon => {
                    stack.pop();
                    continue;
                }
            };

            trace!("{:?} on {} -> {:?}", top, lookahead, action);
            steps.push(TraceStep {
                stack: stack.clone(),
                input: tokens[cursor..].to_vec(),
                action: action.clone(),
            });

            if let Some(status) = status {
                return Trace { status, steps };
            }

            stack.pop();
            match action {
                TraceAction::Match(_) => cursor += 1,
                TraceAction::Apply { production, .. } => {
                    if let Some(p) = self.production(production) {
                        stack.extend(p.symbols().iter().rev().cloned());
                    }
                }
                _ => {}
            }
        }

        Trace {
            status: TraceStatus::StepLimitExceeded,
            steps,
        }
    }
}
