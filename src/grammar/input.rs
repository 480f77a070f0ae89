use serde::{Deserialize, Serialize};

use super::trace::DEFAULT_MAX_STEPS;

/// One left side with its alternatives. Each entry of `rhs` is a
/// whitespace-delimited alternative and may itself contain `|`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInput {
    pub lhs: String,
    pub rhs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarInput {
    pub grammar: Vec<RuleInput>,
    pub start_symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceInput {
    #[serde(flatten)]
    pub grammar: GrammarInput,
    pub input_string: String,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}
