use thiserror::Error;

/// Structural problems found while loading a grammar. Fatal to the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarSyntaxError {
    #[error("grammar contains no productions")]
    EmptyGrammar,

    #[error("line {line}: too many \"->\"")]
    TooManyArrows { line: usize },

    #[error("line {line}: empty left side")]
    EmptyLeftSide { line: usize },

    #[error("line {line}: left side contains whitespace")]
    LeftSideContainsWhitespace { line: usize },

    #[error("line {line}: cannot find left side")]
    MissingLeftSide { line: usize },

    #[error("left side `{0}` is not a nonterminal (nonterminals start with an uppercase letter)")]
    InvalidLeftSide(String),

    #[error("ε cannot appear on the left side of a production")]
    EpsilonOnLeftSide,

    #[error("production `{left} -> {right}` mixes ε with other symbols")]
    MixedEpsilon { left: String, right: String },

    #[error("nonterminal `{name}` is used by `{left}` but has no productions")]
    UndefinedNonTerminal { name: String, left: String },

    #[error("`{0}` is reserved for the end of input")]
    ReservedTerminal(String),

    #[error("start symbol `{0}` is not declared")]
    UndeclaredStartSymbol(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] GrammarSyntaxError),

    #[error("invalid request: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}
