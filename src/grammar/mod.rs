pub mod analysis;
pub mod conflict;
pub mod eliminate_left_recursion;
pub mod error;
pub mod first_follow;
pub mod grammar;
pub mod input;
pub mod ll1_parsing_table;
pub mod parse;
pub mod pretty_print;
pub mod trace;

pub use analysis::Analysis;
pub use grammar::{Grammar, Production, Symbol, SymbolKind};

pub const EPSILON: &str = "ε";
pub const EPSILON_ALIAS: &str = "ϵ";
pub const END_MARK: &str = "$";
