extern crate wasm_bindgen;

use log::warn;
use wasm_bindgen::prelude::*;

pub mod grammar;
pub use grammar::{
    error::{Error, GrammarSyntaxError},
    input::{GrammarInput, RuleInput, TraceInput},
    pretty_print::{AnalysisOutput, Render, TraceOutput},
    trace::{TraceFailure, TraceStatus, DEFAULT_MAX_STEPS},
    Analysis, Grammar, Production, Symbol,
};

fn error_json(e: &Error) -> String {
    warn!("request failed: {}", e);
    serde_json::json!({ "error": e.to_string() }).to_string()
}

fn respond(result: Result<String, Error>) -> String {
    result.unwrap_or_else(|e| error_json(&e))
}

/// Analyzes a JSON `GrammarInput`: FIRST/FOLLOW sets, the LL(1) table and
/// its conflicts.
pub fn analyze_request(request: &str) -> Result<AnalysisOutput, Error> {
    let input: GrammarInput = serde_json::from_str(request)?;
    let g = Grammar::from_input(&input)?;
    let output = g.analyze().to_output();
    Ok(output)
}

/// Traces the parse of a JSON `TraceInput` and returns the serialized
/// `TraceOutput`, which borrows the grammar it was built from.
pub fn trace_request(request: &str) -> Result<String, Error> {
    let input: TraceInput = serde_json::from_str(request)?;
    let g = Grammar::from_input(&input.grammar)?;
    let trace = g.analyze().trace(&input.input_string, input.max_steps);
    trace.to_output(&g).to_json().map_err(Error::from)
}

#[wasm_bindgen]
pub fn analyze_to_json(request: &str) -> String {
    respond(analyze_request(request).and_then(|output| output.to_json().map_err(Error::from)))
}

#[wasm_bindgen]
pub fn trace_to_json(request: &str) -> String {
    respond(trace_request(request))
}

#[wasm_bindgen]
pub fn first_follow_to_json(grammar: &str) -> String {
    respond(Grammar::parse(grammar).map_err(Error::from).and_then(|g| {
        g.analyze()
            .to_non_terminal_output_vec()
            .to_json()
            .map_err(Error::from)
    }))
}


#[cfg(test)]
mod boundary_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    const BALANCED: &str = r#"{"grammar":[{"lhs":"S","rhs":["a S b","ε"]}],"start_symbol":"S"}"#;

    #[test]
    fn analyze_balanced_grammar() {
        let output: Value = serde_json::from_str(&analyze_to_json(BALANCED)).unwrap();
        assert_eq!(output["is_LL1"], true);
        assert_eq!(output["first_sets"]["S"], json!(["a", "ε"]));
        assert_eq!(output["parse_table"]["S"]["b"], "S -> ε");
    }

    #[test]
    fn analyze_reports_first_first_conflict() {
        let request = r#"{"grammar":[{"lhs":"S","rhs":["a","a b"]}],"start_symbol":"S"}"#;
        let output = analyze_request(request).unwrap();
        assert!(!output.is_ll1);
        assert_eq!(output.conflicts.len(), 1);
        assert_eq!(output.parse_table["S"]["a"], "S -> a | S -> a b");
    }

    #[test]
    fn malformed_grammar_returns_error_object() {
        let request = r#"{"grammar":[{"lhs":"S","rhs":["a B"]}],"start_symbol":"S"}"#;
        let output: Value = serde_json::from_str(&analyze_to_json(request)).unwrap();
        assert_eq!(
            output,
            json!({ "error": "nonterminal `B` is used by `S` but has no productions" })
        );
        assert!(matches!(
            analyze_request(request),
            Err(Error::Syntax(GrammarSyntaxError::UndefinedNonTerminal { .. }))
        ));
    }

    #[test]
    fn end_marker_terminal_is_rejected() {
        let request = r#"{"grammar":[{"lhs":"S","rhs":["a $","ε"]}],"start_symbol":"S"}"#;
        let output: Value = serde_json::from_str(&analyze_to_json(request)).unwrap();
        assert_eq!(output, json!({ "error": "`$` is reserved for the end of input" }));
    }

    #[test]
    fn empty_rule_is_not_a_declaration() {
        let request = r#"{"grammar":[{"lhs":"S","rhs":["X a"]},{"lhs":"X","rhs":[]}],"start_symbol":"S"}"#;
        assert!(matches!(
            analyze_request(request),
            Err(Error::Syntax(GrammarSyntaxError::UndefinedNonTerminal { .. }))
        ));
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(analyze_request("{"), Err(Error::Json(_))));
        let output: Value = serde_json::from_str(&trace_to_json("[]")).unwrap();
        assert!(output["error"].as_str().unwrap().starts_with("invalid request"));
    }

    #[test]
    fn trace_accepts_and_rejects() {
        let accept = r#"{"grammar":[{"lhs":"S","rhs":["a S b","ε"]}],"start_symbol":"S","input_string":"a a b b","max_steps":20}"#;
        let output: Value = serde_json::from_str(&trace_request(accept).unwrap()).unwrap();
        assert_eq!(output["success"], true);
        assert_eq!(output["status"], "Accepted");
        assert_eq!(output["trace"].as_array().unwrap().len(), 8);

        let reject = r#"{"grammar":[{"lhs":"S","rhs":["a S b","ε"]}],"start_symbol":"S","input_string":"a a b"}"#;
        let output: Value = serde_json::from_str(&trace_to_json(reject)).unwrap();
        assert_eq!(output["success"], false);
        assert_eq!(output["status"], "Rejected");
        assert_eq!(
            output["trace"].as_array().unwrap().last().unwrap()["action"],
            "error: expected `b` but found `$`"
        );
    }

    #[test]
    fn trace_step_limit() {
        let request = r#"{"grammar":[{"lhs":"E","rhs":["E + t","t"]}],"start_symbol":"E","input_string":"t + t","max_steps":5}"#;
        let output: Value = serde_json::from_str(&trace_request(request).unwrap()).unwrap();
        assert_eq!(output["status"], "StepLimitExceeded");
        assert_eq!(output["success"], false);
        let steps = output["trace"].as_array().unwrap();
        assert_eq!(steps.len(), 5);
        assert!(steps.iter().all(|step| step["ambiguous"] == true));
    }

    #[test]
    fn first_follow_from_text() {
        let output: Value =
            serde_json::from_str(&first_follow_to_json("S -> A b\nA -> a | ε")).unwrap();
        assert_eq!(output["data"][1]["name"], "A");
        assert_eq!(output["data"][1]["nullable"], true);
        assert_eq!(output["data"][1]["follow"], json!(["b"]));
    }
}
