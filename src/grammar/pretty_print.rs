use std::collections::BTreeSet;

use crowbook_text_processing::escape;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use super::{
    analysis::Analysis,
    grammar::{Production, Symbol},
    trace::{Trace, TraceAction, TraceStatus},
    Grammar, EPSILON,
};

/// Textual renderings shared by every output table.
pub trait Render {
    fn to_plaintext(&self) -> String;
    fn to_latex(&self) -> String;
}

fn align_columns(output: &[Vec<String>]) -> String {
    let columns = output.iter().map(|line| line.len()).max().unwrap_or(0);
    let width: Vec<usize> = (0..columns)
        .map(|j| {
            output
                .iter()
                .filter_map(|line| line.get(j))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    output
        .iter()
        .map(|line| {
            line.iter()
                .enumerate()
                .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn tex_text(s: &str) -> String {
    escape::tex(s).replace(EPSILON, r"$\epsilon$")
}

fn symbol_names(symbols: &BTreeSet<Symbol>) -> Vec<String> {
    symbols.iter().map(|s| s.name().to_string()).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductionOutput<'a> {
    pub left: &'a str,
    pub rights: Vec<Vec<&'a str>>,
}

impl<'a> ProductionOutput<'a> {
    pub fn from_production(production: &'a Production) -> Self {
        Self {
            left: production.left.as_str(),
            rights: vec![production.right.iter().map(|s| s.name()).collect()],
        }
    }

    pub fn to_plaintext(&self, left_width: usize, multiline: bool) -> String {
        self.rights
            .iter()
            .map(|right| right.join(" "))
            .enumerate()
            .map(|(i, right)| {
                if i == 0 {
                    format!("{:>width$} -> {}", self.left, right, width = left_width)
                } else if multiline {
                    format!("{:>width$}  | {}", "", right, width = left_width)
                } else {
                    format!(" | {}", right)
                }
            })
            .collect::<Vec<_>>()
            .join(if multiline { "\n" } else { "" })
    }

    pub fn to_latex(&self, and_sign: bool) -> String {
        if self.rights.is_empty() {
            return String::new();
        }

        let left = if and_sign {
            format!("{} & \\rightarrow &", escape::tex(self.left))
        } else {
            format!("{} \\rightarrow ", escape::tex(self.left))
        };
        let right = self
            .rights
            .iter()
            .map(|right| {
                right
                    .iter()
                    .map(|s| escape::tex(*s))
                    .collect::<Vec<_>>()
                    .join(" \\ ")
            })
            .collect::<Vec<_>>()
            .join(" \\mid ");

        let output = left + &right;
        output.replace(EPSILON, "\\epsilon")
    }
}

#[derive(Debug, Serialize)]
pub struct ProductionOutputVec<'a> {
    productions: Vec<ProductionOutput<'a>>,
}

impl Render for ProductionOutputVec<'_> {
    fn to_plaintext(&self) -> String {
        let left_max_len = self
            .productions
            .iter()
            .map(|p| p.left.chars().count())
            .max()
            .unwrap_or(0);
        self.productions
            .iter()
            .map(|s| s.to_plaintext(left_max_len, true))
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn to_latex(&self) -> String {
        std::iter::once("\\[\\begin{array}{cll}".to_string())
            .chain(self.productions.iter().map(|s| s.to_latex(true)))
            .chain(std::iter::once("\\end{array}\\]".to_string()))
            .collect::<Vec<String>>()
            .join("\\\\\n")
    }
}

impl Grammar {
    pub fn to_production_output_vec(&self) -> ProductionOutputVec {
        let productions = self
            .non_terminal_iter()
            .map(|nt| ProductionOutput {
                left: nt.as_str(),
                rights: self
                    .productions_of(nt)
                    .map(|(_, p)| p.right.iter().map(|s| s.name()).collect())
                    .collect(),
            })
            .collect();
        ProductionOutputVec { productions }
    }
}

#[derive(Debug, Serialize)]
struct NonTerminalOutput<'a> {
    name: &'a str,
    nullable: bool,
    first: Vec<String>,
    follow: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NonTerminalOutputVec<'a> {
    data: Vec<NonTerminalOutput<'a>>,
}

impl NonTerminalOutputVec<'_> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Render for NonTerminalOutputVec<'_> {
    fn to_plaintext(&self) -> String {
        let mut output: Vec<Vec<String>> = vec![vec![
            String::new(),
            "nullable".to_string(),
            "first".to_string(),
            "follow".to_string(),
        ]];
        output.extend(self.data.iter().map(|nt| {
            vec![
                nt.name.to_string(),
                nt.nullable.to_string(),
                nt.first.join(", "),
                nt.follow.join(", "),
            ]
        }));
        align_columns(&output)
    }

    fn to_latex(&self) -> String {
        fn f(a: &[String]) -> String {
            a.iter()
                .map(|s| tex_text(s))
                .collect::<Vec<_>>()
                .join(r"\ ")
        }

        let content = self
            .data
            .iter()
            .map(|e| {
                format!(
                    "{} & {} & {} & {}",
                    escape::tex(e.name),
                    e.nullable,
                    f(&e.first),
                    f(&e.follow)
                )
            })
            .collect::<Vec<_>>()
            .join("\\\\\n ");

        "\\begin{tabular}{c|c|c|c}\n".to_string()
            + "Symbol & Nullable & First & Follow\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }
}

/// Rendered LL(1) table. Cells list the applicable productions; more than
/// one means the cell is ambiguous.
#[derive(Debug)]
pub struct LL1ParsingTableOutput<'a> {
    terminals: Vec<&'a str>,
    rows: Vec<(&'a str, Vec<Vec<ProductionOutput<'a>>>)>,
}

impl LL1ParsingTableOutput<'_> {
    fn cell_text(cell: &[ProductionOutput]) -> String {
        cell.iter()
            .map(|p| p.to_plaintext(0, false))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// nonterminal -> terminal -> production text, empty for empty cells.
    pub fn to_map(&self) -> IndexMap<String, IndexMap<String, String>> {
        self.rows
            .iter()
            .map(|(left, row)| {
                let cells = self
                    .terminals
                    .iter()
                    .zip(row.iter())
                    .map(|(t, cell)| (t.to_string(), Self::cell_text(cell)))
                    .collect();
                (left.to_string(), cells)
            })
            .collect()
    }
}

impl Serialize for LL1ParsingTableOutput<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl Render for LL1ParsingTableOutput<'_> {
    fn to_plaintext(&self) -> String {
        let mut header: Vec<String> = vec![String::new()];
        header.extend(self.terminals.iter().map(|&t| t.to_string()));
        let mut output: Vec<Vec<String>> = vec![header];
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![left.to_string()];
            line.extend(row.iter().map(|cell| Self::cell_text(cell)));
            output.push(line);
        }
        align_columns(&output)
    }

    fn to_latex(&self) -> String {
        let mut header: Vec<String> = vec![format!(
            "\\[\\begin{{array}}{{c{}}}\n",
            "|l".repeat(self.terminals.len()),
        )];
        header.extend(
            self.terminals
                .iter()
                .map(|&t| format!("\\text{{{}}}", escape::tex(t))),
        );
        let header = header.join(" & ");

        let mut output: Vec<String> = Vec::new();
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![escape::tex(*left).to_string()];
            line.extend(row.iter().map(|cell| {
                let r = cell
                    .iter()
                    .map(|p| p.to_latex(false))
                    .collect::<Vec<_>>()
                    .join("; ");
                if cell.len() > 1 {
                    format!("{{\\color{{red}}{}}}", r)
                } else {
                    r
                }
            }));
            output.push(line.join(" & "));
        }

        let output = output.join("\\\\\n");

        header + "\\\\\\hline\n" + &output + "\n\\end{array}\\]"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ConflictOutput {
    #[serde(rename = "FIRST/FIRST conflict")]
    FirstFirst {
        non_terminal: String,
        productions: [String; 2],
        intersection: Vec<String>,
        suggestion: String,
    },
    #[serde(rename = "FIRST/FOLLOW conflict")]
    FirstFollow {
        non_terminal: String,
        first: Vec<String>,
        follow: Vec<String>,
        intersection: Vec<String>,
        suggestion: String,
    },
}

impl ConflictOutput {
    fn kind(&self) -> &'static str {
        match self {
            ConflictOutput::FirstFirst { .. } => "FIRST/FIRST",
            ConflictOutput::FirstFollow { .. } => "FIRST/FOLLOW",
        }
    }

    fn describe(&self) -> String {
        match self {
            ConflictOutput::FirstFirst {
                non_terminal,
                productions,
                intersection,
                ..
            } => format!(
                "{}: `{}` and `{}` both start with {}",
                non_terminal,
                productions[0],
                productions[1],
                intersection.join(", ")
            ),
            ConflictOutput::FirstFollow {
                non_terminal,
                first,
                follow,
                intersection,
                ..
            } => format!(
                "{}: FIRST = {{{}}}, FOLLOW = {{{}}}, shared {}",
                non_terminal,
                first.join(", "),
                follow.join(", "),
                intersection.join(", ")
            ),
        }
    }

    fn suggestion(&self) -> &str {
        match self {
            ConflictOutput::FirstFirst { suggestion, .. }
            | ConflictOutput::FirstFollow { suggestion, .. } => suggestion,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AmbiguousCellOutput {
    pub non_terminal: String,
    pub lookahead: String,
    pub productions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConflictOutputVec {
    #[serde(rename = "is_LL1")]
    pub is_ll1: bool,
    pub conflicts: Vec<ConflictOutput>,
    pub ambiguous_cells: Vec<AmbiguousCellOutput>,
}

impl Render for ConflictOutputVec {
    fn to_plaintext(&self) -> String {
        let mut lines = vec![format!(
            "LL(1): {}",
            if self.is_ll1 { "yes" } else { "no" }
        )];
        for conflict in &self.conflicts {
            lines.push(format!("{} conflict on {}", conflict.kind(), conflict.describe()));
            lines.push(format!("  suggestion: {}", conflict.suggestion()));
        }
        for cell in &self.ambiguous_cells {
            lines.push(format!(
                "ambiguous cell [{}, {}]: {}",
                cell.non_terminal,
                cell.lookahead,
                cell.productions.join(" | ")
            ));
        }
        lines.join("\n")
    }

    fn to_latex(&self) -> String {
        let verdict = format!(
            "The grammar is {}LL(1).",
            if self.is_ll1 { "" } else { "not " }
        );
        if self.conflicts.is_empty() {
            return verdict;
        }
        let items = self
            .conflicts
            .iter()
            .map(|c| {
                format!(
                    "\\item \\textbf{{{}}} {}\\\\\n{}",
                    c.kind(),
                    tex_text(&c.describe()),
                    tex_text(c.suggestion())
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n\\begin{{itemize}}\n{}\n\\end{{itemize}}", verdict, items)
    }
}

/// The analysis result handed to the request boundary.
#[derive(Debug, Serialize)]
pub struct AnalysisOutput {
    #[serde(rename = "is_LL1")]
    pub is_ll1: bool,
    pub terminals: Vec<String>,
    pub non_terminals: Vec<String>,
    pub first_sets: IndexMap<String, Vec<String>>,
    pub follow_sets: IndexMap<String, Vec<String>>,
    pub conflicts: Vec<ConflictOutput>,
    pub parse_table: IndexMap<String, IndexMap<String, String>>,
}

impl AnalysisOutput {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Analysis<'_> {
    fn production_text(&self, index: usize) -> String {
        self.grammar
            .production(index)
            .map(|p| p.to_string())
            .unwrap_or_default()
    }

    pub fn to_non_terminal_output_vec(&self) -> NonTerminalOutputVec<'_> {
        let data = self
            .grammar
            .non_terminal_iter()
            .map(|nt| NonTerminalOutput {
                name: nt.as_str(),
                nullable: self.first.is_nullable(nt),
                first: self.first.get(nt).map(symbol_names).unwrap_or_default(),
                follow: self.follow.get(nt).map(symbol_names).unwrap_or_default(),
            })
            .collect();
        NonTerminalOutputVec { data }
    }

    pub fn to_ll1_table_output(&self) -> LL1ParsingTableOutput<'_> {
        let terminals = self.table.terminals().iter().map(|t| t.name()).collect();
        let rows = self
            .table
            .rows()
            .map(|(left, cells)| {
                let cells = cells
                    .iter()
                    .map(|cell| {
                        cell.productions()
                            .iter()
                            .filter_map(|&idx| self.grammar.production(idx))
                            .map(ProductionOutput::from_production)
                            .collect()
                    })
                    .collect();
                (left, cells)
            })
            .collect();
        LL1ParsingTableOutput { terminals, rows }
    }

    pub fn to_conflict_output_vec(&self) -> ConflictOutputVec {
        let report = &self.conflicts;
        let first_first = report.first_first.iter().map(|c| ConflictOutput::FirstFirst {
            non_terminal: c.non_terminal.clone(),
            productions: [
                self.production_text(c.productions.0),
                self.production_text(c.productions.1),
            ],
            intersection: symbol_names(&c.intersection),
            suggestion: c.suggestion.clone(),
        });
        let first_follow = report.first_follow.iter().map(|c| ConflictOutput::FirstFollow {
            non_terminal: c.non_terminal.clone(),
            first: symbol_names(&c.first),
            follow: symbol_names(&c.follow),
            intersection: symbol_names(&c.intersection),
            suggestion: c.suggestion.clone(),
        });
        let ambiguous_cells = report
            .ambiguous_cells
            .iter()
            .map(|cell| AmbiguousCellOutput {
                non_terminal: cell.non_terminal.clone(),
                lookahead: cell.lookahead.name().to_string(),
                productions: cell
                    .productions
                    .iter()
                    .map(|&idx| self.production_text(idx))
                    .collect(),
            })
            .collect();

        ConflictOutputVec {
            is_ll1: report.is_ll1(),
            conflicts: first_first.chain(first_follow).collect(),
            ambiguous_cells,
        }
    }

    pub fn to_output(&self) -> AnalysisOutput {
        AnalysisOutput {
            is_ll1: self.is_ll1(),
            terminals: self.grammar.terminal_iter().cloned().collect(),
            non_terminals: self.grammar.non_terminal_iter().cloned().collect(),
            first_sets: self
                .grammar
                .non_terminal_iter()
                .map(|nt| (nt.clone(), self.first.get(nt).map(symbol_names).unwrap_or_default()))
                .collect(),
            follow_sets: self
                .grammar
                .non_terminal_iter()
                .map(|nt| (nt.clone(), self.follow.get(nt).map(symbol_names).unwrap_or_default()))
                .collect(),
            conflicts: self.to_conflict_output_vec().conflicts,
            parse_table: self.to_ll1_table_output().to_map(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TraceStepOutput<'g> {
    pub stack: String,
    pub input: String,
    pub action: String,
    pub rule: String,
    pub ambiguous: bool,
    #[serde(skip)]
    production: Option<&'g Production>,
}

#[derive(Debug, Serialize)]
pub struct TraceOutput<'g> {
    pub success: bool,
    pub status: TraceStatus,
    pub trace: Vec<TraceStepOutput<'g>>,
}

impl TraceOutput<'_> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn join_names(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Trace {
    pub fn to_output<'g>(&self, grammar: &'g Grammar) -> TraceOutput<'g> {
        let trace = self
            .steps
            .iter()
            .map(|step| {
                let (action, production, ambiguous) = match &step.action {
                    TraceAction::Match(symbol) => (format!("match {}", symbol), None, false),
                    TraceAction::Apply {
                        production,
                        ambiguous,
                    } => ("apply".to_string(), grammar.production(*production), *ambiguous),
                    TraceAction::Accept => ("accept".to_string(), None, false),
                    TraceAction::Reject(failure) => (format!("error: {}", failure), None, false),
                };
                TraceStepOutput {
                    stack: join_names(&step.stack),
                    input: join_names(&step.input),
                    action,
                    rule: production.map(|p| p.to_string()).unwrap_or_default(),
                    ambiguous,
                    production,
                }
            })
            .collect();

        TraceOutput {
            success: self.success(),
            status: self.status,
            trace,
        }
    }
}

impl Render for TraceOutput<'_> {
    fn to_plaintext(&self) -> String {
        let mut output: Vec<Vec<String>> = vec![vec![
            "stack".to_string(),
            "input".to_string(),
            "action".to_string(),
        ]];
        output.extend(self.trace.iter().map(|step| {
            let action = match (step.rule.is_empty(), step.ambiguous) {
                (true, _) => step.action.clone(),
                (false, false) => step.rule.clone(),
                (false, true) => format!("{} (ambiguous)", step.rule),
            };
            vec![step.stack.clone(), step.input.clone(), action]
        }));

        format!("{}\n{:?}", align_columns(&output), self.status)
    }

    fn to_latex(&self) -> String {
        let content = self
            .trace
            .iter()
            .map(|step| {
                let action = match step.production {
                    Some(p) => format!("${}$", ProductionOutput::from_production(p).to_latex(false)),
                    None => tex_text(&step.action),
                };
                format!(
                    "{} & {} & {}",
                    tex_text(&step.stack),
                    tex_text(&step.input),
                    action
                )
            })
            .collect::<Vec<_>>()
            .join("\\\\\n");

        format!(
            "\\begin{{tabular}}{{r|r|l}}\nStack & Input & Action\\\\\\hline\n{}\\\\\n\\end{{tabular}}",
            content
        )
    }
}
