use std::{fs, io::Read, path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use ll1_checker::{Error, Grammar, GrammarInput, Render, DEFAULT_MAX_STEPS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    /// Productions
    Prod,
    /// Nullable, FIRST and FOLLOW sets
    Ff,
    /// LL(1) parsing table
    Ll1,
    /// LL(1) verdict and conflicts
    Conflicts,
    /// Predictive parse trace of --input
    Trace,
}

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// File containing the grammar (default: stdin)
    file: Option<PathBuf>,

    /// What to print
    #[arg(
        short,
        long = "output",
        value_enum,
        value_name = "OUTPUT",
        default_values_t = [Output::Ff, Output::Ll1, Output::Conflicts]
    )]
    outputs: Vec<Output>,

    /// Start symbol (default: first left side in the file)
    #[arg(short, long, value_name = "SYMBOL")]
    start: Option<String>,

    /// Whitespace-separated tokens to trace
    #[arg(short, long, value_name = "TOKENS")]
    input: Option<String>,

    /// Step limit for the trace
    #[arg(long, value_name = "STEPS", default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Eliminate left recursion before analysis
    #[arg(short, long)]
    eliminate_left_recursion: bool,

    /// Read a JSON request ({"grammar": [...], "start_symbol": ...}) instead of grammar text
    #[arg(short, long)]
    request: bool,

    /// Print in LaTeX format
    #[arg(short, long, conflicts_with = "json")]
    latex: bool,

    /// Print in JSON format
    #[arg(short, long)]
    json: bool,
}

#[derive(Deserialize)]
struct RequestFile {
    #[serde(flatten)]
    grammar: GrammarInput,
    input_string: Option<String>,
    max_steps: Option<usize>,
}

enum OutputFormat {
    Plain,
    LaTeX,
    JSON,
}

fn print<T: Render + Serialize>(t: &T, format: &OutputFormat) -> Result<(), Error> {
    let text = match format {
        OutputFormat::Plain => t.to_plaintext(),
        OutputFormat::LaTeX => t.to_latex(),
        OutputFormat::JSON => serde_json::to_string(t)?,
    };
    println!("{}", text);
    Ok(())
}

fn run(cli: Cli) -> Result<(), Error> {
    let text = match &cli.file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut input = cli.input.clone();
    let mut max_steps = cli.max_steps;
    let mut g = if cli.request {
        let request: RequestFile = serde_json::from_str(&text)?;
        input = input.or(request.input_string);
        max_steps = request.max_steps.unwrap_or(max_steps);
        Grammar::from_input(&request.grammar)?
    } else {
        Grammar::parse_with_start(&text, cli.start.as_deref())?
    };

    if cli.eliminate_left_recursion {
        g = g.eliminate_left_recursion();
    }

    let format = if cli.latex {
        OutputFormat::LaTeX
    } else if cli.json {
        OutputFormat::JSON
    } else {
        OutputFormat::Plain
    };

    let mut outputs = cli.outputs.clone();
    if input.is_some() && !outputs.contains(&Output::Trace) {
        outputs.push(Output::Trace);
    }

    let analysis = g.analyze();
    for output in outputs {
        match output {
            Output::Prod => print(&g.to_production_output_vec(), &format)?,
            Output::Ff => print(&analysis.to_non_terminal_output_vec(), &format)?,
            Output::Ll1 => print(&analysis.to_ll1_table_output(), &format)?,
            Output::Conflicts => print(&analysis.to_conflict_output_vec(), &format)?,
            Output::Trace => {
                let tokens = input.as_deref().unwrap_or_default();
                let trace = analysis.trace(tokens, max_steps);
                print(&trace.to_output(&g), &format)?;
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
