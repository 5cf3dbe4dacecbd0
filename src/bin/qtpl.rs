//! qtpl — compile query templates from the command line
//!
//! # Usage
//!
//! ```bash
//! # Compile a template
//! qtpl "SELECT * FROM users WHERE id = ?d AND name = ?" --arg 42 --arg "O'Brien"
//!
//! # Skip an optional block
//! qtpl "SELECT * FROM users {WHERE id = ?d}" --arg @skip
//!
//! # All arguments as one JSON array
//! qtpl "UPDATE users SET ?a WHERE id = ?d" --args-json '[{"name": "Jack"}, 7]'
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use qtpl::prelude::*;
use qtpl::parser::Piece;
use tracing_subscriber::EnvFilter;

/// Argument text standing for the skip sentinel.
const SKIP_ARG: &str = "@skip";

#[derive(Parser)]
#[command(name = "qtpl")]
#[command(version)]
#[command(about = "Compile typed SQL query templates into literal SQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    qtpl 'SELECT * FROM users WHERE id = ?d' --arg 42
    qtpl 'SELECT ?# FROM users {WHERE name = ?}' --arg '[\"id\",\"name\"]' --arg @skip
    qtpl explain 'SELECT * FROM t {WHERE a = ?d}'")]
struct Cli {
    /// The query template to compile
    template: Option<String>,

    /// Positional argument (JSON if it parses as JSON, else text; @skip to skip)
    #[arg(short, long = "arg", allow_negative_numbers = true)]
    args: Vec<String>,

    /// All positional arguments as one JSON array (replaces --arg)
    #[arg(long, conflicts_with = "args")]
    args_json: Option<String>,

    /// String escaping rules: mysql, mysql-no-backslash or standard
    #[arg(long)]
    escaping: Option<EscapingMode>,

    /// How conditional blocks are elided: structural or textual
    #[arg(long)]
    elision: Option<ElisionMode>,

    /// Fail when argument and placeholder counts differ
    #[arg(long)]
    strict: bool,

    /// Config file (default: ./qtpl.toml, then the user config dir)
    #[arg(short, long, env = "QTPL_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the placeholders and blocks of a template
    Explain {
        /// The template to explain
        template: String,
    },
    /// Show the placeholder reference
    Markers,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Some(Commands::Explain { template }) => explain_template(template),
        Some(Commands::Markers) => {
            show_markers();
            Ok(())
        }
        None => match &cli.template {
            Some(template) => compile_template(template, &cli),
            None => {
                println!("{}", "qtpl — typed SQL query templates".cyan().bold());
                println!();
                println!("Usage: qtpl <TEMPLATE> [--arg VALUE]...");
                println!();
                println!("Try: qtpl --help");
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("qtpl=debug")
    } else {
        EnvFilter::try_from_env("QTPL_LOG").unwrap_or_else(|_| EnvFilter::new("qtpl=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn compile_template(template: &str, cli: &Cli) -> anyhow::Result<()> {
    let config = QtplConfig::load(cli.config.as_deref()).context("loading config")?;

    let mut compiler_config = config.compiler;
    if let Some(escaping) = cli.escaping {
        compiler_config.escaping = escaping;
    }
    if let Some(elision) = cli.elision {
        compiler_config.elision = elision;
    }
    if cli.strict {
        compiler_config.strict_arguments = true;
    }

    let args = match &cli.args_json {
        Some(json) => parse_args_json(json)?,
        None => cli.args.iter().map(|raw| parse_arg(raw)).collect(),
    };

    if cli.verbose {
        eprintln!("{} {}", "Template:".dimmed(), template.yellow());
        for (i, arg) in args.iter().enumerate() {
            eprintln!("  {} = {:?}", format!("#{}", i + 1).cyan(), arg);
        }
    }

    let sql = compiler_config.compiler().compile(template, &args)?;
    println!("{}", sql);
    Ok(())
}

/// One `--arg`: JSON when it parses, plain text otherwise.
fn parse_arg(raw: &str) -> SqlValue {
    if raw == SKIP_ARG {
        return SqlValue::Skip;
    }
    serde_json::from_str::<serde_json::Value>(raw)
        .map(SqlValue::from)
        .unwrap_or_else(|_| SqlValue::Text(raw.to_string()))
}

/// `--args-json`: a JSON array; the string "@skip" is the skip sentinel.
fn parse_args_json(json: &str) -> anyhow::Result<Vec<SqlValue>> {
    let items: Vec<serde_json::Value> =
        serde_json::from_str(json).map_err(QtplError::from).context("--args-json must be a JSON array")?;
    Ok(items
        .into_iter()
        .map(|item| match item {
            serde_json::Value::String(s) if s == SKIP_ARG => SqlValue::Skip,
            other => SqlValue::from(other),
        })
        .collect())
}

fn explain_template(template: &str) -> anyhow::Result<()> {
    println!("{}", "qtpl Template Explanation".cyan().bold());
    println!();
    println!("{} {}", "Template:".dimmed(), template.yellow());
    println!();

    let parsed = Template::parse(template)?;

    println!("{}", "Placeholders:".green().bold());
    let markers = parsed.markers_with_block();
    for (i, (marker, in_block)) in markers.iter().enumerate() {
        if *in_block {
            println!(
                "  #{:<3} {} {}",
                i + 1,
                marker.to_string().cyan(),
                "(in block)".dimmed()
            );
        } else {
            println!("  #{:<3} {}", i + 1, marker.to_string().cyan());
        }
    }
    if markers.is_empty() {
        println!("  {}", "(none)".dimmed());
    }

    println!();
    println!("{}", "Conditional blocks:".green().bold());
    let mut blocks = 0;
    for pieces in parsed.blocks() {
        blocks += 1;
        let text: String = pieces
            .iter()
            .map(|p| match p {
                Piece::Text(t) => t.to_string(),
                Piece::Marker(m) => m.to_string(),
            })
            .collect();
        println!("  {{{}}}", text.white());
    }
    if blocks == 0 {
        println!("  {}", "(none)".dimmed());
    }

    println!();
    println!("{} argument(s) expected", markers.len().to_string().cyan());
    Ok(())
}

fn show_markers() {
    println!("{}", "qtpl Placeholder Reference".cyan().bold());
    println!();

    let markers = [
        ("?", "String", "Escaped scalar", "'text', 12, NULL, 1"),
        ("?s", "String", "Same as ?", "'text'"),
        ("?d", "Integer", "Truncated integer", "42"),
        ("?f", "Float", "Shortest float", "3.14"),
        ("?a", "Array", "List or key = value list", "1, 2 / `k` = 'v'"),
        ("?#", "Identifier", "Backtick-quoted names", "`id`, `name`"),
        ("{...}", "Block", "Dropped when an arg is skipped", ""),
    ];

    println!(
        "{:8} {:12} {:32} {}",
        "Marker".white().bold(),
        "Type".white().bold(),
        "Function".white().bold(),
        "SQL Output".white().bold()
    );
    println!("{}", "─".repeat(80).dimmed());

    for (marker, kind, function, sql) in markers {
        println!(
            "{:8} {:12} {:32} {}",
            marker.cyan().bold(),
            kind.yellow(),
            function.white(),
            sql.dimmed()
        );
    }
}
