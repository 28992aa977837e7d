//! rowfilter - filter JSON rows through a condition list

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use log::info;
use rowfilter::config::{Evaluator, FilterDefinition};
use rowfilter::executor::{row_to_json, FilterExecutor, JsonSource, RowSource};
use rowfilter::value::Value;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Filter the rows of a JSON document through a condition list and print the
/// matching rows as JSON lines
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Condition file: a condition list, or an object with `conditions`,
    /// `config` and `variables`
    #[arg(short, long)]
    conditions: PathBuf,

    /// Row file with `columns` and `rows`
    #[arg(short, long)]
    rows: PathBuf,

    /// Variable value as name=value; the value is read as JSON when it parses
    #[arg(short = 'v', long = "var", value_parser = parse_var)]
    vars: Vec<(String, Value)>,

    /// Result for conditions on columns missing from the rows
    #[arg(long)]
    not_found: Option<bool>,

    /// Drop conditions whose variables have no value
    #[arg(long)]
    drop_ignored: bool,

    /// Evaluate with the stack machine instead of the compiled tree
    #[arg(long)]
    stack: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn parse_var(arg: &str) -> Result<(String, Value), String> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", arg))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{}'", arg));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::string(raw));
    Ok((name.to_string(), value))
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut definition = FilterDefinition::from_path(&args.conditions)?;
    definition.variables.extend(args.vars);
    if let Some(result) = args.not_found {
        definition.config.not_found_result = result;
    }
    if args.drop_ignored {
        definition.config.drop_ignored = true;
    }
    if args.stack {
        definition.config.evaluator = Evaluator::Stack;
    }

    let source = JsonSource::open(&args.rows);
    let mut filter = FilterExecutor::new(Box::new(source), definition.conditions)
        .with_config(definition.config)
        .with_variables(definition.variables);
    filter.init().context("Failed to prepare filter")?;

    let schema = filter.output_schema().to_vec();
    let mut out = BufWriter::new(io::stdout().lock());
    while let Some(row) = filter.next()? {
        writeln!(out, "{}", row_to_json(&schema, &row))?;
    }
    out.flush()?;

    let stats = filter.stats();
    info!("{} of {} rows matched", stats.passed, stats.scanned);
    Ok(())
}
