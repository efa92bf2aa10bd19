//! `formulary` -- resolve and evaluate formulas from the command line.
//!
//! Formulas are read from a JSON store (`{"name": "text"}`) and evaluated
//! against a JSON parameter file whose nested objects become records.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use formulary::{FormulaStore, Formulary, MapStore, ResolverConfig, DEFAULT_MAX_DEPTH};
use formulary_core::FormulaError;
use formulary_plugin::Environment;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "formulary", about = "Resolve formula references and evaluate the result", version)]
struct Cli {
    /// JSON file mapping formula names to formula text.
    #[arg(long, env = "FORMULARY_STORE")]
    store: Option<PathBuf>,

    /// JSON file with the parameters formulas are evaluated against.
    #[arg(long, env = "FORMULARY_ENV")]
    env: Option<PathBuf>,

    /// Deepest chain of nested formula references allowed.
    #[arg(long, env = "FORMULARY_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Print the formula with every reference substituted instead of its value.
    #[arg(long)]
    expand: bool,

    /// Print the result as JSON.
    #[arg(long, conflicts_with = "expand")]
    json: bool,

    /// List the available functions and exit.
    #[arg(long)]
    functions: bool,

    /// Describe one function (usage, parameters, examples) as JSON and exit.
    #[arg(long, value_name = "FUNCTION")]
    describe: Option<String>,

    /// Formula text, or `@name` for a formula from the store.
    #[arg(required_unless_present_any = ["functions", "describe"])]
    formula: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<FormulaError>() {
                Some(formula_error) => eprintln!("error: [{}] {}", formula_error.code, formula_error.message),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    let formulary = Formulary::with_standard_library()
        .with_config(ResolverConfig::new().with_max_depth(cli.max_depth));

    if cli.functions {
        return Ok(formulary.list_functions(None).join("\n"));
    }
    if let Some(name) = &cli.describe {
        let help = formulary.help(Some(name))?;
        return Ok(serde_json::to_string_pretty(&help.to_json())?);
    }

    let store = match &cli.store {
        Some(path) => MapStore::load(path)?,
        None => MapStore::new(),
    };
    let env = match &cli.env {
        Some(path) => load_env(path)?,
        None => Environment::new(),
    };
    debug!(formulas = store.len(), params = env.len(), "loaded inputs");

    let formula = cli.formula.as_deref().unwrap_or_default();
    let text = match formula.strip_prefix('@') {
        Some(name) => store.get_formula(name)?,
        None => formula.to_string(),
    };

    if cli.expand {
        return Ok(formulary.expand(&text, &env, &store)?);
    }
    let value = formulary.resolve(&text, &env, &store)?;
    if cli.json {
        Ok(serde_json::to_string(&value.to_json())?)
    } else {
        Ok(value.to_string())
    }
}

fn load_env(path: &Path) -> Result<Environment> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read parameters from {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    Ok(Environment::from_json(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_inline_formula() {
        let cli = Cli::parse_from(["formulary", "1 + 2 * 3"]);
        assert_eq!(run(&cli).unwrap(), "7");
    }

    #[test]
    fn test_formula_error_keeps_its_code() {
        let cli = Cli::parse_from(["formulary", "formula.missing"]);
        let err = run(&cli).unwrap_err();
        let formula_error = err.downcast_ref::<FormulaError>().unwrap();
        assert_eq!(formula_error.code, formulary::codes::FORMULA_NOT_FOUND);
    }

    #[test]
    fn test_functions_flag_needs_no_formula() {
        let cli = Cli::parse_from(["formulary", "--functions"]);
        assert!(run(&cli).unwrap().lines().any(|l| l == "sqrt"));
    }

    #[test]
    fn test_describe_prints_function_help() {
        let cli = Cli::parse_from(["formulary", "--describe", "round"]);
        let out: serde_json::Value = serde_json::from_str(&run(&cli).unwrap()).unwrap();
        assert_eq!(out["name"], "round");
        assert!(out["usage"].as_str().unwrap().starts_with("round("));

        let cli = Cli::parse_from(["formulary", "--describe", "rnd"]);
        let err = run(&cli).unwrap_err();
        let formula_error = err.downcast_ref::<FormulaError>().unwrap();
        assert_eq!(formula_error.code, formulary::codes::UNDEFINED_FUNC);
    }

    #[test]
    fn test_json_output() {
        let cli = Cli::parse_from(["formulary", "--json", "[1 / 4, 'a', 2 > 1]"]);
        assert_eq!(run(&cli).unwrap(), r#"[0.25,"a",true]"#);
    }
}
