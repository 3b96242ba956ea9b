use std::fmt::Write as _;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::api::{self, CalculatorView};
use crate::config::AppConfig;
use crate::core::{CalculatorEngine, CalculatorRegistry, EngineError};
use crate::error::AppError;
use crate::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "wealth-calc",
    about = "Goal-based investment calculators over HTTP or from the terminal",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List the available calculators
    List,
    /// Evaluate one calculator and print its results
    Calc(CalcArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct CalcArgs {
    /// Calculator key or route slug, e.g. `sip` or `house-planning-calculator`
    key: String,
    /// Override an input, e.g. `--set years=15`
    #[arg(long = "set", value_name = "INPUT=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, String)>,
    /// Print the full view as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected INPUT=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing input name in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

pub async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => {
            if let Some(host) = args.host {
                config.server.host = host;
            }
            if let Some(port) = args.port {
                config.server.port = port;
            }
            api::run_http_server(&config).await
        }
        Command::List => {
            let registry = CalculatorRegistry::builtin()?;
            print!("{}", render_list(&registry));
            Ok(())
        }
        Command::Calc(args) => {
            let registry = CalculatorRegistry::builtin()?;
            let view = evaluate(&registry, &args.key, &args.set, &config.currency_symbol)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", render_view(&view));
            }
            Ok(())
        }
    }
}

fn evaluate(
    registry: &CalculatorRegistry,
    key: &str,
    overrides: &[(String, String)],
    currency_symbol: &str,
) -> Result<CalculatorView, AppError> {
    let mut engine = CalculatorEngine::new(registry);
    engine.select_type(key)?;
    for (input, raw) in overrides {
        let stored = engine.set_input_text(input, raw)?;
        info!(input = input.as_str(), stored, "input applied");
    }
    let definition = engine.definition().ok_or(EngineError::NotReady)?;
    let snapshot = engine.snapshot().ok_or(EngineError::NotReady)?;
    Ok(api::build_view(definition, snapshot, currency_symbol))
}

fn render_list(registry: &CalculatorRegistry) -> String {
    let mut out = String::new();
    for definition in registry.iter() {
        let summary = api::summarize(definition);
        let _ = writeln!(
            out,
            "{:<10} {:<30} {}",
            summary.key, summary.slug, summary.description
        );
    }
    out
}

fn render_view(view: &CalculatorView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.name);
    let _ = writeln!(out, "{}", view.description);
    let _ = writeln!(out);
    for input in &view.inputs {
        let _ = writeln!(out, "  {:<32} {}", input.label, input.display);
    }
    let _ = writeln!(out);
    for row in &view.results {
        let _ = writeln!(out, "  {:<32} {}", row.label, row.display);
    }
    out
}
