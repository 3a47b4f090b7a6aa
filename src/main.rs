use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use u_roster::config::{FallbackPolicy, OptimizerConfig};
use u_roster::{logging, ScheduleRequest, ShiftOptimizer};

#[derive(Parser)]
#[command(
    name = "u-roster",
    about = "Assign shifts to employees by skill, hour cap, and one shift per day",
    version
)]
struct Cli {
    /// Request JSON with `employees` and `shifts` (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Optimizer config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Override the time limit in milliseconds (0 = give up immediately)
    #[arg(long)]
    time_limit_ms: Option<u64>,
    /// Override the fallback on infeasibility: relaxed, greedy, or disabled
    #[arg(long, value_parser = parse_fallback)]
    fallback: Option<FallbackPolicy>,
    /// Pretty-print the response
    #[arg(long)]
    pretty: bool,
}

fn parse_fallback(value: &str) -> Result<FallbackPolicy, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown fallback '{value}' (expected relaxed, greedy, or disabled)"))
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => OptimizerConfig::from_path(path)?,
        None => OptimizerConfig::default(),
    };
    if let Some(ms) = cli.time_limit_ms {
        config.time_limit_ms = Some(ms);
    }
    if let Some(policy) = cli.fallback {
        config.fallback = policy;
    }

    let raw = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };
    let request = ScheduleRequest::from_json(&raw)?;

    let response = ShiftOptimizer::new()
        .with_config(config)
        .optimize_request(&request)?;

    let out = if cli.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{out}");
    Ok(())
}
