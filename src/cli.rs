use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tokio::time::{sleep, Duration};

use crate::tools::batch::{bounded_map, bounded_map_spawned, bounded_map_with_stats};
use crate::{runtime, ApiResponse, BatchOptions};

#[derive(Parser)]
#[command(name = "boundmap", version, about = "Bounded-concurrency async map (JSON only)")]
pub struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Map "sleep DELAY*x ms, then double" over VALUES
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Non-negative integers to transform
    pub values: Vec<u64>,
    /// Max transforms in flight [default: $BOUNDMAP_LIMIT or 4]
    #[arg(long)]
    pub limit: Option<usize>,
    /// Milliseconds of simulated work per unit of input
    #[arg(long = "delay-ms", default_value_t = 100)]
    pub delay_ms: u64,
    /// Make even inputs fail
    #[arg(long = "fail-even")]
    pub fail_even: bool,
    /// Run each transform as its own runtime task
    #[arg(long, conflicts_with = "stats")]
    pub spawned: bool,
    /// Include batch stats in the output
    #[arg(long)]
    pub stats: bool,
}

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Run(args) => {
            let response = runtime::block_on(execute(args))?;
            let code = if response.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
            print_json(&response)?;
            Ok(code)
        }
    }
}

/// Run one demo batch and wrap the result in the JSON envelope.
pub async fn execute(args: RunArgs) -> anyhow::Result<ApiResponse<Value>> {
    let limit = args.limit.unwrap_or_else(|| BatchOptions::from_env().limit);
    let delay_ms = args.delay_ms;
    let fail_even = args.fail_even;

    let transform = move |x: u64| async move {
        sleep(Duration::from_millis(delay_ms.saturating_mul(x))).await;
        if fail_even && x % 2 == 0 {
            Err("even number failed".to_string())
        } else {
            Ok(x * 2)
        }
    };

    let data = if args.spawned {
        bounded_map_spawned(args.values, transform, limit)
            .await
            .map(|outcomes| {
                outcomes
                    .into_iter()
                    .map(|o| o.map_failure(|e| e.to_string()))
                    .collect::<Vec<_>>()
            })
            .map(|outcomes| serde_json::to_value(outcomes))
    } else if args.stats {
        bounded_map_with_stats(args.values, transform, limit)
            .await
            .map(|run| serde_json::to_value(run))
    } else {
        bounded_map(args.values, transform, limit)
            .await
            .map(|outcomes| serde_json::to_value(outcomes))
    };

    Ok(match data {
        Ok(value) => ApiResponse::ok(value.context("serializing outcomes")?),
        Err(e) => ApiResponse::err(e.to_string()),
    })
}

fn print_json<T: serde::Serialize>(val: &T) -> anyhow::Result<()> {
    // pretty JSON output
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}
