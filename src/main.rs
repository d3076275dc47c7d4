mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use vodwatch::config::Config;
use vodwatch::storage::JsonFileStore;
use vodwatch::types::sorted_ids;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let cfg = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { kind, json } => {
            let mut coordinator = vodwatch::coordinator_from_config(&cfg)?;
            if let Some(k) = kind { coordinator = coordinator.with_kinds(vec![k]); }

            let reports = coordinator.run_all().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }
            let failed = reports.iter().any(|r| r.outcome.is_failure());
            Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
        }
        Commands::State { kind, list } => {
            let store = JsonFileStore::new(cfg.state_dir()?);
            let Some(seen) = store.peek(kind).await.with_context(|| format!("reading {} state", kind))? else {
                println!("{}: nothing recorded yet ({})", kind, store.path_for(kind).display());
                return Ok(ExitCode::SUCCESS);
            };
            println!("{}: {} identifiers announced ({})", kind, seen.len(), store.path_for(kind).display());
            if list {
                for id in sorted_ids(&seen) { println!("{}", id); }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
