mod cli;
mod commands;
mod config;
mod error;

use std::process::ExitCode;

use clap::Parser;
use rimu_api::RimuClient;
use rimu_cluster::{ClusterConfig, ClusterCoordinator};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::servers::{self, Action};
use crate::config::AppConfig;
use crate::error::{Error, Result};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before clap reads RIMUHOSTING_* variables
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await.and_then(print) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Value> {
    let config = AppConfig::resolve(&cli)?;
    let client = RimuClient::new(config.client_config())?;
    tracing::debug!(base_url = %config.base_url, has_key = client.has_api_key(), "client ready");

    match &cli.command {
        Commands::Datacenters => servers::datacenters(&client).await,
        Commands::Distros => servers::distros(&client).await,
        Commands::Ls { all, meta_search } => {
            servers::ls(&client, *all, meta_search.as_deref()).await
        }
        Commands::Mkvm(args) => servers::mkvm(&client, args).await,
        Commands::Status(args) => servers::order_action(&client, Action::Status, args).await,
        Commands::Info(args) => servers::order_action(&client, Action::Info, args).await,
        Commands::Delete(args) => servers::order_action(&client, Action::Delete, args).await,
        Commands::Start(args) => servers::order_action(&client, Action::Start, args).await,
        Commands::Stop(args) => servers::order_action(&client, Action::Stop, args).await,
        Commands::Reboot(args) => servers::order_action(&client, Action::Reboot, args).await,
        Commands::Powercycle(args) => {
            servers::order_action(&client, Action::PowerCycle, args).await
        }
        Commands::Move(args) => servers::move_vps(&client, args).await,
        Commands::Cluster(cmd) => {
            let coordinator = ClusterCoordinator::new(client, ClusterConfig::default());
            commands::cluster::run(&coordinator, cmd).await
        }
    }
}

fn print(value: Value) -> Result<()> {
    let text = serde_json::to_string_pretty(&value).map_err(Error::Output)?;
    println!("{text}");
    Ok(())
}
