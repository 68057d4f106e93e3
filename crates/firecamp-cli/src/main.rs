mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use commands::BootstrapOpts;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let store_path = cli.store_path;

    match cli.command {
        Command::Create { request, domain, vpc_id, region } => {
            commands::create(store_path, request, domain, vpc_id, region).await
        }
        Command::Delete { cluster, service } => commands::delete(store_path, cluster, service).await,
        Command::Init { cluster, service } => commands::init(store_path, cluster, service).await,
        Command::Get { cluster, service } => commands::get(store_path, cluster, service).await,
        Command::List { cluster } => commands::list(store_path, cluster).await,
        Command::Bootstrap { bind, port, auth_token, domain, vpc_id, region, ephemeral } => {
            commands::bootstrap(BootstrapOpts {
                store_path,
                bind,
                port,
                auth_token,
                domain,
                vpc_id,
                region,
                ephemeral,
            })
            .await
        }
    }
}
