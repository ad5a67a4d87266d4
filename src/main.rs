use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use envsync::cli::{self, Cli};
use envsync::config::ClientConfig;
use envsync::error::Result;
use envsync::notify::StderrNotifier;
use envsync::store::GraphqlStore;

#[tokio::main]
async fn main() -> ExitCode {
    envsync::logging::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = ClientConfig::from_env()?.with_overrides(cli.endpoint, cli.token, cli.timeout);
    let store = Arc::new(GraphqlStore::new(&config)?);

    let notifier = Arc::new(StderrNotifier);
    let outcome = cli::run_command(store, notifier, &cli.app_id, cli.command).await?;
    println!("{}", outcome.view);
    Ok(if outcome.ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
