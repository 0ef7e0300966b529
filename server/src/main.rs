use clap::Parser;
use commands::Command;
use tracing_common::{setup_sentry, setup_tracing};

pub use color_eyre::Result;

mod commands;
mod favorites;
mod github;
mod http_server;
mod login_sessions;
mod recipes;
pub mod state;
pub(crate) use state::AppState;

#[derive(Parser)]
#[command(author, version, about)]
struct CliArgs {
    #[clap(subcommand)]
    command: Option<Command>,
}

fn main() -> Result<()> {
    let _sentry_guard = setup_sentry();

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()?
        .block_on(async { _main().await })
}

async fn _main() -> Result<()> {
    setup_tracing("server")?;

    let cli = CliArgs::parse();
    let command = cli.command.unwrap_or_default();

    command.run().await
}
