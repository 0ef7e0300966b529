use clap::Subcommand;
use color_eyre::Result;

pub(crate) mod info;

#[derive(Subcommand, Default)]
pub(crate) enum Command {
    /// Run the HTTP server
    #[default]
    Serve,
    /// Print build and configuration details
    Info,
}

impl Command {
    pub(crate) async fn run(&self) -> Result<()> {
        match &self {
            Command::Serve => crate::http_server::cmd::serve().await,
            Command::Info => info::print_info(),
        }
    }
}
