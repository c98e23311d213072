use clap::Parser;

use scheme_rs::cli::{Cli, ConfigurationMerger, execute_command};
use scheme_rs::logger::init_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = ConfigurationMerger::load(&cli)?.merge_cli_args(&cli)?;
    init_logger(&settings.logger)?;

    if let Err(e) = execute_command(&cli, settings).await {
        tracing::error!(error = ?e, "Command failed");
        return Err(e.into());
    }
    Ok(())
}
