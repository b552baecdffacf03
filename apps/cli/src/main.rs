//! catalog-import CLI, a batch driver for legacy category exports.
//!
//! Reads category records and article assignments exported by the legacy
//! shop system and writes them into the catalog database.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
