//! manualmirror CLI — mirrors a published policy manual into a document store.
//!
//! Scrapes the manual site into a document tree and reconciles it against an
//! existing record in the external content-management system.

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
