//! artfill CLI: fill in missing artwork and image URLs by scraping pages.
//!
//! Walks the artwork collection, fetches the page behind whichever URL a
//! record has, and writes the image URL found there into the missing field.

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
