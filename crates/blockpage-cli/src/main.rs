//! blockpage CLI - render block-based pages with locally cached assets

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod logging;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize_logging(&cli)?;

    let config = commands::load_config(cli.config.as_deref())?;
    tracing::debug!("Asset cache directory: {}", config.assets.cache_dir().display());

    match cli.command {
        Commands::Render { page_id, format } => {
            commands::render_page(&config, &page_id, format).await
        },
        Commands::Attributes {
            page_id,
            resolve_assets,
        } => commands::show_attributes(&config, &page_id, resolve_assets).await,
        Commands::Toc { page_id, format } => commands::show_toc(&config, &page_id, format).await,
    }
}
