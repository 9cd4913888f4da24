//! Command implementations for the blockpage CLI

mod attributes;
mod render;
mod toc;

pub use attributes::execute as show_attributes;
pub use render::execute as render_page;
pub use toc::execute as show_toc;

use std::path::Path;

use anyhow::{Context, Result};
use blockpage_core::{Config, PageRenderer, config::TOKEN_ENV};

/// Load the explicit config file, or the global one.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) if path.exists() => Config::from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        Some(_) | None => Config::load().context("Failed to load configuration"),
    }
}

/// Renderer over the remote API, authenticated from the environment.
pub fn renderer(config: &Config) -> Result<PageRenderer> {
    let token = Config::api_token()
        .with_context(|| format!("No API token. Set {TOKEN_ENV} to an integration token"))?;
    PageRenderer::from_config(config, token).context("Failed to set up the renderer")
}
