//! Show a page's attributes

use anyhow::{Context, Result};
use blockpage_core::Config;

/// Execute the attributes command
pub async fn execute(config: &Config, page_id: &str, resolve_assets: bool) -> Result<()> {
    let renderer = super::renderer(config)?;
    let mut attributes = renderer
        .fetch_attributes(page_id)
        .await
        .with_context(|| format!("Failed to fetch page {page_id}"))?;
    if resolve_assets {
        attributes = renderer.resolve_asset_attributes(attributes).await;
    }
    println!("{}", serde_json::to_string_pretty(&attributes)?);
    Ok(())
}
