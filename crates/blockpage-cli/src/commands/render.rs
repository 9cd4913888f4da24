//! Render a page's content

use anyhow::Result;
use blockpage_core::{Config, HtmlPipeline, default_extensions};

use crate::cli::RenderFormat;

/// Execute the render command
pub async fn execute(config: &Config, page_id: &str, format: RenderFormat) -> Result<()> {
    let renderer = super::renderer(config)?;
    let page = renderer
        .render(page_id, &HtmlPipeline::new(), &default_extensions())
        .await
        .map_err(|failure| {
            anyhow::anyhow!("Failed to render {page_id} ({}): {}", failure.category, failure.message)
        })?;

    match format {
        RenderFormat::Html => println!("{}", page.html),
        RenderFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
    }
    Ok(())
}
