//! Show a page's table of contents

use anyhow::Result;
use blockpage_core::{Config, Heading, HtmlPipeline, OutlineExtension, PipelineExtension};
use std::sync::Arc;

use crate::cli::OutputFormat;

/// Execute the toc command
pub async fn execute(config: &Config, page_id: &str, format: OutputFormat) -> Result<()> {
    let renderer = super::renderer(config)?;
    let extensions: Vec<Arc<dyn PipelineExtension>> = vec![Arc::new(OutlineExtension)];
    let page = renderer
        .render(page_id, &HtmlPipeline::new(), &extensions)
        .await
        .map_err(|failure| {
            anyhow::anyhow!("Failed to render {page_id} ({}): {}", failure.category, failure.message)
        })?;

    match format {
        OutputFormat::Text => print!("{}", format_text(&page.headings)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page.headings)?),
    }
    Ok(())
}

fn format_text(headings: &[Heading]) -> String {
    headings
        .iter()
        .map(|h| format!("{}{} (#{})\n", "  ".repeat(h.depth), h.text, h.slug))
        .collect()
}
