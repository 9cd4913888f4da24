//! # blockpage-core
//!
//! Turns a page from a block-based content API into a rendered document with
//! locally cached assets.
//!
//! ## Architecture
//!
//! - **Client**: paginated access to the remote block hierarchy ([`BlockSource`])
//! - **Assets**: content-addressed, download-once asset cache ([`AssetCache`])
//! - **Transform**: per-block rewriting of asset references ([`BlockTransformer`])
//! - **Tree**: depth-first, order-preserving tree materialization ([`TreeFetcher`])
//! - **Pipeline**: block-to-HTML conversion with ordered extensions ([`HtmlPipeline`])
//! - **TOC**: outline flattening into depth-tagged headings ([`toc::extract`])
//! - **Renderer**: the whole flow for one page ([`PageRenderer`])
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockpage_core::{Config, HtmlPipeline, PageRenderer, default_extensions};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let renderer = PageRenderer::from_config(&config, Config::api_token().unwrap_or_default())?;
//!
//! let page = renderer
//!     .render("0f5c7e1d2b8a4c6e9d3f1a2b3c4d5e6f", &HtmlPipeline::new(), &default_extensions())
//!     .await?;
//! for heading in &page.headings {
//!     println!("{}{}", "  ".repeat(heading.depth), heading.text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`Result<T, Error>`]. [`PageRenderer::render`]
//! is the exception: it reduces failures to a [`RenderFailure`] carrying a
//! message and a category string.

/// Content-addressed asset cache
pub mod assets;
/// Remote content API access
pub mod client;
/// Configuration management
pub mod config;
/// Error types and result aliases
pub mod error;
/// Transformation pipeline seam and built-in HTML pipeline
pub mod pipeline;
/// Page rendering orchestration
pub mod renderer;
/// Heading slugs
pub mod slug;
/// Table-of-contents extraction
pub mod toc;
/// Per-block asset rewriting
pub mod transform;
/// Depth-first tree materialization
pub mod tree;
/// Core data types
pub mod types;

// Re-export commonly used types
pub use assets::{AssetCache, AssetCacheStats, CachedAsset};
pub use client::{BlockRecord, BlockSource, ChildrenPage, HttpBlockSource};
pub use config::{ApiConfig, AssetConfig, Config, ImageFailurePolicy, TreeConfig};
pub use error::{Error, Result};
pub use pipeline::{
    ArticleWrapper, HtmlPipeline, OutlineExtension, PipelineDocument, PipelineExtension,
    PipelineOutput, TransformPipeline, default_extensions,
};
pub use renderer::{PageRenderer, RenderFailure};
pub use toc::OutlineNode;
pub use transform::{AssetResolver, BlockTransformer};
pub use tree::{TreeFetcher, TreeWalk};
pub use types::*;
