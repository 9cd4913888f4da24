//! Page-level orchestration.
//!
//! [`PageRenderer`] ties the pieces together: it walks the page's block
//! tree through a [`BlockTransformer`], hands the finished blocks to a
//! [`TransformPipeline`], and flattens the pipeline's outline into
//! headings. Page attributes are a separate two-step affair: project them
//! with [`PageRenderer::fetch_attributes`], then, if wanted, cache their
//! assets with [`PageRenderer::resolve_asset_attributes`].
//!
//! ```rust,no_run
//! use blockpage_core::{Config, HtmlPipeline, PageRenderer, default_extensions};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let token = Config::api_token().unwrap_or_default();
//! let renderer = PageRenderer::from_config(&config, token)?;
//! let page = renderer
//!     .render("page-id", &HtmlPipeline::new(), &default_extensions())
//!     .await?;
//! println!("{} headings, {} assets", page.headings.len(), page.image_paths.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::assets::AssetCache;
use crate::client::{BlockSource, HttpBlockSource};
use crate::config::{Config, ImageFailurePolicy};
use crate::pipeline::{PipelineExtension, TransformPipeline};
use crate::transform::{AssetResolver, BlockTransformer, looks_like_image};
use crate::tree::TreeFetcher;
use crate::{Error, Page, PageAttributes, PropertyValue, RenderedPage, Result, toc};

/// Why a render produced nothing.
///
/// Only a message and a category string leave the render boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct RenderFailure {
    /// Human-readable description.
    pub message: String,
    /// Stable error category, see [`Error::category`].
    pub category: &'static str,
}

impl From<Error> for RenderFailure {
    fn from(err: Error) -> Self {
        Self {
            category: err.category(),
            message: err.to_string(),
        }
    }
}

/// Renders pages from a [`BlockSource`] with a shared [`AssetCache`].
pub struct PageRenderer {
    source: Arc<dyn BlockSource>,
    assets: Arc<AssetCache>,
    fetcher: TreeFetcher,
    image_failure: ImageFailurePolicy,
}

impl PageRenderer {
    /// Renderer over explicit collaborators.
    pub fn new(source: Arc<dyn BlockSource>, assets: Arc<AssetCache>, config: &Config) -> Self {
        Self {
            fetcher: TreeFetcher::new(Arc::clone(&source), &config.tree),
            source,
            assets,
            image_failure: config.assets.image_failure,
        }
    }

    /// Renderer talking to the remote API over HTTP.
    pub fn from_config(config: &Config, token: impl Into<String>) -> Result<Self> {
        let source: Arc<dyn BlockSource> = Arc::new(HttpBlockSource::new(&config.api, token)?);
        let assets = Arc::new(AssetCache::new(&config.assets)?);
        Ok(Self::new(source, assets, config))
    }

    /// The asset cache shared by every render.
    #[must_use]
    pub fn assets(&self) -> &Arc<AssetCache> {
        &self.assets
    }

    /// Project the attribute view of `page`. Pure; no I/O.
    #[must_use]
    pub fn attributes(page: &Page) -> PageAttributes {
        PageAttributes::from_page(page)
    }

    /// Retrieve a page record and project its attributes.
    ///
    /// Asset references are returned exactly as the API sent them.
    pub async fn fetch_attributes(&self, page_id: &str) -> Result<PageAttributes> {
        let page = self.source.retrieve_page(page_id).await?;
        Ok(Self::attributes(&page))
    }

    /// Cache the assets behind page attributes and point them at the local copies.
    ///
    /// Rewrites a hosted cover and every `files` property entry whose URL
    /// looks like an image. Best effort: an entry that fails keeps its
    /// remote reference and the failure is only logged.
    pub async fn resolve_asset_attributes(&self, mut attributes: PageAttributes) -> PageAttributes {
        if let Some(cover) = attributes.cover.as_mut().filter(|cover| cover.is_hosted()) {
            let resolved = self.assets.resolve(cover).await;
            match resolved {
                Ok(asset) => *cover = asset.to_reference(),
                Err(err) => warn!("Cover of page {} left remote: {}", attributes.id, err),
            }
        }

        for (name, value) in &mut attributes.properties {
            let PropertyValue::Files(entries) = value else {
                continue;
            };
            for entry in entries {
                if !entry.source.remote_url().is_some_and(looks_like_image) {
                    continue;
                }
                let resolved = self.assets.resolve(&entry.source).await;
                match resolved {
                    Ok(asset) => entry.source = asset.to_reference(),
                    Err(err) => warn!(
                        "File '{}' in property '{}' of page {} left remote: {}",
                        entry.name, name, attributes.id, err
                    ),
                }
            }
        }

        attributes
    }

    /// Render the page's content tree.
    ///
    /// Fetch, asset, structure, and pipeline failures all end the render;
    /// there is no partial result.
    pub async fn render(
        &self,
        page_id: &str,
        pipeline: &dyn TransformPipeline,
        extensions: &[Arc<dyn PipelineExtension>],
    ) -> std::result::Result<RenderedPage, RenderFailure> {
        self.try_render(page_id, pipeline, extensions)
            .await
            .map_err(|err| {
                warn!("Render of page {} failed: {}", page_id, err);
                RenderFailure::from(err)
            })
    }

    async fn try_render(
        &self,
        page_id: &str,
        pipeline: &dyn TransformPipeline,
        extensions: &[Arc<dyn PipelineExtension>],
    ) -> Result<RenderedPage> {
        let started = Instant::now();
        let resolver: Arc<dyn AssetResolver> = Arc::clone(&self.assets) as Arc<dyn AssetResolver>;
        let transformer = BlockTransformer::new(resolver, self.image_failure);

        let mut walk = self.fetcher.walk(page_id, transformer);
        let blocks = walk.collect_all().await?;
        let image_paths = walk.into_transformer().into_asset_paths();

        let output = pipeline.run(&blocks, extensions)?;
        let headings = match &output.outline {
            Some(outline) => toc::extract(outline)?,
            None => Vec::new(),
        };

        info!(
            "Rendered page {} ({} top-level blocks, {} headings, {} assets) in {}ms",
            page_id,
            blocks.len(),
            headings.len(),
            image_paths.len(),
            started.elapsed().as_millis()
        );

        Ok(RenderedPage {
            html: output.html,
            headings,
            image_paths,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::client::{BlockRecord, ChildrenPage};
    use crate::config::AssetConfig;
    use crate::pipeline::{HtmlPipeline, OutlineExtension, PipelineOutput};
    use crate::types::{FileEntry, HeadingBlock, MediaBlock, RichText};
    use crate::{AssetReference, Block, BlockKind};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct OnePage {
        blocks: Vec<Block>,
        page: Page,
    }

    #[async_trait]
    impl BlockSource for OnePage {
        async fn list_children(&self, _parent: &str, _cursor: Option<&str>) -> Result<ChildrenPage> {
            Ok(ChildrenPage {
                results: self.blocks.iter().cloned().map(BlockRecord::Full).collect(),
                next_cursor: None,
            })
        }

        async fn retrieve_page(&self, _page_id: &str) -> Result<Page> {
            Ok(self.page.clone())
        }
    }

    fn empty_page() -> Page {
        Page {
            id: "page".into(),
            url: None,
            cover: None,
            icon: None,
            properties: BTreeMap::new(),
            created_time: None,
            last_edited_time: None,
        }
    }

    fn renderer(blocks: Vec<Block>, page: Page, root: &TempDir) -> PageRenderer {
        let config = Config {
            assets: AssetConfig::with_root(root.path()),
            ..Config::default()
        };
        let assets = Arc::new(AssetCache::new(&config.assets).unwrap());
        PageRenderer::new(Arc::new(OnePage { blocks, page }), assets, &config)
    }

    fn hosted(url: String) -> AssetReference {
        AssetReference::Hosted {
            url,
            expiry_time: None,
        }
    }

    fn h1(text: &str) -> Block {
        Block::new(
            text,
            BlockKind::Heading1(HeadingBlock {
                rich_text: vec![RichText::plain(text)],
                ..HeadingBlock::default()
            }),
        )
    }

    struct FailingPipeline;

    impl TransformPipeline for FailingPipeline {
        fn run(
            &self,
            _blocks: &[Block],
            _extensions: &[Arc<dyn PipelineExtension>],
        ) -> Result<PipelineOutput> {
            Err(Error::Pipeline("template exploded".into()))
        }
    }

    #[tokio::test]
    async fn test_render_collects_headings_and_paths() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/a.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let image = |id: &str| {
            Block::new(
                id,
                BlockKind::Image(MediaBlock::new(hosted(format!("{}/img/a.png?sig={id}", server.uri())))),
            )
        };
        let dir = TempDir::new()?;
        let renderer = renderer(vec![h1("Title"), image("one"), image("two")], empty_page(), &dir);

        let extensions: Vec<Arc<dyn PipelineExtension>> = vec![Arc::new(OutlineExtension)];
        let page = renderer
            .render("page", &HtmlPipeline::new(), &extensions)
            .await?;

        assert_eq!(page.headings.len(), 1);
        assert_eq!(page.headings[0].slug, "title");
        assert_eq!(page.image_paths.len(), 1);
        assert!(page.image_paths[0].starts_with("/notion-assets/"));
        assert!(page.html.contains(&page.image_paths[0]));
        Ok(())
    }

    #[tokio::test]
    async fn test_pipeline_failure_returns_no_output() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let renderer = renderer(vec![h1("Title")], empty_page(), &dir);

        let failure = renderer
            .render("page", &FailingPipeline, &[])
            .await
            .unwrap_err();
        assert_eq!(failure.category, "pipeline");
        assert!(failure.message.contains("template exploded"));
        Ok(())
    }

    #[tokio::test]
    async fn test_image_failure_fails_render() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new()?;
        let image = Block::new(
            "img",
            BlockKind::Image(MediaBlock::new(hosted(format!("{}/x.png", server.uri())))),
        );
        let renderer = renderer(vec![image], empty_page(), &dir);

        let failure = renderer
            .render("page", &HtmlPipeline::new(), &[])
            .await
            .unwrap_err();
        assert_eq!(failure.category, "asset_fetch");
        Ok(())
    }

    #[tokio::test]
    async fn test_attributes_are_resolved_only_on_request() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cover.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpg".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut page = empty_page();
        page.cover = Some(hosted(format!("{}/cover.jpg?X-Amz=1", server.uri())));
        page.properties.insert(
            "Files".into(),
            PropertyValue::Files(vec![
                FileEntry {
                    name: "missing.png".into(),
                    source: AssetReference::External {
                        url: format!("{}/missing.png", server.uri()),
                    },
                },
                FileEntry {
                    name: "notes.txt".into(),
                    source: AssetReference::External {
                        url: format!("{}/notes.txt", server.uri()),
                    },
                },
            ]),
        );
        let dir = TempDir::new()?;
        let renderer = renderer(vec![], page, &dir);

        let attributes = renderer.fetch_attributes("page").await?;
        assert!(attributes.cover.as_ref().is_some_and(AssetReference::is_hosted));

        let resolved = renderer.resolve_asset_attributes(attributes.clone()).await;
        assert!(matches!(resolved.cover, Some(AssetReference::Cached { .. })));
        // Failed and non-image entries keep their original references.
        assert_eq!(resolved.properties, attributes.properties);
        Ok(())
    }

    #[test]
    fn test_render_failure_from_error() {
        let failure = RenderFailure::from(Error::Structure("outline root must be a list".into()));
        assert_eq!(failure.category, "structure");
        assert_eq!(failure.to_string(), failure.message);
    }
}
