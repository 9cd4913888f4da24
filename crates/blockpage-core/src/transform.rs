//! Per-block asset rewriting.
//!
//! [`BlockTransformer`] dispatches on the block's type tag:
//!
//! | Variant   | Behavior                                                         |
//! |-----------|------------------------------------------------------------------|
//! | `image`   | hosted source cached; failure propagates (or keeps the remote URL under [`ImageFailurePolicy::KeepRemote`]) |
//! | `file`    | cached when the URL path looks like an image; failure keeps the block as-is |
//! | `video`, `pdf` | hosted source normalized to a plain URL, never downloaded   |
//! | `callout` | hosted icon cached; failure keeps the original icon              |
//! | others    | unchanged                                                        |
//!
//! Every successful resolution records its public path once, in first-produced
//! order, for the page's `image_paths`.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use crate::assets::{AssetCache, CachedAsset};
use crate::config::ImageFailurePolicy;
use crate::{AssetReference, Block, BlockKind, Icon, Result};

/// URL paths ending in a common raster or vector image extension.
static IMAGE_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpe?g|gif|webp|avif|svg|bmp|ico|tiff?|heic)$").unwrap()
});

/// Whether a URL's path (query and fragment ignored) names an image file.
#[must_use]
pub fn looks_like_image(url: &str) -> bool {
    let path = url::Url::parse(url).map_or_else(
        |_| url.split(['?', '#']).next().unwrap_or_default().to_string(),
        |parsed| parsed.path().to_string(),
    );
    IMAGE_PATH_RE.is_match(&path)
}

/// Turns a remote asset reference into a local copy.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Resolve `reference`, downloading it if needed.
    async fn resolve(&self, reference: &AssetReference) -> Result<CachedAsset>;
}

#[async_trait]
impl AssetResolver for AssetCache {
    async fn resolve(&self, reference: &AssetReference) -> Result<CachedAsset> {
        Self::resolve(self, reference).await
    }
}

/// Rewrites asset references inside blocks and tracks produced paths.
///
/// One transformer serves one page render; its recorded paths become that
/// render's `image_paths`.
pub struct BlockTransformer {
    resolver: Arc<dyn AssetResolver>,
    image_failure: ImageFailurePolicy,
    produced: Vec<String>,
}

impl BlockTransformer {
    /// Creates a transformer backed by `resolver`.
    pub fn new(resolver: Arc<dyn AssetResolver>, image_failure: ImageFailurePolicy) -> Self {
        Self {
            resolver,
            image_failure,
            produced: Vec::new(),
        }
    }

    /// Paths produced so far, first-produced order, no duplicates.
    #[must_use]
    pub fn asset_paths(&self) -> &[String] {
        &self.produced
    }

    /// Consume the transformer, returning the produced paths.
    #[must_use]
    pub fn into_asset_paths(self) -> Vec<String> {
        self.produced
    }

    /// Rewrite one block. Children are left as they are.
    ///
    /// Only `image` blocks can fail, and only under
    /// [`ImageFailurePolicy::Abort`].
    pub async fn transform(&mut self, mut block: Block) -> Result<Block> {
        let id = block.id.clone();
        match &mut block.kind {
            BlockKind::Image(media) => {
                if media.source.is_hosted() {
                    let cached = self.cache(&media.source).await;
                    match cached {
                        Ok(local) => media.source = local,
                        Err(err) => match self.image_failure {
                            ImageFailurePolicy::Abort => return Err(err),
                            ImageFailurePolicy::KeepRemote => {
                                warn!("Image block {} keeps its remote URL: {}", id, err);
                            },
                        },
                    }
                }
            },
            BlockKind::File(media) => {
                if media.source.remote_url().is_some_and(looks_like_image) {
                    let cached = self.cache(&media.source).await;
                    match cached {
                        Ok(local) => media.source = local,
                        Err(err) => warn!("File block {} left untouched: {}", id, err),
                    }
                }
            },
            BlockKind::Video(media) | BlockKind::Pdf(media) => {
                if let AssetReference::Hosted { url, .. } = &media.source {
                    media.source = AssetReference::External { url: url.clone() };
                }
            },
            BlockKind::Callout(callout) => {
                let hosted = callout.icon.as_ref().and_then(Icon::hosted_file).cloned();
                if let Some(reference) = hosted {
                    match self.cache(&reference).await {
                        Ok(local) => callout.icon = Some(Icon::Asset(local)),
                        Err(err) => warn!("Callout {} keeps its original icon: {}", id, err),
                    }
                }
            },
            _ => {},
        }
        Ok(block)
    }

    async fn cache(&mut self, reference: &AssetReference) -> Result<AssetReference> {
        let asset = self.resolver.resolve(reference).await?;
        if !self.produced.contains(&asset.public_path) {
            debug!("Recorded asset path {}", asset.public_path);
            self.produced.push(asset.public_path.clone());
        }
        Ok(asset.to_reference())
    }
}
