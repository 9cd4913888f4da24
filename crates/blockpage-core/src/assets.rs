//! Content-addressed asset cache.
//!
//! Remote assets are stored as `{sha256(canonical_url)}{extension}` inside
//! one cache directory and exposed under `/{dir_name}/{file}`. The key
//! depends only on the URL, so the same asset referenced from several
//! blocks or pages maps to one file and one download.
//!
//! Lookups go through three layers:
//!
//! 1. an in-process once-cell per key, so concurrent callers share one download
//! 2. the on-disk file left by an earlier run (no network call)
//! 3. a streaming download into a temporary file that is renamed into place
//!    only after the body has been written completely
//!
//! Concurrent processes may race on the same key. Both write the same bytes
//! to uniquely named temporary files and rename them onto the same target,
//! so the loser overwrites an identical file.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::StreamExt;
use reqwest::Client;
use reqwest::redirect::Policy;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};
use url::Url;

use crate::config::AssetConfig;
use crate::{AssetReference, Error, Result};

/// A locally available copy of a remote asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAsset {
    /// Hex SHA-256 of the canonical URL.
    pub key: String,
    /// `{key}{extension}`
    pub file_name: String,
    /// Where the file lives on disk.
    pub disk_path: PathBuf,
    /// Public path, `/{dir_name}/{file_name}`.
    pub public_path: String,
    /// URL the asset was (or would be) downloaded from.
    pub source_url: String,
}

impl CachedAsset {
    /// Reference pointing at this cached copy.
    #[must_use]
    pub fn to_reference(&self) -> AssetReference {
        AssetReference::Cached {
            path: self.public_path.clone(),
            source_url: self.source_url.clone(),
        }
    }
}

/// Counters describing how lookups were served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetCacheStats {
    /// Files fetched over the network.
    pub downloads: usize,
    /// Lookups answered by a file already on disk.
    pub disk_hits: usize,
    /// Lookups answered by the in-process memo.
    pub memory_hits: usize,
}

#[derive(Default)]
struct Counters {
    downloads: AtomicUsize,
    disk_hits: AtomicUsize,
    memory_hits: AtomicUsize,
}

/// Downloads remote assets at most once and hands out stable local paths.
pub struct AssetCache {
    client: Client,
    cache_dir: PathBuf,
    dir_name: String,
    fallback_extension: String,
    entries: Mutex<HashMap<String, Arc<OnceCell<CachedAsset>>>>,
    counters: Counters,
}

impl AssetCache {
    /// Creates a cache writing under `config.cache_dir()`.
    ///
    /// The directory itself is created lazily on the first download.
    pub fn new(config: &AssetConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .redirect(Policy::limited(config.max_redirects))
            .user_agent(concat!("outfitter-blockpage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            client,
            cache_dir: config.cache_dir(),
            dir_name: config.dir_name.clone(),
            fallback_extension: config.fallback_extension.clone(),
            entries: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        })
    }

    /// Directory the cached files live in.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Snapshot of the lookup counters.
    #[must_use]
    pub fn stats(&self) -> AssetCacheStats {
        AssetCacheStats {
            downloads: self.counters.downloads.load(Ordering::Relaxed),
            disk_hits: self.counters.disk_hits.load(Ordering::Relaxed),
            memory_hits: self.counters.memory_hits.load(Ordering::Relaxed),
        }
    }

    /// Where `reference` is (or will be) cached, without any I/O.
    pub fn locate(&self, reference: &AssetReference) -> Result<CachedAsset> {
        let raw = reference
            .remote_url()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::asset("", "reference has no remote URL"))?;
        let url = Url::parse(raw).map_err(|e| Error::asset(raw, format!("invalid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::asset(
                raw,
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        let canonical = canonical_url(&url, reference.is_hosted());
        let key = cache_key(&canonical);
        let file_name = format!("{key}{}", extension_for(&url, &self.fallback_extension));

        Ok(CachedAsset {
            disk_path: self.cache_dir.join(&file_name),
            public_path: format!("/{}/{}", self.dir_name, file_name),
            key,
            file_name,
            source_url: raw.to_string(),
        })
    }

    /// Resolve `reference` to a local copy, downloading it if needed.
    ///
    /// Repeated calls for the same canonical URL return the same
    /// [`CachedAsset`] and never download twice while the file persists.
    pub async fn resolve(&self, reference: &AssetReference) -> Result<CachedAsset> {
        let located = self.locate(reference)?;

        let cell = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(located.key.clone()).or_default())
        };

        if let Some(asset) = cell.get() {
            self.counters.memory_hits.fetch_add(1, Ordering::Relaxed);
            debug!("Asset memo hit for {}", asset.public_path);
            return Ok(asset.clone());
        }

        cell.get_or_try_init(|| self.materialize(located))
            .await
            .cloned()
    }

    async fn materialize(&self, asset: CachedAsset) -> Result<CachedAsset> {
        let exists = tokio::fs::try_exists(&asset.disk_path)
            .await
            .map_err(|e| Error::asset(&asset.source_url, format!("cannot stat cache file: {e}")))?;
        if exists {
            self.counters.disk_hits.fetch_add(1, Ordering::Relaxed);
            debug!("Asset already on disk: {}", asset.disk_path.display());
            return Ok(asset);
        }

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| Error::asset(&asset.source_url, format!("cannot create cache dir: {e}")))?;

        let bytes = self.download(&asset.source_url, &asset.disk_path).await?;
        self.counters.downloads.fetch_add(1, Ordering::Relaxed);
        info!(
            "Cached {} bytes from {} as {}",
            bytes, asset.source_url, asset.file_name
        );
        Ok(asset)
    }

    async fn download(&self, url: &str, target: &Path) -> Result<u64> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::asset(url, "request timed out")
            } else {
                Error::asset(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::asset(url, format!("HTTP {status}")));
        }

        // Dropping `partial` before `persist` deletes the half-written file.
        let (file, partial) = tempfile::Builder::new()
            .prefix(".")
            .suffix(".part")
            .tempfile_in(&self.cache_dir)
            .map_err(|e| Error::asset(url, format!("cannot create temp file: {e}")))?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                if e.is_timeout() {
                    Error::asset(url, "body read timed out")
                } else {
                    Error::asset(url, format!("body read failed: {e}"))
                }
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::asset(url, format!("write failed: {e}")))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| Error::asset(url, format!("flush failed: {e}")))?;
        drop(file);

        partial
            .persist(target)
            .map_err(|e| Error::asset(url, format!("cannot move into cache: {}", e.error)))?;
        Ok(written)
    }
}

/// Identity of an asset for keying.
///
/// Hosted URLs drop their query and fragment (the query is an expiring
/// signature); external URLs are kept whole.
#[must_use]
pub fn canonical_url(url: &Url, hosted: bool) -> String {
    if hosted {
        let mut stripped = url.clone();
        stripped.set_query(None);
        stripped.set_fragment(None);
        stripped.to_string()
    } else {
        url.to_string()
    }
}

/// Hex SHA-256 of the canonical URL.
#[must_use]
pub fn cache_key(canonical: &str) -> String {
    let digest = Sha256::digest(canonical.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        // write! to String is infallible
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Extension of the last path segment, case preserved, or `fallback`.
///
/// The suffix from the segment's last `.` counts as an extension when it has
/// one to eight ASCII alphanumerics after the dot. Query and fragment are
/// never considered.
#[must_use]
pub fn extension_for(url: &Url, fallback: &str) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    segment
        .rfind('.')
        .map(|idx| &segment[idx..])
        .filter(|suffix| {
            let ext = &suffix[1..];
            (1..=8).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map_or_else(|| fallback.to_string(), str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn cache_in(dir: &TempDir) -> AssetCache {
        AssetCache::new(&AssetConfig::with_root(dir.path())).unwrap()
    }

    fn external(url: String) -> AssetReference {
        AssetReference::External { url }
    }

    #[test]
    fn test_extension_preserves_case_and_ignores_query() {
        let url = Url::parse("https://host/path/img.PNG?sig=abc").unwrap();
        assert_eq!(extension_for(&url, ".bin"), ".PNG");
    }

    #[test]
    fn test_extension_fallbacks() {
        for raw in [
            "https://host/path/noext",
            "https://host/path/",
            "https://host/archive.tar.verylongext",
            "https://host/trailing.",
            "https://host/weird.p-n-g",
        ] {
            let url = Url::parse(raw).unwrap();
            assert_eq!(extension_for(&url, ".bin"), ".bin", "{raw}");
        }
    }

    #[test]
    fn test_hosted_key_ignores_signature() {
        let a = Url::parse("https://files.example/s3/a.png?X-Amz-Signature=1").unwrap();
        let b = Url::parse("https://files.example/s3/a.png?X-Amz-Signature=2").unwrap();
        assert_eq!(
            cache_key(&canonical_url(&a, true)),
            cache_key(&canonical_url(&b, true))
        );
        assert_ne!(
            cache_key(&canonical_url(&a, false)),
            cache_key(&canonical_url(&b, false))
        );
    }

    #[test]
    fn test_locate_builds_public_path() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let asset = cache
            .locate(&external("https://img.example/a/photo.jpeg".into()))
            .unwrap();

        assert_eq!(asset.key.len(), 64);
        assert!(asset.file_name.ends_with(".jpeg"));
        assert_eq!(asset.public_path, format!("/notion-assets/{}", asset.file_name));
        assert_eq!(asset.disk_path, dir.path().join("notion-assets").join(&asset.file_name));
    }

    #[test]
    fn test_locate_rejects_unusable_references() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        let cached = AssetReference::Cached {
            path: "/notion-assets/x.png".into(),
            source_url: "https://a/x.png".into(),
        };
        assert_eq!(cache.locate(&cached).unwrap_err().category(), "asset_fetch");
        assert!(cache.locate(&external(String::new())).is_err());
        assert!(cache.locate(&external("ftp://host/a.png".into())).is_err());
        assert!(cache.locate(&external("not a url".into())).is_err());
    }

    #[tokio::test]
    async fn test_resolve_downloads_once() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/cat.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNGDATA".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new()?;
        let cache = cache_in(&dir);
        let reference = external(format!("{}/img/cat.png", server.uri()));

        let first = cache.resolve(&reference).await?;
        let second = cache.resolve(&reference).await?;

        assert_eq!(first, second);
        assert_eq!(std::fs::read(&first.disk_path)?, b"PNGDATA");
        assert_eq!(cache.stats().downloads, 1);
        assert_eq!(cache.stats().memory_hits, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_resolves_share_one_download() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow.gif"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"GIF89a".to_vec())
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new()?;
        let cache = Arc::new(cache_in(&dir));
        let reference = external(format!("{}/slow.gif", server.uri()));

        let results = futures::future::join_all((0..8).map(|_| {
            let cache = Arc::clone(&cache);
            let reference = reference.clone();
            async move { cache.resolve(&reference).await }
        }))
        .await;

        let paths: Vec<_> = results
            .into_iter()
            .map(|r| r.map(|asset| asset.public_path))
            .collect::<Result<_>>()?;
        assert!(paths.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(cache.stats().downloads, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_file_from_prior_run_skips_network() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"NEW".to_vec()))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new()?;
        let reference = external(format!("{}/a.webp", server.uri()));

        let earlier = cache_in(&dir);
        let located = earlier.locate(&reference)?;
        std::fs::create_dir_all(earlier.cache_dir())?;
        std::fs::write(&located.disk_path, b"OLD")?;

        let cache = cache_in(&dir);
        let asset = cache.resolve(&reference).await?;
        assert_eq!(asset.disk_path, located.disk_path);
        assert_eq!(std::fs::read(&asset.disk_path)?, b"OLD");
        assert_eq!(cache.stats().disk_hits, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_overwriting_same_key_is_idempotent() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shared.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"SAME".to_vec()))
            .expect(2)
            .mount(&server)
            .await;

        // Two independent caches stand in for two processes sharing a directory.
        let dir = TempDir::new()?;
        let reference = external(format!("{}/shared.png", server.uri()));
        let first = cache_in(&dir);
        let second = cache_in(&dir);

        let located = first.locate(&reference)?;
        std::fs::create_dir_all(first.cache_dir())?;
        first.download(&located.source_url, &located.disk_path).await?;
        second.download(&located.source_url, &located.disk_path).await?;

        assert_eq!(std::fs::read(&located.disk_path)?, b"SAME");
        let leftovers = std::fs::read_dir(first.cache_dir())?.count();
        assert_eq!(leftovers, 1, "no temp files should remain");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_file() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let dir = TempDir::new()?;
        let cache = cache_in(&dir);
        let reference = external(format!("{}/missing.png", server.uri()));

        let err = cache.resolve(&reference).await.unwrap_err();
        match err {
            Error::AssetFetch { reason, .. } => assert!(reason.contains("403")),
            other => panic!("expected asset error, got {other:?}"),
        }
        let entries = std::fs::read_dir(cache.cache_dir())?.count();
        assert_eq!(entries, 0);
        assert_eq!(cache.stats().downloads, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_download_timeout_is_asset_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new()?;
        let config = AssetConfig {
            timeout_secs: 1,
            ..AssetConfig::with_root(dir.path())
        };
        let cache = AssetCache::new(&config)?;
        let err = cache
            .resolve(&external(format!("{}/late.png", server.uri())))
            .await
            .unwrap_err();
        assert_eq!(err.category(), "asset_fetch");
        assert!(!cache.locate(&external(format!("{}/late.png", server.uri())))?.disk_path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_redirect_is_followed() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old.jpg"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "/new.jpg"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"JPEG".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new()?;
        let cache = cache_in(&dir);
        let asset = cache
            .resolve(&external(format!("{}/old.jpg", server.uri())))
            .await?;
        assert!(asset.file_name.ends_with(".jpg"));
        assert_eq!(std::fs::read(&asset.disk_path)?, b"JPEG");
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_extension_round_trips(stem in "[a-z0-9_-]{1,12}", ext in "[A-Za-z0-9]{1,8}", sig in "[a-z0-9]{0,16}") {
            let url = Url::parse(&format!("https://host/dir/{stem}.{ext}?sig={sig}")).unwrap();
            prop_assert_eq!(extension_for(&url, ".bin"), format!(".{ext}"));
        }

        #[test]
        fn prop_cache_key_is_stable_hex(input in ".{0,64}") {
            let key = cache_key(&input);
            prop_assert_eq!(key.len(), 64);
            prop_assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
            prop_assert_eq!(key, cache_key(&input));
        }
    }
}
