//! Error types and handling for blockpage-core operations.
//!
//! A single [`Error`] enum covers every failure the render path can hit. The
//! four domain kinds are:
//!
//! - **Asset fetch**: one asset could not be downloaded or written to the cache
//! - **Structure**: an outline or block tree violated its expected shape
//! - **Pipeline**: the injected transformation pipeline failed
//! - **Transient API**: a children-listing or page call to the remote API failed
//!
//! The remaining variants wrap lower-level failures (I/O, HTTP, config)
//! so `?` works across module boundaries.
//!
//! ## Recovery Hints
//!
//! ```rust
//! use blockpage_core::Error;
//!
//! let err = Error::TransientApi("503 from children endpoint".into());
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "transient_api");
//! ```

use thiserror::Error;

/// The main error type for blockpage-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resolving one asset failed.
    ///
    /// Raised when a reference carries no usable URL, the download returns a
    /// non-success status, the request times out, or the cache directory
    /// cannot be written. Callers with a documented fallback recover from it
    /// locally; everyone else lets it abort the render.
    #[error("Asset fetch failed for '{url}': {reason}")]
    AssetFetch {
        /// Source URL of the asset (empty when none could be extracted).
        url: String,
        /// Human-readable cause.
        reason: String,
    },

    /// An outline or block record did not have the expected shape.
    #[error("Structure error: {0}")]
    Structure(String),

    /// The transformation pipeline rejected the block sequence.
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// A call to the remote content API failed.
    ///
    /// Covers non-success responses from the children-listing and page
    /// endpoints as well as undecodable response bodies.
    #[error("Remote API error: {0}")]
    TransientApi(String),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Low-level HTTP transport failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested page or block does not exist (or is not shared with the integration).
    #[error("Not found: {0}")]
    NotFound(String),

    /// URL is malformed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Build an [`Error::AssetFetch`] from anything displayable.
    pub fn asset(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::AssetFetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if the error might be recoverable through retry logic.
    ///
    /// Remote API failures and transport timeouts are considered transient.
    /// Structural and pipeline failures are deterministic and never are.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::TransientApi(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Stable category tag for logs and the render boundary.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::AssetFetch { .. } => "asset_fetch",
            Self::Structure(_) => "structure",
            Self::Pipeline(_) => "pipeline",
            Self::TransientApi(_) => "transient_api",
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
