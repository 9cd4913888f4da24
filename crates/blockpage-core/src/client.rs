//! Remote content API access.
//!
//! [`BlockSource`] is the seam the tree walker and renderer depend on;
//! [`HttpBlockSource`] implements it over the public REST API. Tests and
//! other hosts can plug in their own source.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::{Block, Error, Page, Result};

/// One record of a children listing.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockRecord {
    /// Fully resolved block.
    Full(Block),
    /// Block the integration may not read in full (permissions, unresolved references).
    Partial {
        /// Identifier reported for the partial record.
        id: String,
    },
}

/// One page of a children listing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChildrenPage {
    /// Records in remote order.
    pub results: Vec<BlockRecord>,
    /// Cursor of the following page; `None` once the listing is exhausted.
    pub next_cursor: Option<String>,
}

impl ChildrenPage {
    /// Decode a `{"results": [...], "has_more": .., "next_cursor": ..}` listing.
    ///
    /// Records that carry no `type` are partial.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut obj) = value else {
            return Err(Error::Structure("children listing is not an object".into()));
        };
        let Some(Value::Array(items)) = obj.remove("results") else {
            return Err(Error::Structure("children listing without 'results'".into()));
        };

        let results = items
            .into_iter()
            .map(|item| {
                if item.get("type").is_some() {
                    Block::from_value(item).map(BlockRecord::Full)
                } else {
                    let id = item
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    Ok(BlockRecord::Partial { id })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let has_more = obj.get("has_more").and_then(Value::as_bool).unwrap_or(false);
        let next_cursor = obj
            .get("next_cursor")
            .and_then(Value::as_str)
            .map(str::to_string);
        let next_cursor = match (has_more, next_cursor) {
            (true, None) => {
                return Err(Error::Structure(
                    "children listing reports more pages but no cursor".into(),
                ));
            },
            (true, cursor) => cursor,
            (false, _) => None,
        };

        Ok(Self {
            results,
            next_cursor,
        })
    }
}

/// Read access to the remote block hierarchy.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// List one page of children under `parent_id`, starting at `cursor`.
    async fn list_children(&self, parent_id: &str, cursor: Option<&str>) -> Result<ChildrenPage>;

    /// Retrieve the page record (attributes, cover, properties).
    async fn retrieve_page(&self, page_id: &str) -> Result<Page>;
}

/// [`BlockSource`] over the remote REST API.
pub struct HttpBlockSource {
    client: Client,
    base_url: Url,
    version: String,
    token: String,
    page_size: u32,
}

impl HttpBlockSource {
    /// Creates a source authenticated with `token`.
    pub fn new(config: &ApiConfig, token: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!(
                "{} cannot be used as an API base",
                config.base_url
            )));
        }
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("outfitter-blockpage/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            client,
            base_url,
            version: config.version.clone(),
            token: token.into(),
            page_size: config.page_size,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v1").extend(segments);
        }
        url
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.version)
            .send()
            .await
            .map_err(|e| Error::TransientApi(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!(
                "'{url}' returned 404. Check the id and that the page is shared with the integration"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(Error::TransientApi(format!(
                "{status} from {url}: {snippet}"
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::TransientApi(format!("undecodable body from {url}: {e}")))
    }
}

#[async_trait]
impl BlockSource for HttpBlockSource {
    async fn list_children(&self, parent_id: &str, cursor: Option<&str>) -> Result<ChildrenPage> {
        let mut url = self.endpoint(&["blocks", parent_id, "children"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page_size", &self.page_size.to_string());
            if let Some(cursor) = cursor {
                query.append_pair("start_cursor", cursor);
            }
        }
        debug!("Listing children of {} (cursor: {:?})", parent_id, cursor);
        ChildrenPage::from_value(self.get_json(url).await?)
    }

    async fn retrieve_page(&self, page_id: &str) -> Result<Page> {
        let url = self.endpoint(&["pages", page_id]);
        let value = self.get_json(url).await?;
        serde_json::from_value(value)
            .map_err(|e| Error::Structure(format!("page {page_id} has unexpected shape: {e}")))
    }
}
