//! Core data model: blocks, asset references, page attributes, and render output.
//!
//! Blocks and page properties use the remote API's "type-keyed" wire shape,
//! where the payload lives under a key named after the type tag:
//!
//! ```json
//! { "id": "b1", "type": "image", "has_children": false,
//!   "image": { "type": "file", "file": { "url": "https://..." } } }
//! ```
//!
//! Known tags deserialize into typed payloads; anything else lands in
//! [`BlockKind::Other`] with its raw payload so new remote types pass
//! through untouched.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::{Error, Result};

/// Formatting flags attached to a rich-text span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    /// Bold text.
    #[serde(default)]
    pub bold: bool,
    /// Italic text.
    #[serde(default)]
    pub italic: bool,
    /// Struck-through text.
    #[serde(default)]
    pub strikethrough: bool,
    /// Underlined text.
    #[serde(default)]
    pub underline: bool,
    /// Inline code.
    #[serde(default)]
    pub code: bool,
}

/// One span of formatted text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    /// Unformatted text of the span.
    #[serde(default)]
    pub plain_text: String,
    /// Link target when the span is a hyperlink.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Formatting flags.
    #[serde(default)]
    pub annotations: Annotations,
}

impl RichText {
    /// Unformatted span, mostly useful in tests and fixtures.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
            ..Self::default()
        }
    }
}

/// Concatenate the plain text of a run of spans.
pub fn plain_text(spans: &[RichText]) -> String {
    spans.iter().map(|span| span.plain_text.as_str()).collect()
}

/// Pointer to binary content embedded in a block or page attribute.
///
/// `Hosted` references point at the remote API's own storage and carry
/// expiring signatures; `External` references are arbitrary third-party
/// URLs. `Cached` is produced by this crate once an asset has been copied
/// into the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFileObject", into = "RawFileObject")]
pub enum AssetReference {
    /// Third-party URL.
    External {
        /// Source URL.
        url: String,
    },
    /// File stored by the remote API.
    Hosted {
        /// Signed download URL.
        url: String,
        /// When the signed URL stops working.
        expiry_time: Option<DateTime<Utc>>,
    },
    /// Locally cached copy.
    Cached {
        /// Public path of the cached file (`/{dir}/{file}`).
        path: String,
        /// URL the copy was downloaded from.
        source_url: String,
    },
}

impl AssetReference {
    /// Source URL for remote references; `None` once cached.
    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        match self {
            Self::External { url } | Self::Hosted { url, .. } => Some(url.as_str()),
            Self::Cached { .. } => None,
        }
    }

    /// The address a renderer should link to.
    #[must_use]
    pub fn href(&self) -> &str {
        match self {
            Self::External { url } | Self::Hosted { url, .. } => url,
            Self::Cached { path, .. } => path,
        }
    }

    /// Whether the reference points at remote-API-hosted storage.
    #[must_use]
    pub const fn is_hosted(&self) -> bool {
        matches!(self, Self::Hosted { .. })
    }
}

#[derive(Serialize, Deserialize)]
struct RawUrl {
    url: String,
}

#[derive(Serialize, Deserialize)]
struct RawHosted {
    url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry_time: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
struct RawCached {
    path: String,
    source_url: String,
}

#[derive(Serialize, Deserialize)]
struct RawFileObject {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    external: Option<RawUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<RawHosted>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cached: Option<RawCached>,
}

impl TryFrom<RawFileObject> for AssetReference {
    type Error = String;

    fn try_from(raw: RawFileObject) -> std::result::Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "external" => raw
                .external
                .map(|ext| Self::External { url: ext.url })
                .ok_or_else(|| "external file object without 'external' payload".to_string()),
            "file" => raw
                .file
                .map(|file| Self::Hosted {
                    url: file.url,
                    expiry_time: file.expiry_time,
                })
                .ok_or_else(|| "hosted file object without 'file' payload".to_string()),
            "cached" => raw
                .cached
                .map(|cached| Self::Cached {
                    path: cached.path,
                    source_url: cached.source_url,
                })
                .ok_or_else(|| "cached file object without 'cached' payload".to_string()),
            other => Err(format!("unsupported file object type '{other}'")),
        }
    }
}

impl From<AssetReference> for RawFileObject {
    fn from(reference: AssetReference) -> Self {
        let mut raw = Self {
            kind: String::new(),
            external: None,
            file: None,
            cached: None,
        };
        match reference {
            AssetReference::External { url } => {
                raw.kind = "external".into();
                raw.external = Some(RawUrl { url });
            },
            AssetReference::Hosted { url, expiry_time } => {
                raw.kind = "file".into();
                raw.file = Some(RawHosted { url, expiry_time });
            },
            AssetReference::Cached { path, source_url } => {
                raw.kind = "cached".into();
                raw.cached = Some(RawCached { path, source_url });
            },
        }
        raw
    }
}

/// Page or callout icon.
#[derive(Debug, Clone, PartialEq)]
pub enum Icon {
    /// Unicode emoji.
    Emoji(String),
    /// Image icon (hosted, external, or cached).
    Asset(AssetReference),
    /// Icon kinds this crate does not interpret.
    Other(Value),
}

impl Icon {
    /// The hosted file behind a file-type icon, if any.
    #[must_use]
    pub fn hosted_file(&self) -> Option<&AssetReference> {
        match self {
            Self::Asset(reference @ AssetReference::Hosted { .. }) => Some(reference),
            _ => None,
        }
    }
}

impl Serialize for Icon {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Emoji(emoji) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "emoji")?;
                map.serialize_entry("emoji", emoji)?;
                map.end()
            },
            Self::Asset(reference) => reference.serialize(serializer),
            Self::Other(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Icon {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
        match kind {
            "emoji" => Ok(Self::Emoji(
                value
                    .get("emoji")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            )),
            "external" | "file" | "cached" => serde_json::from_value(value)
                .map(Self::Asset)
                .map_err(serde::de::Error::custom),
            _ => Ok(Self::Other(value)),
        }
    }
}

/// Payload shared by plain text blocks (paragraph, list items, toggle, quote).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Block text.
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    /// Display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Heading payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingBlock {
    /// Heading text.
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    /// Whether the heading collapses its children.
    #[serde(default)]
    pub is_toggleable: bool,
    /// Display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Checklist item payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToDoBlock {
    /// Item text.
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    /// Completion state.
    #[serde(default)]
    pub checked: bool,
}

/// Callout payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalloutBlock {
    /// Callout text.
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    /// Leading icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    /// Display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Code block payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Source text.
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    /// Language hint.
    #[serde(default)]
    pub language: String,
    /// Caption under the code.
    #[serde(default)]
    pub caption: Vec<RichText>,
}

/// Payload of image, video, pdf, and file blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaBlock {
    /// Where the binary content lives.
    #[serde(flatten)]
    pub source: AssetReference,
    /// Caption under the media.
    #[serde(default)]
    pub caption: Vec<RichText>,
    /// Original file name (file blocks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MediaBlock {
    /// Media payload with no caption.
    #[must_use]
    pub const fn new(source: AssetReference) -> Self {
        Self {
            source,
            caption: Vec::new(),
            name: None,
        }
    }
}

/// Type-specific payload of a block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    /// `paragraph`
    Paragraph(TextBlock),
    /// `heading_1`
    Heading1(HeadingBlock),
    /// `heading_2`
    Heading2(HeadingBlock),
    /// `heading_3`
    Heading3(HeadingBlock),
    /// `bulleted_list_item`
    BulletedListItem(TextBlock),
    /// `numbered_list_item`
    NumberedListItem(TextBlock),
    /// `to_do`
    ToDo(ToDoBlock),
    /// `toggle`
    Toggle(TextBlock),
    /// `quote`
    Quote(TextBlock),
    /// `callout`
    Callout(CalloutBlock),
    /// `code`
    Code(CodeBlock),
    /// `divider`
    Divider,
    /// `image`
    Image(MediaBlock),
    /// `video`
    Video(MediaBlock),
    /// `pdf`
    Pdf(MediaBlock),
    /// `file`
    File(MediaBlock),
    /// Any type tag this crate does not interpret.
    Other {
        /// Remote type tag.
        type_tag: String,
        /// Raw payload, passed through untouched.
        payload: Value,
    },
}

impl BlockKind {
    /// Remote type tag for this variant.
    #[must_use]
    pub fn type_tag(&self) -> &str {
        match self {
            Self::Paragraph(_) => "paragraph",
            Self::Heading1(_) => "heading_1",
            Self::Heading2(_) => "heading_2",
            Self::Heading3(_) => "heading_3",
            Self::BulletedListItem(_) => "bulleted_list_item",
            Self::NumberedListItem(_) => "numbered_list_item",
            Self::ToDo(_) => "to_do",
            Self::Toggle(_) => "toggle",
            Self::Quote(_) => "quote",
            Self::Callout(_) => "callout",
            Self::Code(_) => "code",
            Self::Divider => "divider",
            Self::Image(_) => "image",
            Self::Video(_) => "video",
            Self::Pdf(_) => "pdf",
            Self::File(_) => "file",
            Self::Other { type_tag, .. } => type_tag,
        }
    }

    /// Decode the payload stored under `tag`.
    pub fn from_payload(tag: &str, payload: Value) -> serde_json::Result<Self> {
        Ok(match tag {
            "paragraph" => Self::Paragraph(serde_json::from_value(payload)?),
            "heading_1" => Self::Heading1(serde_json::from_value(payload)?),
            "heading_2" => Self::Heading2(serde_json::from_value(payload)?),
            "heading_3" => Self::Heading3(serde_json::from_value(payload)?),
            "bulleted_list_item" => Self::BulletedListItem(serde_json::from_value(payload)?),
            "numbered_list_item" => Self::NumberedListItem(serde_json::from_value(payload)?),
            "to_do" => Self::ToDo(serde_json::from_value(payload)?),
            "toggle" => Self::Toggle(serde_json::from_value(payload)?),
            "quote" => Self::Quote(serde_json::from_value(payload)?),
            "callout" => Self::Callout(serde_json::from_value(payload)?),
            "code" => Self::Code(serde_json::from_value(payload)?),
            "divider" => Self::Divider,
            "image" => Self::Image(serde_json::from_value(payload)?),
            "video" => Self::Video(serde_json::from_value(payload)?),
            "pdf" => Self::Pdf(serde_json::from_value(payload)?),
            "file" => Self::File(serde_json::from_value(payload)?),
            other => Self::Other {
                type_tag: other.to_string(),
                payload,
            },
        })
    }

    /// Encode the payload for the wire shape.
    pub fn to_payload(&self) -> serde_json::Result<Value> {
        match self {
            Self::Paragraph(p)
            | Self::BulletedListItem(p)
            | Self::NumberedListItem(p)
            | Self::Toggle(p)
            | Self::Quote(p) => serde_json::to_value(p),
            Self::Heading1(h) | Self::Heading2(h) | Self::Heading3(h) => serde_json::to_value(h),
            Self::ToDo(t) => serde_json::to_value(t),
            Self::Callout(c) => serde_json::to_value(c),
            Self::Code(c) => serde_json::to_value(c),
            Self::Divider => Ok(Value::Object(Map::new())),
            Self::Image(m) | Self::Video(m) | Self::Pdf(m) | Self::File(m) => {
                serde_json::to_value(m)
            },
            Self::Other { payload, .. } => Ok(payload.clone()),
        }
    }

    /// Text content for text-bearing variants.
    #[must_use]
    pub fn rich_text(&self) -> Option<&[RichText]> {
        match self {
            Self::Paragraph(p)
            | Self::BulletedListItem(p)
            | Self::NumberedListItem(p)
            | Self::Toggle(p)
            | Self::Quote(p) => Some(&p.rich_text),
            Self::Heading1(h) | Self::Heading2(h) | Self::Heading3(h) => Some(&h.rich_text),
            Self::ToDo(t) => Some(&t.rich_text),
            Self::Callout(c) => Some(&c.rich_text),
            Self::Code(c) => Some(&c.rich_text),
            _ => None,
        }
    }
}

/// One content unit of the remote document tree.
///
/// A block with `has_children = true` is only materialized once `children`
/// holds its subtree in remote pagination order.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Stable remote identifier.
    pub id: String,
    /// Whether the remote API reports children under this block.
    pub has_children: bool,
    /// Type tag plus payload.
    pub kind: BlockKind,
    /// Materialized children, in remote order.
    pub children: Vec<Self>,
}

impl Block {
    /// Leaf block.
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            has_children: false,
            kind,
            children: Vec::new(),
        }
    }

    /// Remote type tag.
    #[must_use]
    pub fn type_tag(&self) -> &str {
        self.kind.type_tag()
    }

    /// Decode a full block record from its wire shape.
    ///
    /// Fails with [`Error::Structure`] when the record has no `id`/`type`.
    /// A known type whose payload does not decode falls back to
    /// [`BlockKind::Other`] with the raw payload.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut obj) = value else {
            return Err(Error::Structure("block record is not an object".into()));
        };
        let id = take_string(&mut obj, "id")
            .ok_or_else(|| Error::Structure("block record without 'id'".into()))?;
        let tag = take_string(&mut obj, "type")
            .ok_or_else(|| Error::Structure(format!("block {id} has no 'type'")))?;
        let has_children = obj
            .get("has_children")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let payload = obj
            .remove(&tag)
            .unwrap_or_else(|| Value::Object(Map::new()));
        let kind = match BlockKind::from_payload(&tag, payload.clone()) {
            Ok(kind) => kind,
            Err(err) => {
                warn!("Block {} ({}) has an unrecognized payload, kept raw: {}", id, tag, err);
                BlockKind::Other {
                    type_tag: tag,
                    payload,
                }
            },
        };
        let children = match obj.remove("children") {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(Self::from_value)
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        Ok(Self {
            id,
            has_children,
            kind,
            children,
        })
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let tag = self.type_tag();
        let payload = self.kind.to_payload().map_err(serde::ser::Error::custom)?;
        let mut map = serializer.serialize_map(Some(6))?;
        map.serialize_entry("object", "block")?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("type", tag)?;
        map.serialize_entry("has_children", &self.has_children)?;
        map.serialize_entry(tag, &payload)?;
        if !self.children.is_empty() {
            map.serialize_entry("children", &self.children)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

fn take_string(obj: &mut Map<String, Value>, key: &str) -> Option<String> {
    match obj.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Entry of a `files`-typed page property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Where the file lives.
    #[serde(flatten)]
    pub source: AssetReference,
}

/// Value of one page property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// The page title.
    Title(Vec<RichText>),
    /// Free text.
    RichText(Vec<RichText>),
    /// Attached files.
    Files(Vec<FileEntry>),
    /// Any other property type, kept raw.
    Other {
        /// Remote type tag.
        kind: String,
        /// Raw payload.
        payload: Value,
    },
}

impl PropertyValue {
    fn type_tag(&self) -> &str {
        match self {
            Self::Title(_) => "title",
            Self::RichText(_) => "rich_text",
            Self::Files(_) => "files",
            Self::Other { kind, .. } => kind,
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let tag = self.type_tag();
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", tag)?;
        match self {
            Self::Title(spans) | Self::RichText(spans) => map.serialize_entry(tag, spans)?,
            Self::Files(files) => map.serialize_entry(tag, files)?,
            Self::Other { payload, .. } => map.serialize_entry(tag, payload)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let Value::Object(mut obj) = Value::deserialize(deserializer)? else {
            return Err(serde::de::Error::custom("property value is not an object"));
        };
        let kind = take_string(&mut obj, "type")
            .ok_or_else(|| serde::de::Error::custom("property value without 'type'"))?;
        let payload = obj.remove(&kind).unwrap_or(Value::Null);
        let decoded = match kind.as_str() {
            "title" => serde_json::from_value(payload).map(Self::Title),
            "rich_text" => serde_json::from_value(payload).map(Self::RichText),
            "files" => match serde_json::from_value(payload.clone()) {
                Ok(files) => Ok(Self::Files(files)),
                Err(err) => {
                    warn!("Files property has an unrecognized entry, kept raw: {}", err);
                    Ok(Self::Other { kind, payload })
                },
            },
            _ => Ok(Self::Other { kind, payload }),
        };
        decoded.map_err(serde::de::Error::custom)
    }
}

/// Page record as returned by the remote page endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page identifier; also the root block id of its content tree.
    pub id: String,
    /// Canonical remote URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Cover image. Cover kinds this crate does not know decode as `None`.
    #[serde(default, deserialize_with = "lenient_cover")]
    pub cover: Option<AssetReference>,
    /// Page icon.
    #[serde(default)]
    pub icon: Option<Icon>,
    /// Named properties.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    /// Last edit timestamp.
    #[serde(default)]
    pub last_edited_time: Option<DateTime<Utc>>,
}

fn lenient_cover<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<AssetReference>, D::Error> {
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(cover) => Ok(Some(cover)),
        Err(err) => {
            warn!("Page cover has an unrecognized shape, ignored: {}", err);
            Ok(None)
        },
    }
}

/// Page-level fields projected for consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAttributes {
    /// Page identifier.
    pub id: String,
    /// Plain text of the title property (empty when the page has none).
    pub title: String,
    /// Canonical remote URL.
    pub url: Option<String>,
    /// Cover image.
    pub cover: Option<AssetReference>,
    /// Page icon.
    pub icon: Option<Icon>,
    /// Named properties.
    pub properties: BTreeMap<String, PropertyValue>,
    /// Creation timestamp.
    pub created_time: Option<DateTime<Utc>>,
    /// Last edit timestamp.
    pub last_edited_time: Option<DateTime<Utc>>,
}

impl PageAttributes {
    /// Project the attribute view of a page. Does no I/O.
    #[must_use]
    pub fn from_page(page: &Page) -> Self {
        let title = page
            .properties
            .values()
            .find_map(|value| match value {
                PropertyValue::Title(spans) => Some(plain_text(spans)),
                _ => None,
            })
            .unwrap_or_default();

        Self {
            id: page.id.clone(),
            title,
            url: page.url.clone(),
            cover: page.cover.clone(),
            icon: page.icon.clone(),
            properties: page.properties.clone(),
            created_time: page.created_time,
            last_edited_time: page.last_edited_time,
        }
    }
}

/// One table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Nesting level, zero at the outline root.
    pub depth: usize,
    /// Visible heading text.
    pub text: String,
    /// Anchor target without the leading `#`.
    pub slug: String,
}

/// Result of rendering one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    /// Pipeline output.
    pub html: String,
    /// Flattened table of contents.
    pub headings: Vec<Heading>,
    /// Every distinct local asset path produced during the render, first-produced order.
    pub image_paths: Vec<String>,
}
