//! Table-of-contents extraction from a pipeline outline.
//!
//! The outline is a small element tree shaped like nested HTML lists:
//!
//! ```text
//! ol
//! ├─ li
//! │  ├─ a href="#intro"   "Intro"
//! │  └─ ol
//! │     └─ li
//! │        └─ a href="#setup"  "Setup"
//! └─ li
//!    └─ a href="#usage"   "Usage"
//! ```
//!
//! [`extract`] flattens it pre-order into [`Heading`]s, depth 0 at the root.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Heading, Result};

/// Node of an outline tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutlineNode {
    /// Element with a tag name, string properties, and children.
    Element {
        /// Tag name, e.g. `ol`, `li`, `a`.
        #[serde(rename = "tagName")]
        tag_name: String,
        /// Attributes such as `href`.
        #[serde(default)]
        properties: BTreeMap<String, String>,
        /// Child nodes in document order.
        #[serde(default)]
        children: Vec<OutlineNode>,
    },
    /// Text content.
    Text {
        /// The text.
        value: String,
    },
}

impl OutlineNode {
    /// Element without properties.
    pub fn element(tag_name: impl Into<String>, children: Vec<Self>) -> Self {
        Self::Element {
            tag_name: tag_name.into(),
            properties: BTreeMap::new(),
            children,
        }
    }

    /// `a` element pointing at `#slug` with a single text child.
    pub fn link(slug: &str, text: impl Into<String>) -> Self {
        Self::Element {
            tag_name: "a".into(),
            properties: BTreeMap::from([("href".to_string(), format!("#{slug}"))]),
            children: vec![Self::text(text)],
        }
    }

    /// Text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    fn tag(&self) -> Option<&str> {
        match self {
            Self::Element { tag_name, .. } => Some(tag_name),
            Self::Text { .. } => None,
        }
    }

    fn is_list(&self) -> bool {
        matches!(self.tag(), Some("ol" | "ul"))
    }

    fn children(&self) -> &[Self] {
        match self {
            Self::Element { children, .. } => children,
            Self::Text { .. } => &[],
        }
    }

    fn is_blank_text(&self) -> bool {
        matches!(self, Self::Text { value } if value.trim().is_empty())
    }
}

/// Flatten an outline into depth-tagged headings, pre-order.
///
/// Fails with [`Error::Structure`] when the root is not a list, when a list
/// holds something other than list items, or when an item has no link.
pub fn extract(root: &OutlineNode) -> Result<Vec<Heading>> {
    if !root.is_list() {
        return Err(Error::Structure(format!(
            "outline root must be a list, found {}",
            root.tag().unwrap_or("text")
        )));
    }
    let mut headings = Vec::new();
    flatten(root, 0, &mut headings)?;
    Ok(headings)
}

fn flatten(list: &OutlineNode, depth: usize, out: &mut Vec<Heading>) -> Result<()> {
    for item in list.children() {
        if item.is_blank_text() {
            continue;
        }
        if item.tag() != Some("li") {
            return Err(Error::Structure(format!(
                "outline list contains {} instead of a list item",
                item.tag().unwrap_or("text")
            )));
        }

        let link = item
            .children()
            .iter()
            .find(|child| child.tag() == Some("a"))
            .ok_or_else(|| Error::Structure("outline item without a heading link".into()))?;
        out.push(heading_from_link(link, depth));

        if let Some(sublist) = item.children().iter().find(|child| child.is_list()) {
            flatten(sublist, depth + 1, out)?;
        }
    }
    Ok(())
}

fn heading_from_link(link: &OutlineNode, depth: usize) -> Heading {
    let text = link
        .children()
        .iter()
        .find_map(|child| match child {
            OutlineNode::Text { value } => Some(value.clone()),
            OutlineNode::Element { .. } => None,
        })
        .unwrap_or_default();
    let slug = match link {
        OutlineNode::Element { properties, .. } => properties
            .get("href")
            .map(|href| href.strip_prefix('#').unwrap_or(href).to_string())
            .unwrap_or_default(),
        OutlineNode::Text { .. } => String::new(),
    };
    Heading { depth, text, slug }
}
