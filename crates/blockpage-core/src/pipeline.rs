//! Transformation pipeline seam and the built-in HTML pipeline.
//!
//! A [`TransformPipeline`] turns a materialized block sequence into text
//! and, through its extensions, an optional outline for the table of
//! contents. [`HtmlPipeline`] is the bundled implementation; hosts with
//! their own rendering stack implement the trait instead.
//!
//! Extensions run in the order given, after the blocks have been rendered,
//! each seeing the document as the previous one left it.

use std::fmt::Write as _;
use std::sync::Arc;

use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::debug;

use crate::slug::Slugger;
use crate::toc::OutlineNode;
use crate::types::{CalloutBlock, MediaBlock};
use crate::{Block, BlockKind, Error, Icon, Result, RichText, plain_text};

/// Heading met while rendering, before any outline is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedHeading {
    /// 1 for `heading_1`, 2 for `heading_2`, 3 for `heading_3`.
    pub level: u8,
    /// Plain heading text.
    pub text: String,
    /// `id` attribute given to the heading element.
    pub slug: String,
}

/// Document state shared with extensions.
#[derive(Debug, Clone, Default)]
pub struct PipelineDocument {
    /// Rendered output so far.
    pub html: String,
    /// Headings in document order.
    pub headings: Vec<RenderedHeading>,
    /// Outline produced by an extension, if any.
    pub outline: Option<OutlineNode>,
}

/// Final output of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Rendered text.
    pub html: String,
    /// Table-of-contents outline; `None` when no extension produced one.
    pub outline: Option<OutlineNode>,
}

/// Post-processing step run after the blocks are rendered.
pub trait PipelineExtension: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Mutate the document in place.
    fn apply(&self, document: &mut PipelineDocument) -> Result<()>;
}

/// Converts a block sequence to output text plus an outline.
pub trait TransformPipeline: Send + Sync {
    /// Render `blocks`, then run `extensions` in order.
    fn run(
        &self,
        blocks: &[Block],
        extensions: &[Arc<dyn PipelineExtension>],
    ) -> Result<PipelineOutput>;
}

/// Built-in block-to-HTML pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlPipeline;

impl HtmlPipeline {
    /// Creates the pipeline.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TransformPipeline for HtmlPipeline {
    fn run(
        &self,
        blocks: &[Block],
        extensions: &[Arc<dyn PipelineExtension>],
    ) -> Result<PipelineOutput> {
        let mut writer = HtmlWriter::default();
        writer.blocks(blocks);
        let mut document = PipelineDocument {
            html: writer.html,
            headings: writer.headings,
            outline: None,
        };

        for extension in extensions {
            debug!("Running pipeline extension {}", extension.name());
            extension.apply(&mut document).map_err(|err| match err {
                Error::Pipeline(_) | Error::Structure(_) => err,
                other => Error::Pipeline(format!("{}: {other}", extension.name())),
            })?;
        }

        Ok(PipelineOutput {
            html: document.html,
            outline: document.outline,
        })
    }
}

#[derive(Default)]
struct HtmlWriter {
    html: String,
    headings: Vec<RenderedHeading>,
    slugger: Slugger,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bulleted,
    Numbered,
}

impl ListKind {
    const fn of(kind: &BlockKind) -> Option<Self> {
        match kind {
            BlockKind::BulletedListItem(_) => Some(Self::Bulleted),
            BlockKind::NumberedListItem(_) => Some(Self::Numbered),
            _ => None,
        }
    }

    const fn tag(self) -> &'static str {
        match self {
            Self::Bulleted => "ul",
            Self::Numbered => "ol",
        }
    }
}

impl HtmlWriter {
    fn blocks(&mut self, blocks: &[Block]) {
        let mut open: Option<ListKind> = None;
        for block in blocks {
            let list = ListKind::of(&block.kind);
            if open != list {
                if let Some(kind) = open {
                    let _ = write!(self.html, "</{}>", kind.tag());
                }
                if let Some(kind) = list {
                    let _ = write!(self.html, "<{}>", kind.tag());
                }
                open = list;
            }
            self.block(block);
        }
        if let Some(kind) = open {
            let _ = write!(self.html, "</{}>", kind.tag());
        }
    }

    fn block(&mut self, block: &Block) {
        match &block.kind {
            BlockKind::Paragraph(p) => {
                self.wrapped("p", &p.rich_text);
                self.nested(block);
            },
            BlockKind::Heading1(h) => self.heading(1, &h.rich_text, h.is_toggleable, block),
            BlockKind::Heading2(h) => self.heading(2, &h.rich_text, h.is_toggleable, block),
            BlockKind::Heading3(h) => self.heading(3, &h.rich_text, h.is_toggleable, block),
            BlockKind::BulletedListItem(item) | BlockKind::NumberedListItem(item) => {
                self.html.push_str("<li>");
                self.rich_text(&item.rich_text);
                self.blocks(&block.children);
                self.html.push_str("</li>");
            },
            BlockKind::ToDo(todo) => {
                let checked = if todo.checked { " checked" } else { "" };
                let _ = write!(
                    self.html,
                    r#"<div class="to-do"><input type="checkbox" disabled{checked}> "#
                );
                self.rich_text(&todo.rich_text);
                self.html.push_str("</div>");
                self.nested(block);
            },
            BlockKind::Toggle(toggle) => {
                self.html.push_str("<details><summary>");
                self.rich_text(&toggle.rich_text);
                self.html.push_str("</summary>");
                self.blocks(&block.children);
                self.html.push_str("</details>");
            },
            BlockKind::Quote(quote) => {
                self.html.push_str("<blockquote>");
                self.rich_text(&quote.rich_text);
                self.blocks(&block.children);
                self.html.push_str("</blockquote>");
            },
            BlockKind::Callout(callout) => self.callout(callout, block),
            BlockKind::Code(code) => {
                let language = encode_double_quoted_attribute(&code.language);
                let _ = write!(
                    self.html,
                    r#"<pre><code class="language-{language}">{}</code></pre>"#,
                    encode_text(&plain_text(&code.rich_text))
                );
            },
            BlockKind::Divider => self.html.push_str("<hr>"),
            BlockKind::Image(media) => {
                let alt = plain_text(&media.caption);
                let _ = write!(
                    self.html,
                    r#"<figure><img src="{}" alt="{}">"#,
                    encode_double_quoted_attribute(media.source.href()),
                    encode_double_quoted_attribute(&alt)
                );
                self.figure_end(media);
            },
            BlockKind::Video(media) => {
                let _ = write!(
                    self.html,
                    r#"<figure><video controls src="{}"></video>"#,
                    encode_double_quoted_attribute(media.source.href())
                );
                self.figure_end(media);
            },
            BlockKind::Pdf(media) => {
                let _ = write!(
                    self.html,
                    r#"<figure><object type="application/pdf" data="{}"></object>"#,
                    encode_double_quoted_attribute(media.source.href())
                );
                self.figure_end(media);
            },
            BlockKind::File(media) => {
                let href = media.source.href();
                let label = media
                    .name
                    .clone()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| file_label(href));
                let _ = write!(
                    self.html,
                    r#"<p class="file"><a href="{}">{}</a></p>"#,
                    encode_double_quoted_attribute(href),
                    encode_text(&label)
                );
            },
            BlockKind::Other { type_tag, .. } => {
                debug!("No HTML for block {} of type {}", block.id, type_tag);
            },
        }
    }

    fn heading(&mut self, level: u8, spans: &[RichText], toggleable: bool, block: &Block) {
        let text = plain_text(spans);
        let slug = self.slugger.slug(&text);
        if toggleable {
            self.html.push_str("<details><summary>");
        }
        let _ = write!(
            self.html,
            r#"<h{level} id="{}">"#,
            encode_double_quoted_attribute(&slug)
        );
        self.rich_text(spans);
        let _ = write!(self.html, "</h{level}>");
        self.headings.push(RenderedHeading { level, text, slug });
        if toggleable {
            self.html.push_str("</summary>");
            self.blocks(&block.children);
            self.html.push_str("</details>");
        } else {
            self.nested(block);
        }
    }

    fn callout(&mut self, callout: &CalloutBlock, block: &Block) {
        self.html.push_str(r#"<aside class="callout">"#);
        match &callout.icon {
            Some(Icon::Emoji(emoji)) => {
                let _ = write!(
                    self.html,
                    r#"<span class="callout-icon">{}</span>"#,
                    encode_text(emoji)
                );
            },
            Some(Icon::Asset(reference)) => {
                let _ = write!(
                    self.html,
                    r#"<img class="callout-icon" src="{}" alt="">"#,
                    encode_double_quoted_attribute(reference.href())
                );
            },
            Some(Icon::Other(_)) | None => {},
        }
        self.html.push_str("<div>");
        self.rich_text(&callout.rich_text);
        self.blocks(&block.children);
        self.html.push_str("</div></aside>");
    }

    fn figure_end(&mut self, media: &MediaBlock) {
        if !media.caption.is_empty() {
            self.html.push_str("<figcaption>");
            self.rich_text(&media.caption);
            self.html.push_str("</figcaption>");
        }
        self.html.push_str("</figure>");
    }

    fn wrapped(&mut self, tag: &str, spans: &[RichText]) {
        let _ = write!(self.html, "<{tag}>");
        self.rich_text(spans);
        let _ = write!(self.html, "</{tag}>");
    }

    fn nested(&mut self, block: &Block) {
        if !block.children.is_empty() {
            self.html.push_str(r#"<div class="indented">"#);
            self.blocks(&block.children);
            self.html.push_str("</div>");
        }
    }

    fn rich_text(&mut self, spans: &[RichText]) {
        for span in spans {
            let a = &span.annotations;
            let marks = [
                (span.href.is_some(), "a"),
                (a.bold, "strong"),
                (a.italic, "em"),
                (a.strikethrough, "s"),
                (a.underline, "u"),
                (a.code, "code"),
            ];
            for (on, tag) in marks {
                if !on {
                    continue;
                }
                match (&span.href, tag) {
                    (Some(href), "a") => {
                        let _ = write!(
                            self.html,
                            r#"<a href="{}">"#,
                            encode_double_quoted_attribute(href)
                        );
                    },
                    _ => {
                        let _ = write!(self.html, "<{tag}>");
                    },
                }
            }
            self.html.push_str(&encode_text(&span.plain_text));
            for (on, tag) in marks.iter().rev() {
                if *on {
                    let _ = write!(self.html, "</{tag}>");
                }
            }
        }
    }
}

fn file_label(href: &str) -> String {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
        .to_string()
}

/// Builds the nested `ol > li > a + ol` outline from the rendered headings.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineExtension;

impl PipelineExtension for OutlineExtension {
    fn name(&self) -> &str {
        "outline"
    }

    fn apply(&self, document: &mut PipelineDocument) -> Result<()> {
        let top = document.headings.iter().map(|h| h.level).min().unwrap_or(1);
        let mut cursor = 0;
        let items = outline_items(&document.headings, &mut cursor, top);
        document.outline = Some(OutlineNode::element("ol", items));
        Ok(())
    }
}

/// Items for headings at `level` or deeper, stopping at the first shallower one.
fn outline_items(headings: &[RenderedHeading], cursor: &mut usize, level: u8) -> Vec<OutlineNode> {
    let mut items = Vec::new();
    while let Some(heading) = headings.get(*cursor) {
        if heading.level < level {
            break;
        }
        *cursor += 1;
        let mut children = vec![OutlineNode::link(&heading.slug, heading.text.clone())];
        if headings.get(*cursor).is_some_and(|next| next.level > heading.level) {
            let nested = outline_items(headings, cursor, heading.level + 1);
            children.push(OutlineNode::element("ol", nested));
        }
        items.push(OutlineNode::element("li", children));
    }
    items
}

/// Wraps the rendered output in an `<article>` element.
#[derive(Debug, Clone, Default)]
pub struct ArticleWrapper {
    class: Option<String>,
}

impl ArticleWrapper {
    /// Wrapper adding `class` to the article element.
    pub fn with_class(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
        }
    }
}

impl PipelineExtension for ArticleWrapper {
    fn name(&self) -> &str {
        "article"
    }

    fn apply(&self, document: &mut PipelineDocument) -> Result<()> {
        let open = self.class.as_deref().map_or_else(
            || "<article>".to_string(),
            |class| format!(r#"<article class="{}">"#, encode_double_quoted_attribute(class)),
        );
        document.html = format!("{open}{}</article>", document.html);
        Ok(())
    }
}

/// Extensions used when the caller does not pick any: outline, then article.
#[must_use]
pub fn default_extensions() -> Vec<Arc<dyn PipelineExtension>> {
    vec![Arc::new(OutlineExtension), Arc::new(ArticleWrapper::default())]
}
