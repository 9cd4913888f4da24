//! Depth-first materialization of a remote block tree.
//!
//! The walk keeps an explicit stack of frames instead of recursing, one frame
//! per parent whose children are still being listed. A frame buffers the
//! current pagination page and collects finished children; once its listing
//! is exhausted the frame is popped, the children are attached to the parent
//! block, and the parent is transformed and handed to the frame below.
//!
//! Subtrees are fetched sequentially, so output order always equals remote
//! order: pages in cursor order, records in page order, each parent after
//! its complete subtree has been attached.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use futures::Stream;
use tracing::debug;

use crate::client::{BlockRecord, BlockSource};
use crate::config::TreeConfig;
use crate::transform::BlockTransformer;
use crate::{Block, Error, Result};

/// Starts walks over one [`BlockSource`].
#[derive(Clone)]
pub struct TreeFetcher {
    source: Arc<dyn BlockSource>,
    max_depth: usize,
}

impl TreeFetcher {
    /// Fetcher over `source` honoring `config.max_depth`.
    pub fn new(source: Arc<dyn BlockSource>, config: &TreeConfig) -> Self {
        Self {
            source,
            max_depth: config.max_depth,
        }
    }

    /// Begin a fresh walk of the children of `root_id`.
    ///
    /// Every block is passed through `transformer` before it is yielded;
    /// take it back with [`TreeWalk::into_transformer`] to read the asset
    /// paths the walk produced.
    pub fn walk(&self, root_id: impl Into<String>, transformer: BlockTransformer) -> TreeWalk {
        TreeWalk {
            source: Arc::clone(&self.source),
            transformer,
            max_depth: self.max_depth,
            stack: vec![Frame::new(root_id.into(), 0, None)],
            done: false,
        }
    }
}

struct Frame {
    parent_id: String,
    depth: usize,
    cursor: Option<String>,
    seen_cursors: HashSet<String>,
    exhausted: bool,
    buffer: VecDeque<Block>,
    // Parent block waiting for its children; `None` for the root frame.
    pending: Option<Block>,
    finished: Vec<Block>,
}

impl Frame {
    fn new(parent_id: String, depth: usize, pending: Option<Block>) -> Self {
        Self {
            parent_id,
            depth,
            cursor: None,
            seen_cursors: HashSet::new(),
            exhausted: false,
            buffer: VecDeque::new(),
            pending,
            finished: Vec::new(),
        }
    }
}

/// One in-progress, non-restartable traversal.
///
/// Yields the root's direct children, fully materialized, in remote order.
/// After the first error the walk is over and [`TreeWalk::next`] returns
/// `None`.
pub struct TreeWalk {
    source: Arc<dyn BlockSource>,
    transformer: BlockTransformer,
    max_depth: usize,
    stack: Vec<Frame>,
    done: bool,
}

impl TreeWalk {
    /// The next top-level block, or `None` once the walk has finished.
    pub async fn next(&mut self) -> Option<Result<Block>> {
        if self.done {
            return None;
        }
        match self.step().await {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.done = true;
                None
            },
            Err(err) => {
                self.done = true;
                self.stack.clear();
                Some(Err(err))
            },
        }
    }

    /// Drain the walk into a vector, stopping at the first error.
    pub async fn collect_all(&mut self) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        while let Some(block) = self.next().await {
            blocks.push(block?);
        }
        Ok(blocks)
    }

    /// Give back the transformer and the asset paths it recorded.
    #[must_use]
    pub fn into_transformer(self) -> BlockTransformer {
        self.transformer
    }

    /// Adapt the walk into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<Block>> + Send {
        futures::stream::unfold(self, |mut walk| async move {
            walk.next().await.map(|item| (item, walk))
        })
    }

    async fn step(&mut self) -> Result<Option<Block>> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };

            if let Some(block) = frame.buffer.pop_front() {
                if block.has_children {
                    let depth = frame.depth + 1;
                    if depth > self.max_depth {
                        return Err(Error::Structure(format!(
                            "block {} is nested deeper than the limit of {} levels",
                            block.id, self.max_depth
                        )));
                    }
                    self.stack.push(Frame::new(block.id.clone(), depth, Some(block)));
                    continue;
                }
                let finished = self.transformer.transform(block).await?;
                if let Some(block) = self.hand_up(finished) {
                    return Ok(Some(block));
                }
                continue;
            }

            if !frame.exhausted {
                let page = self
                    .source
                    .list_children(&frame.parent_id, frame.cursor.as_deref())
                    .await?;
                for record in page.results {
                    match record {
                        BlockRecord::Full(block) => frame.buffer.push_back(block),
                        BlockRecord::Partial { id } => {
                            debug!("Skipping partial block {} under {}", id, frame.parent_id);
                        },
                    }
                }
                if let Some(cursor) = &page.next_cursor {
                    if !frame.seen_cursors.insert(cursor.clone()) {
                        return Err(Error::Structure(format!(
                            "children listing of {} repeated cursor '{}'",
                            frame.parent_id, cursor
                        )));
                    }
                }
                frame.exhausted = page.next_cursor.is_none();
                frame.cursor = page.next_cursor;
                continue;
            }

            let Some(frame) = self.stack.pop() else {
                return Ok(None);
            };
            let Some(mut parent) = frame.pending else {
                return Ok(None);
            };
            parent.children = frame.finished;
            let finished = self.transformer.transform(parent).await?;
            if let Some(block) = self.hand_up(finished) {
                return Ok(Some(block));
            }
        }
    }

    /// Route a finished block to its parent frame, or out of the walk when
    /// it sits directly under the root.
    fn hand_up(&mut self, block: Block) -> Option<Block> {
        match self.stack.len() {
            0 | 1 => Some(block),
            _ => {
                if let Some(parent) = self.stack.last_mut() {
                    parent.finished.push(block);
                }
                None
            },
        }
    }
}
