use serde::{Deserialize, Serialize};

use crate::editing::{Block, BlockId, Document, text};

/// A caret coordinate: a block and a char offset into its text
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub block_id: BlockId,
    pub offset: usize,
}

impl Point {
    pub fn new(block_id: impl Into<BlockId>, offset: usize) -> Self {
        Self {
            block_id: block_id.into(),
            offset,
        }
    }
}

/// Anchor is where the selection began, focus is where it currently ends
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn caret(block_id: impl Into<BlockId>, offset: usize) -> Self {
        let point = Point::new(block_id, offset);
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// The block both ends sit in, or `None` for a selection spanning blocks
    pub fn single_block(&self) -> Option<&BlockId> {
        (self.anchor.block_id == self.focus.block_id).then_some(&self.anchor.block_id)
    }

    pub fn collapse_to(&mut self, point: Point) {
        self.anchor = point.clone();
        self.focus = point;
    }
}

/// A selection resolved against the document and ordered by position
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: Point,
    pub end: Point,
    pub start_index: usize,
    pub end_index: usize,
}

impl Span {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn is_single_block(&self) -> bool {
        self.start_index == self.end_index
    }

    /// The char range this span covers inside the block at `index`:
    /// selection bounds at the first and last block, the whole text in between.
    pub fn range_in(&self, index: usize, block: &Block) -> (usize, usize) {
        let start = if index == self.start_index {
            self.start.offset
        } else {
            0
        };
        let end = if index == self.end_index {
            self.end.offset
        } else {
            block.len()
        };
        (start, end.max(start))
    }
}

/// Order anchor and focus by (block index, offset).
///
/// Every range operation goes through here rather than comparing anchor and
/// focus directly. Returns `None` when either point names a missing block.
pub fn start_and_end(document: &Document, selection: &Selection) -> Option<Span> {
    let anchor_index = document.index_of(&selection.anchor.block_id)?;
    let focus_index = document.index_of(&selection.focus.block_id)?;

    let anchor_first = anchor_index < focus_index
        || (anchor_index == focus_index && selection.anchor.offset < selection.focus.offset);

    let span = if anchor_first {
        Span {
            start: selection.anchor.clone(),
            end: selection.focus.clone(),
            start_index: anchor_index,
            end_index: focus_index,
        }
    } else {
        Span {
            start: selection.focus.clone(),
            end: selection.anchor.clone(),
            start_index: focus_index,
            end_index: anchor_index,
        }
    };
    Some(span)
}

/// The text under the selection, blocks joined with `separator`
pub fn selected_text(document: &Document, selection: &Selection, separator: &str) -> String {
    if selection.is_collapsed() {
        return String::new();
    }
    let Some(span) = start_and_end(document, selection) else {
        return String::new();
    };

    document.blocks()[span.start_index..=span.end_index]
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let (start, end) = span.range_in(span.start_index + i, block);
            text::slice(&block.text, start, end)
        })
        .collect::<Vec<_>>()
        .join(separator)
}
