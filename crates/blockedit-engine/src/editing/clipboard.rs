//! Structured clipboard data.
//!
//! Markup never reaches the core: an HTML importer (or any other front end)
//! turns pasted content into a flat list of [`Fragment`]s, and copying
//! produces the same shape, so the core can round-trip its own selections.

use serde::{Deserialize, Serialize};

use crate::editing::{BlockPatch, Document, Selection, selection, text};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Fragment {
    /// A run of text, optionally tagging the block it lands in
    Text {
        text: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        block_type: Option<String>,
    },
    /// A paragraph break
    LineBreak,
    /// An embedded block inserted as a unit
    Atomic(BlockPatch),
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Fragment::Text {
            text: text.into(),
            block_type: None,
        }
    }
}

/// Split plain text into fragments.
///
/// With `split_lines`, every `\n` becomes a [`Fragment::LineBreak`]; otherwise
/// the text is kept as one run and line breaks stay inside the block.
pub fn fragments_from_text(pasted: &str, split_lines: bool) -> Vec<Fragment> {
    let pasted = pasted.replace('\r', "");
    if !split_lines {
        return vec![Fragment::text(pasted)];
    }

    let mut fragments = Vec::new();
    for (i, line) in pasted.split('\n').enumerate() {
        if i > 0 {
            fragments.push(Fragment::LineBreak);
        }
        if !line.is_empty() {
            fragments.push(Fragment::text(line));
        }
    }
    fragments
}

/// Flatten fragments back to plain text, joining paragraphs with `separator`
pub fn fragments_to_text(fragments: &[Fragment], separator: &str) -> String {
    let mut out = String::new();
    for fragment in fragments {
        match fragment {
            Fragment::Text { text, .. } => out.push_str(text),
            Fragment::LineBreak => out.push_str(separator),
            Fragment::Atomic(patch) => out.push_str(patch.text.as_deref().unwrap_or_default()),
        }
    }
    out
}

/// The selection as fragments: the first block's tail, whole interior blocks
/// and the last block's head, each carrying its block type.
pub fn selected_fragments(document: &Document, selection: &Selection) -> Vec<Fragment> {
    if selection.is_collapsed() {
        return Vec::new();
    }
    let Some(span) = selection::start_and_end(document, selection) else {
        return Vec::new();
    };

    let mut fragments = Vec::new();
    for index in span.start_index..=span.end_index {
        let block = &document.blocks()[index];
        if index > span.start_index {
            fragments.push(Fragment::LineBreak);
        }
        if !block.editable {
            fragments.push(Fragment::Atomic(BlockPatch {
                text: Some(block.text.clone()),
                block_type: block.block_type.clone(),
                styles: Some(block.styles.clone()),
                editable: Some(false),
            }));
            continue;
        }
        let (start, end) = span.range_in(index, block);
        fragments.push(Fragment::Text {
            text: text::slice(&block.text, start, end).to_string(),
            block_type: block.block_type.clone(),
        });
    }
    fragments
}
