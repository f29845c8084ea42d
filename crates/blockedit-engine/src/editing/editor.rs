use std::collections::BTreeMap;

use blockedit_config::Config;
use serde::{Deserialize, Serialize};

use crate::editing::{
    ActionKind, Block, BlockPatch, Cmd, Document, Fragment, History, Patch, Point, Selection,
    Span, StyleInterval, clipboard, commands, selection, styles,
};
use crate::error::EditorError;

/// Serializable state of an editor: blocks plus selection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub blocks: Vec<Block>,
    pub selection: Selection,
}

/// The editing core: document, selection and history behind one mutable handle.
///
/// Every mutation goes through [`Editor::apply`]; the named intent methods are
/// shorthands for the matching [`Cmd`].
#[derive(Debug)]
pub struct Editor {
    pub(crate) document: Document,
    pub(crate) selection: Selection,
    history: History,
    version: u64,
    line_separator: String,
    pub(crate) split_pasted_lines: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// A fresh editor holding one empty block, caret at its start
    pub fn with_config(config: &Config) -> Self {
        Self::assemble(Document::with_strategy(config.block_ids), None, config)
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, EditorError> {
        Self::from_blocks_with_config(blocks, &Config::default())
    }

    /// Load existing blocks; the caret starts at offset 0 of the first block
    pub fn from_blocks_with_config(
        blocks: Vec<Block>,
        config: &Config,
    ) -> Result<Self, EditorError> {
        let document = Document::from_blocks_with(blocks, config.block_ids)?;
        Ok(Self::assemble(document, None, config))
    }

    /// Restore an editor from a snapshot, validating blocks and selection
    pub fn from_snapshot(snapshot: EditorSnapshot, config: &Config) -> Result<Self, EditorError> {
        let document = Document::from_blocks_with(snapshot.blocks, config.block_ids)?;
        for point in [&snapshot.selection.anchor, &snapshot.selection.focus] {
            check_point(&document, point)?;
        }
        Ok(Self::assemble(document, Some(snapshot.selection), config))
    }

    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let snapshot: EditorSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot, &Config::default())
    }

    fn assemble(document: Document, selection: Option<Selection>, config: &Config) -> Self {
        let selection =
            selection.unwrap_or_else(|| Selection::caret(document.first().id.clone(), 0));
        let history = History::with_config(config.history.clone(), &document, &selection);
        log::debug!(
            "editor created with {} block(s), history {}",
            document.len(),
            if config.history.enabled { "on" } else { "off" }
        );
        Self {
            document,
            selection,
            history,
            version: 0,
            line_separator: config.line_separator.clone(),
            split_pasted_lines: config.split_pasted_lines,
        }
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            blocks: self.document.blocks().to_vec(),
            selection: self.selection.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, EditorError> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn blocks(&self) -> &[Block] {
        self.document.blocks()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Monotonic counter bumped by every change to document or selection
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn touch(&mut self) {
        self.version += 1;
    }

    /// Replace the selection.
    ///
    /// Both points must name existing blocks; offsets past the end of their
    /// block are clamped to its length.
    pub fn set_selection(&mut self, selection: Selection) -> Result<(), EditorError> {
        let anchor = self.clamp_point(selection.anchor)?;
        let focus = self.clamp_point(selection.focus)?;
        let selection = Selection::new(anchor, focus);
        if selection != self.selection {
            self.selection = selection;
            self.touch();
        }
        Ok(())
    }

    fn clamp_point(&self, point: Point) -> Result<Point, EditorError> {
        let block = self
            .document
            .block(&point.block_id)
            .ok_or_else(|| EditorError::UnknownBlock(point.block_id.clone()))?;
        let offset = point.offset.min(block.len());
        Ok(Point::new(point.block_id, offset))
    }

    pub fn is_collapsed(&self) -> bool {
        self.selection.is_collapsed()
    }

    /// The block holding both selection ends, if they share one
    pub fn current_block(&self) -> Option<&Block> {
        self.selection
            .single_block()
            .and_then(|id| self.document.block(id))
    }

    pub fn current_block_index(&self) -> Option<usize> {
        self.selection
            .single_block()
            .and_then(|id| self.document.index_of(id))
    }

    pub fn start_and_end(&self) -> Option<Span> {
        selection::start_and_end(&self.document, &self.selection)
    }

    pub fn selected_text(&self) -> String {
        selection::selected_text(&self.document, &self.selection, &self.line_separator)
    }

    pub fn selected_fragments(&self) -> Vec<Fragment> {
        clipboard::selected_fragments(&self.document, &self.selection)
    }

    /// Style labels active at the caret or across the whole selection
    pub fn current_styles(&self) -> BTreeMap<String, StyleInterval> {
        match self.start_and_end() {
            Some(span) => styles::active_styles(self.document.blocks(), &span),
            None => BTreeMap::new(),
        }
    }

    /// Collapse the caret to `new_offset` in the current block, shifting the
    /// block's style intervals by the distance moved.
    ///
    /// Meant to follow a text change at the caret: intervals at or after the
    /// old focus move with the text. Intervals are clipped to the block length
    /// afterwards.
    pub fn move_offset(&mut self, new_offset: usize) {
        let Some(index) = self.current_block_index() else {
            return;
        };
        let delta = new_offset as isize - self.selection.anchor.offset as isize;
        let focus = self.selection.focus.offset;

        let block = &mut self.document.blocks_mut()[index];
        styles::move_styles(block, focus, -delta);
        let len = block.len();
        styles::clip_styles(block, len);

        let point = Point::new(block.id.clone(), new_offset.min(len));
        self.selection.collapse_to(point);
        self.touch();
    }

    /// Check the document and selection invariants
    pub fn validate(&self) -> Result<(), EditorError> {
        self.document.validate()?;
        for point in [&self.selection.anchor, &self.selection.focus] {
            check_point(&self.document, point)?;
        }
        Ok(())
    }

    /// Apply a command and record it in history if it changed the document
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        log::trace!("apply {cmd:?}");
        let kind = cmd.kind(self);
        let version = self.version;

        commands::execute(self, cmd);

        let changed = self.version != version;
        if changed && let Some(kind) = kind {
            self.history.push(kind, &self.document, &self.selection);
        }
        debug_assert!(
            self.validate().is_ok(),
            "editor invariants broken: {:?}",
            self.validate()
        );

        Patch {
            changed,
            new_selection: self.selection.clone(),
            version: self.version,
        }
    }

    /// Record the current state under `kind`, for edits made outside [`Cmd`]
    pub fn push_history(&mut self, kind: impl Into<ActionKind>) {
        self.history.push(kind.into(), &self.document, &self.selection);
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.document, &mut self.selection);
        if undone {
            self.touch();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.document, &mut self.selection);
        if redone {
            self.touch();
        }
        redone
    }

    /// Drop all history and record the current state as the new baseline
    pub fn clear_history(&mut self) {
        self.history.clear(&self.document, &self.selection);
    }

    /// Run several commands as one undo step per kind.
    ///
    /// Within the batch every push records a full snapshot and pushes of the
    /// same kind merge into the previous action.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.history.begin_batch();
        let result = f(self);
        self.history.end_batch();
        result
    }

    pub fn insert_text(&mut self, text: impl Into<String>) -> Patch {
        self.apply(Cmd::InsertText(text.into()))
    }

    pub fn delete_backward(&mut self) -> Patch {
        self.apply(Cmd::DeleteBackward)
    }

    pub fn delete_forward(&mut self) -> Patch {
        self.apply(Cmd::DeleteForward)
    }

    pub fn add_new_line(&mut self) -> Patch {
        self.apply(Cmd::AddNewLine)
    }

    pub fn add_new_line_before(&mut self) -> Patch {
        self.apply(Cmd::AddNewLineBefore)
    }

    pub fn insert_block(&mut self, patch: BlockPatch) -> Patch {
        self.apply(Cmd::InsertBlock(patch))
    }

    pub fn remove_current_block(&mut self) -> Patch {
        self.apply(Cmd::RemoveCurrentBlock)
    }

    pub fn apply_style(
        &mut self,
        style: impl Into<String>,
        meta: Option<serde_json::Value>,
    ) -> Patch {
        self.apply(Cmd::ApplyStyle {
            style: style.into(),
            meta,
        })
    }

    pub fn remove_style(&mut self, style: impl Into<String>) -> Patch {
        self.apply(Cmd::RemoveStyle {
            style: style.into(),
        })
    }

    pub fn toggle_style(&mut self, style: impl Into<String>) -> Patch {
        self.apply(Cmd::ToggleStyle {
            style: style.into(),
        })
    }

    pub fn set_block_type(&mut self, block_type: Option<String>) -> Patch {
        self.apply(Cmd::SetBlockType(block_type))
    }

    pub fn delete_selected(&mut self) -> Patch {
        self.apply(Cmd::DeleteSelected)
    }

    pub fn select_all(&mut self) -> Patch {
        self.apply(Cmd::SelectAll)
    }

    pub fn paste(&mut self, fragments: Vec<Fragment>) -> Patch {
        self.apply(Cmd::Paste(fragments))
    }

    pub fn paste_text(&mut self, text: impl Into<String>) -> Patch {
        self.apply(Cmd::PasteText(text.into()))
    }

    /// Copy the selection as fragments and delete it
    pub fn cut(&mut self) -> Vec<Fragment> {
        let fragments = self.selected_fragments();
        self.apply(Cmd::DeleteSelected);
        fragments
    }
}

fn check_point(document: &Document, point: &Point) -> Result<(), EditorError> {
    let block = document
        .block(&point.block_id)
        .ok_or_else(|| EditorError::UnknownBlock(point.block_id.clone()))?;
    if point.offset > block.len() {
        return Err(EditorError::OffsetOutOfRange {
            block_id: point.block_id.clone(),
            offset: point.offset,
            len: block.len(),
        });
    }
    Ok(())
}
