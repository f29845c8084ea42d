//! Undo/redo log.
//!
//! The log is a vector of snapshots with a cursor pointing at the action that
//! describes the current document. Index 0 is the baseline recorded when the
//! history was created, so undoing all the way back restores the initial
//! document.
//!
//! Two snapshot shapes are stored:
//!
//! - **full** actions hold the whole block sequence and are used whenever the
//!   block id sequence changed or the edit kind is structural;
//! - **partial** actions hold only the block under the caret, plus that block
//!   as it was before the edit so undo can revert it. Promotion to full keeps
//!   that copy.
//!
//! Consecutive typing edits of the same kind on the same block coalesce into a
//! single partial action, giving one undo step per burst instead of per key.

use blockedit_config::HistoryConfig;

use crate::editing::{Block, BlockId, Document, Selection};

/// The edit intent a history action was recorded for
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    InsertText,
    DeleteBackward,
    DeleteForward,
    AddNewLine,
    /// Any edit that replaces document structure wholesale
    SetText,
    ApplyStyle,
    RemoveStyle,
    SetBlockType,
    Other(String),
}

impl ActionKind {
    /// Keystroke-level kinds eligible for coalescing
    pub fn is_typing(&self) -> bool {
        matches!(
            self,
            ActionKind::InsertText | ActionKind::DeleteBackward | ActionKind::DeleteForward
        )
    }

    /// Kinds that always record a full snapshot
    pub fn is_structural(&self) -> bool {
        matches!(self, ActionKind::SetText | ActionKind::AddNewLine)
    }

    pub fn name(&self) -> &str {
        match self {
            ActionKind::InsertText => "insertText",
            ActionKind::DeleteBackward => "deleteContentBackward",
            ActionKind::DeleteForward => "deleteContentForward",
            ActionKind::AddNewLine => "addNewLine",
            ActionKind::SetText => "setText",
            ActionKind::ApplyStyle => "applyStyle",
            ActionKind::RemoveStyle => "removeStyle",
            ActionKind::SetBlockType => "setBlockType",
            ActionKind::Other(name) => name,
        }
    }
}

impl From<&str> for ActionKind {
    fn from(name: &str) -> Self {
        match name {
            "insertText" => ActionKind::InsertText,
            "deleteContentBackward" => ActionKind::DeleteBackward,
            "deleteContentForward" => ActionKind::DeleteForward,
            "addNewLine" => ActionKind::AddNewLine,
            "setText" => ActionKind::SetText,
            "applyStyle" => ActionKind::ApplyStyle,
            "removeStyle" => ActionKind::RemoveStyle,
            "setBlockType" => ActionKind::SetBlockType,
            other => ActionKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryAction {
    pub kind: ActionKind,
    /// Whole sequence for full actions, the single edited block otherwise
    pub blocks: Vec<Block>,
    pub full: bool,
    pub selection: Selection,
    before: Option<Block>,
}

impl HistoryAction {
    /// For an action recorded as a single-block edit (including one later
    /// promoted to full), that block as it was before the action
    pub fn before(&self) -> Option<&Block> {
        self.before.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct History {
    actions: Vec<HistoryAction>,
    cursor: usize,
    /// Id sequence as of the last full snapshot or restore
    id_signature: Vec<BlockId>,
    /// Document blocks as of the last push or restore
    cached_blocks: Vec<Block>,
    config: HistoryConfig,
    batch_open: bool,
    batch_index: Option<usize>,
}

impl History {
    pub fn new(document: &Document, selection: &Selection) -> Self {
        Self::with_config(HistoryConfig::default(), document, selection)
    }

    pub fn with_config(config: HistoryConfig, document: &Document, selection: &Selection) -> Self {
        let mut history = Self {
            actions: Vec::new(),
            cursor: 0,
            id_signature: Vec::new(),
            cached_blocks: Vec::new(),
            config,
            batch_open: false,
            batch_index: None,
        };
        history.clear(document, selection);
        history
    }

    /// Drop every action and record the current state as the new baseline
    pub fn clear(&mut self, document: &Document, selection: &Selection) {
        self.actions = vec![HistoryAction {
            kind: ActionKind::SetText,
            blocks: document.blocks().to_vec(),
            full: true,
            selection: selection.clone(),
            before: None,
        }];
        self.cursor = 0;
        self.id_signature = document.id_signature();
        self.cached_blocks = document.blocks().to_vec();
        self.batch_index = None;
    }

    pub fn actions(&self) -> &[HistoryAction] {
        &self.actions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        self.config.enabled && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.config.enabled && self.cursor + 1 < self.actions.len()
    }

    /// Record the current document and selection as the result of a `kind` edit.
    ///
    /// Any redo branch past the cursor is discarded first.
    pub fn push(&mut self, kind: ActionKind, document: &Document, selection: &Selection) {
        if !self.config.enabled {
            return;
        }
        self.actions.truncate(self.cursor + 1);

        if self.batch_open {
            self.push_batched(kind, document, selection);
        } else {
            let full = kind.is_structural() || self.id_signature != document.id_signature();
            let current = selection
                .single_block()
                .and_then(|id| document.block(id));

            match current {
                Some(block) if !full => {
                    let cached = self.cached_blocks.iter_mut().find(|b| b.id == block.id);
                    match cached {
                        Some(cached) => {
                            let before = std::mem::replace(cached, block.clone());
                            self.push_partial(kind, block, before, selection);
                        }
                        None => self.push_full(kind, document, selection),
                    }
                }
                _ => self.push_full(kind, document, selection),
            }
        }

        self.cursor = self.actions.len() - 1;
    }

    fn push_partial(
        &mut self,
        kind: ActionKind,
        block: &Block,
        before: Block,
        selection: &Selection,
    ) {
        if let Some(last) = self.actions.last_mut()
            && self.config.coalesce_typing
            && kind.is_typing()
            && !last.full
            && last.kind == kind
            && last.blocks.first().map(|b| &b.id) == Some(&block.id)
        {
            log::debug!("coalescing {kind} on block {} into previous action", block.id);
            last.blocks = vec![block.clone()];
            last.selection = selection.clone();
            return;
        }

        log::debug!("pushing partial {kind} action for block {}", block.id);
        self.actions.push(HistoryAction {
            kind,
            blocks: vec![block.clone()],
            full: false,
            selection: selection.clone(),
            before: Some(before),
        });
    }

    fn push_full(&mut self, kind: ActionKind, document: &Document, selection: &Selection) {
        if let Some(last) = self.actions.last_mut()
            && !last.full
        {
            // Undoing this full action must restore every block, not just one.
            // `before` stays so leaving it still reverts the edited block.
            log::debug!("promoting previous {} action to full snapshot", last.kind);
            last.full = true;
            last.blocks = self.cached_blocks.clone();
        }

        log::debug!(
            "pushing full {kind} action ({} blocks)",
            document.blocks().len()
        );
        self.actions.push(HistoryAction {
            kind,
            blocks: document.blocks().to_vec(),
            full: true,
            selection: selection.clone(),
            before: None,
        });
        self.refresh(document);
    }

    fn push_batched(&mut self, kind: ActionKind, document: &Document, selection: &Selection) {
        let last_index = self.actions.len() - 1;
        if self.batch_index == Some(last_index) && self.actions[last_index].kind == kind {
            log::debug!("merging {kind} into the action pushed earlier in this batch");
            let last = &mut self.actions[last_index];
            last.blocks = document.blocks().to_vec();
            last.selection = selection.clone();
            self.refresh(document);
            return;
        }

        self.push_full(kind, document, selection);
        self.batch_index = Some(self.actions.len() - 1);
    }

    fn refresh(&mut self, document: &Document) {
        self.id_signature = document.id_signature();
        self.cached_blocks = document.blocks().to_vec();
    }

    /// Open the batch window: until [`History::end_batch`], pushes of the same
    /// kind collapse into one full action.
    pub fn begin_batch(&mut self) {
        self.batch_open = true;
        self.batch_index = None;
    }

    pub fn end_batch(&mut self) {
        self.batch_open = false;
        self.batch_index = None;
    }

    /// Step back one action. Returns `false` at the start of the log.
    pub fn undo(&mut self, document: &mut Document, selection: &mut Selection) -> bool {
        if !self.can_undo() {
            return false;
        }

        if let Some(before) = self.actions[self.cursor].before.as_ref() {
            document.restore_block(before);
        }
        self.cursor -= 1;
        log::debug!("undo to action {}", self.cursor);
        self.apply(document, selection);
        true
    }

    /// Step forward one action. Returns `false` at the end of the log.
    pub fn redo(&mut self, document: &mut Document, selection: &mut Selection) -> bool {
        if !self.can_redo() {
            return false;
        }

        self.cursor += 1;
        log::debug!("redo to action {}", self.cursor);
        self.apply(document, selection);
        true
    }

    fn apply(&mut self, document: &mut Document, selection: &mut Selection) {
        let action = &self.actions[self.cursor];
        if action.full {
            document.restore(&action.blocks);
        } else {
            for block in &action.blocks {
                document.restore_block(block);
            }
        }
        selection.clone_from(&action.selection);
        self.refresh(document);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{Point, text};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    struct Fixture {
        document: Document,
        selection: Selection,
        history: History,
    }

    impl Fixture {
        fn new(blocks: Vec<Block>) -> Self {
            let document = Document::from_blocks(blocks).unwrap();
            let selection = Selection::caret(document.first().id.clone(), 0);
            let history = History::new(&document, &selection);
            Self {
                document,
                selection,
                history,
            }
        }

        /// Append `text` to block `id` the way a keystroke would, then push
        fn type_into(&mut self, id: &str, typed: &str) {
            let block = self.document.block_mut(&BlockId::from(id)).unwrap();
            block.text.push_str(typed);
            let len = text::char_len(&block.text);
            self.selection = Selection::caret(id, len);
            self.history
                .push(ActionKind::InsertText, &self.document, &self.selection);
        }

        fn undo(&mut self) -> bool {
            self.history.undo(&mut self.document, &mut self.selection)
        }

        fn redo(&mut self) -> bool {
            self.history.redo(&mut self.document, &mut self.selection)
        }

        fn texts(&self) -> Vec<String> {
            self.document
                .blocks()
                .iter()
                .map(|block| block.text.clone())
                .collect()
        }
    }

    #[rstest]
    #[case("insertText", ActionKind::InsertText)]
    #[case("deleteContentBackward", ActionKind::DeleteBackward)]
    #[case("setText", ActionKind::SetText)]
    #[case("paste", ActionKind::Other("paste".to_string()))]
    fn test_kind_names_round_trip(#[case] name: &str, #[case] kind: ActionKind) {
        assert_eq!(ActionKind::from(name), kind);
        assert_eq!(kind.name(), name);
    }

    #[test]
    fn test_baseline_action() {
        let fx = Fixture::new(vec![Block::new("1")]);
        assert_eq!(fx.history.actions().len(), 1);
        assert_eq!(fx.history.cursor(), 0);
        assert!(fx.history.actions()[0].full);
        assert!(!fx.history.can_undo());
        assert!(!fx.history.can_redo());
    }

    #[test]
    fn test_typing_burst_coalesces() {
        let mut fx = Fixture::new(vec![Block::new("1")]);
        for ch in ["a", "b", "c"] {
            fx.type_into("1", ch);
        }

        assert_eq!(fx.history.actions().len(), 2);
        let action = &fx.history.actions()[1];
        assert!(!action.full);
        assert_eq!(action.blocks[0].text, "abc");
        assert_eq!(action.before().map(|b| b.text.as_str()), Some(""));

        assert!(fx.undo());
        assert_eq!(fx.texts(), vec![""]);
        assert!(fx.redo());
        assert_eq!(fx.texts(), vec!["abc"]);
        assert_eq!(fx.selection, Selection::caret("1", 3));
    }

    #[test]
    fn test_different_kind_starts_new_action() {
        let mut fx = Fixture::new(vec![Block::new("1")]);
        fx.type_into("1", "ab");

        fx.document.block_mut(&BlockId::from("1")).unwrap().text.pop();
        fx.selection = Selection::caret("1", 1);
        fx.history
            .push(ActionKind::DeleteBackward, &fx.document, &fx.selection);

        assert_eq!(fx.history.actions().len(), 3);
        fx.undo();
        assert_eq!(fx.texts(), vec!["ab"]);
    }

    #[test]
    fn test_coalescing_can_be_disabled() {
        let document = Document::new();
        let mut selection = Selection::caret("1", 0);
        let mut history = History::with_config(
            HistoryConfig {
                enabled: true,
                coalesce_typing: false,
            },
            &document,
            &selection,
        );
        let mut document = document;
        for ch in ['x', 'y'] {
            document.block_mut(&BlockId::from("1")).unwrap().text.push(ch);
            history.push(ActionKind::InsertText, &document, &selection);
        }

        assert_eq!(history.actions().len(), 3);
        history.undo(&mut document, &mut selection);
        assert_eq!(document.first().text, "x");
    }

    #[test]
    fn test_typing_in_another_block_is_separate_and_reverted() {
        let mut fx = Fixture::new(vec![Block::new("1"), Block::new("2")]);
        fx.type_into("1", "one");
        fx.type_into("2", "two");

        assert_eq!(fx.history.actions().len(), 3);
        fx.undo();
        assert_eq!(fx.texts(), vec!["one", ""]);
        fx.undo();
        assert_eq!(fx.texts(), vec!["", ""]);
        fx.redo();
        fx.redo();
        assert_eq!(fx.texts(), vec!["one", "two"]);
    }

    #[test]
    fn test_structural_push_promotes_partial() {
        let mut fx = Fixture::new(vec![Block::new("1")]);
        fx.type_into("1", "hello");

        let new_id = fx.document.split_block_at(0, 5).unwrap();
        fx.selection = Selection::caret(new_id, 0);
        fx.history
            .push(ActionKind::AddNewLine, &fx.document, &fx.selection);

        let actions = fx.history.actions();
        assert_eq!(actions.len(), 3);
        assert!(actions[1].full, "typing action promoted");
        assert_eq!(actions[1].blocks.len(), 1);
        assert_eq!(actions[1].blocks[0].text, "hello");
        assert!(actions[2].full);

        assert_eq!(actions[1].before().map(|b| b.text.as_str()), Some(""));

        fx.undo();
        assert_eq!(fx.texts(), vec!["hello"]);
        assert_eq!(fx.selection, Selection::caret("1", 5));
        fx.undo();
        assert_eq!(fx.texts(), vec![""]);
    }

    #[test]
    fn test_undo_out_of_promoted_action_reverts_its_block() {
        let mut fx = Fixture::new(vec![Block::new("1"), Block::new("2")]);
        fx.type_into("1", "one");
        fx.type_into("2", "two");

        let new_id = fx.document.split_block_at(1, 3).unwrap();
        fx.selection = Selection::caret(new_id, 0);
        fx.history
            .push(ActionKind::AddNewLine, &fx.document, &fx.selection);

        assert!(fx.undo());
        assert_eq!(fx.texts(), vec!["one", "two"]);
        assert!(fx.undo());
        assert_eq!(fx.texts(), vec!["one", ""]);
        assert_eq!(fx.selection, Selection::caret("1", 3));
        assert!(fx.undo());
        assert_eq!(fx.texts(), vec!["", ""]);

        assert!(fx.redo());
        assert_eq!(fx.texts(), vec!["one", ""]);
        assert!(fx.redo());
        assert_eq!(fx.texts(), vec!["one", "two"]);
        assert!(fx.redo());
        assert_eq!(fx.texts(), vec!["one", "two", ""]);
    }

    #[test]
    fn test_id_change_forces_full_snapshot() {
        let mut fx = Fixture::new(vec![Block::new("1").with_text("ab"), Block::new("2")]);
        fx.document.remove_block(1);
        fx.selection = Selection::caret("1", 2);
        fx.history
            .push(ActionKind::DeleteForward, &fx.document, &fx.selection);

        assert!(fx.history.actions()[1].full);
        fx.undo();
        assert_eq!(fx.document.len(), 2);
    }

    #[test]
    fn test_push_after_undo_truncates_redo_branch() {
        let mut fx = Fixture::new(vec![Block::new("1")]);
        fx.type_into("1", "a");
        fx.history
            .push(ActionKind::SetText, &fx.document, &fx.selection);
        fx.undo();
        assert!(fx.history.can_redo());

        fx.history
            .push(ActionKind::ApplyStyle, &fx.document, &fx.selection);

        assert!(!fx.history.can_redo());
        assert_eq!(fx.history.actions().len(), 3);
        assert_eq!(fx.history.actions()[2].kind, ActionKind::ApplyStyle);
    }

    #[test]
    fn test_undo_redo_at_boundaries_are_noops() {
        let mut fx = Fixture::new(vec![Block::new("1").with_text("x")]);
        assert!(!fx.undo());
        assert!(!fx.redo());
        assert_eq!(fx.texts(), vec!["x"]);
    }

    #[test]
    fn test_multi_block_selection_records_full_snapshot() {
        let mut fx = Fixture::new(vec![Block::new("1").with_text("a"), Block::new("2")]);
        fx.selection = Selection::new(Point::new("1", 0), Point::new("2", 0));
        fx.history
            .push(ActionKind::ApplyStyle, &fx.document, &fx.selection);

        assert!(fx.history.actions()[1].full);
    }

    #[test]
    fn test_batch_merges_same_kind() {
        let mut fx = Fixture::new(vec![Block::new("1")]);
        fx.history.begin_batch();
        fx.type_into("1", "a");
        fx.type_into("1", "b");
        fx.history.end_batch();

        assert_eq!(fx.history.actions().len(), 2);
        assert!(fx.history.actions()[1].full);

        fx.type_into("1", "c");
        assert_eq!(fx.history.actions().len(), 3);
    }

    #[test]
    fn test_disabled_history_records_nothing() {
        let mut document = Document::new();
        let mut selection = Selection::caret("1", 0);
        let mut history = History::with_config(
            HistoryConfig {
                enabled: false,
                coalesce_typing: true,
            },
            &document,
            &selection,
        );

        document.block_mut(&BlockId::from("1")).unwrap().text.push('z');
        history.push(ActionKind::InsertText, &document, &selection);

        assert_eq!(history.actions().len(), 1);
        assert!(!history.undo(&mut document, &mut selection));
        assert_eq!(document.first().text, "z");
    }
}
