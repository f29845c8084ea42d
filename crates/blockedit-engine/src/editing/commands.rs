use serde_json::Value;

use crate::editing::{
    ActionKind, Block, BlockPatch, Editor, Fragment, Point, Selection, clipboard,
    document::concat_blocks, styles, text,
};

/// Edit commands understood by [`Editor::apply`]
#[derive(Clone, Debug, PartialEq)]
pub enum Cmd {
    /// Type text at the caret, replacing any selection
    InsertText(String),
    DeleteBackward,
    DeleteForward,
    /// Split the current block at the caret
    AddNewLine,
    /// Open an empty block above the current one
    AddNewLineBefore,
    InsertBlock(BlockPatch),
    RemoveCurrentBlock,
    ApplyStyle {
        style: String,
        meta: Option<Value>,
    },
    RemoveStyle {
        style: String,
    },
    ToggleStyle {
        style: String,
    },
    SetBlockType(Option<String>),
    DeleteSelected,
    SelectAll,
    /// Move the selection; points naming unknown blocks are ignored
    SetSelection(Selection),
    Paste(Vec<Fragment>),
    PasteText(String),
}

impl Cmd {
    /// The history kind this command records under, or `None` for
    /// selection-only commands
    pub(crate) fn kind(&self, editor: &Editor) -> Option<ActionKind> {
        let kind = match self {
            Cmd::InsertText(_) => ActionKind::InsertText,
            Cmd::DeleteBackward => ActionKind::DeleteBackward,
            Cmd::DeleteForward => ActionKind::DeleteForward,
            Cmd::AddNewLine | Cmd::AddNewLineBefore => ActionKind::AddNewLine,
            Cmd::InsertBlock(_)
            | Cmd::RemoveCurrentBlock
            | Cmd::DeleteSelected
            | Cmd::Paste(_)
            | Cmd::PasteText(_) => ActionKind::SetText,
            Cmd::ApplyStyle { .. } => ActionKind::ApplyStyle,
            Cmd::RemoveStyle { .. } => ActionKind::RemoveStyle,
            Cmd::ToggleStyle { style } if editor.current_styles().contains_key(style) => {
                ActionKind::RemoveStyle
            }
            Cmd::ToggleStyle { .. } => ActionKind::ApplyStyle,
            Cmd::SetBlockType(_) => ActionKind::SetBlockType,
            Cmd::SelectAll | Cmd::SetSelection(_) => return None,
        };
        Some(kind)
    }
}

pub(crate) fn execute(editor: &mut Editor, cmd: Cmd) {
    match cmd {
        Cmd::InsertText(typed) => insert_text(editor, &typed),
        Cmd::DeleteBackward => delete_backward(editor),
        Cmd::DeleteForward => delete_forward(editor),
        Cmd::AddNewLine => add_new_line(editor),
        Cmd::AddNewLineBefore => add_new_line_before(editor),
        Cmd::InsertBlock(patch) => insert_block(editor, &patch),
        Cmd::RemoveCurrentBlock => remove_current_block(editor),
        Cmd::ApplyStyle { style, meta } => apply_style(editor, &style, meta),
        Cmd::RemoveStyle { style } => remove_style(editor, &style),
        Cmd::ToggleStyle { style } => {
            if editor.current_styles().contains_key(&style) {
                remove_style(editor, &style);
            } else {
                apply_style(editor, &style, None);
            }
        }
        Cmd::SetBlockType(block_type) => set_block_type(editor, block_type),
        Cmd::DeleteSelected => delete_selected(editor),
        Cmd::SelectAll => select_all(editor),
        Cmd::SetSelection(selection) => {
            if let Err(err) = editor.set_selection(selection) {
                log::warn!("ignoring selection: {err}");
            }
        }
        Cmd::Paste(fragments) => paste(editor, &fragments),
        Cmd::PasteText(pasted) => {
            let fragments = clipboard::fragments_from_text(&pasted, editor.split_pasted_lines);
            paste(editor, &fragments);
        }
    }
}

fn collapse(editor: &mut Editor, point: Point) {
    editor.selection.collapse_to(point);
    editor.touch();
}

fn insert_text(editor: &mut Editor, typed: &str) {
    if !editor.is_collapsed() {
        delete_selected(editor);
    }
    let typed = typed.replace('\r', "");
    if typed.is_empty() {
        return;
    }
    let Some(index) = editor.current_block_index() else {
        return;
    };
    let block = &mut editor.document.blocks_mut()[index];
    if !block.editable {
        return;
    }

    let offset = editor.selection.focus.offset.min(block.len());
    text::splice(&mut block.text, offset, offset, &typed);
    let point = Point::new(block.id.clone(), offset);

    editor.selection.collapse_to(point);
    editor.move_offset(offset + text::char_len(&typed));
}

fn delete_backward(editor: &mut Editor) {
    if !editor.is_collapsed() {
        delete_selected(editor);
        return;
    }
    let Some(index) = editor.current_block_index() else {
        return;
    };
    let block = &mut editor.document.blocks_mut()[index];
    if !block.editable {
        remove_current_block(editor);
        return;
    }

    let offset = editor.selection.focus.offset.min(block.len());
    if offset > 0 {
        text::splice(&mut block.text, offset - 1, offset, "");
        editor.move_offset(offset - 1);
        return;
    }

    // At the start of a block: drop the type tag first, then merge upwards
    if block.block_type.take().is_some() {
        editor.touch();
        return;
    }
    if index == 0 {
        return;
    }

    let previous = &editor.document.blocks()[index - 1];
    if !previous.editable {
        editor.document.remove_block(index - 1);
        editor.touch();
        return;
    }
    let previous_id = previous.id.clone();
    if let Some(boundary) = editor.document.merge_with_next(index - 1) {
        collapse(editor, Point::new(previous_id, boundary));
    }
}

fn delete_forward(editor: &mut Editor) {
    if !editor.is_collapsed() {
        delete_selected(editor);
        return;
    }
    let Some(index) = editor.current_block_index() else {
        return;
    };
    let block = &mut editor.document.blocks_mut()[index];
    if !block.editable {
        remove_current_block(editor);
        return;
    }

    let offset = editor.selection.focus.offset.min(block.len());
    if offset < block.len() {
        text::splice(&mut block.text, offset, offset + 1, "");
        styles::move_styles(block, offset + 1, 1);
        editor.touch();
        return;
    }

    let Some(next) = editor.document.blocks().get(index + 1) else {
        return;
    };
    if next.editable {
        editor.document.merge_with_next(index);
    } else {
        editor.document.remove_block(index + 1);
    }
    editor.touch();
}

fn add_new_line(editor: &mut Editor) {
    if editor.is_collapsed()
        && let Some(index) = editor.current_block_index()
    {
        let block = &editor.document.blocks()[index];
        if !block.editable {
            // Enter on an embed opens a block after it
            let id = editor.document.insert_empty(index + 1);
            collapse(editor, Point::new(id, 0));
            return;
        }
        if editor.selection.focus.offset == 0 {
            // Caret keeps its block, which moves down one slot
            editor.document.insert_empty(index);
            editor.touch();
            return;
        }
    }

    delete_selected(editor);
    let Some(index) = editor.current_block_index() else {
        return;
    };
    let offset = editor.selection.anchor.offset;
    if let Some(id) = editor.document.split_block_at(index, offset) {
        collapse(editor, Point::new(id, 0));
    }
}

fn add_new_line_before(editor: &mut Editor) {
    let Some(index) = editor.current_block_index() else {
        return;
    };
    editor.document.insert_empty(index);
    editor.touch();
}

fn insert_block(editor: &mut Editor, patch: &BlockPatch) {
    delete_selected(editor);
    let Some(mut index) = editor.current_block_index() else {
        return;
    };

    let block = &editor.document.blocks()[index];
    let offset = editor.selection.focus.offset.min(block.len());
    if block.editable
        && offset > 0
        && let Some(id) = editor.document.split_block_at(index, offset)
    {
        index += 1;
        editor.selection.collapse_to(Point::new(id, 0));
    }

    // Only an empty editable block is overwritten; anything else keeps its
    // content and the new block goes above it
    let target = &editor.document.blocks()[index];
    if !target.is_empty() || !target.editable {
        let id = editor.document.insert_empty(index);
        editor.selection.collapse_to(Point::new(id, 0));
    }

    let inserted = &mut editor.document.blocks_mut()[index];
    patch.apply_to(inserted);

    let point = if inserted.editable {
        Point::new(inserted.id.clone(), inserted.len())
    } else {
        if index + 1 == editor.document.len() {
            editor.document.insert_empty(index + 1);
        }
        Point::new(editor.document.blocks()[index + 1].id.clone(), 0)
    };
    collapse(editor, point);
}

fn remove_current_block(editor: &mut Editor) {
    let Some(index) = editor.current_block_index() else {
        return;
    };
    editor.document.remove_block(index);

    let point = match index.checked_sub(1) {
        Some(previous) => {
            let block = &editor.document.blocks()[previous];
            Point::new(block.id.clone(), block.len())
        }
        None => Point::new(editor.document.first().id.clone(), 0),
    };
    collapse(editor, point);
}

fn apply_style(editor: &mut Editor, style: &str, meta: Option<Value>) {
    if editor.is_collapsed() {
        return;
    }
    restyle(editor, |block, start, end| {
        styles::apply_style_at(block, start, end, style, meta.clone());
    });
}

fn remove_style(editor: &mut Editor, style: &str) {
    if editor.is_collapsed() {
        return;
    }
    restyle(editor, |block, start, end| {
        styles::remove_style_at(block, start, end, Some(style));
    });
}

/// Run `restyle` over the selected range of every editable block in the selection
fn restyle<F>(editor: &mut Editor, mut edit: F)
where
    F: FnMut(&mut Block, usize, usize),
{
    let Some(span) = editor.start_and_end() else {
        return;
    };
    let mut changed = false;
    for index in span.start_index..=span.end_index {
        let block = &mut editor.document.blocks_mut()[index];
        if !block.editable {
            continue;
        }
        let (start, end) = span.range_in(index, block);
        let end = end.min(block.len());
        if start >= end {
            continue;
        }
        let before = block.styles.clone();
        edit(block, start, end);
        changed |= block.styles != before;
    }
    if changed {
        editor.touch();
    }
}

fn set_block_type(editor: &mut Editor, block_type: Option<String>) {
    let Some(index) = editor.current_block_index() else {
        return;
    };
    let block = &mut editor.document.blocks_mut()[index];
    if block.block_type != block_type {
        block.block_type = block_type;
        editor.touch();
    }
}

fn delete_selected(editor: &mut Editor) {
    if editor.is_collapsed() {
        return;
    }
    let Some(span) = editor.start_and_end() else {
        return;
    };
    let blocks = editor.document.blocks_mut();

    if span.is_single_block() {
        let block = &mut blocks[span.start_index];
        let len = block.len();
        let (start, end) = (span.start.offset.min(len), span.end.offset.min(len));
        styles::remove_style_at(block, start, end, None);
        styles::move_styles(block, end, (end - start) as isize);
        text::splice(&mut block.text, start, end, "");
        collapse(editor, Point::new(span.start.block_id, start));
        return;
    }

    // Embeds at either end are removed whole; the text survives in an editable block
    let keep_start = blocks[span.start_index].editable;
    let keep_end = blocks[span.end_index].editable;

    let start_block = &mut blocks[span.start_index];
    let start = span.start.offset.min(start_block.len());
    if keep_start {
        let len = start_block.len();
        styles::remove_style_at(start_block, start, len, None);
        start_block.text = text::head(&start_block.text, start).to_string();
        styles::clip_styles(start_block, start);
    }

    if keep_end {
        let end_block = &mut blocks[span.end_index];
        let end = span.end.offset.min(end_block.len());
        styles::remove_style_at(end_block, 0, end, None);
        styles::move_styles(end_block, end, end as isize);
        end_block.text = text::tail(&end_block.text, end).to_string();
    }

    let point = match (keep_start, keep_end) {
        (true, true) => {
            let end_block = blocks.remove(span.end_index);
            concat_blocks(&mut blocks[span.start_index], end_block);
            editor
                .document
                .remove_range(span.start_index + 1..span.end_index);
            Point::new(span.start.block_id, start)
        }
        (true, false) => {
            editor
                .document
                .remove_range(span.start_index + 1..span.end_index + 1);
            Point::new(span.start.block_id, start)
        }
        (false, true) => {
            let end_id = blocks[span.end_index].id.clone();
            editor.document.remove_range(span.start_index..span.end_index);
            Point::new(end_id, 0)
        }
        (false, false) => {
            let id = editor.document.insert_empty(span.end_index + 1);
            editor.document.remove_range(span.start_index..span.end_index + 1);
            Point::new(id, 0)
        }
    };
    collapse(editor, point);
}

fn select_all(editor: &mut Editor) {
    let first = editor.document.first();
    let last = editor.document.last();
    let selection = Selection::new(
        Point::new(first.id.clone(), 0),
        Point::new(last.id.clone(), last.len()),
    );
    if selection != editor.selection {
        editor.selection = selection;
        editor.touch();
    }
}

fn paste(editor: &mut Editor, fragments: &[Fragment]) {
    delete_selected(editor);
    for fragment in fragments {
        match fragment {
            Fragment::Text { text, block_type } => {
                if let Some(block_type) = block_type {
                    set_block_type(editor, Some(block_type.clone()));
                }
                insert_text(editor, text);
            }
            Fragment::LineBreak => add_new_line(editor),
            Fragment::Atomic(patch) => insert_block(editor, patch),
        }
    }
}
