/*!
 * # Editing Core Module
 *
 * A block-structured rich-text editing core. It owns the document, the
 * selection and the undo history, and knows nothing about rendering, DOM or
 * markup.
 *
 * ## Architecture Overview
 *
 * ### 1. Blocks as the Unit of Structure
 * - A **`Document`** is an ordered, never-empty sequence of **`Block`**s
 * - Each block holds plain text plus a sorted list of **`StyleInterval`**s
 * - Block ids are stable across edits; splitting a block mints a new id for the
 *   right half, merging drops the absorbed block's id
 * - Non-editable (**atomic**) blocks are moved and deleted as a unit
 *
 * ### 2. Char Offsets Everywhere
 * - All offsets count Unicode scalar values, never bytes
 * - Selection points, style bounds and block lengths share that unit
 *
 * ### 3. Command-Based Editing
 * - Every edit is a **`Cmd`** applied through `Editor::apply`
 * - An intent whose preconditions don't hold is a silent no-op
 * - Each applied command returns a **`Patch`** with the new selection and version
 *
 * ### 4. History with Coalescing
 * - Document-changing commands are recorded in a **`History`** log
 * - Typing bursts in one block collapse into one undo step
 * - Edits that change the block id sequence store full snapshots
 *
 * ## Module Structure
 *
 * - **`text`**: char-offset string helpers
 * - **`block`**: `Block`, `BlockId`, `StyleInterval`, `BlockPatch` and id generation
 * - **`styles`**: the style-interval engine
 * - **`document`**: the block sequence and its structural operations
 * - **`selection`**: anchor/focus points and their ordering
 * - **`history`**: undo/redo log
 * - **`commands`**: `Cmd` and the edit operations behind it
 * - **`clipboard`**: structured copy/paste fragments
 * - **`grouping`**: run grouping for list-like block types
 * - **`editor`**: the `Editor` facade tying it all together
 *
 * ## Usage Pattern
 *
 * ```rust
 * use blockedit_engine::editing::*;
 *
 * let mut editor = Editor::new();
 * editor.insert_text("Hello");
 * editor.insert_text(" world");
 * assert_eq!(editor.selection().focus.offset, 11);
 *
 * editor.undo();
 * assert_eq!(editor.document().first().text, "");
 * ```
 */

pub mod block;
pub mod clipboard;
pub mod commands;
pub mod document;
pub mod editor;
pub mod grouping;
pub mod history;
pub mod patch;
pub mod selection;
pub mod styles;
pub mod text;

pub use block::{Block, BlockId, BlockPatch, IdGenerator, StyleInterval};
pub use clipboard::Fragment;
pub use commands::Cmd;
pub use document::Document;
pub use editor::{Editor, EditorSnapshot};
pub use grouping::{Run, group_runs};
pub use history::{ActionKind, History, HistoryAction};
pub use patch::Patch;
pub use selection::{Point, Selection, Span};
