use crate::editing::BlockId;

/// Rejections of caller-supplied state.
///
/// Editing intents never return these: an intent whose preconditions don't
/// hold is simply ignored. Errors only arise when building an editor from
/// external data or when an invariant check fails.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Duplicate block id: {0}")]
    DuplicateBlockId(BlockId),
    #[error("Unknown block: {0}")]
    UnknownBlock(BlockId),
    #[error("Offset {offset} is past the end of block {block_id} (length {len})")]
    OffsetOutOfRange {
        block_id: BlockId,
        offset: usize,
        len: usize,
    },
    #[error("Malformed style {style} [{start}, {end}) in block {block_id}")]
    MalformedStyle {
        block_id: BlockId,
        style: String,
        start: usize,
        end: usize,
    },
    #[error("Document has no blocks")]
    EmptyDocument,
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}
