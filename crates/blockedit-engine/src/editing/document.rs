use std::collections::HashSet;

use blockedit_config::BlockIdStrategy;

use crate::editing::{Block, BlockId, IdGenerator, StyleInterval, styles};
use crate::error::EditorError;

/// Ordered sequence of blocks; never empty.
///
/// The document owns its blocks exclusively and mints ids for every block it
/// creates, so ids stay unique for the lifetime of the document.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    blocks: Vec<Block>,
    ids: IdGenerator,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document holding a single empty block
    pub fn new() -> Self {
        Self::with_strategy(BlockIdStrategy::Sequential)
    }

    pub fn with_strategy(strategy: BlockIdStrategy) -> Self {
        let mut ids = IdGenerator::seeded(strategy, &[]);
        let first = Block::new(ids.next_id());
        Self {
            blocks: vec![first],
            ids,
        }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, EditorError> {
        Self::from_blocks_with(blocks, BlockIdStrategy::Sequential)
    }

    /// Adopt caller-supplied blocks after checking the document invariants
    pub fn from_blocks_with(
        blocks: Vec<Block>,
        strategy: BlockIdStrategy,
    ) -> Result<Self, EditorError> {
        let ids = IdGenerator::seeded(strategy, &blocks);
        let document = Self { blocks, ids };
        document.validate()?;
        Ok(document)
    }

    /// Check ids are unique, the document isn't empty and every interval is well formed
    pub fn validate(&self) -> Result<(), EditorError> {
        if self.blocks.is_empty() {
            return Err(EditorError::EmptyDocument);
        }

        let mut seen = HashSet::new();
        for block in &self.blocks {
            if !seen.insert(&block.id) {
                return Err(EditorError::DuplicateBlockId(block.id.clone()));
            }
            validate_styles(block)?;
        }
        Ok(())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    /// Number of blocks (always at least one)
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn first(&self) -> &Block {
        &self.blocks[0]
    }

    pub fn last(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn index_of(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| &block.id == id)
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|block| &block.id == id)
    }

    pub fn block_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|block| &block.id == id)
    }

    /// The ordered id sequence, used by history to detect structural change
    pub fn id_signature(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|block| block.id.clone()).collect()
    }

    /// An empty block with a fresh id, not yet part of the sequence
    pub fn new_block(&mut self) -> Block {
        Block::new(self.ids.next_id())
    }

    /// Insert an empty block at `index` and return its id
    pub fn insert_empty(&mut self, index: usize) -> BlockId {
        let block = self.new_block();
        let id = block.id.clone();
        self.blocks.insert(index.min(self.blocks.len()), block);
        id
    }

    /// Remove the block at `index`, refilling the document with an empty block if it empties
    pub fn remove_block(&mut self, index: usize) -> Option<Block> {
        if index >= self.blocks.len() {
            return None;
        }
        let removed = self.blocks.remove(index);
        if self.blocks.is_empty() {
            let block = self.new_block();
            self.blocks.push(block);
        }
        Some(removed)
    }

    /// Remove every block in `range` (used for blocks enclosed by a selection)
    pub(crate) fn remove_range(&mut self, range: std::ops::Range<usize>) {
        let end = range.end.min(self.blocks.len());
        let start = range.start.min(end);
        self.blocks.drain(start..end);
        if self.blocks.is_empty() {
            let block = self.new_block();
            self.blocks.push(block);
        }
    }

    /// Split the block at `index` at char `offset`.
    ///
    /// The left part keeps the id, type and intervals clipped to `[0, offset)`;
    /// the right part becomes a new block right after it with intervals shifted
    /// by `-offset`. Returns the new block's id.
    pub fn split_block_at(&mut self, index: usize, offset: usize) -> Option<BlockId> {
        let mut right = self.new_block();
        let left = self.blocks.get_mut(index)?;
        let offset = offset.min(left.len());

        right.text = crate::editing::text::tail(&left.text, offset).to_string();
        right.styles = left.styles.clone();
        styles::remove_style_at(&mut right, 0, offset, None);
        styles::move_styles(&mut right, offset, offset as isize);

        left.text.truncate(crate::editing::text::byte_index(&left.text, offset));
        styles::clip_styles(left, offset);

        let id = right.id.clone();
        self.blocks.insert(index + 1, right);
        Some(id)
    }

    /// Concatenate the block after `index` into it and remove that block.
    ///
    /// Returns the char offset of the join point in the surviving block.
    pub fn merge_with_next(&mut self, index: usize) -> Option<usize> {
        if index + 1 >= self.blocks.len() {
            return None;
        }
        let next = self.blocks.remove(index + 1);
        let current = &mut self.blocks[index];
        let boundary = current.len();
        concat_blocks(current, next);
        Some(boundary)
    }

    /// Overwrite the sequence from a snapshot, reusing the existing block slots.
    ///
    /// Blocks are replaced element-wise; extra trailing blocks are dropped and
    /// missing ones appended.
    pub(crate) fn restore(&mut self, snapshot: &[Block]) {
        for (i, saved) in snapshot.iter().enumerate() {
            match self.blocks.get_mut(i) {
                Some(slot) => slot.clone_from(saved),
                None => self.blocks.push(saved.clone()),
            }
        }
        self.blocks.truncate(snapshot.len());
        if self.blocks.is_empty() {
            let block = self.new_block();
            self.blocks.push(block);
        }
    }

    /// Restore the mutable fields of the block sharing `saved`'s id, if it still exists
    pub(crate) fn restore_block(&mut self, saved: &Block) -> bool {
        match self.block_mut(&saved.id) {
            Some(block) => {
                block.text.clone_from(&saved.text);
                block.styles.clone_from(&saved.styles);
                block.block_type.clone_from(&saved.block_type);
                true
            }
            None => false,
        }
    }
}

/// Append `end` onto `start`, re-offsetting `end`'s intervals past `start`'s text.
///
/// The caller is responsible for removing `end` from the sequence.
pub fn concat_blocks(start: &mut Block, end: Block) {
    let shift = start.len();
    start.text.push_str(&end.text);
    for style in end.styles {
        styles::insert_interval(
            start,
            StyleInterval {
                start: style.start + shift,
                end: style.end + shift,
                ..style
            },
        );
    }
}

fn validate_styles(block: &Block) -> Result<(), EditorError> {
    let len = block.len();
    let malformed = |style: &StyleInterval| EditorError::MalformedStyle {
        block_id: block.id.clone(),
        style: style.style.clone(),
        start: style.start,
        end: style.end,
    };

    for (i, style) in block.styles.iter().enumerate() {
        if style.start >= style.end || style.end > len {
            return Err(malformed(style));
        }
        for later in &block.styles[i + 1..] {
            let unsorted = later.start < style.start;
            let overlapping = later.style == style.style && later.start < style.end;
            if unsorted || overlapping {
                return Err(malformed(later));
            }
        }
    }
    Ok(())
}
