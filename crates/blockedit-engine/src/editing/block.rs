use blockedit_config::BlockIdStrategy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::editing::text;

/// Stable identifier of a block, unique within a document for its whole lifetime
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl BlockId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A half-open `[start, end)` range of a block's text carrying one formatting label
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleInterval {
    pub start: usize,
    pub end: usize,
    pub style: String,
    /// Opaque payload (link target, colour, ...) owned by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl StyleInterval {
    pub fn new(start: usize, end: usize, style: impl Into<String>) -> Self {
        Self {
            start,
            end,
            style: style.into(),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn is_degenerate(&self) -> bool {
        self.end <= self.start
    }
}

/// One unit of document content: a paragraph, list item, heading or embedded element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub text: String,
    /// Semantic tag such as `heading` or `list-item`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
    /// Sorted by `start`; intervals sharing a label never overlap
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<StyleInterval>,
    /// `false` marks an atomic block (embed) whose text can't be edited
    #[serde(default = "default_editable", skip_serializing_if = "is_editable")]
    pub editable: bool,
}

fn default_editable() -> bool {
    true
}

fn is_editable(editable: &bool) -> bool {
    *editable
}

impl Block {
    pub fn new(id: impl Into<BlockId>) -> Self {
        Self {
            id: id.into(),
            text: String::new(),
            block_type: None,
            styles: Vec::new(),
            editable: true,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_type(mut self, block_type: impl Into<String>) -> Self {
        self.block_type = Some(block_type.into());
        self
    }

    pub fn with_styles(mut self, styles: Vec<StyleInterval>) -> Self {
        self.styles = styles;
        self
    }

    pub fn atomic(mut self) -> Self {
        self.editable = false;
        self
    }

    /// Text length in chars
    pub fn len(&self) -> usize {
        text::char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Partial block used by block insertion: every `Some` field overwrites the target.
///
/// Carries no id: the document assigns block identity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockPatch {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "type", default)]
    pub block_type: Option<String>,
    #[serde(default)]
    pub styles: Option<Vec<StyleInterval>>,
    #[serde(default)]
    pub editable: Option<bool>,
}

impl BlockPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// An embedded, non-editable block
    pub fn atomic(block_type: impl Into<String>) -> Self {
        Self {
            block_type: Some(block_type.into()),
            editable: Some(false),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_type(mut self, block_type: impl Into<String>) -> Self {
        self.block_type = Some(block_type.into());
        self
    }

    pub fn with_styles(mut self, styles: Vec<StyleInterval>) -> Self {
        self.styles = Some(styles);
        self
    }

    /// Overwrite `block` with the fields present in this patch.
    ///
    /// Styles are clipped to the resulting text and re-sorted so the block stays valid.
    pub fn apply_to(&self, block: &mut Block) {
        if let Some(text) = &self.text {
            block.text = text.replace('\r', "");
        }
        if let Some(block_type) = &self.block_type {
            block.block_type = Some(block_type.clone());
        }
        if let Some(editable) = self.editable {
            block.editable = editable;
        }
        if let Some(styles) = &self.styles {
            let len = block.len();
            block.styles.clear();
            for style in styles {
                let mut style = style.clone();
                style.end = style.end.min(len);
                if !style.is_degenerate() {
                    crate::editing::styles::apply_style_at(
                        block,
                        style.start,
                        style.end,
                        &style.style,
                        style.meta,
                    );
                }
            }
        } else {
            let len = block.len();
            crate::editing::styles::clip_styles(block, len);
        }
    }
}

/// Mints fresh block ids
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdGenerator {
    Sequential { next: u64 },
    Uuid,
}

impl IdGenerator {
    /// Build a generator that never collides with the ids already in `blocks`
    pub fn seeded(strategy: BlockIdStrategy, blocks: &[Block]) -> Self {
        match strategy {
            BlockIdStrategy::Sequential => {
                let next = blocks
                    .iter()
                    .filter_map(|block| block.id.as_str().parse::<u64>().ok())
                    .max()
                    .map_or(1, |max| max + 1);
                IdGenerator::Sequential { next }
            }
            BlockIdStrategy::Uuid => IdGenerator::Uuid,
        }
    }

    pub fn next_id(&mut self) -> BlockId {
        match self {
            IdGenerator::Sequential { next } => {
                let id = BlockId(next.to_string());
                *next += 1;
                id
            }
            IdGenerator::Uuid => BlockId(uuid::Uuid::new_v4().to_string()),
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        IdGenerator::Sequential { next: 1 }
    }
}
