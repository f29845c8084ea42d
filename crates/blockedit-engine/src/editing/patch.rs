use crate::editing::Selection;

/// Result of applying a command
#[derive(Clone, Debug, PartialEq)]
pub struct Patch {
    /// Whether the command touched the document or selection at all
    pub changed: bool,
    pub new_selection: Selection,
    pub version: u64,
}
