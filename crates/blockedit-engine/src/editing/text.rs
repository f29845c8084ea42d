//! Char-offset helpers.
//!
//! Every offset in the engine counts Unicode scalar values, never bytes, so a
//! caret can't land inside a multi-byte sequence.

/// Number of chars in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Convert a char offset into a byte index, clamping past-the-end offsets
pub(crate) fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// Slice `text` by char offsets; out-of-range bounds are clamped
pub fn slice(text: &str, start: usize, end: usize) -> &str {
    let start_byte = byte_index(text, start);
    let end_byte = byte_index(text, end.max(start));
    &text[start_byte..end_byte]
}

pub(crate) fn head(text: &str, end: usize) -> &str {
    &text[..byte_index(text, end)]
}

pub(crate) fn tail(text: &str, start: usize) -> &str {
    &text[byte_index(text, start)..]
}

/// Replace the chars in `start..end` with `replacement`
pub(crate) fn splice(text: &mut String, start: usize, end: usize, replacement: &str) {
    let start_byte = byte_index(text, start);
    let end_byte = byte_index(text, end.max(start));
    text.replace_range(start_byte..end_byte, replacement);
}
