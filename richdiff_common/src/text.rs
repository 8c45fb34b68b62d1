//! Length arithmetic for text runs.
//!
//! Retain and delete lengths are counted in UTF-16 code units so that edit
//! scripts line up with the JavaScript editors consuming them.

/// Length of `text` in UTF-16 code units
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Split `text` after `units` UTF-16 code units.
///
/// The split point is moved forward to the next `char` boundary if it would
/// land inside a surrogate pair, and clamped to the end of the string.
pub fn split_at_utf16(text: &str, units: usize) -> (&str, &str) {
    let mut consumed = 0;
    for (byte_idx, ch) in text.char_indices() {
        if consumed >= units {
            return text.split_at(byte_idx);
        }
        consumed += ch.len_utf16();
    }
    (text, "")
}
