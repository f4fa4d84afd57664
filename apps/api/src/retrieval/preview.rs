/// Characters of template content shown in a match preview.
pub const PREVIEW_CHARS: usize = 500;

/// Appended when a preview is cut short.
pub const TRUNCATION_MARKER: &str = "...";

/// Returns the first `max_chars` characters of `text`, with
/// `TRUNCATION_MARKER` appended if anything was cut. Counts chars, not bytes,
/// so multi-byte text never splits mid-character.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{TRUNCATION_MARKER}", &text[..byte_idx]),
        None => text.to_string(),
    }
}
