//! Shared utilities for channel implementations.

/// Largest char boundary in `text` that is `<= index`.
fn floor_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Split a long message into chunks of at most `max_len` bytes.
///
/// Chunks end after the last newline that fits, so formatting that opens and
/// closes on one line (`<b>..</b>`, triple-backtick spans) is never cut. A
/// single line longer than `max_len` is broken at its last space, and only
/// cut mid-word when it has none. Cuts always land on UTF-8 char boundaries.
pub fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = floor_boundary(text, start + max_len);
        if end == start {
            // max_len is narrower than one char; emit the char whole.
            end = text[start..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| start + i)
                .unwrap_or(text.len());
        }
        let break_at = if end < text.len() {
            let window = &text[start..end];
            window
                .rfind('\n')
                .or_else(|| window.rfind(' '))
                .map(|i| start + i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&text[start..break_at]);
        start = break_at;
    }

    chunks
}
