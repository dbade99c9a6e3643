//! Text normalization for everything the bot sends out.

/// Telegram rejects messages longer than 4096 characters; we stay a bit under.
pub const MAX_MESSAGE_LEN: usize = 4000;

const MARKDOWN_MARKERS: [char; 5] = ['*', '_', '~', '`', '#'];

/// Strips markdown control characters the model likes to sprinkle into
/// replies and trims surrounding whitespace. Emoji and Cyrillic pass through
/// untouched.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !MARKDOWN_MARKERS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitizes `text` and splits it into chunks of at most [`MAX_MESSAGE_LEN`]
/// characters, in order. Concatenating the chunks gives back exactly
/// `sanitize(text)`. Empty input produces no chunks.
pub fn chunks(text: &str) -> Vec<String> {
    let text = sanitize(text);
    let mut out = Vec::new();
    let mut current = String::new();
    let mut len = 0;

    for c in text.chars() {
        if len == MAX_MESSAGE_LEN {
            out.push(std::mem::take(&mut current));
            len = 0;
        }
        current.push(c);
        len += 1;
    }
    if !current.is_empty() {
        out.push(current);
    }

    out
}
