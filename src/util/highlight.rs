//! Search-term highlighting for conversation names.
//!
//! Matching is literal and case-insensitive per character. Every
//! non-overlapping occurrence is marked, scanning left to right.

#[cfg(test)]
#[path = "highlight_test.rs"]
mod highlight_test;

/// A run of text, emphasized when it matched the query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub matched: bool,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self { text: text.to_owned(), matched: false }
    }

    fn hit(text: &str) -> Self {
        Self { text: text.to_owned(), matched: true }
    }
}

/// Split `text` into plain and matched segments for `query`.
///
/// An empty query, or one that never matches, yields the text verbatim as a
/// single plain segment.
pub fn highlight_matches(text: &str, query: &str) -> Vec<Segment> {
    if query.is_empty() {
        return vec![Segment::plain(text)];
    }

    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut cursor = 0;
    while cursor < text.len() {
        if let Some(len) = match_len_at(&text[cursor..], query) {
            if plain_start < cursor {
                segments.push(Segment::plain(&text[plain_start..cursor]));
            }
            segments.push(Segment::hit(&text[cursor..cursor + len]));
            cursor += len;
            plain_start = cursor;
        } else {
            cursor += text[cursor..].chars().next().map_or(1, char::len_utf8);
        }
    }
    if plain_start < text.len() || segments.is_empty() {
        segments.push(Segment::plain(&text[plain_start..]));
    }
    segments
}

/// Byte length of the prefix of `haystack` that equals `needle` ignoring
/// case, if any.
fn match_len_at(haystack: &str, needle: &str) -> Option<usize> {
    let mut consumed = 0;
    let mut hay = haystack.chars();
    for n in needle.chars() {
        let h = hay.next()?;
        if !chars_eq_ignore_case(h, n) {
            return None;
        }
        consumed += h.len_utf8();
    }
    (consumed > 0).then_some(consumed)
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
