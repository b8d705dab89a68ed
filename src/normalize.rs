//! Display helpers. Parsing never normalizes; only trimming is applied to fact text.

/// Map no-break space (U+00A0) and ideographic space (U+3000) to ASCII space,
/// collapse whitespace runs to a single space and trim both ends.
///
/// Idempotent: `normalize_space(&normalize_space(s)) == normalize_space(s)`.
pub fn normalize_space(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let words = s
        .split(|c: char| c.is_whitespace() || c == '\u{00A0}' || c == '\u{3000}')
        .filter(|w| !w.is_empty());
    for (i, word) in words.enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
