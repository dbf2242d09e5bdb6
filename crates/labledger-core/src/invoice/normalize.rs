//! Repair of text-extraction artifacts before matching or rendering.

/// Presentation-form ligatures emitted by some PDF text layers.
const LIGATURES: [(char, &str); 7] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "ft"),
    ('\u{FB06}', "st"),
];

fn expand(c: char) -> Option<&'static str> {
    LIGATURES
        .iter()
        .find(|(ligature, _)| *ligature == c)
        .map(|(_, letters)| *letters)
}

/// Replace ligature code points with their letter sequences.
///
/// Idempotent: the replacements contain no ligatures themselves.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match expand(c) {
            Some(letters) => out.push_str(letters),
            None => out.push(c),
        }
    }
    out
}
