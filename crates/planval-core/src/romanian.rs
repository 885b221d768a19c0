//! Romanian-letter normalization (spec.md §1, §4.5 R39/R46).
//!
//! The pre-1993 cedilla forms `ş` (U+015F) and `ţ` (U+0163) are mapped to the
//! comma-below forms `ș` (U+0219) and `ț` (U+021B) used by the dictionaries
//! before any equality comparison, so a record typed with the older keyboard
//! layout still matches a ZF/ZRS or cross-table dictionary entry.

pub fn normalize(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{015F}' => '\u{0219}',
            '\u{0163}' => '\u{021B}',
            other => other,
        })
        .collect()
}

pub fn eq_after_normalization(a: &str, b: &str) -> bool {
    normalize(a.trim()) == normalize(b.trim())
}
