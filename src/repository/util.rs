//! Repository utilities.

/// Escape character used in LIKE patterns.
pub const LIKE_ESCAPE: char = '\\';

/// Build a `%needle%` LIKE pattern that matches `needle` literally.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
