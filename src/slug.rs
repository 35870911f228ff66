//! Slug normalization for post file names and permalinks.

use regex::Regex;
use std::sync::OnceLock;

fn separators() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| {
        Regex::new("[^a-zA-Z0-9]+").expect("separator pattern is valid")
    })
}

/// Converts arbitrary text into a lowercase, hyphen-separated slug. Every run
/// of characters outside `[A-Za-z0-9]` becomes a single hyphen and hyphens at
/// either end are dropped, so the result only contains lowercase ASCII
/// alphanumerics and internal hyphens (or is empty).
///
/// ```
/// assert_eq!(nomin::slug::normalize("Hello, World!"), "hello-world");
/// ```
pub fn normalize(s: &str) -> String {
    let hyphenated = separators().replace_all(s, "-");
    hyphenated
        .trim_start_matches('-')
        .trim_end_matches('-')
        .to_ascii_lowercase()
}
