//! Small text helpers shared by the level validators.

/// Lowercase after trimming surrounding whitespace.
pub fn fold(s: &str) -> String {
  s.trim().to_lowercase()
}

/// Remove all whitespace, including interior runs.
/// Used for equality checks that ignore spacing.
pub fn strip_whitespace(s: &str) -> String {
  s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Remove every character contained in `chars`.
pub fn strip_chars(s: &str, chars: &[char]) -> String {
  s.chars().filter(|c| !chars.contains(c)).collect()
}
