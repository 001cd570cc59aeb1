// Note text tokenizer
// Lowercases, strips everything but a-z and spaces, keeps words longer than three letters

use std::collections::HashSet;

/// Shortest token kept by the default tokenizer
pub const DEFAULT_MIN_TOKEN_LEN: usize = 4;

/// Tokenize text with the default minimum token length
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_with(text, DEFAULT_MIN_TOKEN_LEN)
}

/// Tokenize text, keeping tokens of at least `min_len` characters
///
/// Characters that are not lowercase ASCII letters or spaces are deleted
/// rather than replaced, so "to-do" becomes the single token "todo".
pub fn tokenize_with(text: &str, min_len: usize) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || *c == ' ')
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| word.len() >= min_len)
        .map(str::to_string)
        .collect()
}

/// Distinct tokens in first-occurrence order
pub fn distinct(tokens: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .map(String::as_str)
        .filter(|token| seen.insert(*token))
        .collect()
}
