//! Topic slug generation.

use chrono::Utc;

/// Build a slug from a title and a numeric suffix.
///
/// The title is lowercased and every run of characters outside `[a-z0-9]`
/// becomes a single hyphen. A title with nothing left falls back to `topic`.
#[must_use]
pub fn slugify(title: &str, suffix: i64) -> String {
    let mut base = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !base.is_empty() {
                base.push('-');
            }
            pending_hyphen = false;
            base.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    if base.is_empty() {
        base.push_str("topic");
    }

    format!("{base}-{suffix}")
}

/// Suffix for the given attempt: the current time in milliseconds, moved
/// forward by one for every retry.
#[must_use]
pub fn timestamp_suffix(attempt: u32) -> i64 {
    Utc::now().timestamp_millis() + i64::from(attempt.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World", 1700000000000), "hello-world-1700000000000");
    }

    #[test]
    fn test_slugify_collapses_and_trims() {
        assert_eq!(slugify("  --Rust: 2024 edition!!  ", 7), "rust-2024-edition-7");
        assert_eq!(slugify("a___b", 1), "a-b-1");
    }

    #[test]
    fn test_slugify_non_ascii() {
        assert_eq!(slugify("Café au lait", 3), "caf-au-lait-3");
        assert_eq!(slugify("日本語", 3), "topic-3");
    }

    #[test]
    fn test_slugify_empty_base() {
        assert_eq!(slugify("!!!", 42), "topic-42");
        assert_eq!(slugify("", 42), "topic-42");
    }

    #[test]
    fn test_retry_suffix_moves_forward() {
        let first = timestamp_suffix(1);
        let retry = timestamp_suffix(2);
        assert!(retry > first);
    }

    #[test]
    fn test_identical_titles_get_distinct_slugs() {
        let a = slugify("Same", timestamp_suffix(1));
        let b = slugify("Same", timestamp_suffix(2));
        assert_ne!(a, b);
    }
}
