//! Anchor ids for headings in exported pages.

use std::collections::HashMap;

/// Converts heading text to an anchor id.
///
/// - Converts to lowercase
/// - Replaces whitespace with hyphens
/// - Keeps alphanumeric characters (any script), hyphens, and underscores
/// - Collapses consecutive hyphens and trims them from both ends
/// - Returns "section" for empty results
///
/// # Examples
///
/// ```
/// use tome::infra::slugify;
///
/// assert_eq!(slugify("API Design"), "api-design");
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("!!!"), "section");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev_was_hyphen = true;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '_' {
            slug.push(c);
            prev_was_hyphen = false;
        } else if (c == '-' || c.is_whitespace()) && !prev_was_hyphen {
            slug.push('-');
            prev_was_hyphen = true;
        }
    }

    let trimmed = slug.trim_end_matches('-');
    if trimmed.is_empty() {
        "section".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Hands out unique anchor ids within one page.
///
/// Repeated headings get `-1`, `-2`, ... appended.
#[derive(Debug, Default)]
pub struct AnchorIds {
    used: HashMap<String, usize>,
}

impl AnchorIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the anchor id for the next heading with `text`.
    pub fn next_id(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut count = self.used.get(&base).copied().unwrap_or(0);
        let mut candidate = if count == 0 {
            base.clone()
        } else {
            format!("{base}-{count}")
        };
        while count > 0 && self.used.contains_key(&candidate) {
            count += 1;
            candidate = format!("{base}-{count}");
        }
        self.used.insert(base, count + 1);
        self.used.entry(candidate.clone()).or_insert(1);
        candidate
    }
}
