//! URL template placeholders.

use std::collections::HashMap;

/// Placeholder positions of a URL template such as `/item/{item}`.
///
/// Indexes count the non-empty segments of the template, so `/item/{item}`
/// and `item/{item}` both put `item` at index 1. Request paths are split the
/// same way when placeholders are read back.
///
/// # Example
///
/// ```rust
/// use oasis_extract::PathPattern;
///
/// let pattern = PathPattern::parse("/users/{user}/posts/{post}");
/// assert_eq!(pattern.index_of("user"), Some(1));
/// assert_eq!(pattern.index_of("post"), Some(3));
/// assert_eq!(pattern.index_of("other"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPattern {
    template: String,
    placeholders: HashMap<String, usize>,
}

impl PathPattern {
    /// Parses a template. Segments that are not a whole `{name}` are literals.
    #[must_use]
    pub fn parse(template: &str) -> Self {
        let placeholders = template
            .split('/')
            .filter(|s| !s.is_empty())
            .enumerate()
            .filter_map(|(index, segment)| {
                segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .filter(|name| !name.is_empty())
                    .map(|name| (name.to_string(), index))
            })
            .collect();

        Self {
            template: template.to_string(),
            placeholders,
        }
    }

    /// Returns the template this pattern was parsed from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the segment index of a placeholder.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.placeholders.get(name).copied()
    }

    /// Returns the number of placeholders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.placeholders.len()
    }

    /// Returns `true` if the template has no placeholders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placeholders.is_empty()
    }
}

/// Counts the non-empty segments of a mount path such as `/api`.
#[must_use]
pub fn segment_count(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}
