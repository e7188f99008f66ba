//! Answer normalization and matching.

/// Separators that split one cell into several acceptable answers.
const ALTERNATIVE_SEPARATORS: &[char] = &['|', ';', '；', '/', '、'];

/// Normalize text for answer comparison.
///
/// Trims, maps the ideographic space (U+3000) to a plain space, collapses
/// whitespace runs, and lowercases when `ignore_case` is set.
pub fn normalize_answer(s: &str, ignore_case: bool) -> String {
    let replaced = s.replace('\u{3000}', " ");
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    if ignore_case {
        collapsed.to_lowercase()
    } else {
        collapsed
    }
}

/// Split a cell like `bonjour|salut` into its acceptable answers.
pub fn split_alternatives(cell: &str) -> Vec<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Vec::new();
    }
    let parts: Vec<String> = cell
        .split(ALTERNATIVE_SEPARATORS)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if parts.is_empty() {
        vec![cell.to_string()]
    } else {
        parts
    }
}

/// Compares user input with expected answers.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    pub ignore_case: bool,
}

impl Default for Matcher {
    fn default() -> Self {
        Self { ignore_case: true }
    }
}

impl Matcher {
    pub fn new(ignore_case: bool) -> Self {
        Self { ignore_case }
    }

    pub fn normalize(&self, s: &str) -> String {
        normalize_answer(s, self.ignore_case)
    }

    /// `true` when both sides normalize equal. A blank expectation never matches.
    pub fn matches(&self, user: &str, expected: &str) -> bool {
        let expected = self.normalize(expected);
        !expected.is_empty() && self.normalize(user) == expected
    }

    pub fn matches_any<S: AsRef<str>>(&self, user: &str, alternatives: &[S]) -> bool {
        alternatives.iter().any(|alt| self.matches(user, alt.as_ref()))
    }
}
