use unicode_segmentation::UnicodeSegmentation;

/// Reduce a raw source identifier to ASCII letters, digits, `_` and `-`.
///
/// Whitespace, `/` and `.` become `_`; other characters are dropped. Runs of
/// `_` collapse and leading/trailing `_` are trimmed. The result may be empty.
#[must_use]
pub fn sanitize_identifier(raw: &str) -> String {
    let cleaned = raw
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim_matches('`')
        .trim();

    let mut out = String::with_capacity(cleaned.len());
    for grapheme in cleaned.graphemes(true) {
        if grapheme
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-'))
        {
            out.push_str(grapheme);
        } else if grapheme
            .chars()
            .all(|ch| ch.is_whitespace() || matches!(ch, '/' | '.'))
            && !out.ends_with('_')
        {
            out.push('_');
        }
    }

    let mut collapsed = String::with_capacity(out.len());
    for ch in out.chars() {
        if ch == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(ch);
    }
    collapsed.trim_matches('_').to_string()
}

/// Return `base` if it is free, otherwise the first free `base_N` (N >= 2).
#[must_use]
pub fn disambiguate(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }
    let mut suffix = 2_usize;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !is_taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Monotonic source of synthetic identifiers, scoped to one parse call.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next: usize,
}

impl IdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Next synthetic id with the given prefix (`node_1`, `commit_2`, ...).
    pub fn fallback(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{prefix}_{}", self.next)
    }

    #[must_use]
    pub const fn issued(&self) -> usize {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{IdGenerator, disambiguate, sanitize_identifier};

    #[test]
    fn sanitize_keeps_identifier_characters() {
        assert_eq!(sanitize_identifier("node_A-1"), "node_A-1");
        assert_eq!(sanitize_identifier("\"quoted\""), "quoted");
    }

    #[test]
    fn sanitize_maps_separators_and_drops_the_rest() {
        assert_eq!(sanitize_identifier("feature/login"), "feature_login");
        assert_eq!(sanitize_identifier("Dogs and  cats"), "Dogs_and_cats");
        assert_eq!(sanitize_identifier("v1.2"), "v1_2");
        assert_eq!(sanitize_identifier("a&b"), "ab");
        assert_eq!(sanitize_identifier("ünïcode"), "ncode");
    }

    #[test]
    fn sanitize_can_yield_empty() {
        assert_eq!(sanitize_identifier("***"), "");
        assert_eq!(sanitize_identifier("  / . "), "");
    }

    #[test]
    fn disambiguate_appends_counter() {
        let taken = ["a", "a_2"];
        assert_eq!(disambiguate("b", |id| taken.contains(&id)), "b");
        assert_eq!(disambiguate("a", |id| taken.contains(&id)), "a_3");
    }

    #[test]
    fn generators_are_independent() {
        let mut first = IdGenerator::new();
        let mut second = IdGenerator::new();
        assert_eq!(first.fallback("node"), "node_1");
        assert_eq!(first.fallback("node"), "node_2");
        assert_eq!(second.fallback("node"), "node_1");
        assert_eq!(first.issued(), 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_sanitized_ids_use_only_safe_characters(input in ".{0,64}") {
            let id = sanitize_identifier(&input);
            prop_assert!(id.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-')));
            prop_assert!(!id.starts_with('_') && !id.ends_with('_'));
            prop_assert_eq!(sanitize_identifier(&id), id.clone());
        }
    }
}
