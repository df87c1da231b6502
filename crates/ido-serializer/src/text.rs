//! Escaping for labels written back into diagram source.

/// Replace double quotes with the entity the parsers decode.
pub(crate) fn escape_quotes(text: &str) -> String {
    text.replace('"', "#quot;")
}

pub(crate) fn quoted(text: &str) -> String {
    format!("\"{}\"", escape_quotes(text))
}

/// Letters, digits, `_` and `-` only.
pub(crate) fn is_plain_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::{is_plain_identifier, quoted};

    #[test]
    fn escapes() {
        assert_eq!(quoted("say \"hi\""), "\"say #quot;hi#quot;\"");
        assert!(is_plain_identifier("node_1-a"));
        assert!(!is_plain_identifier("two words"));
        assert!(!is_plain_identifier(""));
    }
}
