use ido_core::GraphDirection;

use crate::text::header_index;

/// Canonical form of diagram source: LF line endings, trimmed, and a
/// normalized header line. Idempotent; unknown headers pass through.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = unified.trim();
    let mut lines: Vec<&str> = text.lines().collect();
    let Some(index) = header_index(&lines) else {
        return text.to_string();
    };
    let Some(rewritten) = rewrite_header(lines[index]) else {
        return text.to_string();
    };
    lines[index] = &rewritten;
    lines.join("\n")
}

fn rewrite_header(line: &str) -> Option<String> {
    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    let body = body.trim_end();
    let keyword = body.split_whitespace().next()?;

    match keyword.to_ascii_lowercase().as_str() {
        "flowchart" | "graph" => rewrite_flowchart_header(indent, keyword, &body[keyword.len()..]),
        lower if lower.starts_with("gitgraph") => rewrite_git_header(indent, &body["gitgraph".len()..]),
        _ => None,
    }
}

fn rewrite_flowchart_header(indent: &str, keyword: &str, rest: &str) -> Option<String> {
    let rest = rest.trim_start();
    let token_end = rest
        .find(|ch: char| ch.is_whitespace() || ch == ';')
        .unwrap_or(rest.len());
    let direction = GraphDirection::parse(&rest[..token_end])?;
    let trailing = &rest[token_end..];
    Some(format!("{indent}{keyword} {}{trailing}", direction.as_str()))
}

fn rewrite_git_header(indent: &str, rest: &str) -> Option<String> {
    if rest
        .chars()
        .next()
        .is_some_and(|ch| !ch.is_whitespace() && ch != ':')
    {
        return None;
    }

    let mut rest = rest.trim_start();
    let token_end = rest
        .find(|ch: char| ch.is_whitespace() || ch == ':')
        .unwrap_or(rest.len());
    let direction = match GraphDirection::parse(&rest[..token_end]) {
        Some(direction) => {
            rest = rest[token_end..].trim_start();
            direction
        }
        None => GraphDirection::LR,
    };
    let trailing = rest.strip_prefix(':').unwrap_or(rest).trim();

    let mut header = format!("{indent}gitGraph {}:", direction.as_str());
    if !trailing.is_empty() {
        header.push('\n');
        header.push_str(indent);
        header.push_str("    ");
        header.push_str(trailing);
    }
    Some(header)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::normalize;

    #[test]
    fn flowchart_direction_is_uppercased() {
        assert_eq!(normalize("  flowchart lr\r\n  A-->B  "), "flowchart LR\n  A-->B");
        assert_eq!(normalize("graph td;"), "graph TD;");
        assert_eq!(normalize("graph A-->B"), "graph A-->B");
        assert_eq!(normalize("flowchart lr;A-->B"), "flowchart LR;A-->B");
        assert_eq!(normalize("graph rl ; A-->B"), "graph RL ; A-->B");
    }

    #[test]
    fn git_header_gets_direction_and_colon() {
        assert_eq!(normalize("gitGraph\ncommit"), "gitGraph LR:\ncommit");
        assert_eq!(normalize("gitGraph tb"), "gitGraph TB:");
        assert_eq!(normalize("gitGraph:"), "gitGraph LR:");
        assert_eq!(
            normalize("gitGraph BT: commit id: \"x\""),
            "gitGraph BT:\n    commit id: \"x\""
        );
        assert_eq!(normalize("gitGraph commit"), "gitGraph LR:\n    commit");
    }

    #[test]
    fn header_after_front_matter_is_found() {
        let input = "---\ntitle: Demo\n---\n%% comment\ngitGraph";
        assert_eq!(normalize(input), "---\ntitle: Demo\n---\n%% comment\ngitGraph LR:");
    }

    #[test]
    fn unknown_headers_pass_through() {
        assert_eq!(normalize("sequenceDiagram\nA->>B: hi"), "sequenceDiagram\nA->>B: hi");
        assert_eq!(normalize("gitGraphical"), "gitGraphical");
        assert_eq!(normalize(""), "");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_normalize_is_idempotent(input in ".{0,200}") {
            let once = normalize(&input);
            prop_assert_eq!(normalize(&once), once.clone());
        }

        #[test]
        fn prop_normalize_is_idempotent_for_headers(
            keyword in prop::sample::select(vec!["flowchart", "graph", "gitGraph", "GITGRAPH"]),
            direction in prop::sample::select(vec!["", "lr", "TD", "bt", "rl"]),
            colon in prop::bool::ANY,
            trailing in "[a-z :\"]{0,20}",
        ) {
            let input = format!("{keyword} {direction}{}{trailing}\nA-->B", if colon { ":" } else { "" });
            let once = normalize(&input);
            prop_assert_eq!(normalize(&once), once.clone());
        }
    }
}
