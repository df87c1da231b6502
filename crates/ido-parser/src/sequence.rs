use ido_core::{DiagramConfig, EdgeVariant, HasMetadata, MessageKind, NodeVariant, ParticipantKind, keys};

use crate::builder::ModelBuilder;
use crate::text::{
    clean_label, find_operator, is_comment, not_preserved, strip_inline_comment, unsupported,
};

/// Constructs that are recognized but have no place in the graph model.
const UNPRESERVED_KEYWORDS: [&str; 16] = [
    "loop",
    "alt",
    "else",
    "opt",
    "par",
    "and",
    "critical",
    "option",
    "break",
    "rect",
    "end",
    "note",
    "activate",
    "deactivate",
    "box",
    "destroy",
];

pub(crate) fn parse_sequence(input: &str, builder: &mut ModelBuilder) {
    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        let content = strip_inline_comment(trimmed);
        let first = content.split_whitespace().next().unwrap_or_default();

        if first.to_ascii_lowercase().starts_with("sequencediagram") {
            continue;
        }
        if first == "autonumber" {
            if let DiagramConfig::Sequence(config) = builder.config_mut() {
                config.autonumber = true;
            }
            continue;
        }
        if let Some(rest) = content.strip_prefix("title")
            && (rest.starts_with(char::is_whitespace) || rest.starts_with(':'))
        {
            let title = clean_label(rest.trim_start().trim_start_matches(':'));
            if let DiagramConfig::Sequence(config) = builder.config_mut() {
                config.title = title;
            }
            continue;
        }

        let (first, rest) = match first {
            "create" => {
                builder.add_warning(not_preserved(line_number, "participant creation", content));
                let rest = content["create".len()..].trim_start();
                (rest.split_whitespace().next().unwrap_or_default(), rest)
            }
            _ => (first, content),
        };
        if let Some(kind) = ParticipantKind::from_keyword(first) {
            if !declare_participant(&rest[first.len()..], kind, builder) {
                builder.add_warning(unsupported(line_number, "sequence", content));
            }
            continue;
        }
        if UNPRESERVED_KEYWORDS.contains(&first.to_ascii_lowercase().as_str()) {
            builder.add_warning(not_preserved(line_number, "sequence block", content));
            continue;
        }
        if !parse_message(content, builder) {
            builder.add_warning(unsupported(line_number, "sequence", content));
        }
    }
}

/// `<alias> [as <label>]`
fn declare_participant(rest: &str, kind: ParticipantKind, builder: &mut ModelBuilder) -> bool {
    let rest = rest.trim();
    let (alias, label) = match rest.split_once(" as ") {
        Some((alias, label)) => (alias.trim(), Some(label.trim())),
        None => (rest, None),
    };
    if alias.is_empty() {
        return false;
    }
    builder.intern_node(alias, label, Some(NodeVariant::Sequence(kind)));
    true
}

fn parse_message(content: &str, builder: &mut ModelBuilder) -> bool {
    let Some((position, operator, kind)) = find_operator(content, &MessageKind::OPERATORS) else {
        return false;
    };
    let source = content[..position].trim();
    let after = &content[position + operator.len()..];
    let (target, label) = match after.split_once(':') {
        Some((target, label)) => (target.trim(), Some(label)),
        None => (after.trim(), None),
    };
    let (target, activation) = match target.chars().next() {
        Some('+') => (target[1..].trim_start(), Some("activate")),
        Some('-') => (target[1..].trim_start(), Some("deactivate")),
        _ => (target, None),
    };
    if source.is_empty() || target.is_empty() || target.contains(char::is_whitespace) {
        return false;
    }

    let source = builder.intern_node(source, None, None);
    let target = builder.intern_node(target, None, None);
    let index = builder.push_edge(&source, &target, EdgeVariant::Sequence(kind), label);
    if let Some(activation) = activation
        && let Some(edge) = builder.edge_mut(index)
    {
        edge.set_meta(keys::ACTIVATION, activation);
    }
    true
}
