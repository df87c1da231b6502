use std::sync::LazyLock;

use ido_core::{
    ClassKind, ClassRelation, DiagramConfig, EdgeVariant, GraphDirection, HasMetadata,
    NodeVariant, keys,
};
use regex::Regex;

use crate::builder::ModelBuilder;
use crate::text::{clean_label, is_comment, not_preserved, strip_inline_comment, unsupported};

static CLASS_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^class\s+([^\s{\[~":]+)(?:~([^~]+)~)?\s*(?:\[\s*([^\]]*)\])?\s*(?::::[\w-]+)?\s*(\{.*)?$"#,
    )
    .expect("class declaration pattern is valid")
});

static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<<\s*([^>]+?)\s*>>\s*([^\s{]+)$").expect("annotation pattern is valid")
});

static RELATIONSHIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^([^\s"]+?)\s*(?:"([^"]*)"\s*)?((?:<\||[<*o])?(?:--|\.\.)(?:\|>|[>*o])?)\s*(?:"([^"]*)"\s*)?([^\s":]+)\s*(?::\s*(.*))?$"#,
    )
    .expect("relationship pattern is valid")
});

static MEMBER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\s:]+)\s*:\s*(.+)$").expect("member pattern is valid"));

const UNPRESERVED_KEYWORDS: [&str; 7] = [
    "note", "click", "link", "callback", "style", "classDef", "cssClass",
];

struct OpenBody {
    class_id: String,
    line: usize,
}

pub(crate) fn parse_class(input: &str, builder: &mut ModelBuilder) {
    let mut open_body: Option<OpenBody> = None;
    let mut namespace_depth = 0_usize;

    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        let content = strip_inline_comment(trimmed);

        if let Some(body) = &open_body {
            let class_id = body.class_id.clone();
            match content.strip_suffix('}') {
                Some(last) => {
                    add_body_line(builder, &class_id, last);
                    open_body = None;
                }
                None => add_body_line(builder, &class_id, content),
            }
            continue;
        }

        let first = content.split_whitespace().next().unwrap_or_default();
        if first.to_ascii_lowercase().starts_with("classdiagram") {
            continue;
        }
        if first == "direction" {
            match GraphDirection::parse(&content[first.len()..]) {
                Some(direction) => {
                    if let DiagramConfig::Class(config) = builder.config_mut() {
                        config.direction = Some(direction);
                    }
                }
                None => builder.add_warning(unsupported(line_number, "class", content)),
            }
            continue;
        }
        if first == "namespace" {
            builder.add_warning(not_preserved(line_number, "namespace", content));
            if content.ends_with('{') {
                namespace_depth += 1;
            }
            continue;
        }
        if content == "}" && namespace_depth > 0 {
            namespace_depth -= 1;
            continue;
        }

        if let Some(captures) = CLASS_DECLARATION.captures(content) {
            let raw_id = &captures[1];
            let label = captures.get(3).map(|label| label.as_str());
            let class_id = builder.intern_node(raw_id, label, None);
            if let Some(generic) = captures.get(2)
                && let Some(node) = builder.node_mut(&class_id)
            {
                node.set_meta(keys::GENERIC, generic.as_str().trim());
            }
            if let Some(body) = captures.get(4) {
                let body = body.as_str()[1..].trim();
                match body.strip_suffix('}') {
                    Some(inline) => {
                        for item in inline.split(';') {
                            add_body_line(builder, &class_id, item);
                        }
                    }
                    None => {
                        add_body_line(builder, &class_id, body);
                        open_body = Some(OpenBody {
                            class_id,
                            line: line_number,
                        });
                    }
                }
            }
            continue;
        }
        if let Some(captures) = ANNOTATION.captures(content) {
            let class_id = builder.intern_node(&captures[2], None, None);
            apply_stereotype(builder, &class_id, &captures[1]);
            continue;
        }
        if let Some(captures) = RELATIONSHIP.captures(content) {
            add_relationship(builder, &captures);
            continue;
        }
        if UNPRESERVED_KEYWORDS.contains(&first) {
            builder.add_warning(not_preserved(line_number, first, content));
            continue;
        }
        if let Some(captures) = MEMBER_LINE.captures(content) {
            let class_id = builder.intern_node(&captures[1], None, None);
            add_body_line(builder, &class_id, &captures[2]);
            continue;
        }
        if is_bare_class_name(content) {
            builder.intern_node(content, None, None);
            continue;
        }
        builder.add_warning(unsupported(line_number, "class", content));
    }

    if let Some(body) = open_body {
        builder.add_warning(format!(
            "Line {}: class body for '{}' was not closed",
            body.line, body.class_id
        ));
    }
}

fn is_bare_class_name(content: &str) -> bool {
    content
        .chars()
        .all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '-'))
}

/// Route one body entry to the stereotype, methods or members.
fn add_body_line(builder: &mut ModelBuilder, class_id: &str, raw: &str) {
    let entry = raw.trim();
    if entry.is_empty() {
        return;
    }
    if let Some(stereotype) = entry
        .strip_prefix("<<")
        .and_then(|rest| rest.strip_suffix(">>"))
    {
        apply_stereotype(builder, class_id, stereotype);
        return;
    }
    let key = if entry.contains('(') {
        keys::METHODS
    } else {
        keys::MEMBERS
    };
    if let Some(node) = builder.node_mut(class_id) {
        node.push_meta_string(key, entry);
    }
}

fn apply_stereotype(builder: &mut ModelBuilder, class_id: &str, stereotype: &str) {
    let stereotype = stereotype.trim();
    if let Some(node) = builder.node_mut(class_id) {
        node.set_meta(keys::STEREOTYPE, stereotype);
        node.variant = NodeVariant::Class(ClassKind::from_stereotype(stereotype));
    }
}

fn add_relationship(builder: &mut ModelBuilder, captures: &regex::Captures<'_>) {
    let symbol = &captures[3];
    let source = builder.intern_node(&captures[1], None, None);
    let target = builder.intern_node(&captures[5], None, None);
    let label = captures.get(6).map(|label| label.as_str());
    let index = builder.push_edge(
        &source,
        &target,
        EdgeVariant::Class(ClassRelation::from_symbol(symbol)),
        label,
    );
    let Some(edge) = builder.edge_mut(index) else {
        return;
    };
    edge.set_meta(keys::ARROW, symbol);
    for (group, key) in [(2, keys::SOURCE_CARDINALITY), (4, keys::TARGET_CARDINALITY)] {
        if let Some(cardinality) = captures.get(group).and_then(|c| clean_label(c.as_str())) {
            edge.set_meta(key, cardinality);
        }
    }
}
