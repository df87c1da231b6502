use std::sync::LazyLock;

use ido_core::{Cardinality, DiagramConfig, EdgeVariant, GraphDirection, HasMetadata, keys};
use regex::Regex;
use serde_json::{Map, Value};

use crate::builder::ModelBuilder;
use crate::text::{is_comment, strip_inline_comment, unsupported};

static ENTITY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^("[^"]+"|[\w-]+)\s*(?:\[\s*([^\]]*)\])?\s*\{\s*(\})?$"#)
        .expect("entity block pattern is valid")
});

static ENTITY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^("[^"]+"|[\w-]+)\s*(?:\[\s*([^\]]*)\])?$"#).expect("entity pattern is valid")
});

static RELATIONSHIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^("[^"]+"|[\w-]+?)\s*((?:\|o|\|\||\}o|\}\|)(?:--|\.\.)(?:o\||\|\||o\{|\|\{))\s*("[^"]+"|[\w-]+)\s*(?::\s*(.*))?$"#,
    )
    .expect("relationship pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^([\w\-\[\]()*,]+)\s+([\w\-*]+)(?:\s+((?:PK|FK|UK)(?:\s*,\s*(?:PK|FK|UK))*))?(?:\s+"([^"]*)")?$"#,
    )
    .expect("attribute pattern is valid")
});

pub(crate) fn parse_er(input: &str, builder: &mut ModelBuilder) {
    let mut open_entity: Option<(String, usize)> = None;

    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        let content = strip_inline_comment(trimmed);

        if let Some((entity, _)) = &open_entity {
            if content == "}" {
                open_entity = None;
            } else if !add_attribute(builder, &entity.clone(), content) {
                builder.add_warning(unsupported(line_number, "er attribute", content));
            }
            continue;
        }

        let first = content.split_whitespace().next().unwrap_or_default();
        if first.eq_ignore_ascii_case("erdiagram") {
            continue;
        }
        if first == "direction" {
            match GraphDirection::parse(&content[first.len()..]) {
                Some(direction) => {
                    if let DiagramConfig::Er(config) = builder.config_mut() {
                        config.direction = Some(direction);
                    }
                }
                None => builder.add_warning(unsupported(line_number, "er", content)),
            }
            continue;
        }

        if let Some(captures) = RELATIONSHIP.captures(content) {
            let symbol = &captures[2];
            let left = builder.intern_node(&captures[1], None, None);
            let right = builder.intern_node(&captures[3], None, None);
            let label = captures.get(4).map(|label| label.as_str());
            let index = builder.push_edge(
                &left,
                &right,
                EdgeVariant::Er(Cardinality::from_symbol(symbol)),
                label,
            );
            if let Some(edge) = builder.edge_mut(index) {
                edge.set_meta(keys::CARDINALITY, symbol);
            }
            continue;
        }
        if let Some(captures) = ENTITY_BLOCK.captures(content) {
            let alias = captures.get(2).map(|alias| alias.as_str());
            let entity = builder.intern_node(&captures[1], alias, None);
            if captures.get(3).is_none() {
                open_entity = Some((entity, line_number));
            }
            continue;
        }
        if let Some(captures) = ENTITY_LINE.captures(content) {
            let alias = captures.get(2).map(|alias| alias.as_str());
            builder.intern_node(&captures[1], alias, None);
            continue;
        }
        builder.add_warning(unsupported(line_number, "er", content));
    }

    if let Some((entity, line)) = open_entity {
        builder.add_warning(format!(
            "Line {line}: attribute block for '{entity}' was not closed"
        ));
    }
}

/// `type name [PK|FK|UK[, ...]] ["comment"]`
fn add_attribute(builder: &mut ModelBuilder, entity: &str, content: &str) -> bool {
    let Some(captures) = ATTRIBUTE.captures(content) else {
        return false;
    };
    let mut attribute = Map::new();
    attribute.insert("type".into(), Value::from(&captures[1]));
    attribute.insert("name".into(), Value::from(&captures[2]));
    let key_list: Vec<Value> = captures
        .get(3)
        .map(|list| {
            list.as_str()
                .split(',')
                .map(|item| Value::from(item.trim()))
                .collect()
        })
        .unwrap_or_default();
    if !key_list.is_empty() {
        attribute.insert("keys".into(), Value::Array(key_list));
    }
    if let Some(comment) = captures.get(4) {
        attribute.insert("comment".into(), Value::from(comment.as_str()));
    }

    let Some(node) = builder.node_mut(entity) else {
        return false;
    };
    let entry = node
        .metadata_mut()
        .entry(keys::ATTRIBUTES.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    match entry {
        Value::Array(items) => items.push(Value::Object(attribute)),
        other => *other = Value::Array(vec![Value::Object(attribute)]),
    }
    true
}
