use ido_core::{Cardinality, EdgeVariant, ErConfig, GraphModel, HasMetadata, Node, keys};
use serde_json::Value;

use crate::text::{is_plain_identifier, quoted};
use crate::writer::CodeWriter;
use crate::{own_edges, own_nodes};

pub(crate) fn write(model: &GraphModel, config: &ErConfig, writer: &mut CodeWriter) {
    writer.line("erDiagram");
    writer.indent();
    if let Some(direction) = config.direction {
        writer.line(format!("direction {}", direction.as_str()));
    }

    let nodes: Vec<&Node> = own_nodes(model, writer)
        .into_iter()
        .filter(|node| {
            let usable = is_plain_identifier(&node.id);
            if !usable {
                writer.warn(format!(
                    "entity id '{}' is not a valid identifier and was skipped",
                    node.id
                ));
            }
            usable
        })
        .collect();
    for node in &nodes {
        write_entity(node, writer);
    }

    for edge in own_edges(model, &nodes, writer) {
        let EdgeVariant::Er(cardinality) = edge.variant else {
            continue;
        };
        let symbol = match edge.meta_str(keys::CARDINALITY) {
            Some(symbol) if Cardinality::from_symbol(symbol) == cardinality => symbol,
            _ => cardinality.symbol(),
        };
        let label = edge.label.as_deref().unwrap_or_default();
        writer.line(format!(
            "{} {symbol} {} : {}",
            edge.source,
            edge.target,
            quoted(label)
        ));
    }
    writer.dedent();
}

fn write_entity(node: &Node, writer: &mut CodeWriter) {
    let mut header = node.id.clone();
    if !node.label.is_empty() && node.label != node.id {
        header.push_str(&format!("[{}]", quoted(&node.label)));
    }
    let attributes: Vec<&Value> = match node.meta(keys::ATTRIBUTES) {
        Some(Value::Array(items)) => items.iter().collect(),
        _ => Vec::new(),
    };
    if attributes.is_empty() {
        writer.line(header);
        return;
    }

    writer.line(format!("{header} {{"));
    writer.indent();
    for attribute in attributes {
        match attribute_line(attribute) {
            Some(line) => writer.line(line),
            None => writer.warn(format!(
                "attribute of entity '{}' needs a type and a name and was skipped",
                node.id
            )),
        }
    }
    writer.dedent();
    writer.line("}");
}

/// `type name [PK, FK] ["comment"]`
fn attribute_line(attribute: &Value) -> Option<String> {
    let field = |key: &str| {
        attribute
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };
    let mut line = format!("{} {}", field("type")?, field("name")?);
    let key_list: Vec<&str> = attribute
        .get("keys")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if !key_list.is_empty() {
        line.push(' ');
        line.push_str(&key_list.join(", "));
    }
    if let Some(comment) = field("comment") {
        line.push(' ');
        line.push_str(&quoted(comment));
    }
    Some(line)
}

#[cfg(test)]
mod tests {
    use ido_core::{HasMetadata, keys};
    use ido_parser::parse;
    use serde_json::json;

    use crate::serialize;

    #[test]
    fn entities_attributes_and_relationships() {
        let source = "erDiagram\nCUSTOMER[\"Customer\"] {\n  string name\n  int id PK \"primary key\"\n  int org_id FK, UK\n}\nCUSTOMER ||--o{ ORDER : places\nORDER }|..|{ LINE : \"\"";
        let model = parse(source);
        let output = serialize(&model).expect("serializes");
        assert_eq!(
            output.code,
            "erDiagram\n    CUSTOMER[\"Customer\"] {\n        string name\n        int id PK \"primary key\"\n        int org_id FK, UK\n    }\n    ORDER\n    LINE\n    CUSTOMER ||--o{ ORDER : \"places\"\n    ORDER }|..|{ LINE : \"\"\n"
        );

        let reparsed = parse(&output.code);
        assert!(reparsed.warnings.is_empty(), "{:?}", reparsed.warnings);
        assert_eq!(
            reparsed.node("CUSTOMER").and_then(|node| node.meta(keys::ATTRIBUTES)),
            model.node("CUSTOMER").and_then(|node| node.meta(keys::ATTRIBUTES))
        );
        assert_eq!(reparsed.edges[1].variant, model.edges[1].variant);
    }

    #[test]
    fn incomplete_attributes_warn() {
        let mut model = parse("erDiagram\nTHING");
        if let Some(node) = model.node_mut("THING") {
            node.set_meta(keys::ATTRIBUTES, json!([{"name": "orphan"}, {"type": "int", "name": "n"}]));
        }
        let output = serialize(&model).expect("serializes");
        assert!(output.code.contains("    THING {\n        int n\n    }\n"));
        assert_eq!(output.warnings.len(), 1);
    }
}
