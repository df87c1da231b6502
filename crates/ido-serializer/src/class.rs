use ido_core::{
    ClassConfig, ClassKind, ClassRelation, EdgeVariant, GraphModel, HasMetadata, Node,
    NodeVariant, keys,
};

use crate::text::{is_plain_identifier, quoted};
use crate::writer::CodeWriter;
use crate::{own_edges, own_nodes};

pub(crate) fn write(model: &GraphModel, config: &ClassConfig, writer: &mut CodeWriter) {
    writer.line("classDiagram");
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
                    "class id '{}' is not a valid identifier and was skipped",
                    node.id
                ));
            }
            usable
        })
        .collect();
    for node in &nodes {
        write_class(node, writer);
    }

    for edge in own_edges(model, &nodes, writer) {
        let EdgeVariant::Class(relation) = edge.variant else {
            continue;
        };
        let mut line = edge.source.clone();
        if let Some(cardinality) = edge.meta_str(keys::SOURCE_CARDINALITY) {
            line.push(' ');
            line.push_str(&quoted(cardinality));
        }
        line.push(' ');
        line.push_str(relation_symbol(edge.meta_str(keys::ARROW), relation));
        if let Some(cardinality) = edge.meta_str(keys::TARGET_CARDINALITY) {
            line.push(' ');
            line.push_str(&quoted(cardinality));
        }
        line.push(' ');
        line.push_str(&edge.target);
        if let Some(label) = edge.label.as_deref().filter(|label| !label.is_empty()) {
            line.push_str(" : ");
            line.push_str(label);
        }
        writer.line(line);
    }
    writer.dedent();
}

/// The symbol written in the source when it still agrees with the variant,
/// otherwise the canonical one.
fn relation_symbol(written: Option<&str>, relation: ClassRelation) -> &str {
    match written {
        Some(symbol) if ClassRelation::from_symbol(symbol) == relation => symbol,
        _ => relation.symbol(),
    }
}

fn write_class(node: &Node, writer: &mut CodeWriter) {
    let mut header = format!("class {}", node.id);
    if let Some(generic) = node.meta_str(keys::GENERIC) {
        header.push('~');
        header.push_str(generic);
        header.push('~');
    }
    if !node.label.is_empty() && node.label != node.id {
        header.push_str(&format!("[{}]", quoted(&node.label)));
    }

    let stereotype = match (node.meta_str(keys::STEREOTYPE), node.variant) {
        (Some(stereotype), NodeVariant::Class(kind))
            if ClassKind::from_stereotype(stereotype) == kind =>
        {
            Some(stereotype.to_string())
        }
        (_, NodeVariant::Class(ClassKind::Class)) => None,
        (_, NodeVariant::Class(kind)) => Some(kind.as_str().to_string()),
        _ => None,
    };
    let members = node.meta_strings(keys::MEMBERS);
    let methods = node.meta_strings(keys::METHODS);
    if stereotype.is_none() && members.is_empty() && methods.is_empty() {
        writer.line(header);
        return;
    }

    writer.line(format!("{header} {{"));
    writer.indent();
    if let Some(stereotype) = stereotype {
        writer.line(format!("<<{stereotype}>>"));
    }
    for entry in members.iter().chain(&methods) {
        writer.line(entry);
    }
    writer.dedent();
    writer.line("}");
}

#[cfg(test)]
mod tests {
    use ido_core::{
        ClassKind, ClassRelation, DiagramType, EdgeVariant, GraphModel, HasMetadata, Node,
        NodeVariant, keys,
    };
    use ido_parser::parse;

    use crate::serialize;

    #[test]
    fn bodies_carry_stereotype_members_and_methods() {
        let source = "classDiagram\nclass Animal {\n  <<abstract>>\n  +String name\n  +speak() String\n}\nclass Box~T~[\"Generic box\"]";
        let output = serialize(&parse(source)).expect("serializes");
        assert_eq!(
            output.code,
            "classDiagram\n    class Animal {\n        <<abstract>>\n        +String name\n        +speak() String\n    }\n    class Box~T~[\"Generic box\"]\n"
        );
    }

    #[test]
    fn relationships_keep_their_written_symbol() {
        let source = "classDiagram\nCar \"1\" *-- \"4\" Wheel : has\nA ..|> B\nDog --|> Animal";
        let model = parse(source);
        let output = serialize(&model).expect("serializes");
        assert!(output.code.contains("    Car \"1\" *-- \"4\" Wheel : has\n"));
        assert!(output.code.contains("    A ..|> B\n"));
        assert!(output.code.contains("    Dog --|> Animal\n"));

        let reparsed = parse(&output.code);
        assert_eq!(reparsed.edges.len(), 3);
        assert_eq!(reparsed.edges[0].meta_str(keys::TARGET_CARDINALITY), Some("4"));
        assert_eq!(reparsed.edges[1].variant, EdgeVariant::Class(ClassRelation::Realization));
    }

    #[test]
    fn edited_variants_get_a_stereotype_and_canonical_symbol() {
        let mut model = GraphModel::empty(DiagramType::Class);
        model
            .add_node(Node::new("Shape", NodeVariant::Class(ClassKind::Interface)))
            .expect("node");
        model
            .add_node(Node::new("Circle", NodeVariant::Class(ClassKind::Class)))
            .expect("node");
        let edge = model
            .add_edge("Shape", "Circle", EdgeVariant::Class(ClassRelation::Realization), None)
            .expect("edge");
        if let Some(edge) = model.edges.iter_mut().find(|e| e.id == edge) {
            edge.metadata.insert(keys::ARROW.to_string(), "*--".into());
        }

        let output = serialize(&model).expect("serializes");
        assert!(output.code.contains("    class Shape {\n        <<interface>>\n    }\n"));
        assert!(output.code.contains("    Shape <|.. Circle\n"));
        let reparsed = parse(&output.code);
        assert_eq!(
            reparsed.node("Shape").map(|node| node.variant),
            Some(NodeVariant::Class(ClassKind::Interface))
        );
    }
}
