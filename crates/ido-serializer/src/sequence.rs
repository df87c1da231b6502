use ido_core::{EdgeVariant, GraphModel, HasMetadata, NodeVariant, SequenceConfig, keys};

use crate::text::is_plain_identifier;
use crate::writer::CodeWriter;
use crate::{own_edges, own_nodes};

/// Ids the message parser would read back as part of an arrow are unusable.
fn is_participant_id(id: &str) -> bool {
    is_plain_identifier(id)
        && !id.starts_with('-')
        && !id.ends_with('-')
        && !["--", "->", "-x", "-)"]
            .iter()
            .any(|fragment| id.contains(fragment))
}

pub(crate) fn write(model: &GraphModel, config: &SequenceConfig, writer: &mut CodeWriter) {
    writer.line("sequenceDiagram");
    writer.indent();
    if let Some(title) = &config.title {
        writer.line(format!("title {title}"));
    }
    if config.autonumber {
        writer.line("autonumber");
    }

    let nodes: Vec<_> = own_nodes(model, writer)
        .into_iter()
        .filter(|node| {
            let usable = is_participant_id(&node.id);
            if !usable {
                writer.warn(format!(
                    "participant id '{}' cannot be written as a message endpoint and was skipped",
                    node.id
                ));
            }
            usable
        })
        .collect();
    for node in &nodes {
        let NodeVariant::Sequence(kind) = node.variant else {
            continue;
        };
        let label = node.label.trim();
        if label.is_empty() || label == node.id {
            writer.line(format!("{} {}", kind.keyword(), node.id));
        } else {
            writer.line(format!("{} {} as {label}", kind.keyword(), node.id));
        }
    }

    for edge in own_edges(model, &nodes, writer) {
        let EdgeVariant::Sequence(kind) = edge.variant else {
            continue;
        };
        let activation = match edge.meta_str(keys::ACTIVATION) {
            Some("activate") => "+",
            Some("deactivate") => "-",
            _ => "",
        };
        let mut line = format!(
            "{}{}{activation}{}",
            edge.source,
            kind.operator(),
            edge.target
        );
        if let Some(label) = edge.label.as_deref().filter(|label| !label.is_empty()) {
            line.push_str(": ");
            line.push_str(label);
        }
        writer.line(line);
    }
    writer.dedent();
}

#[cfg(test)]
mod tests {
    use ido_core::{DiagramType, EdgeVariant, GraphModel, MessageKind, Node, NodeVariant, ParticipantKind};
    use ido_parser::parse;

    use crate::serialize;

    #[test]
    fn participants_then_messages() {
        let source = "sequenceDiagram\ntitle Checkout\nautonumber\nactor U as End user\nparticipant Api\nU->>+Api: POST /cart: add\nApi-->>-U: 201\nApi-)U";
        let output = serialize(&parse(source)).expect("serializes");
        assert_eq!(
            output.code,
            "sequenceDiagram\n    title Checkout\n    autonumber\n    actor U as End user\n    participant Api\n    U->>+Api: POST /cart: add\n    Api-->>-U: 201\n    Api-)U\n"
        );
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn every_operator_survives() {
        let source = "sequenceDiagram\nA->>B\nA-->>B\nA->B\nA-->B\nA-xB\nA--xB\nA-)B\nA--)B";
        let model = parse(source);
        let reparsed = parse(&serialize(&model).expect("serializes").code);
        let kinds: Vec<EdgeVariant> = reparsed.edges.iter().map(|edge| edge.variant).collect();
        assert_eq!(kinds.len(), 8);
        assert_eq!(kinds[4], EdgeVariant::Sequence(MessageKind::Cross));
        assert_eq!(
            kinds,
            model.edges.iter().map(|edge| edge.variant).collect::<Vec<_>>()
        );
    }

    #[test]
    fn participant_ids_with_spaces_are_skipped() {
        let mut model = GraphModel::empty(DiagramType::Sequence);
        model.nodes.push(Node::new(
            "two words",
            NodeVariant::Sequence(ParticipantKind::Participant),
        ));
        let output = serialize(&model).expect("serializes");
        assert_eq!(output.code, "sequenceDiagram\n");
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn participant_ids_resembling_arrows_are_skipped() {
        let mut model = GraphModel::empty(DiagramType::Sequence);
        for id in ["api--gw", "fix-xray", "tail-", "-lead", "db-1"] {
            model.nodes.push(Node::new(
                id,
                NodeVariant::Sequence(ParticipantKind::Participant),
            ));
        }
        let output = serialize(&model).expect("serializes");
        assert_eq!(output.code, "sequenceDiagram\n    participant db-1\n");
        assert_eq!(output.warnings.len(), 4, "{:?}", output.warnings);

        let reparsed = parse(&output.code);
        assert!(reparsed.warnings.is_empty(), "{:?}", reparsed.warnings);
        assert!(reparsed.node("db-1").is_some());
    }
}
