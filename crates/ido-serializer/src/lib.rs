#![forbid(unsafe_code)]

//! [`GraphModel`] back to Mermaid source.
//!
//! Serialization is pure and only fails when the model's config does not
//! belong to its diagram type. Anything that cannot be written faithfully is
//! reported in [`Serialized::warnings`] and left out of the output.

mod class;
mod er;
mod flowchart;
mod gantt;
mod gitgraph;
mod pie;
mod preamble;
mod sequence;
mod state;
mod text;
mod writer;

use ido_core::{DiagramConfig, DiagramType, Edge, GraphModel, Node};
use rustc_hash::FxHashSet;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::writer::CodeWriter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Serialized {
    pub code: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    #[error("model type {model} does not match its {config} config")]
    ConfigMismatch {
        model: DiagramType,
        config: DiagramType,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self { indent: 4 }
    }
}

pub fn serialize(model: &GraphModel) -> Result<Serialized, SerializeError> {
    serialize_with_options(model, &SerializeOptions::default())
}

pub fn serialize_with_options(
    model: &GraphModel,
    options: &SerializeOptions,
) -> Result<Serialized, SerializeError> {
    let config_type = model.config.diagram_type();
    if config_type != model.diagram_type {
        return Err(SerializeError::ConfigMismatch {
            model: model.diagram_type,
            config: config_type,
        });
    }

    let mut writer = CodeWriter::new(options.indent);
    preamble::write_preamble(model, &mut writer);
    match &model.config {
        DiagramConfig::Flowchart(config) => flowchart::write(model, config, &mut writer),
        DiagramConfig::Sequence(config) => sequence::write(model, config, &mut writer),
        DiagramConfig::Class(config) => class::write(model, config, &mut writer),
        DiagramConfig::State(config) => state::write(model, config, &mut writer),
        DiagramConfig::Er(config) => er::write(model, config, &mut writer),
        DiagramConfig::Gantt(config) => gantt::write(model, config, &mut writer),
        DiagramConfig::Pie(config) => pie::write(model, config, &mut writer),
        DiagramConfig::GitGraph(config) => gitgraph::write(model, config, &mut writer),
    }

    let output = writer.finish();
    debug!(
        diagram_type = %model.diagram_type,
        lines = output.code.lines().count(),
        warnings = output.warnings.len(),
        "serialized diagram"
    );
    Ok(output)
}

/// Nodes whose variant belongs to the model's diagram type, in model order.
pub(crate) fn own_nodes<'m>(model: &'m GraphModel, writer: &mut CodeWriter) -> Vec<&'m Node> {
    model
        .nodes
        .iter()
        .filter(|node| {
            let found = node.variant.diagram_type();
            if found == model.diagram_type {
                return true;
            }
            writer.warn(format!(
                "node '{}' has a {found} variant and was skipped",
                node.id
            ));
            false
        })
        .collect()
}

/// Edges of the model's diagram type whose endpoints are among `nodes`.
pub(crate) fn own_edges<'m>(
    model: &'m GraphModel,
    nodes: &[&Node],
    writer: &mut CodeWriter,
) -> Vec<&'m Edge> {
    let known: FxHashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    model
        .edges
        .iter()
        .filter(|edge| {
            let found = edge.variant.diagram_type();
            if found != model.diagram_type {
                writer.warn(format!(
                    "edge '{}' has a {found} variant and was skipped",
                    edge.id
                ));
                return false;
            }
            for endpoint in [&edge.source, &edge.target] {
                if !known.contains(endpoint.as_str()) {
                    writer.warn(format!(
                        "edge '{}' references unknown node '{endpoint}' and was skipped",
                        edge.id
                    ));
                    return false;
                }
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use ido_core::{
        DiagramConfig, DiagramType, EdgeVariant, FlowShape, GraphModel, LinkKind, Node,
        NodeVariant, PieConfig,
    };

    use super::{SerializeError, SerializeOptions, serialize, serialize_with_options};

    #[test]
    fn mismatched_config_is_a_contract_violation() {
        let mut model = GraphModel::empty(DiagramType::Flowchart);
        model.config = DiagramConfig::Pie(PieConfig::default());
        assert_eq!(
            serialize(&model),
            Err(SerializeError::ConfigMismatch {
                model: DiagramType::Flowchart,
                config: DiagramType::Pie,
            })
        );
    }

    #[test]
    fn foreign_items_are_skipped_with_warnings() {
        let mut model = GraphModel::empty(DiagramType::Flowchart);
        model.nodes.push(Node::new("A", NodeVariant::Flowchart(FlowShape::Process)));
        model.nodes.push(Node::new("S", NodeVariant::Slice));
        model.edges.push(ido_core::Edge {
            id: "edge_1".to_string(),
            source: "A".to_string(),
            target: "S".to_string(),
            variant: EdgeVariant::Flowchart(LinkKind::Arrow),
            label: None,
            metadata: Default::default(),
        });
        let output = serialize(&model).expect("serializes");
        assert_eq!(output.code, "flowchart TD\n    A[\"A\"]\n");
        assert_eq!(
            output.warnings,
            vec![
                "node 'S' has a pie variant and was skipped",
                "edge 'edge_1' references unknown node 'S' and was skipped",
            ]
        );
    }

    #[test]
    fn indent_option_controls_nesting() {
        let mut model = GraphModel::empty(DiagramType::Flowchart);
        model.nodes.push(Node::new("A", NodeVariant::Flowchart(FlowShape::Process)));
        let output = serialize_with_options(&model, &SerializeOptions { indent: 2 })
            .expect("serializes");
        assert_eq!(output.code, "flowchart TD\n  A[\"A\"]\n");
    }

    #[test]
    fn serialize_does_not_touch_the_model() {
        let model = ido_parser::parse("flowchart LR\n  A --> B");
        let before = model.clone();
        let _ = serialize(&model);
        assert_eq!(model, before);
    }
}
