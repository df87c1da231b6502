#![forbid(unsafe_code)]

//! Mermaid source to [`GraphModel`].
//!
//! Parsing never fails: anything the parsers cannot represent is reported in
//! `GraphModel::warnings` and skipped.

mod builder;
mod class;
mod detect;
mod er;
mod flowchart;
mod gantt;
mod gitgraph;
mod normalize;
mod pie;
mod preamble;
mod sequence;
mod state;
mod text;

use ido_core::{DiagramType, GraphModel};
use tracing::debug;

use crate::builder::ModelBuilder;

pub use detect::{DetectedType, DetectionMethod, detect_type, detect_type_with_confidence};
pub use normalize::normalize;
pub use preamble::{SplitDocument, split_preamble};

/// Normalize, detect and parse a document.
#[must_use]
pub fn parse(input: &str) -> GraphModel {
    let normalized = normalize(input);
    if normalized.is_empty() {
        return empty_input(DiagramType::Flowchart);
    }
    let detected = detect_type_with_confidence(&normalized);
    parse_normalized(&normalized, detected.diagram_type, detected.warnings)
}

/// Parse a document as `diagram_type`, skipping detection.
#[must_use]
pub fn parse_as(input: &str, diagram_type: DiagramType) -> GraphModel {
    let normalized = normalize(input);
    if normalized.is_empty() {
        return empty_input(diagram_type);
    }
    parse_normalized(&normalized, diagram_type, Vec::new())
}

fn empty_input(diagram_type: DiagramType) -> GraphModel {
    let mut model = GraphModel::empty(diagram_type);
    model.add_warning("Input was empty");
    model
}

fn parse_normalized(
    text: &str,
    diagram_type: DiagramType,
    detection_warnings: Vec<String>,
) -> GraphModel {
    let split = split_preamble(text);
    let mut builder = ModelBuilder::new(diagram_type);
    for warning in split.warnings.into_iter().chain(detection_warnings) {
        builder.add_warning(warning);
    }
    builder.set_preamble(split.preamble);

    match diagram_type {
        DiagramType::Flowchart => flowchart::parse_flowchart(&split.body, &mut builder),
        DiagramType::Sequence => sequence::parse_sequence(&split.body, &mut builder),
        DiagramType::Class => class::parse_class(&split.body, &mut builder),
        DiagramType::State => state::parse_state(&split.body, &mut builder),
        DiagramType::Er => er::parse_er(&split.body, &mut builder),
        DiagramType::Gantt => gantt::parse_gantt(&split.body, &mut builder),
        DiagramType::Pie => pie::parse_pie(&split.body, &mut builder),
        DiagramType::GitGraph => gitgraph::parse_gitgraph(&split.body, &mut builder),
    }

    let model = builder.finish();
    debug!(
        diagram_type = %model.diagram_type,
        nodes = model.nodes.len(),
        edges = model.edges.len(),
        warnings = model.warnings.len(),
        "parsed diagram"
    );
    model
}
