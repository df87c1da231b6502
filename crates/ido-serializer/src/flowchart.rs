use ido_core::{
    EdgeVariant, FlowShape, FlowchartConfig, GraphModel, HasMetadata, Node, NodeVariant,
    Subgraph, keys,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::text::{is_plain_identifier, quoted};
use crate::writer::CodeWriter;
use crate::{own_edges, own_nodes};

const SUBGRAPH_PRAGMA: &str = "ido:subgraphs";

/// Pipe label text; quoted when it holds a statement separator, a pipe, a
/// quote or a comment marker.
fn edge_label(label: &str) -> String {
    if label.contains(['"', '|', ';', '%']) {
        quoted(&label.replace('|', "#124;"))
    } else {
        label.to_string()
    }
}

/// Node ids the flowchart grammar reads back unchanged.
fn is_flow_identifier(id: &str) -> bool {
    is_plain_identifier(id) && !id.contains("--") && !id.starts_with('-')
}

struct Layout<'m> {
    nodes: Vec<&'m Node>,
    subgraphs: Vec<&'m Subgraph>,
    /// Subgraph a node is declared in: the first one listing it.
    home: FxHashMap<&'m str, &'m str>,
}

pub(crate) fn write(model: &GraphModel, config: &FlowchartConfig, writer: &mut CodeWriter) {
    writer.line(format!("flowchart {}", config.direction.as_str()));
    writer.indent();
    for (name, props) in &config.class_defs {
        writer.line(format!("classDef {name} {props}"));
    }

    let nodes: Vec<&Node> = own_nodes(model, writer)
        .into_iter()
        .filter(|node| {
            let usable = is_flow_identifier(&node.id);
            if !usable {
                writer.warn(format!(
                    "node id '{}' is not a valid flowchart identifier and was skipped",
                    node.id
                ));
            }
            usable
        })
        .collect();
    let layout = plan_layout(model, nodes, writer);

    for node in &layout.nodes {
        if !layout.home.contains_key(node.id.as_str()) {
            writer.line(declaration(node));
        }
    }
    let mut visited = FxHashSet::default();
    for subgraph in &layout.subgraphs {
        let nested = subgraph
            .parent
            .as_deref()
            .is_some_and(|parent| layout.subgraphs.iter().any(|sg| sg.id == parent));
        if !nested {
            write_subgraph(subgraph, &layout, &mut visited, writer);
        }
    }
    // parent cycles leave blocks unreached
    for subgraph in &layout.subgraphs {
        write_subgraph(subgraph, &layout, &mut visited, writer);
    }

    let edges = own_edges(model, &layout.nodes, writer);
    for edge in &edges {
        let operator = match edge.variant {
            EdgeVariant::Flowchart(kind) => kind.operator(),
            _ => continue,
        };
        match edge.label.as_deref().filter(|label| !label.is_empty()) {
            Some(label) => writer.line(format!(
                "{} {operator}|{}| {}",
                edge.source,
                edge_label(label),
                edge.target
            )),
            None => writer.line(format!("{} {operator} {}", edge.source, edge.target)),
        }
    }

    if let Some(style) = &config.default_link_style {
        writer.line(format!("linkStyle default {style}"));
    }
    for node in &layout.nodes {
        if let Some(props) = style_props(*node) {
            writer.line(format!("style {} {props}", node.id));
        }
    }
    for (index, edge) in edges.iter().enumerate() {
        if let Some(props) = style_props(*edge) {
            writer.line(format!("linkStyle {index} {props}"));
        }
    }
    for node in &layout.nodes {
        if let Some(class) = node.meta_str(keys::CSS_CLASS) {
            writer.line(format!("class {} {class}", node.id));
        }
        if let Some(href) = node.meta_str(keys::HREF) {
            writer.line(format!("click {} href {}", node.id, quoted(href)));
        }
    }
    writer.dedent();

    write_pragma(&layout, writer);
}

fn plan_layout<'m>(
    model: &'m GraphModel,
    nodes: Vec<&'m Node>,
    writer: &mut CodeWriter,
) -> Layout<'m> {
    let known: FxHashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    let subgraphs: Vec<&Subgraph> = model
        .subgraphs
        .iter()
        .filter(|subgraph| {
            let usable = is_flow_identifier(&subgraph.id);
            if !usable {
                writer.warn(format!(
                    "subgraph id '{}' is not a valid identifier; its members are written at top level",
                    subgraph.id
                ));
            }
            usable
        })
        .collect();

    let mut home = FxHashMap::default();
    for subgraph in &subgraphs {
        for member in &subgraph.members {
            if known.contains(member.as_str()) {
                home.entry(member.as_str()).or_insert(subgraph.id.as_str());
            }
        }
    }
    Layout {
        nodes,
        subgraphs,
        home,
    }
}

fn write_subgraph<'m>(
    subgraph: &'m Subgraph,
    layout: &Layout<'m>,
    visited: &mut FxHashSet<&'m str>,
    writer: &mut CodeWriter,
) {
    if !visited.insert(subgraph.id.as_str()) {
        return;
    }
    match subgraph.title.as_deref().filter(|title| !title.is_empty()) {
        Some(title) => writer.line(format!("subgraph {} [{}]", subgraph.id, quoted(title))),
        None => writer.line(format!("subgraph {}", subgraph.id)),
    }
    writer.indent();
    for node in &layout.nodes {
        if layout.home.get(node.id.as_str()) == Some(&subgraph.id.as_str()) {
            writer.line(declaration(node));
        }
    }
    for child in &layout.subgraphs {
        if child.parent.as_deref() == Some(subgraph.id.as_str()) {
            write_subgraph(child, layout, visited, writer);
        }
    }
    writer.dedent();
    writer.line("end");
}

fn declaration(node: &Node) -> String {
    let shape = match node.variant {
        NodeVariant::Flowchart(shape) => shape,
        _ => FlowShape::default(),
    };
    let (open, close) = shape.delimiters();
    format!("{}{open}{}{close}", node.id, quoted(&node.label))
}

/// `fill`, `stroke` and `color` first, then any preserved extra properties.
fn style_props(item: &impl HasMetadata) -> Option<String> {
    let mut props: Vec<String> = [keys::FILL, keys::STROKE, keys::COLOR]
        .into_iter()
        .filter_map(|key| item.meta_str(key).map(|value| format!("{key}:{value}")))
        .collect();
    if let Some(extra) = item.meta_str(keys::STYLE_EXTRA) {
        props.push(extra.to_string());
    }
    (!props.is_empty()).then(|| props.join(","))
}

/// One comment line per node that belongs to more than one subgraph.
fn write_pragma(layout: &Layout<'_>, writer: &mut CodeWriter) {
    let mut entries = Vec::new();
    for node in &layout.nodes {
        let memberships: Vec<&str> = layout
            .subgraphs
            .iter()
            .filter(|subgraph| subgraph.contains(&node.id))
            .map(|subgraph| subgraph.id.as_str())
            .collect();
        if memberships.len() > 1 {
            entries.push(format!("{}={}", node.id, memberships.join(",")));
        }
    }
    for entry in entries {
        writer.raw(format!("%% {SUBGRAPH_PRAGMA} {entry}"));
    }
}
