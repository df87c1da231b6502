use ido_core::{Edge, GraphModel, HasMetadata, Node, NodeVariant, StateConfig, StateKind, keys};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::text::{escape_quotes, is_plain_identifier};
use crate::writer::CodeWriter;
use crate::{own_edges, own_nodes};

const ROOT: &str = "";

struct Tree<'m> {
    nodes: Vec<&'m Node>,
    /// Enclosing composite per node id; `ROOT` at top level.
    parent: FxHashMap<&'m str, &'m str>,
    composites: FxHashSet<&'m str>,
    /// Transitions grouped by the block they are written in.
    transitions: FxHashMap<&'m str, Vec<&'m Edge>>,
}

pub(crate) fn write(model: &GraphModel, config: &StateConfig, writer: &mut CodeWriter) {
    writer.line(if config.v2 {
        "stateDiagram-v2"
    } else {
        "stateDiagram"
    });
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
                    "state id '{}' is not a valid identifier and was skipped",
                    node.id
                ));
            }
            usable
        })
        .collect();
    let edges = own_edges(model, &nodes, writer);
    let tree = build_tree(nodes, &edges, writer);

    let mut visited = FxHashSet::default();
    write_block(ROOT, &tree, &mut visited, writer);
    writer.dedent();
}

fn is_pseudo(node: &Node) -> bool {
    matches!(
        node.variant,
        NodeVariant::State(StateKind::Start | StateKind::End)
    )
}

fn build_tree<'m>(nodes: Vec<&'m Node>, edges: &[&'m Edge], writer: &mut CodeWriter) -> Tree<'m> {
    let ids: FxHashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    let mut parent = FxHashMap::default();
    let mut composites = FxHashSet::default();
    for node in &nodes {
        let enclosing = node
            .meta_str(keys::PARENT)
            .filter(|id| *id != node.id && ids.contains(id))
            .unwrap_or(ROOT);
        parent.insert(node.id.as_str(), enclosing);
        if enclosing != ROOT {
            composites.insert(enclosing);
        }
    }

    let by_id: FxHashMap<&str, &Node> = nodes.iter().map(|node| (node.id.as_str(), *node)).collect();
    let mut transitions: FxHashMap<&str, Vec<&Edge>> = FxHashMap::default();
    for edge in edges {
        // `[*]` only means the start or end of the block it is written in
        let scopes: Vec<&str> = [&edge.source, &edge.target]
            .into_iter()
            .filter_map(|id| by_id.get(id.as_str()))
            .filter(|node| is_pseudo(node))
            .map(|node| parent.get(node.id.as_str()).copied().unwrap_or(ROOT))
            .collect();
        let scope = match scopes.as_slice() {
            [] => {
                let source = parent.get(edge.source.as_str()).copied();
                let target = parent.get(edge.target.as_str()).copied();
                match (source, target) {
                    (Some(source), Some(target)) if source == target => source,
                    _ => ROOT,
                }
            }
            [scope] => *scope,
            [first, second] if first == second => *first,
            _ => {
                writer.warn(format!(
                    "transition '{}' joins start and end states of different composites and was skipped",
                    edge.id
                ));
                continue;
            }
        };
        transitions.entry(scope).or_default().push(edge);
    }

    Tree {
        nodes,
        parent,
        composites,
        transitions,
    }
}

fn write_block<'m>(
    scope: &'m str,
    tree: &Tree<'m>,
    visited: &mut FxHashSet<&'m str>,
    writer: &mut CodeWriter,
) {
    for node in &tree.nodes {
        if tree.parent.get(node.id.as_str()) != Some(&scope) || is_pseudo(node) {
            continue;
        }
        let id = node.id.as_str();
        let composite = tree.composites.contains(id) && visited.insert(id);
        let labelled = !node.label.is_empty() && node.label != node.id;

        let declaration = if labelled {
            format!("state \"{}\" as {id}", escape_quotes(&node.label))
        } else if let NodeVariant::State(kind) = node.variant
            && let Some(marker) = kind.marker()
        {
            format!("state {id} <<{marker}>>")
        } else if composite {
            format!("state {id}")
        } else {
            id.to_string()
        };

        if composite {
            writer.line(format!("{declaration} {{"));
            writer.indent();
            write_block(id, tree, visited, writer);
            writer.dedent();
            writer.line("}");
        } else {
            writer.line(declaration);
        }
        if labelled
            && let NodeVariant::State(kind) = node.variant
            && let Some(marker) = kind.marker()
        {
            writer.line(format!("state {id} <<{marker}>>"));
        }
    }

    for edge in tree.transitions.get(scope).into_iter().flatten() {
        let source = endpoint(tree, &edge.source);
        let target = endpoint(tree, &edge.target);
        match edge.label.as_deref().filter(|label| !label.is_empty()) {
            Some(label) => writer.line(format!("{source} --> {target} : {label}")),
            None => writer.line(format!("{source} --> {target}")),
        }
    }
}

fn endpoint<'a>(tree: &Tree<'_>, id: &'a str) -> &'a str {
    let pseudo = tree
        .nodes
        .iter()
        .any(|node| node.id == id && is_pseudo(node));
    if pseudo { "[*]" } else { id }
}
