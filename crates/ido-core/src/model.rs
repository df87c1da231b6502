use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{DiagramConfig, DiagramType, EdgeVariant, NodeVariant, Preamble, disambiguate, keys};

/// Open, string-keyed map for variant-specific fields.
pub type Metadata = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("node '{0}' already exists")]
    DuplicateNode(String),
    #[error("unknown node '{0}'")]
    UnknownNode(String),
    #[error("unknown edge '{0}'")]
    UnknownEdge(String),
    #[error("unknown subgraph '{0}'")]
    UnknownSubgraph(String),
    #[error("subgraph '{0}' already exists")]
    DuplicateSubgraph(String),
    #[error("config for {found} does not fit a {expected} diagram")]
    ConfigMismatch {
        expected: DiagramType,
        found: DiagramType,
    },
    #[error("'{item}' has a {found} variant in a {expected} diagram")]
    VariantMismatch {
        item: String,
        expected: DiagramType,
        found: DiagramType,
    },
    #[error("{0} diagrams do not support subgraphs")]
    SubgraphsUnsupported(DiagramType),
}

/// Typed access to the open metadata map on nodes and edges.
pub trait HasMetadata {
    fn metadata(&self) -> &Metadata;
    fn metadata_mut(&mut self) -> &mut Metadata;

    fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata().get(key)
    }

    /// String value for `key`; empty strings count as absent.
    fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata()
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    fn meta_u64(&self, key: &str) -> Option<u64> {
        self.metadata().get(key).and_then(Value::as_u64)
    }

    /// String array for `key`; a single string is treated as a one-element list.
    fn meta_strings(&self, key: &str) -> Vec<String> {
        match self.metadata().get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(item)) if !item.is_empty() => vec![item.clone()],
            _ => Vec::new(),
        }
    }

    fn set_meta(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata_mut().insert(key.to_string(), value.into());
    }

    fn remove_meta(&mut self, key: &str) -> Option<Value> {
        self.metadata_mut().remove(key)
    }

    /// Append `item` to the string array at `key` unless already present.
    fn push_meta_string(&mut self, key: &str, item: &str) {
        let entry = self
            .metadata_mut()
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            let previous = entry.take();
            *entry = Value::Array(
                previous
                    .as_str()
                    .map(|value| vec![Value::from(value)])
                    .unwrap_or_default(),
            );
        }
        if let Value::Array(items) = entry
            && !items.iter().any(|existing| existing.as_str() == Some(item))
        {
            items.push(Value::from(item));
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub variant: NodeVariant,
    pub label: String,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Node {
    /// New node whose label defaults to its id.
    #[must_use]
    pub fn new(id: impl Into<String>, variant: NodeVariant) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            variant,
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl HasMetadata for Node {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub variant: EdgeVariant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl HasMetadata for Edge {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subgraph {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Enclosing subgraph for nested blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Member node ids in first-seen order, without duplicates.
    pub members: Vec<String>,
}

impl Subgraph {
    #[must_use]
    pub fn new(id: impl Into<String>, title: Option<String>) -> Self {
        Self {
            id: id.into(),
            title,
            parent: None,
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn contains(&self, node_id: &str) -> bool {
        self.members.iter().any(|member| member == node_id)
    }
}

/// One diagram document as nodes, edges, subgraphs and typed configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphModel {
    #[serde(rename = "type")]
    pub diagram_type: DiagramType,
    pub config: DiagramConfig,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subgraphs: Vec<Subgraph>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Preamble::is_empty")]
    pub preamble: Preamble,
}

impl GraphModel {
    /// Empty model seeded with the default configuration for `diagram_type`.
    #[must_use]
    pub fn empty(diagram_type: DiagramType) -> Self {
        Self {
            diagram_type,
            config: DiagramConfig::default_for(diagram_type),
            nodes: Vec::new(),
            edges: Vec::new(),
            subgraphs: Vec::new(),
            warnings: Vec::new(),
            preamble: Preamble::default(),
        }
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == id)
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    #[must_use]
    pub fn subgraph(&self, id: &str) -> Option<&Subgraph> {
        self.subgraphs.iter().find(|subgraph| subgraph.id == id)
    }

    /// Edges leaving `node_id`, in model order.
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.source == node_id)
    }

    /// Edges arriving at `node_id`, in model order.
    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.target == node_id)
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), ModelError> {
        if self.contains_node(&node.id) {
            return Err(ModelError::DuplicateNode(node.id));
        }
        self.ensure_node_variant(&node.id, node.variant)?;
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node together with its incident edges and subgraph membership.
    pub fn remove_node(&mut self, id: &str) -> Result<Node, ModelError> {
        let index = self
            .node_index(id)
            .ok_or_else(|| ModelError::UnknownNode(id.to_string()))?;
        let node = self.nodes.remove(index);
        self.edges
            .retain(|edge| edge.source != node.id && edge.target != node.id);
        for subgraph in &mut self.subgraphs {
            subgraph.members.retain(|member| member != &node.id);
        }
        Ok(node)
    }

    pub fn relabel_node(&mut self, id: &str, label: impl Into<String>) -> Result<(), ModelError> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| ModelError::UnknownNode(id.to_string()))?;
        node.label = label.into();
        Ok(())
    }

    /// Connect two existing nodes and return the synthesized edge id.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        variant: EdgeVariant,
        label: Option<String>,
    ) -> Result<String, ModelError> {
        for endpoint in [source, target] {
            if !self.contains_node(endpoint) {
                return Err(ModelError::UnknownNode(endpoint.to_string()));
            }
        }
        let id = self.next_edge_id();
        self.ensure_edge_variant(&id, variant)?;
        self.edges.push(Edge {
            id: id.clone(),
            source: source.to_string(),
            target: target.to_string(),
            variant,
            label,
            metadata: Metadata::new(),
        });
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: &str) -> Result<Edge, ModelError> {
        let index = self
            .edges
            .iter()
            .position(|edge| edge.id == id)
            .ok_or_else(|| ModelError::UnknownEdge(id.to_string()))?;
        Ok(self.edges.remove(index))
    }

    pub fn set_config(&mut self, config: DiagramConfig) -> Result<(), ModelError> {
        if config.diagram_type() != self.diagram_type {
            return Err(ModelError::ConfigMismatch {
                expected: self.diagram_type,
                found: config.diagram_type(),
            });
        }
        self.config = config;
        Ok(())
    }

    pub fn add_subgraph(&mut self, subgraph: Subgraph) -> Result<(), ModelError> {
        if self.diagram_type != DiagramType::Flowchart {
            return Err(ModelError::SubgraphsUnsupported(self.diagram_type));
        }
        if self.subgraph(&subgraph.id).is_some() {
            return Err(ModelError::DuplicateSubgraph(subgraph.id));
        }
        if let Some(parent) = &subgraph.parent
            && self.subgraph(parent).is_none()
        {
            return Err(ModelError::UnknownSubgraph(parent.clone()));
        }
        self.subgraphs.push(subgraph);
        Ok(())
    }

    /// Add `node_id` to a subgraph, mirroring membership into the node's
    /// `subgraphs` metadata. Adding an existing member is a no-op.
    pub fn add_to_subgraph(&mut self, node_id: &str, subgraph_id: &str) -> Result<(), ModelError> {
        if self.diagram_type != DiagramType::Flowchart {
            return Err(ModelError::SubgraphsUnsupported(self.diagram_type));
        }
        let subgraph = self
            .subgraphs
            .iter_mut()
            .find(|subgraph| subgraph.id == subgraph_id)
            .ok_or_else(|| ModelError::UnknownSubgraph(subgraph_id.to_string()))?;
        let node = self
            .nodes
            .iter_mut()
            .find(|node| node.id == node_id)
            .ok_or_else(|| ModelError::UnknownNode(node_id.to_string()))?;

        if !subgraph.contains(node_id) {
            subgraph.members.push(node_id.to_string());
        }
        node.push_meta_string(keys::SUBGRAPHS, subgraph_id);
        Ok(())
    }

    /// Subgraph ids `node_id` belongs to, in membership order.
    #[must_use]
    pub fn subgraphs_of(&self, node_id: &str) -> Vec<String> {
        let from_metadata = self
            .node(node_id)
            .map(|node| node.meta_strings(keys::SUBGRAPHS))
            .unwrap_or_default();
        let mut ordered: Vec<String> = from_metadata
            .into_iter()
            .filter(|id| self.subgraph(id).is_some_and(|sg| sg.contains(node_id)))
            .collect();
        for subgraph in &self.subgraphs {
            if subgraph.contains(node_id) && !ordered.contains(&subgraph.id) {
                ordered.push(subgraph.id.clone());
            }
        }
        ordered
    }

    /// Verify every model invariant, reporting the first violation.
    pub fn check(&self) -> Result<(), ModelError> {
        if self.config.diagram_type() != self.diagram_type {
            return Err(ModelError::ConfigMismatch {
                expected: self.diagram_type,
                found: self.config.diagram_type(),
            });
        }

        let mut seen = FxHashSet::default();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(ModelError::DuplicateNode(node.id.clone()));
            }
            self.ensure_node_variant(&node.id, node.variant)?;
        }

        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(ModelError::UnknownNode(endpoint.clone()));
                }
            }
            self.ensure_edge_variant(&edge.id, edge.variant)?;
        }

        if !self.subgraphs.is_empty() && self.diagram_type != DiagramType::Flowchart {
            return Err(ModelError::SubgraphsUnsupported(self.diagram_type));
        }
        for subgraph in &self.subgraphs {
            if let Some(member) = subgraph
                .members
                .iter()
                .find(|member| !seen.contains(member.as_str()))
            {
                return Err(ModelError::UnknownNode(member.clone()));
            }
            if let Some(parent) = &subgraph.parent
                && self.subgraph(parent).is_none()
            {
                return Err(ModelError::UnknownSubgraph(parent.clone()));
            }
        }
        Ok(())
    }

    fn next_edge_id(&self) -> String {
        let base = format!("edge_{}", self.edges.len() + 1);
        disambiguate(&base, |candidate| {
            self.edges.iter().any(|edge| edge.id == candidate)
        })
    }

    fn ensure_node_variant(&self, id: &str, variant: NodeVariant) -> Result<(), ModelError> {
        if variant.diagram_type() == self.diagram_type {
            Ok(())
        } else {
            Err(ModelError::VariantMismatch {
                item: id.to_string(),
                expected: self.diagram_type,
                found: variant.diagram_type(),
            })
        }
    }

    fn ensure_edge_variant(&self, id: &str, variant: EdgeVariant) -> Result<(), ModelError> {
        if variant.diagram_type() == self.diagram_type {
            Ok(())
        } else {
            Err(ModelError::VariantMismatch {
                item: id.to_string(),
                expected: self.diagram_type,
                found: variant.diagram_type(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{GraphModel, HasMetadata, ModelError, Node, Subgraph};
    use crate::{
        DiagramConfig, DiagramType, EdgeVariant, FlowShape, LinkKind, NodeVariant, PieConfig,
        keys,
    };

    fn flowchart_with(ids: &[&str]) -> GraphModel {
        let mut model = GraphModel::empty(DiagramType::Flowchart);
        for id in ids {
            model
                .add_node(Node::new(*id, NodeVariant::Flowchart(FlowShape::Process)))
                .expect("add node");
        }
        model
    }

    #[test]
    fn empty_model_has_default_config() {
        let model = GraphModel::empty(DiagramType::Pie);
        assert_eq!(model.config, DiagramConfig::Pie(PieConfig::default()));
        assert!(model.check().is_ok());
    }

    #[test]
    fn duplicate_nodes_are_rejected() {
        let mut model = flowchart_with(&["A"]);
        let result = model.add_node(Node::new("A", NodeVariant::Flowchart(FlowShape::Decision)));
        assert_eq!(result, Err(ModelError::DuplicateNode("A".to_string())));
    }

    #[test]
    fn foreign_variants_are_rejected() {
        let mut model = flowchart_with(&[]);
        let result = model.add_node(Node::new("s", NodeVariant::Slice));
        assert!(matches!(result, Err(ModelError::VariantMismatch { .. })));
    }

    #[test]
    fn edges_need_existing_endpoints_and_get_unique_ids() {
        let mut model = flowchart_with(&["A", "B"]);
        let first = model
            .add_edge("A", "B", EdgeVariant::Flowchart(LinkKind::Arrow), None)
            .expect("first edge");
        let second = model
            .add_edge("B", "A", EdgeVariant::Flowchart(LinkKind::Dashed), Some("back".into()))
            .expect("second edge");
        assert_ne!(first, second);
        assert_eq!(
            model.add_edge("A", "Z", EdgeVariant::Flowchart(LinkKind::Arrow), None),
            Err(ModelError::UnknownNode("Z".to_string()))
        );

        model.remove_edge(&first).expect("remove first");
        let third = model
            .add_edge("A", "B", EdgeVariant::Flowchart(LinkKind::Thick), None)
            .expect("third edge");
        assert_ne!(third, second);
        assert!(model.check().is_ok());
    }

    #[test]
    fn removing_a_node_cascades() {
        let mut model = flowchart_with(&["A", "B", "C"]);
        model
            .add_subgraph(Subgraph::new("g", Some("Group".into())))
            .expect("subgraph");
        model.add_to_subgraph("B", "g").expect("membership");
        model
            .add_edge("A", "B", EdgeVariant::Flowchart(LinkKind::Arrow), None)
            .expect("edge");
        model
            .add_edge("B", "C", EdgeVariant::Flowchart(LinkKind::Arrow), None)
            .expect("edge");

        let removed = model.remove_node("B").expect("remove B");
        assert_eq!(removed.id, "B");
        assert!(model.edges.is_empty());
        assert!(model.subgraphs[0].members.is_empty());
        assert!(model.check().is_ok());
    }

    #[test]
    fn subgraph_membership_is_mirrored_in_metadata() {
        let mut model = flowchart_with(&["A"]);
        model.add_subgraph(Subgraph::new("one", None)).expect("one");
        model.add_subgraph(Subgraph::new("two", None)).expect("two");
        model.add_to_subgraph("A", "two").expect("two");
        model.add_to_subgraph("A", "one").expect("one");
        model.add_to_subgraph("A", "two").expect("repeat");

        let node = model.node("A").expect("node A");
        assert_eq!(node.meta(keys::SUBGRAPHS), Some(&json!(["two", "one"])));
        assert_eq!(model.subgraphs_of("A"), vec!["two".to_string(), "one".to_string()]);
        assert_eq!(model.subgraph("two").map(|sg| sg.members.len()), Some(1));
    }

    #[test]
    fn subgraphs_are_flowchart_only() {
        let mut model = GraphModel::empty(DiagramType::State);
        assert_eq!(
            model.add_subgraph(Subgraph::new("g", None)),
            Err(ModelError::SubgraphsUnsupported(DiagramType::State))
        );
    }

    #[test]
    fn config_tag_must_match() {
        let mut model = flowchart_with(&[]);
        let result = model.set_config(DiagramConfig::default_for(DiagramType::Gantt));
        assert_eq!(
            result,
            Err(ModelError::ConfigMismatch {
                expected: DiagramType::Flowchart,
                found: DiagramType::Gantt,
            })
        );

        model.config = DiagramConfig::default_for(DiagramType::Gantt);
        assert!(matches!(model.check(), Err(ModelError::ConfigMismatch { .. })));
    }

    #[test]
    fn metadata_helpers_normalize_lists() {
        let mut node = Node::new("n", NodeVariant::Flowchart(FlowShape::Process));
        node.set_meta(keys::SUBGRAPHS, "solo");
        node.push_meta_string(keys::SUBGRAPHS, "other");
        assert_eq!(node.meta_strings(keys::SUBGRAPHS), vec!["solo", "other"]);

        node.set_meta(keys::FILL, "");
        assert_eq!(node.meta_str(keys::FILL), None);
        node.set_meta(keys::SEQUENCE, 4_u64);
        assert_eq!(node.meta_u64(keys::SEQUENCE), Some(4));
    }

    #[test]
    fn model_round_trips_through_json() {
        let mut model = flowchart_with(&["A", "B"]);
        model
            .add_edge("A", "B", EdgeVariant::Flowchart(LinkKind::Arrow), Some("go".into()))
            .expect("edge");
        model.relabel_node("A", "Start").expect("relabel");

        let encoded = serde_json::to_string(&model).expect("encode");
        assert!(encoded.contains("\"type\":\"flowchart\""));
        let decoded: GraphModel = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, model);
    }
}
