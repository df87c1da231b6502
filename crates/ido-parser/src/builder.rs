use ido_core::{
    DiagramConfig, DiagramType, Edge, EdgeVariant, GraphModel, IdGenerator, Metadata, Node,
    NodeVariant, Preamble, disambiguate, sanitize_identifier,
};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::text::clean_label;

/// Accumulates one parse call's nodes and edges.
///
/// Owns the raw-identifier index and the fallback id counter, so every parse
/// starts from a clean slate.
pub(crate) struct ModelBuilder {
    model: GraphModel,
    node_index: FxHashMap<String, usize>,
    raw_ids: FxHashMap<String, String>,
    ids: IdGenerator,
}

impl ModelBuilder {
    pub(crate) fn new(diagram_type: DiagramType) -> Self {
        Self {
            model: GraphModel::empty(diagram_type),
            node_index: FxHashMap::default(),
            raw_ids: FxHashMap::default(),
            ids: IdGenerator::new(),
        }
    }

    pub(crate) fn diagram_type(&self) -> DiagramType {
        self.model.diagram_type
    }

    pub(crate) fn add_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        trace!(%warning, "parse warning");
        self.model.add_warning(warning);
    }

    pub(crate) fn set_preamble(&mut self, preamble: Preamble) {
        self.model.preamble = preamble;
    }

    pub(crate) fn preamble(&self) -> &Preamble {
        &self.model.preamble
    }

    pub(crate) fn config_mut(&mut self) -> &mut DiagramConfig {
        &mut self.model.config
    }

    pub(crate) fn model_mut(&mut self) -> &mut GraphModel {
        &mut self.model
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        let index = *self.node_index.get(id)?;
        self.model.nodes.get_mut(index)
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.model.edges.len()
    }

    pub(crate) fn edge_mut(&mut self, index: usize) -> Option<&mut Edge> {
        self.model.edges.get_mut(index)
    }

    /// Node id for a raw identifier seen earlier, or an existing node id.
    pub(crate) fn resolve(&self, raw: &str) -> Option<String> {
        let key = raw.trim();
        self.raw_ids
            .get(key)
            .cloned()
            .or_else(|| self.node_index.contains_key(key).then(|| key.to_string()))
    }

    pub(crate) fn resolve_scoped(&self, scope: &str, raw: &str) -> Option<String> {
        self.raw_ids.get(&scoped_key(scope, raw)).cloned()
    }

    /// Node for a raw source identifier. The same raw identifier always maps
    /// to the same node; a re-declaration updates its label and variant.
    pub(crate) fn intern_node(
        &mut self,
        raw: &str,
        label: Option<&str>,
        variant: Option<NodeVariant>,
    ) -> String {
        self.intern_with_key(raw.trim().to_string(), raw, label, variant)
    }

    /// Like [`Self::intern_node`], with raw identifiers namespaced by `scope`
    /// so that different kinds of names never merge.
    pub(crate) fn intern_scoped(
        &mut self,
        scope: &str,
        raw: &str,
        label: Option<&str>,
        variant: Option<NodeVariant>,
    ) -> String {
        self.intern_with_key(scoped_key(scope, raw), raw, label, variant)
    }

    /// Always create a new node whose id derives from `base`.
    pub(crate) fn create_node(&mut self, base: &str, label: &str, variant: NodeVariant) -> String {
        let id = self.unique_id(base, "node");
        self.push_node(Node::new(id.clone(), variant).with_label(label));
        id
    }

    pub(crate) fn push_edge(
        &mut self,
        source: &str,
        target: &str,
        variant: EdgeVariant,
        label: Option<&str>,
    ) -> usize {
        let index = self.model.edges.len();
        self.model.edges.push(Edge {
            id: format!("edge_{}", index + 1),
            source: source.to_string(),
            target: target.to_string(),
            variant,
            label: label.and_then(clean_label),
            metadata: Metadata::new(),
        });
        index
    }

    pub(crate) fn finish(mut self) -> GraphModel {
        if self.model.nodes.is_empty() {
            self.add_warning("No parseable nodes or edges were found");
        }
        self.model
    }

    fn intern_with_key(
        &mut self,
        key: String,
        raw: &str,
        label: Option<&str>,
        variant: Option<NodeVariant>,
    ) -> String {
        let label = label.and_then(clean_label);
        if let Some(id) = self.raw_ids.get(&key).cloned() {
            if let Some(node) = self.node_mut(&id) {
                if let Some(label) = label {
                    node.label = label;
                }
                if let Some(variant) = variant {
                    node.variant = variant;
                }
            }
            return id;
        }

        let id = self.unique_id(raw, "node");
        let variant = variant.unwrap_or_else(|| NodeVariant::default_for(self.diagram_type()));
        let label = label
            .or_else(|| clean_label(raw))
            .unwrap_or_else(|| id.clone());
        self.push_node(Node::new(id.clone(), variant).with_label(label));
        self.raw_ids.insert(key, id.clone());
        id
    }

    fn unique_id(&mut self, raw: &str, prefix: &str) -> String {
        let sanitized = sanitize_identifier(raw);
        let base = if sanitized.is_empty() {
            self.ids.fallback(prefix)
        } else {
            sanitized
        };
        disambiguate(&base, |candidate| self.node_index.contains_key(candidate))
    }

    fn push_node(&mut self, node: Node) {
        self.node_index.insert(node.id.clone(), self.model.nodes.len());
        self.model.nodes.push(node);
    }
}

fn scoped_key(scope: &str, raw: &str) -> String {
    format!("{scope}:{}", raw.trim())
}

#[cfg(test)]
mod tests {
    use ido_core::{DiagramType, EdgeVariant, FlowShape, LinkKind, NodeVariant};

    use super::ModelBuilder;

    #[test]
    fn same_raw_identifier_merges() {
        let mut builder = ModelBuilder::new(DiagramType::Flowchart);
        let first = builder.intern_node("A", None, None);
        let second = builder.intern_node(
            "A",
            Some("Start"),
            Some(NodeVariant::Flowchart(FlowShape::Decision)),
        );
        assert_eq!(first, second);
        let model = builder.finish();
        assert_eq!(model.nodes.len(), 1);
        assert_eq!(model.nodes[0].label, "Start");
        assert_eq!(model.nodes[0].variant, NodeVariant::Flowchart(FlowShape::Decision));
    }

    #[test]
    fn colliding_sanitized_identifiers_are_disambiguated() {
        let mut builder = ModelBuilder::new(DiagramType::Flowchart);
        let slash = builder.intern_node("a/b", None, None);
        let dot = builder.intern_node("a.b", None, None);
        assert_eq!(slash, "a_b");
        assert_eq!(dot, "a_b_2");
        assert_eq!(builder.resolve("a.b").as_deref(), Some("a_b_2"));
    }

    #[test]
    fn empty_identifiers_get_fallback_ids() {
        let mut builder = ModelBuilder::new(DiagramType::Pie);
        let first = builder.create_node("???", "???", NodeVariant::Slice);
        let second = builder.create_node("!!!", "!!!", NodeVariant::Slice);
        assert_eq!(first, "node_1");
        assert_eq!(second, "node_2");
    }

    #[test]
    fn scoped_identifiers_do_not_merge() {
        let mut builder = ModelBuilder::new(DiagramType::GitGraph);
        let branch = builder.intern_scoped("branch", "x", None, None);
        let commit = builder.intern_scoped("commit", "x", None, None);
        assert_ne!(branch, commit);
        assert_eq!(builder.resolve_scoped("commit", "x"), Some(commit));
    }

    #[test]
    fn edges_get_sequential_ids_and_empty_models_warn() {
        let mut builder = ModelBuilder::new(DiagramType::Flowchart);
        let a = builder.intern_node("A", None, None);
        let b = builder.intern_node("B", None, None);
        builder.push_edge(&a, &b, EdgeVariant::Flowchart(LinkKind::Arrow), Some(" go "));
        let model = builder.finish();
        assert_eq!(model.edges[0].id, "edge_1");
        assert_eq!(model.edges[0].label.as_deref(), Some("go"));
        assert!(model.warnings.is_empty());

        let empty = ModelBuilder::new(DiagramType::Flowchart).finish();
        assert_eq!(empty.warnings, vec!["No parseable nodes or edges were found"]);
    }
}
