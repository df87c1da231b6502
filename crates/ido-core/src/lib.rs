#![forbid(unsafe_code)]

//! Shared graph model for the ido Mermaid interchange layer.
//!
//! Parsers produce a [`GraphModel`], the visual editor mutates it, and the
//! serializers turn it back into diagram source.

mod ids;
pub mod keys;
mod model;
pub mod registry;

pub use ids::{IdGenerator, disambiguate, sanitize_identifier};
pub use model::{Edge, GraphModel, HasMetadata, Metadata, ModelError, Node, Subgraph};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum DiagramType {
    Flowchart,
    Sequence,
    Class,
    State,
    Er,
    Gantt,
    Pie,
    GitGraph,
}

impl DiagramType {
    pub const ALL: [Self; 8] = [
        Self::Flowchart,
        Self::Sequence,
        Self::Class,
        Self::State,
        Self::Er,
        Self::Gantt,
        Self::Pie,
        Self::GitGraph,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flowchart => "flowchart",
            Self::Sequence => "sequence",
            Self::Class => "class",
            Self::State => "state",
            Self::Er => "er",
            Self::Gantt => "gantt",
            Self::Pie => "pie",
            Self::GitGraph => "gitGraph",
        }
    }

    /// Keyword that opens a document of this type.
    #[must_use]
    pub const fn header_keyword(self) -> &'static str {
        match self {
            Self::Flowchart => "flowchart",
            Self::Sequence => "sequenceDiagram",
            Self::Class => "classDiagram",
            Self::State => "stateDiagram-v2",
            Self::Er => "erDiagram",
            Self::Gantt => "gantt",
            Self::Pie => "pie",
            Self::GitGraph => "gitGraph",
        }
    }

    /// Parse the short name used by [`DiagramType::as_str`] (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for DiagramType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum GraphDirection {
    #[default]
    TB,
    TD,
    BT,
    RL,
    LR,
}

impl GraphDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TB => "TB",
            Self::TD => "TD",
            Self::BT => "BT",
            Self::RL => "RL",
            Self::LR => "LR",
        }
    }

    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "TB" => Some(Self::TB),
            "TD" => Some(Self::TD),
            "BT" => Some(Self::BT),
            "RL" => Some(Self::RL),
            "LR" => Some(Self::LR),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Node variants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum FlowShape {
    StartEnd,
    #[default]
    Process,
    Decision,
    Subroutine,
    InputOutput,
    Rounded,
    Database,
    Hexagon,
}

impl FlowShape {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartEnd => "startEnd",
            Self::Process => "process",
            Self::Decision => "decision",
            Self::Subroutine => "subroutine",
            Self::InputOutput => "inputOutput",
            Self::Rounded => "rounded",
            Self::Database => "database",
            Self::Hexagon => "hexagon",
        }
    }

    /// Opening and closing bracket pair used in flowchart source.
    #[must_use]
    pub const fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            Self::StartEnd => ("((", "))"),
            Self::Process => ("[", "]"),
            Self::Decision => ("{", "}"),
            Self::Subroutine => ("[[", "]]"),
            Self::InputOutput => ("[/", "/]"),
            Self::Rounded => ("(", ")"),
            Self::Database => ("[(", ")]"),
            Self::Hexagon => ("{{", "}}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum ParticipantKind {
    #[default]
    Participant,
    Actor,
    Boundary,
    Control,
    Database,
    Entity,
    Collections,
    Queue,
}

impl ParticipantKind {
    pub const ALL: [Self; 8] = [
        Self::Participant,
        Self::Actor,
        Self::Boundary,
        Self::Control,
        Self::Database,
        Self::Entity,
        Self::Collections,
        Self::Queue,
    ];

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Actor => "actor",
            Self::Boundary => "boundary",
            Self::Control => "control",
            Self::Database => "database",
            Self::Entity => "entity",
            Self::Collections => "collections",
            Self::Queue => "queue",
        }
    }

    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.keyword() == keyword)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Abstract,
    Enumeration,
}

impl ClassKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Abstract => "abstract",
            Self::Enumeration => "enumeration",
        }
    }

    /// Classify a `<<stereotype>>` body (without the angle brackets).
    #[must_use]
    pub fn from_stereotype(stereotype: &str) -> Self {
        match stereotype.trim().to_ascii_lowercase().as_str() {
            "interface" => Self::Interface,
            "abstract" => Self::Abstract,
            "enumeration" | "enum" => Self::Enumeration,
            _ => Self::Class,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum StateKind {
    #[default]
    State,
    Start,
    End,
    Choice,
    Fork,
    Join,
}

impl StateKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Start => "start",
            Self::End => "end",
            Self::Choice => "choice",
            Self::Fork => "fork",
            Self::Join => "join",
        }
    }

    /// `<<choice>>` style marker, for the pseudo-states that have one.
    #[must_use]
    pub const fn marker(self) -> Option<&'static str> {
        match self {
            Self::Choice => Some("choice"),
            Self::Fork => Some("fork"),
            Self::Join => Some("join"),
            Self::State | Self::Start | Self::End => None,
        }
    }

    #[must_use]
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker.trim().to_ascii_lowercase().as_str() {
            "choice" => Some(Self::Choice),
            "fork" => Some(Self::Fork),
            "join" => Some(Self::Join),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum TaskKind {
    #[default]
    Task,
    Milestone,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum GitCommand {
    #[default]
    Commit,
    Branch,
    Checkout,
    Merge,
    CherryPick,
}

impl GitCommand {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Branch => "branch",
            Self::Checkout => "checkout",
            Self::Merge => "merge",
            Self::CherryPick => "cherryPick",
        }
    }

    /// Commands that advance the head of the current branch.
    #[must_use]
    pub const fn creates_commit(self) -> bool {
        matches!(self, Self::Commit | Self::Merge | Self::CherryPick)
    }
}

/// Diagram-type-specific node subtype.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "diagram", content = "kind", rename_all = "camelCase")]
pub enum NodeVariant {
    Flowchart(FlowShape),
    Sequence(ParticipantKind),
    Class(ClassKind),
    State(StateKind),
    Entity,
    Gantt(TaskKind),
    Slice,
    Git(GitCommand),
}

impl NodeVariant {
    #[must_use]
    pub const fn diagram_type(self) -> DiagramType {
        match self {
            Self::Flowchart(_) => DiagramType::Flowchart,
            Self::Sequence(_) => DiagramType::Sequence,
            Self::Class(_) => DiagramType::Class,
            Self::State(_) => DiagramType::State,
            Self::Entity => DiagramType::Er,
            Self::Gantt(_) => DiagramType::Gantt,
            Self::Slice => DiagramType::Pie,
            Self::Git(_) => DiagramType::GitGraph,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flowchart(shape) => shape.as_str(),
            Self::Sequence(kind) => kind.keyword(),
            Self::Class(kind) => kind.as_str(),
            Self::State(kind) => kind.as_str(),
            Self::Entity => "entity",
            Self::Gantt(TaskKind::Task) => "task",
            Self::Gantt(TaskKind::Milestone) => "milestone",
            Self::Slice => "slice",
            Self::Git(command) => command.as_str(),
        }
    }

    /// The variant a node gets when it is referenced before being declared.
    #[must_use]
    pub const fn default_for(diagram_type: DiagramType) -> Self {
        match diagram_type {
            DiagramType::Flowchart => Self::Flowchart(FlowShape::Process),
            DiagramType::Sequence => Self::Sequence(ParticipantKind::Participant),
            DiagramType::Class => Self::Class(ClassKind::Class),
            DiagramType::State => Self::State(StateKind::State),
            DiagramType::Er => Self::Entity,
            DiagramType::Gantt => Self::Gantt(TaskKind::Task),
            DiagramType::Pie => Self::Slice,
            DiagramType::GitGraph => Self::Git(GitCommand::Commit),
        }
    }
}

// ---------------------------------------------------------------------------
// Edge variants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum LinkKind {
    #[default]
    Arrow,
    Dashed,
    Thick,
    Line,
}

impl LinkKind {
    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::Arrow => "-->",
            Self::Dashed => "-.->",
            Self::Thick => "==>",
            Self::Line => "---",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    #[default]
    Solid,
    Dashed,
    Open,
    DashedOpen,
    Cross,
    DashedCross,
    Async,
    DashedAsync,
}

impl MessageKind {
    /// Operators ordered longest-first so prefix matching picks the right one.
    pub const OPERATORS: [(&'static str, Self); 8] = [
        ("-->>", Self::Dashed),
        ("->>", Self::Solid),
        ("--x", Self::DashedCross),
        ("--)", Self::DashedAsync),
        ("-->", Self::DashedOpen),
        ("-x", Self::Cross),
        ("-)", Self::Async),
        ("->", Self::Open),
    ];

    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::Solid => "->>",
            Self::Dashed => "-->>",
            Self::Open => "->",
            Self::DashedOpen => "-->",
            Self::Cross => "-x",
            Self::DashedCross => "--x",
            Self::Async => "-)",
            Self::DashedAsync => "--)",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum ClassRelation {
    Inheritance,
    Realization,
    Composition,
    Aggregation,
    Dependency,
    #[default]
    Association,
    Link,
}

impl ClassRelation {
    /// Canonical symbol, written left-to-right from source to target.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Inheritance => "<|--",
            Self::Realization => "<|..",
            Self::Composition => "*--",
            Self::Aggregation => "o--",
            Self::Dependency => "..>",
            Self::Association => "-->",
            Self::Link => "--",
        }
    }

    /// Classify a relationship symbol such as `<|--`, `*--` or `..>`.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Self {
        let dotted = symbol.contains("..");
        if symbol.contains("<|") || symbol.contains("|>") {
            if dotted {
                Self::Realization
            } else {
                Self::Inheritance
            }
        } else if symbol.contains('*') {
            Self::Composition
        } else if symbol.contains('o') {
            Self::Aggregation
        } else if dotted {
            Self::Dependency
        } else if symbol.contains('>') || symbol.contains('<') {
            Self::Association
        } else {
            Self::Link
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    #[default]
    Identifying,
    NonIdentifying,
    OneToMany,
    ManyToMany,
}

impl Cardinality {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Identifying => "||--||",
            Self::NonIdentifying => "||--o{",
            Self::OneToMany => "||--|{",
            Self::ManyToMany => "}o--o{",
        }
    }

    /// Map a relationship symbol to a variant. The four canonical symbols map
    /// directly; anything else is classified by its line style and ends.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "||--||" => Self::Identifying,
            "||--o{" => Self::NonIdentifying,
            "||--|{" => Self::OneToMany,
            "}o--o{" => Self::ManyToMany,
            other => {
                let left_many = other.starts_with('}');
                let right_many = other.ends_with('{');
                if other.contains("..") {
                    Self::NonIdentifying
                } else if left_many && right_many {
                    Self::ManyToMany
                } else if left_many || right_many {
                    Self::OneToMany
                } else {
                    Self::Identifying
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum GitLink {
    #[default]
    #[serde(rename = "gitCommit")]
    Commit,
    #[serde(rename = "gitBranchCreate")]
    BranchCreate,
    #[serde(rename = "gitCheckout")]
    Checkout,
    #[serde(rename = "gitMerge")]
    Merge,
    #[serde(rename = "gitCherryPick")]
    CherryPick,
}

impl GitLink {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Commit => "gitCommit",
            Self::BranchCreate => "gitBranchCreate",
            Self::Checkout => "gitCheckout",
            Self::Merge => "gitMerge",
            Self::CherryPick => "gitCherryPick",
        }
    }
}

/// Diagram-type-specific edge subtype.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "diagram", content = "kind", rename_all = "camelCase")]
pub enum EdgeVariant {
    Flowchart(LinkKind),
    Sequence(MessageKind),
    Class(ClassRelation),
    Transition,
    Er(Cardinality),
    Dependency,
    Git(GitLink),
}

impl EdgeVariant {
    #[must_use]
    pub const fn diagram_type(self) -> DiagramType {
        match self {
            Self::Flowchart(_) => DiagramType::Flowchart,
            Self::Sequence(_) => DiagramType::Sequence,
            Self::Class(_) => DiagramType::Class,
            Self::Transition => DiagramType::State,
            Self::Er(_) => DiagramType::Er,
            Self::Dependency => DiagramType::Gantt,
            Self::Git(_) => DiagramType::GitGraph,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-type configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartConfig {
    pub direction: GraphDirection,
    /// `classDef` name to its raw property list.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub class_defs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_link_style: Option<String>,
}

impl Default for FlowchartConfig {
    fn default() -> Self {
        Self {
            direction: GraphDirection::TD,
            class_defs: BTreeMap::new(),
            default_link_style: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SequenceConfig {
    pub autonumber: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClassConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<GraphDirection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StateConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<GraphDirection>,
    /// Emit `stateDiagram-v2` rather than `stateDiagram`.
    pub v2: bool,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            direction: None,
            v2: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ErConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<GraphDirection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GanttConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub date_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excludes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today_marker: Option<String>,
}

impl Default for GanttConfig {
    fn default() -> Self {
        Self {
            title: None,
            date_format: "YYYY-MM-DD".to_string(),
            axis_format: None,
            excludes: None,
            tick_interval: None,
            today_marker: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PieConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub show_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GitGraphConfig {
    pub direction: GraphDirection,
    pub main_branch: String,
    /// Raw body of an `options { ... }` block, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}

impl Default for GitGraphConfig {
    fn default() -> Self {
        Self {
            direction: GraphDirection::LR,
            main_branch: "main".to_string(),
            options: None,
        }
    }
}

/// Configuration tagged by the diagram type it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DiagramConfig {
    Flowchart(FlowchartConfig),
    Sequence(SequenceConfig),
    Class(ClassConfig),
    State(StateConfig),
    Er(ErConfig),
    Gantt(GanttConfig),
    Pie(PieConfig),
    GitGraph(GitGraphConfig),
}

impl DiagramConfig {
    #[must_use]
    pub fn default_for(diagram_type: DiagramType) -> Self {
        match diagram_type {
            DiagramType::Flowchart => Self::Flowchart(FlowchartConfig::default()),
            DiagramType::Sequence => Self::Sequence(SequenceConfig::default()),
            DiagramType::Class => Self::Class(ClassConfig::default()),
            DiagramType::State => Self::State(StateConfig::default()),
            DiagramType::Er => Self::Er(ErConfig::default()),
            DiagramType::Gantt => Self::Gantt(GanttConfig::default()),
            DiagramType::Pie => Self::Pie(PieConfig::default()),
            DiagramType::GitGraph => Self::GitGraph(GitGraphConfig::default()),
        }
    }

    #[must_use]
    pub const fn diagram_type(&self) -> DiagramType {
        match self {
            Self::Flowchart(_) => DiagramType::Flowchart,
            Self::Sequence(_) => DiagramType::Sequence,
            Self::Class(_) => DiagramType::Class,
            Self::State(_) => DiagramType::State,
            Self::Er(_) => DiagramType::Er,
            Self::Gantt(_) => DiagramType::Gantt,
            Self::Pie(_) => DiagramType::Pie,
            Self::GitGraph(_) => DiagramType::GitGraph,
        }
    }
}

/// Document-level configuration that precedes the diagram header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Preamble {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Front matter mapping without `title` (kept under its original keys).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_matter: Option<Value>,
    /// Merged `%%{init: ...}%%` payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<Value>,
}

impl Preamble {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.front_matter.is_none() && self.init.is_none()
    }

    /// Look up `section.key` in the init payload, falling back to the front
    /// matter `config` mapping.
    #[must_use]
    pub fn config_value(&self, section: &str, key: &str) -> Option<&Value> {
        let from_init = self
            .init
            .as_ref()
            .and_then(|init| init.get(section))
            .and_then(|section| section.get(key));
        from_init.or_else(|| {
            self.front_matter
                .as_ref()
                .and_then(|front| front.get("config"))
                .and_then(|config| config.get(section))
                .and_then(|section| section.get(key))
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        Cardinality, ClassKind, ClassRelation, DiagramConfig, DiagramType, EdgeVariant,
        GitLink, GraphDirection, MessageKind, NodeVariant, Preamble,
    };

    #[test]
    fn diagram_type_names_round_trip() {
        for diagram_type in DiagramType::ALL {
            assert_eq!(DiagramType::from_name(diagram_type.as_str()), Some(diagram_type));
        }
        assert_eq!(DiagramType::from_name("GITGRAPH"), Some(DiagramType::GitGraph));
        assert_eq!(DiagramType::from_name("mindmap"), None);
    }

    #[test]
    fn default_configs_carry_their_own_tag() {
        for diagram_type in DiagramType::ALL {
            assert_eq!(DiagramConfig::default_for(diagram_type).diagram_type(), diagram_type);
            assert_eq!(NodeVariant::default_for(diagram_type).diagram_type(), diagram_type);
        }
    }

    #[test]
    fn direction_parsing_is_case_insensitive() {
        assert_eq!(GraphDirection::parse("lr"), Some(GraphDirection::LR));
        assert_eq!(GraphDirection::parse(" td "), Some(GraphDirection::TD));
        assert_eq!(GraphDirection::parse("up"), None);
    }

    #[test]
    fn class_relation_symbols_classify() {
        assert_eq!(ClassRelation::from_symbol("<|--"), ClassRelation::Inheritance);
        assert_eq!(ClassRelation::from_symbol("..|>"), ClassRelation::Realization);
        assert_eq!(ClassRelation::from_symbol("*--"), ClassRelation::Composition);
        assert_eq!(ClassRelation::from_symbol("o--"), ClassRelation::Aggregation);
        assert_eq!(ClassRelation::from_symbol(".."), ClassRelation::Dependency);
        assert_eq!(ClassRelation::from_symbol("-->"), ClassRelation::Association);
        assert_eq!(ClassRelation::from_symbol("--"), ClassRelation::Link);
        for relation in [
            ClassRelation::Inheritance,
            ClassRelation::Realization,
            ClassRelation::Composition,
            ClassRelation::Aggregation,
            ClassRelation::Dependency,
            ClassRelation::Association,
            ClassRelation::Link,
        ] {
            assert_eq!(ClassRelation::from_symbol(relation.symbol()), relation);
        }
    }

    #[test]
    fn er_symbols_map_to_cardinality() {
        assert_eq!(Cardinality::from_symbol("||--||"), Cardinality::Identifying);
        assert_eq!(Cardinality::from_symbol("||--o{"), Cardinality::NonIdentifying);
        assert_eq!(Cardinality::from_symbol("||--|{"), Cardinality::OneToMany);
        assert_eq!(Cardinality::from_symbol("}o--o{"), Cardinality::ManyToMany);
        assert_eq!(Cardinality::from_symbol("}|..|{"), Cardinality::NonIdentifying);
        assert_eq!(Cardinality::from_symbol("|o--o{"), Cardinality::OneToMany);
        assert_eq!(Cardinality::from_symbol("|o--o|"), Cardinality::Identifying);
    }

    #[test]
    fn message_operators_are_longest_first() {
        for (index, (operator, _)) in MessageKind::OPERATORS.iter().enumerate() {
            for (later, _) in &MessageKind::OPERATORS[index + 1..] {
                assert!(
                    !later.starts_with(operator),
                    "{later} is shadowed by {operator}"
                );
            }
        }
    }

    #[test]
    fn variants_serialize_with_diagram_tag() {
        let node = serde_json::to_value(NodeVariant::Class(ClassKind::Interface))
            .expect("serialize node variant");
        assert_eq!(node, json!({"diagram": "class", "kind": "interface"}));

        let edge =
            serde_json::to_value(EdgeVariant::Git(GitLink::BranchCreate)).expect("serialize edge");
        assert_eq!(edge, json!({"diagram": "git", "kind": "gitBranchCreate"}));

        let config = serde_json::to_value(DiagramConfig::default_for(DiagramType::GitGraph))
            .expect("serialize config");
        assert_eq!(config["type"], "gitGraph");
        assert_eq!(config["direction"], "LR");
    }

    #[test]
    fn preamble_config_prefers_init_over_front_matter() {
        let preamble = Preamble {
            title: None,
            front_matter: Some(json!({"config": {"gitGraph": {"mainBranchName": "trunk"}}})),
            init: Some(json!({"gitGraph": {"mainBranchName": "develop"}})),
        };
        assert_eq!(
            preamble.config_value("gitGraph", "mainBranchName"),
            Some(&json!("develop"))
        );

        let front_only = Preamble {
            init: None,
            ..preamble
        };
        assert_eq!(
            front_only.config_value("gitGraph", "mainBranchName"),
            Some(&json!("trunk"))
        );
    }
}
