//! Static catalog of diagram types: variant templates, editable fields and
//! the starter document shown on a blank canvas.

use crate::{
    Cardinality, ClassKind, ClassRelation, DiagramConfig, DiagramType, EdgeVariant, FlowShape,
    GitCommand, GitLink, LinkKind, MessageKind, NodeVariant, ParticipantKind, StateKind, TaskKind,
    keys,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Duration,
    List,
    Flag,
    Choice(&'static [&'static str]),
}

/// One editable property of a node or edge, stored under `key` in metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultStyle {
    pub fill: &'static str,
    pub stroke: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTemplate {
    pub variant: NodeVariant,
    pub default_label: &'static str,
    pub default_metadata: &'static [(&'static str, &'static str)],
    pub style: DefaultStyle,
    pub fields: &'static [FieldSpec],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeTemplate {
    pub variant: EdgeVariant,
    pub default_label: Option<&'static str>,
    pub fields: &'static [FieldSpec],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagramTemplate {
    pub diagram_type: DiagramType,
    pub display_name: &'static str,
    pub node_variants: &'static [NodeTemplate],
    pub edge_variants: &'static [EdgeTemplate],
    /// Source for a new, blank document of this type.
    pub starter: &'static str,
}

impl DiagramTemplate {
    #[must_use]
    pub fn default_config(&self) -> DiagramConfig {
        DiagramConfig::default_for(self.diagram_type)
    }

    #[must_use]
    pub fn node_template(&self, variant: NodeVariant) -> Option<&'static NodeTemplate> {
        self.node_variants
            .iter()
            .find(|template| template.variant == variant)
    }

    #[must_use]
    pub fn edge_template(&self, variant: EdgeVariant) -> Option<&'static EdgeTemplate> {
        self.edge_variants
            .iter()
            .find(|template| template.variant == variant)
    }
}

/// Registry entry for `diagram_type`. Every type has a complete entry.
#[must_use]
pub fn template(diagram_type: DiagramType) -> &'static DiagramTemplate {
    match diagram_type {
        DiagramType::Flowchart => &FLOWCHART,
        DiagramType::Sequence => &SEQUENCE,
        DiagramType::Class => &CLASS,
        DiagramType::State => &STATE,
        DiagramType::Er => &ER,
        DiagramType::Gantt => &GANTT,
        DiagramType::Pie => &PIE,
        DiagramType::GitGraph => &GIT_GRAPH,
    }
}

const NEUTRAL: DefaultStyle = DefaultStyle {
    fill: "#ECECFF",
    stroke: "#9370DB",
    text: "#333333",
};
const ACCENT: DefaultStyle = DefaultStyle {
    fill: "#FFF5AD",
    stroke: "#AAAA33",
    text: "#333333",
};
const TERMINAL: DefaultStyle = DefaultStyle {
    fill: "#333333",
    stroke: "#333333",
    text: "#FFFFFF",
};

const LABEL_FIELD: FieldSpec = FieldSpec {
    key: "label",
    label: "Label",
    kind: FieldKind::Text,
};

const FLOW_NODE_FIELDS: &[FieldSpec] = &[
    LABEL_FIELD,
    FieldSpec {
        key: keys::FILL,
        label: "Fill",
        kind: FieldKind::Text,
    },
    FieldSpec {
        key: keys::STROKE,
        label: "Stroke",
        kind: FieldKind::Text,
    },
    FieldSpec {
        key: keys::COLOR,
        label: "Text color",
        kind: FieldKind::Text,
    },
    FieldSpec {
        key: keys::SUBGRAPHS,
        label: "Subgraphs",
        kind: FieldKind::List,
    },
    FieldSpec {
        key: keys::HREF,
        label: "Link",
        kind: FieldKind::Text,
    },
];

const FLOW_EDGE_FIELDS: &[FieldSpec] = &[
    LABEL_FIELD,
    FieldSpec {
        key: keys::STROKE,
        label: "Stroke",
        kind: FieldKind::Text,
    },
];

const fn flow_node(
    shape: FlowShape,
    default_label: &'static str,
    style: DefaultStyle,
) -> NodeTemplate {
    NodeTemplate {
        variant: NodeVariant::Flowchart(shape),
        default_label,
        default_metadata: &[],
        style,
        fields: FLOW_NODE_FIELDS,
    }
}

const fn flow_edge(kind: LinkKind) -> EdgeTemplate {
    EdgeTemplate {
        variant: EdgeVariant::Flowchart(kind),
        default_label: None,
        fields: FLOW_EDGE_FIELDS,
    }
}

static FLOWCHART: DiagramTemplate = DiagramTemplate {
    diagram_type: DiagramType::Flowchart,
    display_name: "Flowchart",
    node_variants: &[
        flow_node(FlowShape::StartEnd, "Start", TERMINAL),
        flow_node(FlowShape::Process, "Process", NEUTRAL),
        flow_node(FlowShape::Decision, "Decision?", ACCENT),
        flow_node(FlowShape::Subroutine, "Subroutine", NEUTRAL),
        flow_node(FlowShape::InputOutput, "Input", NEUTRAL),
        flow_node(FlowShape::Rounded, "Step", NEUTRAL),
        flow_node(FlowShape::Database, "Database", NEUTRAL),
        flow_node(FlowShape::Hexagon, "Prepare", ACCENT),
    ],
    edge_variants: &[
        flow_edge(LinkKind::Arrow),
        flow_edge(LinkKind::Dashed),
        flow_edge(LinkKind::Thick),
        flow_edge(LinkKind::Line),
    ],
    starter: "flowchart TD\n    start((Start)) --> check{Ready?}\n    check -->|yes| work[Do the work]\n    check -.->|no| start\n",
};

const PARTICIPANT_FIELDS: &[FieldSpec] = &[LABEL_FIELD];
const MESSAGE_FIELDS: &[FieldSpec] = &[
    LABEL_FIELD,
    FieldSpec {
        key: keys::ACTIVATION,
        label: "Activation",
        kind: FieldKind::Choice(&["+", "-"]),
    },
];

const fn participant(kind: ParticipantKind, default_label: &'static str) -> NodeTemplate {
    NodeTemplate {
        variant: NodeVariant::Sequence(kind),
        default_label,
        default_metadata: &[],
        style: NEUTRAL,
        fields: PARTICIPANT_FIELDS,
    }
}

const fn message(kind: MessageKind) -> EdgeTemplate {
    EdgeTemplate {
        variant: EdgeVariant::Sequence(kind),
        default_label: Some("message"),
        fields: MESSAGE_FIELDS,
    }
}

static SEQUENCE: DiagramTemplate = DiagramTemplate {
    diagram_type: DiagramType::Sequence,
    display_name: "Sequence diagram",
    node_variants: &[
        participant(ParticipantKind::Participant, "Service"),
        participant(ParticipantKind::Actor, "User"),
        participant(ParticipantKind::Boundary, "Boundary"),
        participant(ParticipantKind::Control, "Control"),
        participant(ParticipantKind::Database, "Database"),
        participant(ParticipantKind::Entity, "Entity"),
        participant(ParticipantKind::Collections, "Collections"),
        participant(ParticipantKind::Queue, "Queue"),
    ],
    edge_variants: &[
        message(MessageKind::Solid),
        message(MessageKind::Dashed),
        message(MessageKind::Open),
        message(MessageKind::DashedOpen),
        message(MessageKind::Cross),
        message(MessageKind::DashedCross),
        message(MessageKind::Async),
        message(MessageKind::DashedAsync),
    ],
    starter: "sequenceDiagram\n    actor User\n    participant App\n    User->>App: request\n    App-->>User: response\n",
};

const CLASS_FIELDS: &[FieldSpec] = &[
    LABEL_FIELD,
    FieldSpec {
        key: keys::STEREOTYPE,
        label: "Stereotype",
        kind: FieldKind::Text,
    },
    FieldSpec {
        key: keys::GENERIC,
        label: "Type parameter",
        kind: FieldKind::Text,
    },
    FieldSpec {
        key: keys::MEMBERS,
        label: "Members",
        kind: FieldKind::List,
    },
    FieldSpec {
        key: keys::METHODS,
        label: "Methods",
        kind: FieldKind::List,
    },
];

const RELATION_FIELDS: &[FieldSpec] = &[
    LABEL_FIELD,
    FieldSpec {
        key: keys::SOURCE_CARDINALITY,
        label: "Source cardinality",
        kind: FieldKind::Text,
    },
    FieldSpec {
        key: keys::TARGET_CARDINALITY,
        label: "Target cardinality",
        kind: FieldKind::Text,
    },
];

const fn class_node(
    kind: ClassKind,
    default_label: &'static str,
    default_metadata: &'static [(&'static str, &'static str)],
) -> NodeTemplate {
    NodeTemplate {
        variant: NodeVariant::Class(kind),
        default_label,
        default_metadata,
        style: NEUTRAL,
        fields: CLASS_FIELDS,
    }
}

const fn relation(kind: ClassRelation) -> EdgeTemplate {
    EdgeTemplate {
        variant: EdgeVariant::Class(kind),
        default_label: None,
        fields: RELATION_FIELDS,
    }
}

static CLASS: DiagramTemplate = DiagramTemplate {
    diagram_type: DiagramType::Class,
    display_name: "Class diagram",
    node_variants: &[
        class_node(ClassKind::Class, "Class", &[]),
        class_node(
            ClassKind::Interface,
            "Interface",
            &[(keys::STEREOTYPE, "interface")],
        ),
        class_node(
            ClassKind::Abstract,
            "Abstract",
            &[(keys::STEREOTYPE, "abstract")],
        ),
        class_node(
            ClassKind::Enumeration,
            "Enumeration",
            &[(keys::STEREOTYPE, "enumeration")],
        ),
    ],
    edge_variants: &[
        relation(ClassRelation::Inheritance),
        relation(ClassRelation::Realization),
        relation(ClassRelation::Composition),
        relation(ClassRelation::Aggregation),
        relation(ClassRelation::Dependency),
        relation(ClassRelation::Association),
        relation(ClassRelation::Link),
    ],
    starter: "classDiagram\n    class Animal {\n        +String name\n        +speak() String\n    }\n    class Dog\n    Animal <|-- Dog\n",
};

const STATE_FIELDS: &[FieldSpec] = &[
    LABEL_FIELD,
    FieldSpec {
        key: keys::PARENT,
        label: "Composite state",
        kind: FieldKind::Text,
    },
];

const fn state_node(kind: StateKind, default_label: &'static str, style: DefaultStyle) -> NodeTemplate {
    NodeTemplate {
        variant: NodeVariant::State(kind),
        default_label,
        default_metadata: &[],
        style,
        fields: STATE_FIELDS,
    }
}

static STATE: DiagramTemplate = DiagramTemplate {
    diagram_type: DiagramType::State,
    display_name: "State diagram",
    node_variants: &[
        state_node(StateKind::State, "State", NEUTRAL),
        state_node(StateKind::Start, "start", TERMINAL),
        state_node(StateKind::End, "end", TERMINAL),
        state_node(StateKind::Choice, "choice", ACCENT),
        state_node(StateKind::Fork, "fork", TERMINAL),
        state_node(StateKind::Join, "join", TERMINAL),
    ],
    edge_variants: &[EdgeTemplate {
        variant: EdgeVariant::Transition,
        default_label: None,
        fields: &[LABEL_FIELD],
    }],
    starter: "stateDiagram-v2\n    [*] --> Idle\n    Idle --> Running : start\n    Running --> Idle : stop\n    Running --> [*]\n",
};

const ER_REL_FIELDS: &[FieldSpec] = &[
    LABEL_FIELD,
    FieldSpec {
        key: keys::CARDINALITY,
        label: "Symbol",
        kind: FieldKind::Text,
    },
];

const fn er_relation(kind: Cardinality) -> EdgeTemplate {
    EdgeTemplate {
        variant: EdgeVariant::Er(kind),
        default_label: Some("relates"),
        fields: ER_REL_FIELDS,
    }
}

static ER: DiagramTemplate = DiagramTemplate {
    diagram_type: DiagramType::Er,
    display_name: "Entity relationship diagram",
    node_variants: &[NodeTemplate {
        variant: NodeVariant::Entity,
        default_label: "ENTITY",
        default_metadata: &[],
        style: NEUTRAL,
        fields: &[
            LABEL_FIELD,
            FieldSpec {
                key: keys::ATTRIBUTES,
                label: "Attributes",
                kind: FieldKind::List,
            },
        ],
    }],
    edge_variants: &[
        er_relation(Cardinality::Identifying),
        er_relation(Cardinality::NonIdentifying),
        er_relation(Cardinality::OneToMany),
        er_relation(Cardinality::ManyToMany),
    ],
    starter: "erDiagram\n    CUSTOMER {\n        string name\n        int id PK\n    }\n    ORDER {\n        int id PK\n    }\n    CUSTOMER ||--o{ ORDER : places\n",
};

const TASK_FIELDS: &[FieldSpec] = &[
    LABEL_FIELD,
    FieldSpec {
        key: keys::SECTION,
        label: "Section",
        kind: FieldKind::Text,
    },
    FieldSpec {
        key: keys::TASK_ID,
        label: "Task id",
        kind: FieldKind::Text,
    },
    FieldSpec {
        key: keys::STATUS,
        label: "Status",
        kind: FieldKind::List,
    },
    FieldSpec {
        key: keys::START,
        label: "Start",
        kind: FieldKind::Date,
    },
    FieldSpec {
        key: keys::END,
        label: "End",
        kind: FieldKind::Date,
    },
    FieldSpec {
        key: keys::DURATION,
        label: "Duration",
        kind: FieldKind::Duration,
    },
    FieldSpec {
        key: keys::DEPENDS_ON,
        label: "After",
        kind: FieldKind::List,
    },
];

static GANTT: DiagramTemplate = DiagramTemplate {
    diagram_type: DiagramType::Gantt,
    display_name: "Gantt chart",
    node_variants: &[
        NodeTemplate {
            variant: NodeVariant::Gantt(TaskKind::Task),
            default_label: "Task",
            default_metadata: &[(keys::DURATION, "1d")],
            style: NEUTRAL,
            fields: TASK_FIELDS,
        },
        NodeTemplate {
            variant: NodeVariant::Gantt(TaskKind::Milestone),
            default_label: "Milestone",
            default_metadata: &[(keys::DURATION, "0d")],
            style: TERMINAL,
            fields: TASK_FIELDS,
        },
    ],
    edge_variants: &[EdgeTemplate {
        variant: EdgeVariant::Dependency,
        default_label: None,
        fields: &[],
    }],
    starter: "gantt\n    title Project plan\n    dateFormat YYYY-MM-DD\n    section Build\n    Design : design, 2024-01-01, 3d\n    Implement : impl, after design, 5d\n",
};

static PIE: DiagramTemplate = DiagramTemplate {
    diagram_type: DiagramType::Pie,
    display_name: "Pie chart",
    node_variants: &[NodeTemplate {
        variant: NodeVariant::Slice,
        default_label: "Slice",
        default_metadata: &[(keys::VALUE, "1")],
        style: NEUTRAL,
        fields: &[
            LABEL_FIELD,
            FieldSpec {
                key: keys::VALUE,
                label: "Value",
                kind: FieldKind::Number,
            },
        ],
    }],
    edge_variants: &[],
    starter: "pie title Pets\n    \"Dogs\" : 40\n    \"Cats\" : 35\n",
};

const COMMIT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: keys::COMMIT_ID,
        label: "Commit id",
        kind: FieldKind::Text,
    },
    FieldSpec {
        key: keys::MESSAGE,
        label: "Message",
        kind: FieldKind::Text,
    },
    FieldSpec {
        key: keys::TAG,
        label: "Tag",
        kind: FieldKind::Text,
    },
    FieldSpec {
        key: keys::COMMIT_TYPE,
        label: "Type",
        kind: FieldKind::Choice(&["NORMAL", "HIGHLIGHT", "REVERSE"]),
    },
];

const BRANCH_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: keys::BRANCH_NAME,
        label: "Branch",
        kind: FieldKind::Text,
    },
    FieldSpec {
        key: keys::ORDER,
        label: "Order",
        kind: FieldKind::Number,
    },
];

const fn git_node(
    command: GitCommand,
    default_label: &'static str,
    fields: &'static [FieldSpec],
) -> NodeTemplate {
    NodeTemplate {
        variant: NodeVariant::Git(command),
        default_label,
        default_metadata: &[],
        style: NEUTRAL,
        fields,
    }
}

const fn git_edge(link: GitLink) -> EdgeTemplate {
    EdgeTemplate {
        variant: EdgeVariant::Git(link),
        default_label: None,
        fields: &[],
    }
}

static GIT_GRAPH: DiagramTemplate = DiagramTemplate {
    diagram_type: DiagramType::GitGraph,
    display_name: "Git graph",
    node_variants: &[
        git_node(GitCommand::Commit, "commit", COMMIT_FIELDS),
        git_node(GitCommand::Branch, "branch", BRANCH_FIELDS),
        git_node(
            GitCommand::Checkout,
            "checkout",
            &[FieldSpec {
                key: keys::BRANCH_NAME,
                label: "Branch",
                kind: FieldKind::Text,
            }],
        ),
        git_node(GitCommand::Merge, "merge", COMMIT_FIELDS),
        git_node(
            GitCommand::CherryPick,
            "cherry-pick",
            &[
                FieldSpec {
                    key: keys::SOURCE_COMMIT_ID,
                    label: "Commit",
                    kind: FieldKind::Text,
                },
                FieldSpec {
                    key: keys::PARENT_COMMIT_ID,
                    label: "Parent",
                    kind: FieldKind::Text,
                },
                FieldSpec {
                    key: keys::TAG,
                    label: "Tag",
                    kind: FieldKind::Text,
                },
            ],
        ),
    ],
    edge_variants: &[
        git_edge(GitLink::Commit),
        git_edge(GitLink::BranchCreate),
        git_edge(GitLink::Checkout),
        git_edge(GitLink::Merge),
        git_edge(GitLink::CherryPick),
    ],
    starter: "gitGraph LR:\n    commit id: \"init\"\n    branch develop\n    commit id: \"feature\"\n    checkout main\n    merge develop\n",
};

#[cfg(test)]
mod tests {
    use super::{FieldKind, template};
    use crate::{DiagramType, NodeVariant};

    #[test]
    fn every_template_belongs_to_its_type() {
        for diagram_type in DiagramType::ALL {
            let entry = template(diagram_type);
            assert_eq!(entry.diagram_type, diagram_type);
            assert_eq!(entry.default_config().diagram_type(), diagram_type);
            assert!(!entry.node_variants.is_empty(), "{diagram_type} has no nodes");
            assert!(!entry.starter.trim().is_empty());
            for node in entry.node_variants {
                assert_eq!(node.variant.diagram_type(), diagram_type);
            }
            for edge in entry.edge_variants {
                assert_eq!(edge.variant.diagram_type(), diagram_type);
            }
        }
    }

    #[test]
    fn default_node_variant_has_a_template() {
        for diagram_type in DiagramType::ALL {
            let variant = NodeVariant::default_for(diagram_type);
            assert!(
                template(diagram_type).node_template(variant).is_some(),
                "missing template for {variant:?}"
            );
        }
    }

    #[test]
    fn variants_are_listed_once() {
        for diagram_type in DiagramType::ALL {
            let nodes = template(diagram_type).node_variants;
            for (index, node) in nodes.iter().enumerate() {
                assert!(nodes[index + 1..].iter().all(|other| other.variant != node.variant));
            }
        }
    }

    #[test]
    fn choice_fields_offer_options() {
        for diagram_type in DiagramType::ALL {
            for node in template(diagram_type).node_variants {
                for field in node.fields {
                    if let FieldKind::Choice(options) = field.kind {
                        assert!(!options.is_empty(), "{} has no options", field.key);
                    }
                }
            }
        }
    }

    #[test]
    fn starters_open_with_their_header() {
        for diagram_type in DiagramType::ALL {
            let starter = template(diagram_type).starter;
            assert!(
                starter.starts_with(diagram_type.header_keyword()),
                "{diagram_type} starter: {starter}"
            );
        }
    }
}
