//! Metadata keys shared by parsers, serializers and the editor.

// styling (flowchart nodes and edges)
pub const FILL: &str = "fill";
pub const STROKE: &str = "stroke";
pub const COLOR: &str = "color";
pub const STYLE_EXTRA: &str = "styleExtra";
pub const CSS_CLASS: &str = "cssClass";
pub const HREF: &str = "href";
/// String array of subgraph ids a flowchart node belongs to.
pub const SUBGRAPHS: &str = "subgraphs";

// class diagrams
pub const STEREOTYPE: &str = "stereotype";
pub const GENERIC: &str = "generic";
pub const MEMBERS: &str = "members";
pub const METHODS: &str = "methods";
pub const SOURCE_CARDINALITY: &str = "sourceCardinality";
pub const TARGET_CARDINALITY: &str = "targetCardinality";
/// Exact relationship symbol as written in the source.
pub const ARROW: &str = "arrow";

// state diagrams
pub const PARENT: &str = "parent";

// entity-relationship diagrams
pub const ATTRIBUTES: &str = "attributes";
pub const CARDINALITY: &str = "cardinality";

// gantt
pub const SECTION: &str = "section";
pub const TASK_ID: &str = "taskId";
pub const STATUS: &str = "status";
pub const START: &str = "start";
pub const END: &str = "end";
pub const DURATION: &str = "duration";
pub const DEPENDS_ON: &str = "dependsOn";
pub const UNTIL: &str = "until";

// pie
pub const VALUE: &str = "value";

// sequence
pub const ACTIVATION: &str = "activation";

// git graphs
pub const BRANCH_ID: &str = "branchId";
pub const BRANCH_NAME: &str = "branchName";
pub const TARGET_BRANCH_ID: &str = "targetBranchId";
pub const PARENT_BRANCH_ID: &str = "parentBranchId";
pub const MERGED_BRANCH_ID: &str = "mergedBranchId";
pub const COMMIT_ID: &str = "commitId";
pub const MESSAGE: &str = "message";
pub const TAG: &str = "tag";
pub const COMMIT_TYPE: &str = "commitType";
pub const ORDER: &str = "order";
pub const SEQUENCE: &str = "sequence";
pub const SOURCE_COMMIT_ID: &str = "sourceCommitId";
pub const PARENT_COMMIT_ID: &str = "parentCommitId";
