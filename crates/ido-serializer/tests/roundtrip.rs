use ido_core::{DiagramType, EdgeVariant, GraphModel, HasMetadata, NodeVariant, keys, registry};
use ido_parser::{parse, parse_as};
use ido_serializer::serialize;
use proptest::prelude::*;

type NodeKey = (String, NodeVariant, String);
type EdgeKey = (String, String, EdgeVariant, Option<String>);

/// Order-insensitive view of what a diagram means.
fn signature(model: &GraphModel) -> (Vec<NodeKey>, Vec<EdgeKey>) {
    let mut nodes: Vec<NodeKey> = model
        .nodes
        .iter()
        .map(|node| (node.id.clone(), node.variant, node.label.clone()))
        .collect();
    nodes.sort_by(|a, b| a.0.cmp(&b.0));
    let mut edges: Vec<EdgeKey> = model
        .edges
        .iter()
        .map(|edge| {
            (
                edge.source.clone(),
                edge.target.clone(),
                edge.variant,
                edge.label.clone(),
            )
        })
        .collect();
    edges.sort_by(|a, b| (&a.0, &a.1, &a.3).cmp(&(&b.0, &b.1, &b.3)));
    (nodes, edges)
}

fn assert_round_trip(source: &str) -> GraphModel {
    let model = parse(source);
    let output = serialize(&model).expect("serializes");
    assert!(output.warnings.is_empty(), "{source}\n{:?}", output.warnings);
    let reparsed = parse(&output.code);
    assert_eq!(reparsed.diagram_type, model.diagram_type, "{}", output.code);
    assert!(reparsed.warnings.is_empty(), "{}\n{:?}", output.code, reparsed.warnings);
    assert_eq!(signature(&reparsed), signature(&model), "{}", output.code);
    assert_eq!(reparsed.config, model.config, "{}", output.code);
    reparsed
}

#[test]
fn every_starter_survives_a_round_trip() {
    for diagram_type in DiagramType::ALL {
        assert_round_trip(registry::template(diagram_type).starter);
    }
}

#[test]
fn second_serialization_is_stable() {
    for diagram_type in DiagramType::ALL {
        let first = serialize(&parse(registry::template(diagram_type).starter))
            .expect("serializes")
            .code;
        let second = serialize(&parse(&first)).expect("serializes").code;
        assert_eq!(first, second, "{diagram_type}");
    }
}

#[test]
fn flowchart_with_subgraphs_styles_and_entities() {
    let reparsed = assert_round_trip(
        "flowchart LR\n  classDef hot fill:#f00\n  subgraph outer [Outer]\n    subgraph inner\n      a[\"say #quot;hi#quot;\"] -->|yes| b{{Hex}}\n    end\n    c[(Store)]\n  end\n  b ==> c & d[/Flag/]\n  style a fill:#0f0,stroke:#333\n  class c hot\n  click d href \"https://example.com\"",
    );
    assert_eq!(reparsed.subgraphs.len(), 2);
    assert_eq!(
        reparsed.subgraph("inner").and_then(|sg| sg.parent.as_deref()),
        Some("outer")
    );
    assert_eq!(reparsed.node("a").map(|node| node.label.as_str()), Some("say \"hi\""));
    assert_eq!(
        reparsed.node("c").and_then(|node| node.meta_str(keys::CSS_CLASS)),
        Some("hot")
    );
}

#[test]
fn sequence_class_state_and_er_documents() {
    assert_round_trip(
        "sequenceDiagram\n  autonumber\n  participant A as Alice\n  database D\n  A->>+D: query\n  D-->>-A: fail",
    );
    assert_round_trip(
        "classDiagram\n  direction LR\n  class Shape {\n    <<interface>>\n    +area() double\n  }\n  Shape <|.. Circle\n  Circle \"1\" o-- \"*\" Point : centre",
    );
    assert_round_trip("stateDiagram-v2\n  [*] --> root\n  state root {\n    [*] --> A\n  }");
    assert_round_trip(
        "stateDiagram-v2\n  [*] --> Off\n  state On {\n    [*] --> Warm\n    Warm --> Hot : heat\n  }\n  Off --> On\n  On --> [*]\n  state fork_a <<fork>>",
    );
    assert_round_trip(
        "erDiagram\n  USER {\n    uuid id PK\n    string email UK \"login\"\n  }\n  USER |o--o{ SESSION : opens\n  SESSION }|..|| DEVICE : \"\"",
    );
}

#[test]
fn gantt_and_pie_documents() {
    assert_round_trip(
        "gantt\n  dateFormat YYYY-MM-DD\n  axisFormat %m/%d\n  section One\n  Spec : done, spec, 2024-03-01, 2d\n  Build : active, build, after spec, 4d\n  section Two\n  Test : test, 2024-03-08, until ship\n  Ship : milestone, ship, after build test, 0d",
    );
    assert_round_trip("pie showData\n  title Browsers\n  \"Firefox\" : 21.5\n  \"Other\" : 3");
}

#[test]
fn feature_branch_history_keeps_lineage() {
    let source = "gitGraph\n  commit id: \"setup\"\n  branch feature/login\n  checkout feature/login\n  commit id: \"form\"\n  commit id: \"validation\" tag: \"rc1\"\n  checkout main\n  commit id: \"hotfix\" type: REVERSE\n  merge feature/login id: \"merge-login\"\n  branch release\n  cherry-pick id: \"form\"";
    let reparsed = assert_round_trip(source);
    let merge = reparsed.node("merge-login").expect("merge node");
    assert_eq!(merge.variant, NodeVariant::Git(ido_core::GitCommand::Merge));
    assert_eq!(merge.meta_str(keys::BRANCH_ID), Some("main"));
    let sequences: Vec<u64> = reparsed
        .nodes
        .iter()
        .filter_map(|node| node.meta_u64(keys::SEQUENCE))
        .collect();
    assert!(sequences.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn preamble_survives() {
    let source = "---\ntitle: Flow\n---\n%%{init: {\"theme\": \"dark\"}}%%\nflowchart TD\n  A --> B";
    let model = parse(source);
    let reparsed = assert_round_trip(source);
    assert_eq!(reparsed.preamble, model.preamble);
    assert_eq!(reparsed.preamble.title.as_deref(), Some("Flow"));
}

#[test]
fn malformed_documents_warn_but_still_serialize() {
    for source in [
        "flowchart TD\n  A --> \n  B",
        "sequenceDiagram\n  @@@ !!!",
        "classDiagram\n  @@@ !!!",
        "stateDiagram-v2\n  @@@ !!!",
        "erDiagram\n  @@@ !!!",
        "gantt\n  no colon here",
        "pie\n  \"Bad\" lots",
        "gitGraph\n  merge ghost\n  checkout ghost",
    ] {
        let model = parse(source);
        assert!(!model.warnings.is_empty(), "{source}");
        let output = serialize(&model).expect("serializes");
        assert!(parse(&output.code).check().is_ok(), "{}", output.code);
    }
}

const LINKS: [&str; 4] = ["-->", "---", "-.->", "==>"];

fn render_flowchart(labels: &[String], links: &[(usize, usize, usize, Option<String>)]) -> String {
    let mut source = "flowchart TD\n".to_string();
    for (index, label) in labels.iter().enumerate() {
        source.push_str(&format!("  n{index}[\"{label}\"]\n"));
    }
    for (from, to, kind, label) in links {
        let (from, to) = (from % labels.len(), to % labels.len());
        match label {
            Some(label) => source.push_str(&format!("  n{from} -->|{label}| n{to}\n")),
            None => source.push_str(&format!("  n{from} {} n{to}\n", LINKS[kind % LINKS.len()])),
        }
    }
    source
}

/// Ops: 0 commit, 1 new branch, 2 checkout, 3 merge. Merges into the current
/// branch itself are left out.
fn render_history(ops: &[(u8, usize)]) -> String {
    let mut branches = vec!["main".to_string()];
    let mut current = 0;
    let mut source = "gitGraph\n  commit\n".to_string();
    for &(op, pick) in ops {
        match op {
            0 => source.push_str("  commit\n"),
            1 => {
                let name = format!("b{}", branches.len());
                source.push_str(&format!("  branch {name}\n"));
                branches.push(name);
                current = branches.len() - 1;
            }
            2 => {
                current = pick % branches.len();
                source.push_str(&format!("  checkout {}\n", branches[current]));
            }
            _ => {
                let merged = pick % branches.len();
                if merged != current {
                    source.push_str(&format!("  merge {}\n", branches[merged]));
                }
            }
        }
    }
    source
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_generated_flowcharts_keep_their_signature(
        labels in prop::collection::vec("[A-Za-z][A-Za-z0-9]{0,9}", 1..6),
        links in prop::collection::vec(
            (0_usize..6, 0_usize..6, 0_usize..4, prop::option::of("[a-z]{1,6}")),
            0..10,
        ),
    ) {
        let source = render_flowchart(&labels, &links);
        prop_assert!(parse(&source).warnings.is_empty(), "{}", source);
        let reparsed = assert_round_trip(&source);
        prop_assert_eq!(reparsed.edges.len(), links.len());
    }

    #[test]
    fn prop_generated_git_histories_keep_their_signature(
        ops in prop::collection::vec((0_u8..4, 0_usize..8), 0..24),
    ) {
        let source = render_history(&ops);
        let model = parse(&source);
        prop_assert!(model.warnings.is_empty(), "{}\n{:?}", source, model.warnings);
        let reparsed = assert_round_trip(&source);
        prop_assert_eq!(reparsed.nodes.len(), model.nodes.len());
    }

    #[test]
    fn prop_parsed_models_always_serialize(
        input in "[a-zA-Z0-9 :\\-\\[\\](){}|>.\"\n]{0,200}",
        index in 0_usize..8,
    ) {
        let model = parse_as(&input, DiagramType::ALL[index]);
        let output = serialize(&model);
        prop_assert!(output.is_ok());
        if let Ok(output) = output {
            let reparsed = parse_as(&output.code, model.diagram_type);
            prop_assert!(reparsed.check().is_ok());
        }
    }
}
