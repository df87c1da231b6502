use chumsky::prelude::*;
use ido_core::{
    DiagramConfig, EdgeVariant, GitCommand, GitLink, GraphDirection, HasMetadata, NodeVariant,
    keys,
};
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::builder::ModelBuilder;
use crate::text::{extract_quoted_value, is_comment, strip_inline_comment, unsupported};

type Extra<'a> = extra::Err<Rich<'a, char>>;

/// `key: value` pairs following a command keyword. Values are bare tokens or
/// double-quoted strings.
fn attribute_list<'a>() -> impl Parser<'a, &'a str, Vec<(&'a str, &'a str)>, Extra<'a>> {
    let ws = any().filter(|c: &char| c.is_whitespace()).repeated();
    let key = any()
        .filter(|c: &char| c.is_ascii_alphabetic())
        .repeated()
        .at_least(1)
        .to_slice();
    let quoted = just('"')
        .ignore_then(any().filter(|c: &char| *c != '"').repeated().to_slice())
        .then_ignore(just('"'));
    let bare = any()
        .filter(|c: &char| !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice();
    key.then_ignore(ws.clone())
        .then_ignore(just(':'))
        .then_ignore(ws.clone())
        .then(choice((quoted, bare)))
        .padded_by(ws)
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
}

#[derive(Debug, Default)]
struct BranchState {
    node_id: Option<String>,
    /// Commit the branch was created from.
    base: Option<String>,
    /// Last commit made on the branch itself.
    head: Option<String>,
}

impl BranchState {
    fn last_commit(&self) -> Option<String> {
        self.head.clone().or_else(|| self.base.clone())
    }
}

/// Branch lineage for one git-graph parse.
struct Lineage {
    main: String,
    branches: FxHashMap<String, BranchState>,
    current: String,
    pending_checkout: Option<String>,
    sequence: u64,
}

impl Lineage {
    fn new(main: String) -> Self {
        let mut branches = FxHashMap::default();
        branches.insert(main.clone(), BranchState::default());
        Self {
            current: main.clone(),
            main,
            branches,
            pending_checkout: None,
            sequence: 0,
        }
    }

    fn knows(&self, name: &str) -> bool {
        self.branches.contains_key(name)
    }

    /// Model-level id of a branch: the main branch name, or the branch node id.
    fn branch_id(&self, name: &str) -> String {
        if name == self.main {
            return self.main.clone();
        }
        self.branches
            .get(name)
            .and_then(|branch| branch.node_id.clone())
            .unwrap_or_else(|| name.to_string())
    }

    fn last_commit(&self, name: &str) -> Option<String> {
        self.branches.get(name).and_then(BranchState::last_commit)
    }

    fn current_mut(&mut self) -> &mut BranchState {
        self.branches.entry(self.current.clone()).or_default()
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

struct GitParser<'b> {
    builder: &'b mut ModelBuilder,
    lineage: Lineage,
}

pub(crate) fn parse_gitgraph(input: &str, builder: &mut ModelBuilder) {
    let main = builder
        .preamble()
        .config_value("gitGraph", "mainBranchName")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("main")
        .to_string();
    if let DiagramConfig::GitGraph(config) = builder.config_mut() {
        config.main_branch = main.clone();
    }

    let mut parser = GitParser {
        builder,
        lineage: Lineage::new(main),
    };
    let mut lines = input.lines().enumerate();
    let mut after_options = false;

    while let Some((index, line)) = lines.next() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        let content = strip_inline_comment(trimmed);
        if std::mem::take(&mut after_options) && content == "end" {
            continue;
        }
        if keyword_rest(content, "options").is_some() {
            let raw = read_options_block(content, &mut lines);
            if let DiagramConfig::GitGraph(config) = parser.builder.config_mut() {
                config.options = Some(raw);
            }
            after_options = true;
            continue;
        }
        parser.line(line_number, content);
    }
}

/// Consume an `options { ... }` block by brace depth, returning its raw text.
fn read_options_block<'a>(
    first_line: &'a str,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
) -> String {
    let mut depth = 0_i64;
    let mut opened = false;
    let mut raw: Vec<&str> = Vec::new();
    let mut take = |text: &'a str, depth: &mut i64, opened: &mut bool| {
        for ch in text.chars() {
            match ch {
                '{' => {
                    *depth += 1;
                    *opened = true;
                }
                '}' => *depth -= 1,
                _ => {}
            }
        }
        if !text.trim().is_empty() {
            raw.push(text);
        }
    };

    let rest = first_line["options".len()..].trim();
    take(rest, &mut depth, &mut opened);
    while !(opened && depth <= 0) {
        let Some((_, line)) = lines.next() else {
            break;
        };
        take(line, &mut depth, &mut opened);
    }
    raw.join("\n")
}

fn keyword_rest<'a>(content: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = content.strip_prefix(keyword)?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then(|| rest.trim())
}

/// Branch name at the start of `rest` (bare or quoted) and the text after it.
fn split_name(rest: &str) -> Option<(String, &str)> {
    let rest = rest.trim();
    if rest.starts_with('"') {
        let (name, after) = extract_quoted_value(rest)?;
        let name = name.trim().to_string();
        return (!name.is_empty()).then_some((name, after));
    }
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let name = &rest[..end];
    (!name.is_empty()).then(|| (name.to_string(), &rest[end..]))
}

impl GitParser<'_> {
    fn line(&mut self, line_number: usize, content: &str) {
        let first = content.split_whitespace().next().unwrap_or_default();
        let rest = content[first.len()..].trim();
        if first.to_ascii_lowercase().starts_with("gitgraph") {
            self.header(content);
            return;
        }
        match first {
            "commit" => self.commit(line_number, content, rest),
            "branch" => self.branch(line_number, content, rest),
            "checkout" | "switch" => self.checkout(line_number, content, rest),
            "merge" => self.merge(line_number, content, rest),
            "cherry-pick" => self.cherry_pick(line_number, content, rest),
            _ => self
                .builder
                .add_warning(unsupported(line_number, "gitGraph", content)),
        }
    }

    fn header(&mut self, content: &str) {
        let rest = content.get("gitgraph".len()..).unwrap_or_default().trim_start();
        let token = rest
            .split(|ch: char| ch.is_whitespace() || ch == ':')
            .next()
            .unwrap_or_default();
        if let Some(direction) = GraphDirection::parse(token)
            && let DiagramConfig::GitGraph(config) = self.builder.config_mut()
        {
            config.direction = direction;
        }
    }

    fn attributes<'a>(
        &mut self,
        line_number: usize,
        content: &str,
        rest: &'a str,
    ) -> Option<FxHashMap<&'a str, &'a str>> {
        let (pairs, errors) = attribute_list().parse(rest).into_output_errors();
        match pairs {
            Some(pairs) if errors.is_empty() => Some(pairs.into_iter().collect()),
            _ => {
                self.builder
                    .add_warning(unsupported(line_number, "gitGraph", content));
                None
            }
        }
    }

    fn warn_unknown_attributes(
        &mut self,
        line_number: usize,
        command: &str,
        attributes: &FxHashMap<&str, &str>,
        allowed: &[&str],
    ) {
        let mut unknown: Vec<&str> = attributes
            .keys()
            .copied()
            .filter(|key| !allowed.contains(key))
            .collect();
        unknown.sort_unstable();
        for key in unknown {
            self.builder.add_warning(format!(
                "Line {line_number}: unknown {command} attribute '{key}' ignored"
            ));
        }
    }

    /// Node for a command that may carry a commit id. Ids are registered so
    /// later cherry-picks can find them; a repeated id gets a fresh node.
    fn command_node(
        &mut self,
        line_number: usize,
        commit_id: Option<&str>,
        fallback_base: &str,
        label: &str,
        command: GitCommand,
    ) -> String {
        let variant = NodeVariant::Git(command);
        match commit_id {
            Some(id) if self.builder.resolve_scoped("commit", id).is_none() => {
                self.builder.intern_scoped("commit", id, Some(label), Some(variant))
            }
            Some(id) => {
                self.builder.add_warning(format!(
                    "Line {line_number}: duplicate commit id '{id}'"
                ));
                self.builder.create_node(id, label, variant)
            }
            None => self.builder.create_node(fallback_base, label, variant),
        }
    }

    fn stamp(&mut self, node_id: &str, branch_id: String, fields: &[(&str, Option<&str>)]) {
        let sequence = self.lineage.next_sequence();
        if let Some(node) = self.builder.node_mut(node_id) {
            node.set_meta(keys::SEQUENCE, sequence);
            node.set_meta(keys::BRANCH_ID, branch_id);
            for (key, value) in fields {
                if let Some(value) = value {
                    node.set_meta(key, *value);
                }
            }
        }
    }

    fn link(&mut self, source: Option<&str>, target: &str, link: GitLink) {
        if let Some(source) = source {
            self.builder
                .push_edge(source, target, EdgeVariant::Git(link), None);
        }
    }

    fn commit(&mut self, line_number: usize, content: &str, rest: &str) {
        let Some(attributes) = self.attributes(line_number, content, rest) else {
            return;
        };
        self.warn_unknown_attributes(line_number, "commit", &attributes, &["id", "msg", "tag", "type"]);
        let commit_id = attributes.get("id").copied();
        let message = attributes.get("msg").copied();
        let label = commit_id.or(message).unwrap_or("commit");
        let node_id = self.command_node(line_number, commit_id, "commit", label, GitCommand::Commit);

        let branch_id = self.lineage.branch_id(&self.lineage.current.clone());
        self.stamp(
            &node_id,
            branch_id,
            &[
                (keys::COMMIT_ID, commit_id),
                (keys::MESSAGE, message),
                (keys::TAG, attributes.get("tag").copied()),
                (keys::COMMIT_TYPE, attributes.get("type").copied()),
            ],
        );

        let head = self.lineage.current_mut().head.clone();
        self.link(head.as_deref(), &node_id, GitLink::Commit);
        if let Some(source) = self.lineage.pending_checkout.take()
            && head.as_deref() != Some(source.as_str())
        {
            self.link(Some(&source), &node_id, GitLink::Checkout);
        }
        self.lineage.current_mut().head = Some(node_id);
    }

    fn branch(&mut self, line_number: usize, content: &str, rest: &str) {
        let Some((name, after)) = split_name(rest) else {
            self.builder
                .add_warning(unsupported(line_number, "gitGraph", content));
            return;
        };
        let Some(attributes) = self.attributes(line_number, content, after) else {
            return;
        };
        if self.lineage.knows(&name) {
            self.builder.add_warning(format!(
                "Line {line_number}: branch '{name}' already exists; command skipped"
            ));
            return;
        }
        self.warn_unknown_attributes(line_number, "branch", &attributes, &["order"]);

        let node_id = self.builder.intern_scoped(
            "branch",
            &name,
            Some(&name),
            Some(NodeVariant::Git(GitCommand::Branch)),
        );
        let parent = self.lineage.current.clone();
        let parent_id = self.lineage.branch_id(&parent);
        let inherited = self.lineage.last_commit(&parent);
        self.stamp(
            &node_id,
            node_id.clone(),
            &[
                (keys::BRANCH_NAME, Some(name.as_str())),
                (keys::PARENT_BRANCH_ID, Some(parent_id.as_str())),
            ],
        );
        if let Some(order) = attributes.get("order")
            && let Some(node) = self.builder.node_mut(&node_id)
        {
            match order.parse::<u64>() {
                Ok(order) => node.set_meta(keys::ORDER, order),
                Err(_) => node.set_meta(keys::ORDER, *order),
            }
        }

        self.link(inherited.as_deref(), &node_id, GitLink::BranchCreate);
        self.lineage.branches.insert(
            name.clone(),
            BranchState {
                node_id: Some(node_id),
                base: inherited.clone(),
                head: None,
            },
        );
        self.lineage.current = name;
        self.lineage.pending_checkout = inherited;
    }

    fn checkout(&mut self, line_number: usize, content: &str, rest: &str) {
        let Some((name, _)) = split_name(rest).filter(|(_, after)| after.trim().is_empty()) else {
            self.builder
                .add_warning(unsupported(line_number, "gitGraph", content));
            return;
        };
        if !self.lineage.knows(&name) {
            self.builder.add_warning(format!(
                "Line {line_number}: cannot checkout unknown branch '{name}'"
            ));
            return;
        }

        let node_id = self.builder.create_node(
            &format!("checkout_{name}"),
            &name,
            NodeVariant::Git(GitCommand::Checkout),
        );
        let target_id = self.lineage.branch_id(&name);
        self.stamp(
            &node_id,
            target_id.clone(),
            &[(keys::TARGET_BRANCH_ID, Some(target_id.as_str()))],
        );

        let branch_node = self
            .lineage
            .branches
            .get(&name)
            .and_then(|branch| branch.node_id.clone());
        let source_commit = self.lineage.last_commit(&self.lineage.current.clone());
        self.link(branch_node.as_deref(), &node_id, GitLink::Checkout);
        self.link(source_commit.as_deref(), &node_id, GitLink::Checkout);

        self.lineage.current = name;
        self.lineage.pending_checkout = Some(node_id);
    }

    fn merge(&mut self, line_number: usize, content: &str, rest: &str) {
        let Some((name, after)) = split_name(rest) else {
            self.builder
                .add_warning(unsupported(line_number, "gitGraph", content));
            return;
        };
        let Some(attributes) = self.attributes(line_number, content, after) else {
            return;
        };
        if !self.lineage.knows(&name) {
            self.builder.add_warning(format!(
                "Line {line_number}: cannot merge unknown branch '{name}'"
            ));
            return;
        }
        if name == self.lineage.current {
            self.builder.add_warning(format!(
                "Line {line_number}: cannot merge branch '{name}' into itself"
            ));
            return;
        }
        self.warn_unknown_attributes(line_number, "merge", &attributes, &["id", "tag", "type"]);

        let commit_id = attributes.get("id").copied();
        let label = commit_id.unwrap_or(&name);
        let node_id = self.command_node(
            line_number,
            commit_id,
            &format!("merge_{name}"),
            label,
            GitCommand::Merge,
        );
        let merged_id = self.lineage.branch_id(&name);
        let branch_id = self.lineage.branch_id(&self.lineage.current.clone());
        self.stamp(
            &node_id,
            branch_id,
            &[
                (keys::MERGED_BRANCH_ID, Some(merged_id.as_str())),
                (keys::COMMIT_ID, commit_id),
                (keys::TAG, attributes.get("tag").copied()),
                (keys::COMMIT_TYPE, attributes.get("type").copied()),
            ],
        );

        let merged_commit = self.lineage.last_commit(&name);
        let current_commit = self.lineage.last_commit(&self.lineage.current.clone());
        self.link(merged_commit.as_deref(), &node_id, GitLink::Merge);
        if current_commit != merged_commit {
            self.link(current_commit.as_deref(), &node_id, GitLink::Merge);
        }
        self.lineage.current_mut().head = Some(node_id);
        self.lineage.pending_checkout = None;
    }

    fn cherry_pick(&mut self, line_number: usize, content: &str, rest: &str) {
        let Some(attributes) = self.attributes(line_number, content, rest) else {
            return;
        };
        let Some(picked) = attributes.get("id").copied() else {
            self.builder.add_warning(format!(
                "Line {line_number}: cherry-pick requires an id; command skipped"
            ));
            return;
        };
        let Some(picked_node) = self.builder.resolve_scoped("commit", picked) else {
            self.builder.add_warning(format!(
                "Line {line_number}: cherry-pick references unknown commit '{picked}'"
            ));
            return;
        };
        self.warn_unknown_attributes(line_number, "cherry-pick", &attributes, &["id", "parent", "tag"]);

        let node_id = self.builder.create_node(
            &format!("cherry_pick_{picked}"),
            picked,
            NodeVariant::Git(GitCommand::CherryPick),
        );
        let branch_id = self.lineage.branch_id(&self.lineage.current.clone());
        self.stamp(
            &node_id,
            branch_id,
            &[
                (keys::SOURCE_COMMIT_ID, Some(picked)),
                (keys::PARENT_COMMIT_ID, attributes.get("parent").copied()),
                (keys::TAG, attributes.get("tag").copied()),
            ],
        );

        let head = self.lineage.current_mut().head.clone();
        self.link(Some(&picked_node), &node_id, GitLink::CherryPick);
        self.link(head.as_deref(), &node_id, GitLink::Commit);
        self.lineage.current_mut().head = Some(node_id);
        self.lineage.pending_checkout = None;
    }
}

#[cfg(test)]
mod tests {
    use chumsky::Parser;
    use ido_core::{
        DiagramConfig, EdgeVariant, GitCommand, GitLink, GraphDirection, GraphModel, HasMetadata,
        NodeVariant, keys,
    };

    use super::attribute_list;
    use crate::parse;

    fn has_edge(model: &GraphModel, source: &str, target: &str, link: GitLink) -> bool {
        model.edges.iter().any(|edge| {
            edge.source == source && edge.target == target && edge.variant == EdgeVariant::Git(link)
        })
    }

    fn branch_of<'m>(model: &'m GraphModel, id: &str) -> Option<&'m str> {
        model.node(id).and_then(|node| node.meta_str(keys::BRANCH_ID))
    }

    #[test]
    fn attribute_lists_accept_quoted_and_bare_values() {
        let parsed = attribute_list()
            .parse(r#"id: "a b" tag:"v1" type: HIGHLIGHT"#)
            .into_result()
            .expect("attributes parse");
        assert_eq!(parsed, vec![("id", "a b"), ("tag", "v1"), ("type", "HIGHLIGHT")]);
        assert!(attribute_list().parse("id \"x\"").into_result().is_err());
    }

    #[test]
    fn first_commit_on_new_branch_gets_checkout_edge() {
        let model = parse("gitGraph\ncommit id:\"A\"\nbranch feature\ncommit id:\"B\"");
        assert!(model.warnings.is_empty(), "{:?}", model.warnings);
        assert!(has_edge(&model, "A", "feature", GitLink::BranchCreate));
        assert!(has_edge(&model, "A", "B", GitLink::Checkout));
        assert!(!has_edge(&model, "A", "B", GitLink::Commit));
        assert_eq!(branch_of(&model, "B"), Some("feature"));
    }

    #[test]
    fn checkout_back_to_main_keeps_earlier_branch_ids() {
        let model = parse(
            "gitGraph LR:\n  commit id: \"A\"\n  commit id: \"B\"\n  branch \"feature/login\"\n  checkout \"feature/login\"\n  commit id: \"C\"\n  checkout main\n  commit id: \"D\"",
        );
        assert!(model.warnings.is_empty(), "{:?}", model.warnings);
        assert_eq!(branch_of(&model, "A"), Some("main"));
        assert_eq!(branch_of(&model, "B"), Some("main"));
        assert_eq!(branch_of(&model, "C"), Some("feature_login"));
        assert_eq!(branch_of(&model, "D"), Some("main"));

        let branch = model.node("feature_login").expect("branch node");
        assert_eq!(branch.label, "feature/login");
        assert_eq!(branch.meta_str(keys::BRANCH_NAME), Some("feature/login"));
        assert_eq!(branch.meta_str(keys::PARENT_BRANCH_ID), Some("main"));

        assert!(has_edge(&model, "A", "B", GitLink::Commit));
        assert!(has_edge(&model, "B", "D", GitLink::Commit));
        assert!(has_edge(&model, "C", "checkout_main", GitLink::Checkout));
        assert!(has_edge(&model, "checkout_main", "D", GitLink::Checkout));
        assert!(has_edge(&model, "feature_login", "checkout_feature_login", GitLink::Checkout));
    }

    #[test]
    fn sequence_numbers_are_monotonic() {
        let model = parse("gitGraph\ncommit\nbranch dev\ncommit\ncheckout main\nmerge dev");
        let sequences: Vec<u64> = model
            .nodes
            .iter()
            .filter_map(|node| node.meta_u64(keys::SEQUENCE))
            .collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn merges_link_both_branch_heads() {
        let model = parse(
            "gitGraph\ncommit id: \"A\"\nbranch dev\ncommit id: \"B\"\ncheckout main\ncommit id: \"C\"\nmerge dev id: \"M\" tag: \"v1\"",
        );
        assert!(model.warnings.is_empty(), "{:?}", model.warnings);
        let merge = model.node("M").expect("merge node");
        assert_eq!(merge.variant, NodeVariant::Git(GitCommand::Merge));
        assert_eq!(merge.meta_str(keys::MERGED_BRANCH_ID), Some("dev"));
        assert_eq!(merge.meta_str(keys::TAG), Some("v1"));
        assert!(has_edge(&model, "B", "M", GitLink::Merge));
        assert!(has_edge(&model, "C", "M", GitLink::Merge));
    }

    #[test]
    fn cherry_pick_links_picked_commit_and_head() {
        let model = parse(
            "gitGraph\ncommit id: \"A\"\nbranch dev\ncommit id: \"B\"\ncheckout main\ncommit id: \"C\"\ncherry-pick id: \"B\" parent: \"A\"",
        );
        assert!(model.warnings.is_empty(), "{:?}", model.warnings);
        let pick = model.node("cherry_pick_B").expect("cherry-pick node");
        assert_eq!(pick.meta_str(keys::SOURCE_COMMIT_ID), Some("B"));
        assert_eq!(pick.meta_str(keys::PARENT_COMMIT_ID), Some("A"));
        assert!(has_edge(&model, "B", "cherry_pick_B", GitLink::CherryPick));
        assert!(has_edge(&model, "C", "cherry_pick_B", GitLink::Commit));
    }

    #[test]
    fn invalid_commands_warn_and_are_skipped() {
        let model = parse(
            "gitGraph\ncommit\ncheckout nowhere\nmerge main\nmerge ghost\ncherry-pick tag: \"x\"\ncherry-pick id: \"zzz\"\nbranch main\nrebase x",
        );
        assert_eq!(model.nodes.len(), 1);
        assert_eq!(model.warnings.len(), 7, "{:?}", model.warnings);
        assert!(model.warnings[0].contains("unknown branch 'nowhere'"));
        assert!(model.warnings[1].contains("into itself"));
        assert!(model.warnings[2].contains("unknown branch 'ghost'"));
        assert!(model.warnings[3].contains("requires an id"));
        assert!(model.warnings[4].contains("unknown commit 'zzz'"));
        assert!(model.warnings[5].contains("branch 'main' already exists"));
        assert!(model.warnings[6].starts_with("Line 9: unsupported gitGraph syntax"));
    }

    #[test]
    fn options_block_and_main_branch_override() {
        let model = parse(
            "%%{init: {'gitGraph': {'mainBranchName': 'trunk'}}}%%\ngitGraph TB:\noptions\n{\n  \"nodeSpacing\": 150\n}\nend\ncommit\nbranch dev\ncheckout trunk\ncommit",
        );
        assert!(model.warnings.is_empty(), "{:?}", model.warnings);
        let DiagramConfig::GitGraph(config) = &model.config else {
            panic!("git config");
        };
        assert_eq!(config.main_branch, "trunk");
        assert_eq!(config.direction, GraphDirection::TB);
        assert_eq!(config.options.as_deref(), Some("{\n  \"nodeSpacing\": 150\n}"));
        let last = model.nodes.last().expect("last commit");
        assert_eq!(last.meta_str(keys::BRANCH_ID), Some("trunk"));
    }
}
