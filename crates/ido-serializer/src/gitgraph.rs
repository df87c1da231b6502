use ido_core::{GitCommand, GitGraphConfig, GraphModel, HasMetadata, Node, NodeVariant, keys};
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::writer::CodeWriter;
use crate::{own_edges, own_nodes};

/// Branch names that can be written without quotes.
fn is_bare_branch(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | '/'))
}

fn branch_token(name: &str) -> Option<String> {
    if is_bare_branch(name) {
        Some(name.to_string())
    } else if name.contains('"') || name.trim().is_empty() {
        None
    } else {
        Some(format!("\"{name}\""))
    }
}

/// Attribute values are always quoted; the grammar has no escape for `"`.
fn attribute(line: &mut String, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        line.push_str(&format!(" {key}: \"{}\"", value.replace('"', "'")));
    }
}

/// Commit type is a bare keyword.
fn type_attribute(line: &mut String, value: Option<&str>) {
    match value {
        Some(kind) if !kind.is_empty() && !kind.contains(char::is_whitespace) => {
            line.push_str(&format!(" type: {kind}"));
        }
        Some(_) => attribute(line, "type", value),
        None => {}
    }
}

struct Replay<'m, 'w> {
    /// Branch id to written branch name.
    names: FxHashMap<&'m str, &'m str>,
    current: &'m str,
    writer: &'w mut CodeWriter,
}

pub(crate) fn write(model: &GraphModel, config: &GitGraphConfig, writer: &mut CodeWriter) {
    writer.line(format!("gitGraph {}:", config.direction.as_str()));
    writer.indent();
    if let Some(options) = &config.options {
        writer.line("options");
        for line in options.lines() {
            writer.line(line.trim());
        }
        writer.line("end");
    }

    let mut nodes = own_nodes(model, writer);
    own_edges(model, &nodes, writer);
    // Stable sort keeps model order for unsequenced commands.
    nodes.sort_by_key(|node| node.meta_u64(keys::SEQUENCE).unwrap_or(u64::MAX));

    let mut names: FxHashMap<&str, &str> = FxHashMap::default();
    names.insert(config.main_branch.as_str(), config.main_branch.as_str());
    for node in &nodes {
        if node.variant == NodeVariant::Git(GitCommand::Branch) {
            let name = node.meta_str(keys::BRANCH_NAME).unwrap_or(&node.label);
            names.insert(node.id.as_str(), name);
        }
    }

    let mut replay = Replay {
        names,
        current: config.main_branch.as_str(),
        writer,
    };
    for node in nodes {
        let NodeVariant::Git(command) = node.variant else {
            continue;
        };
        match command {
            GitCommand::Commit => replay.commit(node),
            GitCommand::Branch => replay.branch(node),
            GitCommand::Checkout => replay.checkout(node),
            GitCommand::Merge => replay.merge(node),
            GitCommand::CherryPick => replay.cherry_pick(node),
        }
    }
    replay.writer.dedent();
}

impl<'m> Replay<'m, '_> {
    /// Written name of a known branch, as a command token.
    fn token(&mut self, node: &Node, branch_id: Option<&'m str>, role: &str) -> Option<String> {
        let Some(branch_id) = branch_id else {
            self.writer.warn(format!(
                "{} '{}' has no {role} branch and was skipped",
                command_name(node),
                node.id
            ));
            return None;
        };
        let token = self.names.get(branch_id).and_then(|name| branch_token(name));
        if token.is_none() {
            self.writer.warn(format!(
                "{} '{}' references unknown branch '{branch_id}' and was skipped",
                command_name(node),
                node.id
            ));
        }
        token
    }

    /// Switch to the branch a command ran on when the replay is elsewhere.
    /// Returns false, with a warning, when that branch was never written.
    fn move_to(&mut self, node: &Node, branch_id: Option<&'m str>) -> bool {
        let Some(branch_id) = branch_id else {
            return true;
        };
        if branch_id == self.current {
            return true;
        }
        let Some(token) = self.names.get(branch_id).and_then(|name| branch_token(name)) else {
            self.writer.warn(format!(
                "{} '{}' is on unwritten branch '{branch_id}' and was skipped",
                command_name(node),
                node.id
            ));
            return false;
        };
        self.writer.line(format!("checkout {token}"));
        self.current = branch_id;
        true
    }

    fn commit(&mut self, node: &'m Node) {
        if !self.move_to(node, node.meta_str(keys::BRANCH_ID)) {
            return;
        }
        let mut line = "commit".to_string();
        attribute(&mut line, "id", node.meta_str(keys::COMMIT_ID));
        attribute(&mut line, "msg", node.meta_str(keys::MESSAGE));
        attribute(&mut line, "tag", node.meta_str(keys::TAG));
        type_attribute(&mut line, node.meta_str(keys::COMMIT_TYPE));
        self.writer.line(line);
    }

    fn branch(&mut self, node: &'m Node) {
        let Some(token) = self.names.get(node.id.as_str()).and_then(|name| branch_token(name))
        else {
            self.writer.warn(format!(
                "branch '{}' has no writable name and was skipped",
                node.id
            ));
            self.names.remove(node.id.as_str());
            return;
        };
        if !self.move_to(node, node.meta_str(keys::PARENT_BRANCH_ID)) {
            self.names.remove(node.id.as_str());
            return;
        }
        let mut line = format!("branch {token}");
        match node.meta(keys::ORDER) {
            Some(Value::Number(order)) => line.push_str(&format!(" order: {order}")),
            Some(Value::String(order)) => attribute(&mut line, "order", Some(order)),
            _ => {}
        }
        self.writer.line(line);
        self.current = node.id.as_str();
    }

    fn checkout(&mut self, node: &'m Node) {
        let target = node.meta_str(keys::TARGET_BRANCH_ID);
        let Some(token) = self.token(node, target, "target") else {
            return;
        };
        self.writer.line(format!("checkout {token}"));
        if let Some(target) = target {
            self.current = target;
        }
    }

    fn merge(&mut self, node: &'m Node) {
        if !self.move_to(node, node.meta_str(keys::BRANCH_ID)) {
            return;
        }
        let merged = node.meta_str(keys::MERGED_BRANCH_ID);
        if merged == Some(self.current) {
            self.writer.warn(format!(
                "merge '{}' merges branch '{}' into itself and was skipped",
                node.id, self.current
            ));
            return;
        }
        let Some(token) = self.token(node, merged, "merged") else {
            return;
        };
        let mut line = format!("merge {token}");
        attribute(&mut line, "id", node.meta_str(keys::COMMIT_ID));
        attribute(&mut line, "tag", node.meta_str(keys::TAG));
        type_attribute(&mut line, node.meta_str(keys::COMMIT_TYPE));
        self.writer.line(line);
    }

    fn cherry_pick(&mut self, node: &'m Node) {
        let Some(source) = node.meta_str(keys::SOURCE_COMMIT_ID) else {
            self.writer.warn(format!(
                "cherry-pick '{}' has no source commit and was skipped",
                node.id
            ));
            return;
        };
        if !self.move_to(node, node.meta_str(keys::BRANCH_ID)) {
            return;
        }
        let mut line = "cherry-pick".to_string();
        attribute(&mut line, "id", Some(source));
        attribute(&mut line, "parent", node.meta_str(keys::PARENT_COMMIT_ID));
        attribute(&mut line, "tag", node.meta_str(keys::TAG));
        self.writer.line(line);
    }
}

fn command_name(node: &Node) -> &'static str {
    match node.variant {
        NodeVariant::Git(GitCommand::CherryPick) => "cherry-pick",
        NodeVariant::Git(command) => command.as_str(),
        _ => "command",
    }
}

#[cfg(test)]
mod tests {
    use ido_core::{
        DiagramConfig, EdgeVariant, GitCommand, GraphModel, HasMetadata, NodeVariant, keys,
    };
    use ido_parser::parse;

    use crate::serialize;

    fn edge_set(model: &GraphModel) -> Vec<(String, String, EdgeVariant)> {
        let mut edges: Vec<_> = model
            .edges
            .iter()
            .map(|edge| (edge.source.clone(), edge.target.clone(), edge.variant))
            .collect();
        edges.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        edges
    }

    #[test]
    fn commands_replay_in_sequence() {
        let source = "gitGraph LR:\ncommit id: \"a\"\nbranch develop order: 2\ncommit id: \"b\" type: HIGHLIGHT\ncheckout main\nmerge develop tag: \"v1\"\ncherry-pick id: \"b\"";
        let model = parse(source);
        assert!(model.warnings.is_empty(), "{:?}", model.warnings);
        let output = serialize(&model).expect("serializes");
        assert_eq!(
            output.code,
            "gitGraph LR:\n    commit id: \"a\"\n    branch develop order: 2\n    commit id: \"b\" type: HIGHLIGHT\n    checkout main\n    merge develop tag: \"v1\"\n    cherry-pick id: \"b\"\n"
        );

        let reparsed = parse(&output.code);
        assert_eq!(edge_set(&reparsed), edge_set(&model));
    }

    #[test]
    fn implicit_checkouts_follow_branch_ids() {
        let mut model = parse("gitGraph\ncommit\nbranch feature/login\ncommit msg: \"form\"\ncheckout main\ncommit");
        // Drop the explicit checkout; the replay must still land on main.
        model
            .nodes
            .retain(|node| node.variant != NodeVariant::Git(GitCommand::Checkout));
        let output = serialize(&model).expect("serializes");
        assert!(
            output.code.ends_with("    commit msg: \"form\"\n    checkout main\n    commit\n"),
            "{}",
            output.code
        );
    }

    #[test]
    fn quoting_options_and_renamed_main() {
        let source = "---\nconfig:\n  gitGraph:\n    mainBranchName: trunk\n---\ngitGraph TB:\noptions\n{\n  \"nodeSpacing\": 150\n}\nend\ncommit msg: \"first\"\nbranch \"release 1\"\ncommit";
        let model = parse(source);
        let output = serialize(&model).expect("serializes");
        assert!(output.code.contains("gitGraph TB:\n    options\n    {\n    \"nodeSpacing\": 150\n    }\n    end\n"), "{}", output.code);
        assert!(output.code.contains("    branch \"release 1\"\n"), "{}", output.code);

        let reparsed = parse(&output.code);
        let DiagramConfig::GitGraph(config) = &reparsed.config else {
            panic!("git config");
        };
        assert_eq!(config.main_branch, "trunk");
        assert!(config.options.as_deref().is_some_and(|raw| raw.contains("nodeSpacing")));
        assert_eq!(reparsed.nodes.len(), model.nodes.len());
        assert_eq!(
            reparsed.nodes[1].meta_str(keys::BRANCH_NAME),
            Some("release 1")
        );
    }

    #[test]
    fn broken_references_warn() {
        let mut model = parse("gitGraph\ncommit id: \"a\"\nbranch dev\ncheckout main\nmerge dev\ncherry-pick id: \"a\"");
        for node in &mut model.nodes {
            node.metadata.remove(keys::MERGED_BRANCH_ID);
            node.metadata.remove(keys::SOURCE_COMMIT_ID);
        }
        let output = serialize(&model).expect("serializes");
        assert!(!output.code.contains("merge"));
        assert!(!output.code.contains("cherry-pick"));
        assert_eq!(output.warnings.len(), 2, "{:?}", output.warnings);
    }

    #[test]
    fn commits_on_an_unwritable_branch_are_skipped() {
        let mut model = parse("gitGraph
commit id: \"A\"\nbranch dev\ncommit id: \"X\"\ncheckout main\ncommit id: \"Y\"");
        for node in &mut model.nodes {
            if node.variant == NodeVariant::Git(GitCommand::Branch) {
                node.set_meta(keys::BRANCH_NAME, "bad\"name");
            }
        }
        let output = serialize(&model).expect("serializes");
        assert_eq!(
            output.code,
            "gitGraph LR:\n    commit id: \"A\"\n    checkout main\n    commit id: \"Y\"\n"
        );
        assert_eq!(output.warnings.len(), 2, "{:?}", output.warnings);
        assert!(output.warnings[1].contains("'dev'"), "{:?}", output.warnings);

        let reparsed = parse(&output.code);
        assert!(
            reparsed
                .nodes
                .iter()
                .all(|node| node.meta_str(keys::COMMIT_ID) != Some("X"))
        );
    }
}
