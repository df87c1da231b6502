use std::sync::LazyLock;

use ido_core::{DiagramConfig, EdgeVariant, GraphDirection, HasMetadata, NodeVariant, StateKind, keys};
use regex::Regex;

use crate::builder::ModelBuilder;
use crate::text::{is_comment, not_preserved, strip_inline_comment, unsupported};

static STATE_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^state\s+"([^"]*)"\s+as\s+([^\s{]+)\s*(\{)?$"#).expect("alias pattern is valid")
});

static STATE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^state\s+([^\s{]+)\s*<<\s*(\w+)\s*>>$").expect("marker pattern is valid")
});

static STATE_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^state\s+([^\s{"]+)\s*(\{)?$"#).expect("declaration pattern is valid")
});

static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\s:]+)\s*:\s*(.+)$").expect("description pattern is valid")
});

#[derive(Clone, Copy)]
enum Side {
    Source,
    Target,
}

struct StateParser<'b> {
    builder: &'b mut ModelBuilder,
    composites: Vec<String>,
    in_note: bool,
}

pub(crate) fn parse_state(input: &str, builder: &mut ModelBuilder) {
    let mut parser = StateParser {
        builder,
        composites: Vec::new(),
        in_note: false,
    };
    for (index, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        parser.line(index + 1, strip_inline_comment(trimmed));
    }
    if !parser.composites.is_empty() {
        let open = parser.composites.len();
        parser
            .builder
            .add_warning(format!("State diagram ended with {open} unclosed composite state(s)"));
    }
}

impl StateParser<'_> {
    fn line(&mut self, line_number: usize, content: &str) {
        if self.in_note {
            if content.eq_ignore_ascii_case("end note") {
                self.in_note = false;
            }
            return;
        }

        let first = content.split_whitespace().next().unwrap_or_default();
        let lower_first = first.to_ascii_lowercase();
        if lower_first.starts_with("statediagram") {
            if let DiagramConfig::State(config) = self.builder.config_mut() {
                config.v2 = lower_first.ends_with("-v2");
            }
            return;
        }
        if lower_first == "direction" {
            self.direction(line_number, content, &content[first.len()..]);
            return;
        }
        if content == "}" {
            if self.composites.pop().is_none() {
                self.builder.add_warning(format!(
                    "Line {line_number}: '}}' without an open composite state"
                ));
            }
            return;
        }
        if lower_first == "note" {
            self.builder
                .add_warning(not_preserved(line_number, "note", content));
            self.in_note = !content.contains(':');
            return;
        }
        if content == "--" || matches!(first, "classDef" | "class" | "style") {
            self.builder
                .add_warning(not_preserved(line_number, first, content));
            return;
        }

        if let Some(captures) = STATE_ALIAS.captures(content) {
            let id = self.builder.intern_node(&captures[2], Some(&captures[1]), None);
            self.place(&id);
            if captures.get(3).is_some() {
                self.composites.push(id);
            }
            return;
        }
        if let Some(captures) = STATE_MARKER.captures(content) {
            let Some(kind) = StateKind::from_marker(&captures[2]) else {
                self.builder
                    .add_warning(unsupported(line_number, "state", content));
                return;
            };
            let id = self
                .builder
                .intern_node(&captures[1], None, Some(NodeVariant::State(kind)));
            self.place(&id);
            return;
        }
        if let Some(captures) = STATE_DECLARATION.captures(content) {
            let id = self.builder.intern_node(&captures[1], None, None);
            self.place(&id);
            if captures.get(2).is_some() {
                self.composites.push(id);
            }
            return;
        }
        if let Some((left, right)) = content.split_once("-->") {
            if !self.transition(left, right) {
                self.builder
                    .add_warning(unsupported(line_number, "state", content));
            }
            return;
        }
        if let Some(captures) = DESCRIPTION.captures(content) {
            let id = self.reference(&captures[1], Side::Source);
            if let Some(node) = self.builder.node_mut(&id) {
                node.label = captures[2].trim().to_string();
            }
            return;
        }
        if content
            .chars()
            .all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '-'))
        {
            let id = self.builder.intern_node(content, None, None);
            self.place(&id);
            return;
        }
        self.builder
            .add_warning(unsupported(line_number, "state", content));
    }

    fn direction(&mut self, line_number: usize, content: &str, token: &str) {
        if !self.composites.is_empty() {
            self.builder
                .add_warning(not_preserved(line_number, "composite direction", content));
            return;
        }
        match GraphDirection::parse(token) {
            Some(direction) => {
                if let DiagramConfig::State(config) = self.builder.config_mut() {
                    config.direction = Some(direction);
                }
            }
            None => self
                .builder
                .add_warning(unsupported(line_number, "state", content)),
        }
    }

    fn transition(&mut self, left: &str, right: &str) -> bool {
        let (target, label) = match right.split_once(':') {
            Some((target, label)) => (target.trim(), Some(label)),
            None => (right.trim(), None),
        };
        let source = left.trim();
        if source.is_empty() || target.is_empty() {
            return false;
        }
        let source = self.reference(source, Side::Source);
        let target = self.reference(target, Side::Target);
        self.builder
            .push_edge(&source, &target, EdgeVariant::Transition, label);
        true
    }

    /// Resolve a transition endpoint; `[*]` is the start or end of the
    /// enclosing composite.
    fn reference(&mut self, raw: &str, side: Side) -> String {
        let id = if raw == "[*]" {
            let (suffix, label, kind) = match side {
                Side::Source => ("start", "Start", StateKind::Start),
                Side::Target => ("end", "End", StateKind::End),
            };
            let raw = pseudo_base(self.composites.last().map(String::as_str), suffix);
            self.builder
                .intern_scoped(suffix, &raw, Some(label), Some(NodeVariant::State(kind)))
        } else {
            self.builder.intern_node(raw, None, None)
        };
        self.place(&id);
        id
    }

    /// Record the enclosing composite the first time a state is seen inside one.
    fn place(&mut self, id: &str) {
        let Some(parent) = self.composites.last() else {
            return;
        };
        if parent == id {
            return;
        }
        let parent = parent.clone();
        if let Some(node) = self.builder.node_mut(id)
            && node.meta(keys::PARENT).is_none()
        {
            node.set_meta(keys::PARENT, parent);
        }
    }
}

/// Base id of a start or end state. Composites whose name would collapse to
/// the top level's `root_start` join with a hyphen instead.
fn pseudo_base(composite: Option<&str>, suffix: &str) -> String {
    match composite {
        None => format!("root_{suffix}"),
        Some(name) if name.trim_end_matches('_') == "root" => format!("{name}-{suffix}"),
        Some(name) => format!("{name}_{suffix}"),
    }
}
