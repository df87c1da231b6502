use ido_core::{GanttConfig, GraphModel, HasMetadata, Node, NodeVariant, TaskKind, keys};
use rustc_hash::FxHashMap;

use crate::writer::CodeWriter;
use crate::{own_edges, own_nodes};

const STATUSES: [&str; 3] = ["done", "active", "crit"];

fn is_task_id(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-'))
}

pub(crate) fn write(model: &GraphModel, config: &GanttConfig, writer: &mut CodeWriter) {
    writer.line("gantt");
    writer.indent();
    if let Some(title) = &config.title {
        writer.line(format!("title {title}"));
    }
    writer.line(format!("dateFormat {}", config.date_format));
    for (keyword, value) in [
        ("axisFormat", &config.axis_format),
        ("excludes", &config.excludes),
        ("tickInterval", &config.tick_interval),
        ("todayMarker", &config.today_marker),
    ] {
        if let Some(value) = value {
            writer.line(format!("{keyword} {value}"));
        }
    }

    let nodes = own_nodes(model, writer);
    let edges = own_edges(model, &nodes, writer);
    let mut dependencies: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for edge in &edges {
        dependencies
            .entry(edge.target.as_str())
            .or_default()
            .push(edge.source.as_str());
    }

    // Declared task ids, plus node ids for tasks other tasks depend on.
    let mut task_ids: FxHashMap<&str, &str> = FxHashMap::default();
    for node in &nodes {
        let declared = node.meta_str(keys::TASK_ID).filter(|id| is_task_id(id));
        let referenced = edges.iter().any(|edge| edge.source == node.id);
        match declared {
            Some(id) => {
                task_ids.insert(node.id.as_str(), id);
            }
            None if referenced && is_task_id(&node.id) => {
                task_ids.insert(node.id.as_str(), node.id.as_str());
            }
            None if referenced => writer.warn(format!(
                "task '{}' has no usable id; tasks depending on it lose that dependency",
                node.id
            )),
            None => {}
        }
    }

    let mut section: Option<&str> = None;
    for node in &nodes {
        match node.meta_str(keys::SECTION) {
            Some(name) if section != Some(name) => {
                writer.line(format!("section {name}"));
                section = Some(name);
            }
            None if section.is_some() => writer.warn(format!(
                "task '{}' has no section and is written under the previous one",
                node.id
            )),
            _ => {}
        }

        let label = node.label.trim().replace(':', "#58;");
        if label.is_empty() {
            writer.warn(format!("task '{}' has an empty label and was skipped", node.id));
            continue;
        }
        let depends_on: Vec<&str> = dependencies
            .get(node.id.as_str())
            .into_iter()
            .flatten()
            .filter_map(|source| task_ids.get(source).copied())
            .collect();
        let fields = task_fields(node, task_ids.get(node.id.as_str()).copied(), &depends_on);
        writer.line(format!("{label} : {}", fields.join(", ")));
    }
    writer.dedent();
}

/// Fields in the order the parser sniffs them: statuses, id, start or
/// `after`, duration or end or `until`, then any remaining dependencies.
fn task_fields<'a>(node: &'a Node, id: Option<&'a str>, depends_on: &[&'a str]) -> Vec<String> {
    let milestone = node.variant == NodeVariant::Gantt(TaskKind::Milestone);
    let mut fields: Vec<String> = node
        .meta_strings(keys::STATUS)
        .into_iter()
        .filter(|status| STATUSES.contains(&status.as_str()))
        .collect();
    if milestone {
        fields.push("milestone".to_string());
    }
    if let Some(id) = id {
        fields.push(id.to_string());
    }

    let mut trailing = depends_on;
    if let Some(start) = node.meta_str(keys::START) {
        fields.push(start.to_string());
    } else if !depends_on.is_empty() {
        fields.push(format!("after {}", depends_on.join(" ")));
        trailing = &[];
    }

    if let Some(duration) = node.meta_str(keys::DURATION) {
        fields.push(duration.to_string());
    } else if let Some(end) = node.meta_str(keys::END) {
        fields.push(end.to_string());
    } else if let Some(until) = node.meta_str(keys::UNTIL) {
        fields.push(format!("until {until}"));
    }
    fields.extend(trailing.iter().map(|id| (*id).to_string()));
    fields
}
