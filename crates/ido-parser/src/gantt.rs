use std::sync::LazyLock;

use ido_core::{DiagramConfig, EdgeVariant, HasMetadata, NodeVariant, TaskKind, keys};
use regex::Regex;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::builder::ModelBuilder;
use crate::text::{clean_label, is_comment, not_preserved, strip_inline_comment, unsupported};

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}(?:[ T]\d{1,2}:\d{2}(?::\d{2})?)?|\d{1,2}:\d{2}(?::\d{2})?)$")
        .expect("date pattern is valid")
});

static DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?[hdwmy]$").expect("duration pattern is valid"));

static TASK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][\w-]*$").expect("task id pattern is valid"));

const STATUSES: [&str; 4] = ["done", "active", "crit", "milestone"];

const UNPRESERVED_KEYWORDS: [&str; 7] = [
    "includes",
    "weekday",
    "weekend",
    "inclusiveEndDates",
    "topAxis",
    "displayMode",
    "click",
];

/// Fields of one task line after shape sniffing.
#[derive(Debug, Default, PartialEq)]
struct TaskFields<'a> {
    statuses: Vec<&'a str>,
    id: Option<&'a str>,
    start: Option<&'a str>,
    after: Vec<&'a str>,
    duration: Option<&'a str>,
    end: Option<&'a str>,
    until: Option<&'a str>,
    depends_on: Vec<&'a str>,
}

/// Classify comma-separated task fields. Order of precedence: any number of
/// statuses, a task id, a start (date or `after ids`), a duration or end
/// (date or `until id`), then trailing dependencies.
fn sniff_fields(raw: &str) -> TaskFields<'_> {
    let fields: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .collect();
    let mut task = TaskFields::default();
    let mut rest = fields.as_slice();

    while let Some((&field, tail)) = rest.split_first()
        && STATUSES.contains(&field)
    {
        task.statuses.push(field);
        rest = tail;
    }
    if let Some((&field, tail)) = rest.split_first()
        && TASK_ID.is_match(field)
        && !field.starts_with("after ")
        && !field.starts_with("until ")
    {
        task.id = Some(field);
        rest = tail;
    }
    if let Some((&field, tail)) = rest.split_first() {
        if let Some(ids) = field.strip_prefix("after ") {
            task.after = ids.split_whitespace().collect();
            rest = tail;
        } else if DATE.is_match(field) {
            task.start = Some(field);
            rest = tail;
        }
    }
    if let Some((&field, tail)) = rest.split_first() {
        if DURATION.is_match(field) {
            task.duration = Some(field);
            rest = tail;
        } else if DATE.is_match(field) {
            task.end = Some(field);
            rest = tail;
        } else if let Some(id) = field.strip_prefix("until ") {
            task.until = Some(id.trim());
            rest = tail;
        }
    }
    task.depends_on = rest.iter().copied().flat_map(str::split_whitespace).collect();
    task
}

pub(crate) fn parse_gantt(input: &str, builder: &mut ModelBuilder) {
    let mut section: Option<String> = None;
    let mut task_nodes: FxHashMap<String, String> = FxHashMap::default();
    let mut pending: Vec<(usize, String, Vec<String>)> = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        let content = strip_inline_comment(trimmed);
        let (first, rest) = content
            .split_once(char::is_whitespace)
            .map_or((content, ""), |(first, rest)| (first, rest.trim()));

        if first.eq_ignore_ascii_case("gantt") {
            continue;
        }
        if first == "section" {
            section = clean_label(rest);
            continue;
        }
        if set_config(builder, first, rest) {
            continue;
        }
        if UNPRESERVED_KEYWORDS.contains(&first) {
            builder.add_warning(not_preserved(line_number, first, content));
            continue;
        }

        let Some((label, fields)) = content.split_once(':') else {
            builder.add_warning(unsupported(line_number, "gantt", content));
            continue;
        };
        let label = clean_label(label).unwrap_or_default();
        if label.is_empty() {
            builder.add_warning(unsupported(line_number, "gantt", content));
            continue;
        }
        let task = sniff_fields(fields);
        let variant = if task.statuses.contains(&"milestone") {
            TaskKind::Milestone
        } else {
            TaskKind::Task
        };
        let node_id = builder.create_node(task.id.unwrap_or(&label), &label, NodeVariant::Gantt(variant));
        if let Some(task_id) = task.id {
            task_nodes.insert(task_id.to_string(), node_id.clone());
        }

        let dependencies: Vec<String> = task
            .after
            .iter()
            .chain(&task.depends_on)
            .map(|id| (*id).to_string())
            .collect();
        if let Some(node) = builder.node_mut(&node_id) {
            write_task_metadata(node, section.as_deref(), &task, &dependencies);
        }
        if !dependencies.is_empty() {
            pending.push((line_number, node_id, dependencies));
        }
    }

    for (line, node_id, dependencies) in pending {
        for dependency in dependencies {
            match task_nodes.get(&dependency) {
                Some(source) => {
                    builder.push_edge(source, &node_id, EdgeVariant::Dependency, None);
                }
                None => builder.add_warning(format!(
                    "Line {line}: task depends on unknown task '{dependency}'"
                )),
            }
        }
    }
}

fn set_config(builder: &mut ModelBuilder, keyword: &str, value: &str) -> bool {
    let DiagramConfig::Gantt(config) = builder.config_mut() else {
        return false;
    };
    let value = value.to_string();
    let slot = match keyword {
        "title" => &mut config.title,
        "axisFormat" => &mut config.axis_format,
        "excludes" => &mut config.excludes,
        "tickInterval" => &mut config.tick_interval,
        "todayMarker" => &mut config.today_marker,
        "dateFormat" => {
            if !value.is_empty() {
                config.date_format = value;
            }
            return true;
        }
        _ => return false,
    };
    *slot = (!value.is_empty()).then_some(value);
    true
}

fn write_task_metadata(
    node: &mut impl HasMetadata,
    section: Option<&str>,
    task: &TaskFields<'_>,
    dependencies: &[String],
) {
    if let Some(section) = section {
        node.set_meta(keys::SECTION, section);
    }
    if let Some(id) = task.id {
        node.set_meta(keys::TASK_ID, id);
    }
    if !task.statuses.is_empty() {
        node.set_meta(keys::STATUS, task.statuses.clone());
    }
    for (key, value) in [
        (keys::START, task.start),
        (keys::DURATION, task.duration),
        (keys::END, task.end),
        (keys::UNTIL, task.until),
    ] {
        if let Some(value) = value {
            node.set_meta(key, value);
        }
    }
    if !dependencies.is_empty() {
        node.set_meta(
            keys::DEPENDS_ON,
            Value::Array(dependencies.iter().map(|id| Value::from(id.as_str())).collect()),
        );
    }
}

#[cfg(test)]
mod tests {
    use ido_core::{DiagramConfig, EdgeVariant, HasMetadata, NodeVariant, TaskKind, keys};
    use serde_json::json;

    use super::{TaskFields, sniff_fields};
    use crate::parse;

    #[test]
    fn field_precedence() {
        assert_eq!(
            sniff_fields(" done, crit, a1, 2024-01-01, 3d"),
            TaskFields {
                statuses: vec!["done", "crit"],
                id: Some("a1"),
                start: Some("2024-01-01"),
                duration: Some("3d"),
                ..TaskFields::default()
            }
        );
        assert_eq!(
            sniff_fields("after a1 b2, 2024-02-01"),
            TaskFields {
                after: vec!["a1", "b2"],
                end: Some("2024-02-01"),
                ..TaskFields::default()
            }
        );
        assert_eq!(
            sniff_fields("t3, 2024-01-01, until t9, extra"),
            TaskFields {
                id: Some("t3"),
                start: Some("2024-01-01"),
                until: Some("t9"),
                depends_on: vec!["extra"],
                ..TaskFields::default()
            }
        );
        assert_eq!(
            sniff_fields("12h"),
            TaskFields {
                duration: Some("12h"),
                ..TaskFields::default()
            }
        );
    }

    #[test]
    fn tasks_sections_and_dependencies() {
        let model = parse(
            "gantt\ntitle Launch\ndateFormat YYYY-MM-DD\nexcludes weekends\nsection Build\nDesign : des, 2024-01-01, 3d\nCode #58; core : code, after des, 5d\nsection Ship\nRelease : milestone, rel, after code, 0d",
        );
        assert!(model.warnings.is_empty(), "{:?}", model.warnings);
        let DiagramConfig::Gantt(config) = &model.config else {
            panic!("gantt config");
        };
        assert_eq!(config.title.as_deref(), Some("Launch"));
        assert_eq!(config.excludes.as_deref(), Some("weekends"));

        let code = model.node("code").expect("code");
        assert_eq!(code.label, "Code : core");
        assert_eq!(code.meta_str(keys::SECTION), Some("Build"));
        assert_eq!(code.meta(keys::DEPENDS_ON), Some(&json!(["des"])));

        let release = model.node("rel").expect("rel");
        assert_eq!(release.variant, NodeVariant::Gantt(TaskKind::Milestone));
        assert_eq!(release.meta_str(keys::SECTION), Some("Ship"));
        assert_eq!(release.meta(keys::STATUS), Some(&json!(["milestone"])));

        assert_eq!(model.edges.len(), 2);
        assert!(model.edges.iter().all(|edge| edge.variant == EdgeVariant::Dependency));
        assert_eq!((model.edges[0].source.as_str(), model.edges[0].target.as_str()), ("des", "code"));
    }

    #[test]
    fn forward_references_resolve_and_unknown_ones_warn() {
        let model = parse("gantt\nLater : b, after a, 1d\nFirst : a, 2024-01-01, 1d\nOrphan : after ghost, 1d");
        assert_eq!(model.edges.len(), 1);
        assert_eq!(
            model.warnings,
            vec!["Line 4: task depends on unknown task 'ghost'"]
        );
    }

    #[test]
    fn tasks_without_ids_get_unique_nodes() {
        let model = parse("gantt\nsection A\nWrite : 1d\nWrite : 2d\nweekday monday\nnonsense");
        assert_eq!(model.nodes.len(), 2);
        assert_ne!(model.nodes[0].id, model.nodes[1].id);
        assert_eq!(model.warnings.len(), 2, "{:?}", model.warnings);
        assert!(model.warnings[0].contains("weekday is not preserved"));
        assert!(model.warnings[1].starts_with("Line 6: unsupported gantt syntax"));
    }
}
