use ido_core::{DiagramConfig, GraphModel, Preamble};
use serde_json::{Map, Value};

use crate::writer::CodeWriter;

/// Front matter (title plus preserved keys) and a single merged init directive.
pub(crate) fn write_preamble(model: &GraphModel, writer: &mut CodeWriter) {
    write_front_matter(&model.preamble, writer);
    let Some(init) = init_payload(model) else {
        return;
    };
    match serde_json::to_string(&init) {
        Ok(json) => writer.raw(format!("%%{{init: {json}}}%%")),
        Err(error) => writer.warn(format!("init directive could not be written: {error}")),
    }
}

fn write_front_matter(preamble: &Preamble, writer: &mut CodeWriter) {
    let mut entries = Map::new();
    if let Some(title) = &preamble.title {
        entries.insert("title".to_string(), Value::from(title.as_str()));
    }
    match &preamble.front_matter {
        Some(Value::Object(extra)) => {
            entries.extend(extra.iter().map(|(key, value)| (key.clone(), value.clone())));
        }
        Some(_) => writer.warn("front matter is not a mapping and was skipped"),
        None => {}
    }
    if entries.is_empty() {
        return;
    }

    match serde_yaml::to_string(&Value::Object(entries)) {
        Ok(yaml) => {
            writer.raw("---");
            for line in yaml.lines() {
                writer.raw(line);
            }
            writer.raw("---");
        }
        Err(error) => writer.warn(format!("front matter could not be written: {error}")),
    }
}

/// Init payload, with the git-graph main branch name added when the config
/// no longer matches what the preamble says.
fn init_payload(model: &GraphModel) -> Option<Value> {
    let mut init = model.preamble.init.clone();
    let DiagramConfig::GitGraph(config) = &model.config else {
        return init;
    };
    let declared = model
        .preamble
        .config_value("gitGraph", "mainBranchName")
        .and_then(Value::as_str)
        .unwrap_or("main");
    if declared == config.main_branch {
        return init;
    }

    let root = init.get_or_insert_with(|| Value::Object(Map::new()));
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    if let Value::Object(root) = root {
        let section = root
            .entry("gitGraph")
            .or_insert_with(|| Value::Object(Map::new()));
        if !section.is_object() {
            *section = Value::Object(Map::new());
        }
        if let Value::Object(section) = section {
            section.insert(
                "mainBranchName".to_string(),
                Value::from(config.main_branch.as_str()),
            );
        }
    }
    init
}
