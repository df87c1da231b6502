use ido_core::{DiagramConfig, HasMetadata, NodeVariant, keys};
use serde_json::{Number, Value};

use crate::builder::ModelBuilder;
use crate::text::{clean_label, extract_quoted_value, is_comment, strip_inline_comment, unsupported};

pub(crate) fn parse_pie(input: &str, builder: &mut ModelBuilder) {
    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        let content = strip_inline_comment(trimmed);

        if let Some(rest) = strip_keyword(content, "pie") {
            read_options(builder, rest);
            continue;
        }
        if strip_keyword(content, "showData").is_some() || strip_keyword(content, "title").is_some() {
            read_options(builder, content);
            continue;
        }
        if !add_slice(builder, line_number, content) {
            builder.add_warning(unsupported(line_number, "pie", content));
        }
    }
}

fn strip_keyword<'a>(content: &'a str, keyword: &str) -> Option<&'a str> {
    let head = content.get(..keyword.len())?;
    let rest = &content[keyword.len()..];
    (head.eq_ignore_ascii_case(keyword) && (rest.is_empty() || rest.starts_with(char::is_whitespace)))
        .then(|| rest.trim())
}

/// `[showData] [title text]`
fn read_options(builder: &mut ModelBuilder, rest: &str) {
    let DiagramConfig::Pie(config) = builder.config_mut() else {
        return;
    };
    let mut rest = rest.trim();
    if let Some(after) = strip_keyword(rest, "showData") {
        config.show_data = true;
        rest = after;
    }
    if let Some(title) = strip_keyword(rest, "title") {
        config.title = clean_label(title);
    }
}

/// `"Label" : value`
fn add_slice(builder: &mut ModelBuilder, line_number: usize, content: &str) -> bool {
    let Some((label, rest)) = extract_quoted_value(content) else {
        return false;
    };
    let Some(raw_value) = rest.trim_start().strip_prefix(':').map(str::trim) else {
        return false;
    };
    if raw_value.is_empty() {
        return false;
    }
    let label = clean_label(&label).unwrap_or_default();
    let value = numeric_value(raw_value);
    if value.is_none() {
        builder.add_warning(format!(
            "Line {line_number}: pie slice '{label}' has a non-numeric value: {raw_value}"
        ));
    }

    let id = builder.create_node(&label, &label, NodeVariant::Slice);
    if let Some(node) = builder.node_mut(&id) {
        node.set_meta(
            keys::VALUE,
            value.unwrap_or_else(|| Value::from(raw_value)),
        );
    }
    true
}

fn numeric_value(raw: &str) -> Option<Value> {
    if let Ok(integer) = raw.parse::<i64>() {
        return Some(Value::from(integer));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}
