use ido_core::Preamble;
use serde_json::{Map, Value};

use crate::text::front_matter_end;

/// A document with its front matter and init directives separated out.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitDocument {
    pub preamble: Preamble,
    /// Diagram body. Removed preamble lines are left blank so line numbers in
    /// warnings still match the input.
    pub body: String,
    pub warnings: Vec<String>,
}

/// Separate YAML front matter and `%%{init: ...}%%` directives from the body.
#[must_use]
pub fn split_preamble(text: &str) -> SplitDocument {
    let lines: Vec<&str> = text.lines().collect();
    let mut preamble = Preamble::default();
    let mut warnings = Vec::new();
    let mut body_lines: Vec<&str> = Vec::with_capacity(lines.len());

    let body_start = match front_matter_end(&lines) {
        Some(end) => {
            let yaml = lines[1..end].join("\n");
            read_front_matter(&yaml, &mut preamble, &mut warnings);
            body_lines.extend(std::iter::repeat_n("", end + 1));
            end + 1
        }
        None => 0,
    };

    let mut init = Map::new();
    for (index, line) in lines.iter().enumerate().skip(body_start) {
        let Some(payload) = extract_init_payload(line.trim()) else {
            body_lines.push(line);
            continue;
        };
        body_lines.push("");
        match parse_init_payload_value(payload) {
            Ok(Value::Object(entries)) => init.extend(entries),
            Ok(other) => warnings.push(format!(
                "Line {}: init directive must be an object, found {other}",
                index + 1
            )),
            Err(error) => warnings.push(format!(
                "Line {}: invalid init directive: {error}",
                index + 1
            )),
        }
    }
    if !init.is_empty() {
        preamble.init = Some(Value::Object(init));
    }

    SplitDocument {
        preamble,
        body: body_lines.join("\n"),
        warnings,
    }
}

fn read_front_matter(yaml: &str, preamble: &mut Preamble, warnings: &mut Vec<String>) {
    if yaml.trim().is_empty() {
        return;
    }
    let value = match serde_yaml::from_str::<Value>(yaml) {
        Ok(value) => value,
        Err(error) => {
            warnings.push(format!("Front matter is not valid YAML: {error}"));
            return;
        }
    };
    let Value::Object(mut entries) = value else {
        if !value.is_null() {
            warnings.push("Front matter must be a mapping; ignored".to_string());
        }
        return;
    };

    preamble.title = match entries.remove("title") {
        Some(Value::String(title)) => Some(title),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    };
    if !entries.is_empty() {
        preamble.front_matter = Some(Value::Object(entries));
    }
}

fn extract_init_payload(trimmed: &str) -> Option<&str> {
    let inner = trimmed.strip_prefix("%%{")?.strip_suffix("}%%")?;
    let (directive, payload) = inner.trim().split_once(':')?;
    let directive = directive.trim();
    if !(directive.eq_ignore_ascii_case("init") || directive.eq_ignore_ascii_case("initialize")) {
        return None;
    }
    let payload = payload.trim();
    (!payload.is_empty()).then_some(payload)
}

fn parse_init_payload_value(payload: &str) -> Result<Value, String> {
    serde_json::from_str::<Value>(payload).or_else(|json_error| {
        json5::from_str::<Value>(payload).map_err(|json5_error| {
            format!("JSON parse failed ({json_error}); JSON5 parse failed ({json5_error})")
        })
    })
}
