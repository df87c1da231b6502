//! Line-level helpers shared by the per-type parsers.

pub(crate) fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with("%%")
}

/// Index of the `---` line closing a front-matter block that opens on the
/// first line.
pub(crate) fn front_matter_end(lines: &[&str]) -> Option<usize> {
    if lines.first().map(|line| line.trim()) != Some("---") {
        return None;
    }
    lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim() == "---")
        .map(|(index, _)| index)
}

/// Index of the diagram header: the first line that is not blank, a `%%`
/// comment or directive, or part of a leading front-matter block.
pub(crate) fn header_index(lines: &[&str]) -> Option<usize> {
    let start = front_matter_end(lines).map_or(0, |end| end + 1);
    (start..lines.len()).find(|&index| {
        let trimmed = lines[index].trim();
        !trimmed.is_empty() && !is_comment(trimmed)
    })
}

pub(crate) fn first_significant_line(input: &str) -> Option<&str> {
    let lines: Vec<&str> = input.lines().collect();
    header_index(&lines).map(|index| lines[index].trim())
}

/// Split a line on `;` outside quotes and brackets.
pub(crate) fn split_statements(line: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut current_start = 0;
    let mut in_quote: Option<char> = None;
    let mut depth = 0_usize;

    for (index, ch) in line.char_indices() {
        if let Some(quote) = in_quote {
            if ch == quote {
                in_quote = None;
            }
            continue;
        }
        match ch {
            '"' | '`' => in_quote = Some(ch),
            '[' | '(' | '{' => depth = depth.saturating_add(1),
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                let segment = line[current_start..index].trim();
                if !segment.is_empty() {
                    statements.push(segment);
                }
                current_start = index + 1;
            }
            _ => {}
        }
    }

    let remainder = line[current_start..].trim();
    if !remainder.is_empty() {
        statements.push(remainder);
    }
    statements
}

/// Drop a trailing `%%` comment that sits outside quotes and brackets.
pub(crate) fn strip_inline_comment(line: &str) -> &str {
    let mut in_quote: Option<char> = None;
    let mut depth = 0_usize;

    for (index, ch) in line.char_indices() {
        if let Some(quote) = in_quote {
            if ch == quote {
                in_quote = None;
            }
            continue;
        }
        match ch {
            '"' | '`' => in_quote = Some(ch),
            '[' | '(' | '{' => depth = depth.saturating_add(1),
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            '%' if depth == 0 && line[index..].starts_with("%%") => {
                let after_space = line[..index]
                    .chars()
                    .next_back()
                    .is_none_or(char::is_whitespace);
                if after_space {
                    return line[..index].trim_end();
                }
            }
            _ => {}
        }
    }
    line
}

/// Earliest operator occurrence outside quotes and brackets; at one position
/// the longest operator wins.
pub(crate) fn find_operator<T: Copy>(
    statement: &str,
    operators: &[(&'static str, T)],
) -> Option<(usize, &'static str, T)> {
    let mut in_quote: Option<char> = None;
    let mut depth = 0_usize;

    for (index, ch) in statement.char_indices() {
        if let Some(quote) = in_quote {
            if ch == quote {
                in_quote = None;
            }
            continue;
        }
        match ch {
            '"' => {
                in_quote = Some(ch);
                continue;
            }
            '[' | '(' => {
                depth = depth.saturating_add(1);
                continue;
            }
            ']' | ')' => {
                depth = depth.saturating_sub(1);
                continue;
            }
            _ => {}
        }
        if depth != 0 {
            continue;
        }

        let tail = &statement[index..];
        let best = operators
            .iter()
            .filter(|(operator, _)| tail.starts_with(operator))
            .max_by_key(|(operator, _)| operator.len());
        if let Some((operator, value)) = best {
            return Some((index, operator, *value));
        }
    }
    None
}

/// Leading `"..."` or `'...'` value and the text after it.
pub(crate) fn extract_quoted_value(input: &str) -> Option<(String, &str)> {
    let trimmed = input.trim_start();
    let quote = trimmed.chars().next()?;
    if !matches!(quote, '"' | '\'') {
        return None;
    }
    let end = trimmed[1..].find(quote)?;
    Some((trimmed[1..1 + end].to_string(), &trimmed[end + 2..]))
}

/// Strip one pair of matching surrounding quotes.
pub(crate) fn unquote(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\'', '`'] {
        if trimmed.len() >= 2
            && let Some(inner) = trimmed
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

/// Decode the entity escapes the serializers emit.
pub(crate) fn decode_entities(raw: &str) -> String {
    if !raw.contains('#') {
        return raw.to_string();
    }
    raw.replace("#quot;", "\"")
        .replace("#58;", ":")
        .replace("#59;", ";")
        .replace("#124;", "|")
}

/// Display text from raw source: trimmed, unquoted, entity-decoded.
pub(crate) fn clean_label(raw: &str) -> Option<String> {
    let cleaned = decode_entities(unquote(raw).trim());
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

pub(crate) fn unsupported(line_number: usize, kind: &str, trimmed: &str) -> String {
    format!("Line {line_number}: unsupported {kind} syntax: {trimmed}")
}

pub(crate) fn not_preserved(line_number: usize, kind: &str, trimmed: &str) -> String {
    format!("Line {line_number}: {kind} is not preserved: {trimmed}")
}

/// Classic two-row edit distance.
pub(crate) fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev_row: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr_row = vec![0; b_chars.len() + 1];
    for (i, a_char) in a_chars.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }
    prev_row[b_chars.len()]
}
