use chumsky::prelude::*;
use ido_core::{
    DiagramConfig, EdgeVariant, FlowShape, GraphDirection, HasMetadata, LinkKind, NodeVariant,
    Subgraph, disambiguate, keys, sanitize_identifier,
};
use rustc_hash::FxHashMap;

use crate::builder::ModelBuilder;
use crate::text::{
    clean_label, extract_quoted_value, is_comment, not_preserved, split_statements,
    strip_inline_comment, unsupported,
};

/// Comment pragma carrying extra subgraph memberships.
pub(crate) const SUBGRAPH_PRAGMA: &str = "ido:subgraphs";

type Extra<'a> = extra::Err<Rich<'a, char>>;

// ---------------------------------------------------------------------------
// Statement grammar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct NodeToken<'a> {
    id: &'a str,
    shape: Option<(FlowShape, &'a str)>,
    class: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
struct LinkToken<'a> {
    kind: LinkKind,
    label: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
enum FlowStatement<'a> {
    /// `A & B --> C -.->|x| D`
    Chain {
        head: Vec<NodeToken<'a>>,
        links: Vec<(LinkToken<'a>, Vec<NodeToken<'a>>)>,
    },
    ClassAssign {
        nodes: Vec<&'a str>,
        class: &'a str,
    },
    Click {
        node: &'a str,
        target: &'a str,
    },
}

fn inline_ws<'a>() -> impl Parser<'a, &'a str, (), Extra<'a>> + Clone {
    any().filter(|c: &char| *c == ' ' || *c == '\t').repeated()
}

fn required_ws<'a>() -> impl Parser<'a, &'a str, (), Extra<'a>> + Clone {
    any()
        .filter(|c: &char| *c == ' ' || *c == '\t')
        .repeated()
        .at_least(1)
}

/// Bare node identifier. A `-` is part of the identifier unless it starts a link.
fn identifier<'a>() -> impl Parser<'a, &'a str, &'a str, Extra<'a>> + Clone {
    let plain = any().filter(|c: &char| c.is_alphanumeric() || matches!(*c, '_' | '.' | '/'));
    let dash = just('-').and_is(choice((just("--"), just("-."))).not());
    choice((plain, dash)).repeated().at_least(1).to_slice()
}

fn text_until<'a>(terminator: &'static str) -> impl Parser<'a, &'a str, &'a str, Extra<'a>> + Clone {
    any()
        .and_is(just(terminator).not())
        .repeated()
        .at_least(1)
        .to_slice()
}

/// `open label close`, where a quoted label may contain the closing delimiter.
fn delimited<'a>(
    open: &'static str,
    close: &'static str,
) -> impl Parser<'a, &'a str, &'a str, Extra<'a>> + Clone {
    let quoted = just('"')
        .then(any().filter(|c: &char| *c != '"').repeated())
        .then(just('"'))
        .to_slice()
        .then_ignore(inline_ws())
        .then_ignore(just(close).rewind());
    let bare = any().and_is(just(close).not()).repeated().to_slice();
    just(open)
        .ignore_then(choice((quoted, bare)))
        .then_ignore(just(close))
}

fn node_shape<'a>() -> impl Parser<'a, &'a str, (FlowShape, &'a str), Extra<'a>> + Clone {
    choice((
        delimited("((", "))").map(|label| (FlowShape::StartEnd, label)),
        delimited("{{", "}}").map(|label| (FlowShape::Hexagon, label)),
        delimited("[[", "]]").map(|label| (FlowShape::Subroutine, label)),
        delimited("[(", ")]").map(|label| (FlowShape::Database, label)),
        delimited("[/", "/]").map(|label| (FlowShape::InputOutput, label)),
        delimited("[", "]").map(|label| (FlowShape::Process, label)),
        delimited("(", ")").map(|label| (FlowShape::Rounded, label)),
        delimited("{", "}").map(|label| (FlowShape::Decision, label)),
    ))
}

fn node_token<'a>() -> impl Parser<'a, &'a str, NodeToken<'a>, Extra<'a>> + Clone {
    let class_suffix = just(":::").ignore_then(
        any()
            .filter(|c: &char| c.is_alphanumeric() || matches!(*c, '_' | '-'))
            .repeated()
            .at_least(1)
            .to_slice(),
    );
    identifier()
        .then(node_shape().or_not())
        .then(class_suffix.or_not())
        .map(|((id, shape), class)| NodeToken { id, shape, class })
}

fn node_group<'a>() -> impl Parser<'a, &'a str, Vec<NodeToken<'a>>, Extra<'a>> + Clone {
    node_token()
        .separated_by(just('&').padded_by(inline_ws()))
        .at_least(1)
        .collect::<Vec<_>>()
}

fn link<'a>() -> impl Parser<'a, &'a str, LinkToken<'a>, Extra<'a>> + Clone {
    let plain = choice((
        just('-')
            .repeated()
            .at_least(2)
            .then(just('>'))
            .to(LinkKind::Arrow),
        just('-')
            .then(just('.').repeated().at_least(1))
            .then(just('-'))
            .then(just('>').or_not())
            .to(LinkKind::Dashed),
        just('=')
            .repeated()
            .at_least(2)
            .then(just('>').or_not())
            .to(LinkKind::Thick),
        just('-').repeated().at_least(3).to(LinkKind::Line),
    ))
    .map(|kind| LinkToken { kind, label: None });

    // `-- text -->`, `-. text .->`, `== text ==>`
    let inline_label = choice((
        just("--")
            .then(required_ws())
            .ignore_then(text_until("-->"))
            .then_ignore(just("-->"))
            .map(|label| (LinkKind::Arrow, label)),
        just("-.")
            .then(required_ws())
            .ignore_then(text_until(".->"))
            .then_ignore(just(".->"))
            .map(|label| (LinkKind::Dashed, label)),
        just("==")
            .then(required_ws())
            .ignore_then(text_until("==>"))
            .then_ignore(just("==>"))
            .map(|label| (LinkKind::Thick, label)),
    ))
    .map(|(kind, label)| LinkToken {
        kind,
        label: Some(label),
    });

    let pipe_label = just('|')
        .ignore_then(any().filter(|c: &char| *c != '|').repeated().to_slice())
        .then_ignore(just('|'));

    choice((plain, inline_label))
        .then(inline_ws().ignore_then(pipe_label).or_not())
        .map(|(token, pipe)| LinkToken {
            label: pipe.or(token.label),
            ..token
        })
}

fn flow_statement_parser<'a>() -> impl Parser<'a, &'a str, FlowStatement<'a>, Extra<'a>> {
    let class_assign = just("class")
        .then(required_ws())
        .ignore_then(
            identifier()
                .separated_by(just(',').padded_by(inline_ws()))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(required_ws())
        .then(
            any()
                .filter(|c: &char| !c.is_whitespace())
                .repeated()
                .at_least(1)
                .to_slice(),
        )
        .then_ignore(inline_ws())
        .then_ignore(end())
        .map(|(nodes, class)| FlowStatement::ClassAssign { nodes, class });

    let click = just("click")
        .then(required_ws())
        .ignore_then(identifier())
        .then_ignore(required_ws())
        .then(any().repeated().at_least(1).to_slice())
        .then_ignore(end())
        .map(|(node, target)| FlowStatement::Click { node, target });

    let chain = node_group()
        .then(
            inline_ws()
                .ignore_then(link())
                .then_ignore(inline_ws())
                .then(node_group())
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then_ignore(inline_ws())
        .then_ignore(end())
        .map(|(head, links)| FlowStatement::Chain { head, links });

    choice((class_assign, click, chain))
}

// ---------------------------------------------------------------------------
// Document pass
// ---------------------------------------------------------------------------

/// Directives resolved after the pass, so they may precede the nodes they name.
enum Deferred {
    Style {
        line: usize,
        target: String,
        props: String,
    },
    LinkStyle {
        line: usize,
        indices: String,
        props: String,
    },
    ClassAssign {
        line: usize,
        nodes: Vec<String>,
        class: String,
    },
    Click {
        line: usize,
        node: String,
        href: String,
    },
    Membership {
        line: usize,
        node: String,
        subgraphs: Vec<String>,
    },
}

#[derive(Default)]
struct FlowchartState {
    open_subgraphs: Vec<String>,
    subgraph_ids: FxHashMap<String, String>,
    deferred: Vec<Deferred>,
}

pub(crate) fn parse_flowchart(input: &str, builder: &mut ModelBuilder) {
    let mut state = FlowchartState::default();
    let mut header_seen = false;

    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if is_comment(trimmed) {
            read_pragma(trimmed, line_number, builder, &mut state);
            continue;
        }

        let mut content = strip_inline_comment(trimmed);
        if !header_seen {
            header_seen = true;
            if let Some(rest) = parse_header(content, builder) {
                content = rest;
            }
        }

        for statement in split_statements(content) {
            if !parse_statement(statement, line_number, builder, &mut state) {
                builder.add_warning(unsupported(line_number, "flowchart", statement));
            }
        }
    }

    if !state.open_subgraphs.is_empty() {
        builder.add_warning(format!(
            "Flowchart ended with {} unclosed subgraph block(s)",
            state.open_subgraphs.len()
        ));
    }
    apply_deferred(std::mem::take(&mut state.deferred), builder, &state);
}

/// Consume a `flowchart`/`graph` header, returning any same-line statements.
fn parse_header<'a>(content: &'a str, builder: &mut ModelBuilder) -> Option<&'a str> {
    let keyword = content.split_whitespace().next()?;
    let lower = keyword.to_ascii_lowercase();
    if lower != "flowchart" && lower != "graph" {
        return None;
    }

    let rest = content[keyword.len()..].trim_start();
    let token_end = rest
        .find(|ch: char| ch.is_whitespace() || ch == ';')
        .unwrap_or(rest.len());
    let rest = match GraphDirection::parse(&rest[..token_end]) {
        Some(direction) => {
            if let DiagramConfig::Flowchart(config) = builder.config_mut() {
                config.direction = direction;
            }
            &rest[token_end..]
        }
        None => rest,
    };
    Some(rest.trim_start().trim_start_matches(';').trim())
}

fn parse_statement(
    statement: &str,
    line_number: usize,
    builder: &mut ModelBuilder,
    state: &mut FlowchartState,
) -> bool {
    if let Some(rest) = keyword_rest(statement, "subgraph") {
        open_subgraph(rest, builder, state);
        return true;
    }
    if statement == "end" {
        if state.open_subgraphs.pop().is_none() {
            builder.add_warning(format!(
                "Line {line_number}: encountered 'end' without matching 'subgraph'"
            ));
        }
        return true;
    }
    if keyword_rest(statement, "direction").is_some() {
        builder.add_warning(not_preserved(line_number, "subgraph direction", statement));
        return true;
    }
    if let Some(rest) = keyword_rest(statement, "style") {
        let Some((target, props)) = rest.split_once(char::is_whitespace) else {
            return false;
        };
        state.deferred.push(Deferred::Style {
            line: line_number,
            target: target.to_string(),
            props: props.trim().to_string(),
        });
        return true;
    }
    if let Some(rest) = keyword_rest(statement, "linkStyle") {
        let Some((indices, props)) = rest.split_once(char::is_whitespace) else {
            return false;
        };
        state.deferred.push(Deferred::LinkStyle {
            line: line_number,
            indices: indices.to_string(),
            props: props.trim().to_string(),
        });
        return true;
    }
    if let Some(rest) = keyword_rest(statement, "classDef") {
        let Some((names, props)) = rest.split_once(char::is_whitespace) else {
            return false;
        };
        if let DiagramConfig::Flowchart(config) = builder.config_mut() {
            for name in names.split(',').map(str::trim).filter(|name| !name.is_empty()) {
                config
                    .class_defs
                    .insert(name.to_string(), props.trim().to_string());
            }
        }
        return true;
    }

    let (ast, errors) = flow_statement_parser().parse(statement).into_output_errors();
    match ast {
        Some(ast) if errors.is_empty() => {
            lower_statement(ast, line_number, builder, state);
            true
        }
        _ => false,
    }
}

fn keyword_rest<'a>(statement: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = statement.strip_prefix(keyword)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.starts_with(char::is_whitespace)
        .then(|| rest.trim())
}

fn lower_statement(
    statement: FlowStatement<'_>,
    line_number: usize,
    builder: &mut ModelBuilder,
    state: &mut FlowchartState,
) {
    match statement {
        FlowStatement::Chain { head, links } => {
            let mut previous = intern_group(&head, builder, state);
            for (link, group) in links {
                let current = intern_group(&group, builder, state);
                for source in &previous {
                    for target in &current {
                        builder.push_edge(
                            source,
                            target,
                            EdgeVariant::Flowchart(link.kind),
                            link.label,
                        );
                    }
                }
                previous = current;
            }
        }
        FlowStatement::ClassAssign { nodes, class } => {
            state.deferred.push(Deferred::ClassAssign {
                line: line_number,
                nodes: nodes.into_iter().map(str::to_string).collect(),
                class: class.to_string(),
            });
        }
        FlowStatement::Click { node, target } => {
            let target = target.trim();
            let target = target
                .strip_prefix("href")
                .filter(|rest| rest.starts_with(char::is_whitespace))
                .map_or(target, str::trim);
            let href = match extract_quoted_value(target) {
                Some((href, _)) => Some(href),
                None if target.starts_with("http") || target.starts_with('/') => target
                    .split_whitespace()
                    .next()
                    .map(str::to_string),
                None => None,
            };
            match href.filter(|href| !href.is_empty()) {
                Some(href) => state.deferred.push(Deferred::Click {
                    line: line_number,
                    node: node.to_string(),
                    href,
                }),
                None => builder.add_warning(not_preserved(
                    line_number,
                    "click callback",
                    &format!("click {node} {target}"),
                )),
            }
        }
    }
}

fn intern_group(
    group: &[NodeToken<'_>],
    builder: &mut ModelBuilder,
    state: &FlowchartState,
) -> Vec<String> {
    group
        .iter()
        .map(|token| {
            let (variant, label) = match token.shape {
                Some((shape, label)) => (Some(NodeVariant::Flowchart(shape)), Some(label)),
                None => (None, None),
            };
            let id = builder.intern_node(token.id, label, variant);
            if let Some(class) = token.class
                && let Some(node) = builder.node_mut(&id)
            {
                node.set_meta(keys::CSS_CLASS, class);
            }
            if let Some(subgraph) = state.open_subgraphs.last()
                && let Err(error) = builder.model_mut().add_to_subgraph(&id, subgraph)
            {
                builder.add_warning(error.to_string());
            }
            id
        })
        .collect()
}

fn open_subgraph(rest: &str, builder: &mut ModelBuilder, state: &mut FlowchartState) {
    let (raw_id, title) = if rest.is_empty() {
        (None, None)
    } else if rest.starts_with('"') {
        (None, clean_label(rest))
    } else if let Some(open) = rest.find('[') {
        let title = rest[open + 1..].trim_end();
        let title = title.strip_suffix(']').unwrap_or(title);
        let id = rest[..open].trim();
        ((!id.is_empty()).then_some(id), clean_label(title))
    } else if rest.contains(char::is_whitespace) {
        (None, clean_label(rest))
    } else {
        (Some(rest), None)
    };

    let key = raw_id
        .map(str::to_string)
        .or_else(|| title.clone())
        .unwrap_or_default();
    if !key.is_empty()
        && let Some(existing) = state.subgraph_ids.get(&key).cloned()
    {
        state.open_subgraphs.push(existing);
        return;
    }

    let model = builder.model_mut();
    let sanitized = sanitize_identifier(&key);
    let base = if sanitized.is_empty() {
        format!("subgraph_{}", model.subgraphs.len() + 1)
    } else {
        sanitized
    };
    let id = disambiguate(&base, |candidate| model.subgraph(candidate).is_some());
    let subgraph = Subgraph {
        parent: state.open_subgraphs.last().cloned(),
        ..Subgraph::new(id.clone(), title)
    };
    if let Err(error) = model.add_subgraph(subgraph) {
        builder.add_warning(error.to_string());
        return;
    }
    if !key.is_empty() {
        state.subgraph_ids.insert(key, id.clone());
    }
    state.open_subgraphs.push(id);
}

/// `%% ido:subgraphs nodeA=sg1,sg2 nodeB=sg3`
fn read_pragma(
    trimmed: &str,
    line_number: usize,
    builder: &mut ModelBuilder,
    state: &mut FlowchartState,
) {
    let Some(entries) = trimmed
        .trim_start_matches('%')
        .trim()
        .strip_prefix(SUBGRAPH_PRAGMA)
    else {
        return;
    };
    for entry in entries.split_whitespace() {
        let Some((node, subgraphs)) = entry.split_once('=') else {
            builder.add_warning(format!(
                "Line {line_number}: malformed subgraph pragma entry: {entry}"
            ));
            continue;
        };
        state.deferred.push(Deferred::Membership {
            line: line_number,
            node: node.to_string(),
            subgraphs: subgraphs
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
        });
    }
}

fn apply_deferred(deferred: Vec<Deferred>, builder: &mut ModelBuilder, state: &FlowchartState) {
    for directive in deferred {
        match directive {
            Deferred::Style {
                line,
                target,
                props,
            } => match builder.resolve(&target) {
                Some(id) => {
                    if let Some(node) = builder.node_mut(&id) {
                        apply_style(node, &props);
                    }
                }
                None => builder.add_warning(format!(
                    "Line {line}: style target '{target}' is not a known node"
                )),
            },
            Deferred::LinkStyle {
                line,
                indices,
                props,
            } => apply_link_style(line, &indices, &props, builder),
            Deferred::ClassAssign { line, nodes, class } => {
                for raw in nodes {
                    match builder.resolve(&raw) {
                        Some(id) => {
                            if let Some(node) = builder.node_mut(&id) {
                                node.set_meta(keys::CSS_CLASS, class.as_str());
                            }
                        }
                        None => builder.add_warning(format!(
                            "Line {line}: class target '{raw}' is not a known node"
                        )),
                    }
                }
            }
            Deferred::Click { line, node, href } => match builder.resolve(&node) {
                Some(id) => {
                    if let Some(node) = builder.node_mut(&id) {
                        node.set_meta(keys::HREF, href);
                    }
                }
                None => builder.add_warning(format!(
                    "Line {line}: click target '{node}' is not a known node"
                )),
            },
            Deferred::Membership {
                line,
                node,
                subgraphs,
            } => {
                let Some(node_id) = builder.resolve(&node) else {
                    builder.add_warning(format!(
                        "Line {line}: subgraph pragma names unknown node '{node}'"
                    ));
                    continue;
                };
                for raw in subgraphs {
                    let subgraph_id = state
                        .subgraph_ids
                        .get(&raw)
                        .cloned()
                        .unwrap_or_else(|| raw.clone());
                    if let Err(error) = builder.model_mut().add_to_subgraph(&node_id, &subgraph_id)
                    {
                        builder.add_warning(format!("Line {line}: subgraph pragma: {error}"));
                    }
                }
            }
        }
    }
}

fn apply_link_style(line: usize, indices: &str, props: &str, builder: &mut ModelBuilder) {
    for raw in indices.split(',').map(str::trim).filter(|raw| !raw.is_empty()) {
        if raw == "default" {
            if let DiagramConfig::Flowchart(config) = builder.config_mut() {
                config.default_link_style = Some(props.to_string());
            }
            continue;
        }
        let edge = raw
            .parse::<usize>()
            .ok()
            .filter(|&index| index < builder.edge_count());
        match edge.and_then(|index| builder.edge_mut(index)) {
            Some(edge) => apply_style(edge, props),
            None => builder.add_warning(format!(
                "Line {line}: linkStyle index {raw} does not match an edge"
            )),
        }
    }
}

/// Map `fill`, `stroke` and `color` onto metadata; keep everything else verbatim.
fn apply_style(target: &mut impl HasMetadata, props: &str) {
    let mut extra = Vec::new();
    for prop in props.split(',').map(str::trim).filter(|prop| !prop.is_empty()) {
        let key = prop
            .split_once(':')
            .and_then(|(name, value)| match name.trim() {
                "fill" => Some((keys::FILL, value.trim())),
                "stroke" => Some((keys::STROKE, value.trim())),
                "color" => Some((keys::COLOR, value.trim())),
                _ => None,
            });
        match key {
            Some((key, value)) => target.set_meta(key, value),
            None => extra.push(prop),
        }
    }
    if !extra.is_empty() {
        target.set_meta(keys::STYLE_EXTRA, extra.join(","));
    }
}
