#![forbid(unsafe_code)]

//! ido CLI - move Mermaid diagrams between source text and the graph model.
//!
//! # Commands
//!
//! - `detect`: Show the detected diagram type and how it was chosen
//! - `normalize`: Print the canonical form of a document
//! - `parse`: Output the graph model as JSON
//! - `serialize`: Turn graph model JSON back into Mermaid source
//! - `roundtrip`: Parse, serialize and re-parse, reporting any drift
//! - `validate`: Check input and report diagnostics

use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ido_core::{DiagramType, GraphModel};
use ido_parser::{detect_type_with_confidence, normalize, parse, parse_as};
use ido_serializer::{SerializeOptions, serialize_with_options};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "ido",
    version,
    about = "Move Mermaid diagrams between source text and a typed graph model",
    long_about = "Parses flowchart, sequence, class, state, ER, gantt, pie and gitGraph\n\
        diagrams into one JSON graph model and serializes that model back to Mermaid."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Detect the diagram type of a document.
    Detect {
        /// Input file path, "-" for stdin, or inline diagram text.
        #[arg(default_value = "-")]
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the normalized form of a document.
    Normalize {
        /// Input file path, "-" for stdin, or inline diagram text.
        #[arg(default_value = "-")]
        input: String,
    },

    /// Parse a document and output its graph model as JSON.
    Parse {
        /// Input file path, "-" for stdin, or inline diagram text.
        #[arg(default_value = "-")]
        input: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Parse as this diagram type instead of detecting it
        #[arg(long = "type", value_parser = parse_diagram_type)]
        diagram_type: Option<DiagramType>,
    },

    /// Serialize graph model JSON back to Mermaid source.
    Serialize {
        /// Model JSON file path, "-" for stdin, or inline JSON.
        #[arg(default_value = "-")]
        input: String,

        /// Spaces per nesting level
        #[arg(long, default_value_t = 4)]
        indent: usize,

        /// Output file path. If omitted, writes to stdout.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Parse, serialize and re-parse a document, reporting semantic drift.
    Roundtrip {
        /// Input file path, "-" for stdin, or inline diagram text.
        #[arg(default_value = "-")]
        input: String,

        /// Spaces per nesting level
        #[arg(long, default_value_t = 4)]
        indent: usize,

        /// Output a JSON report instead of the serialized source
        #[arg(long)]
        json: bool,
    },

    /// Validate a document and report diagnostics.
    Validate {
        /// Input file path, "-" for stdin, or inline diagram text.
        #[arg(default_value = "-")]
        input: String,

        /// Output as JSON (structured diagnostics)
        #[arg(long)]
        json: bool,

        /// Exit with non-zero status on warnings (not just errors)
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Debug, Serialize)]
struct DetectResult {
    diagram_type: String,
    confidence: f32,
    detection_method: String,
    first_line: String,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RoundtripResult {
    diagram_type: String,
    stable: bool,
    node_count: usize,
    edge_count: usize,
    parse_warnings: Vec<String>,
    serialize_warnings: Vec<String>,
    drift: Vec<String>,
    code: String,
}

#[derive(Debug, Serialize)]
struct ValidateResult {
    valid: bool,
    diagram_type: String,
    node_count: usize,
    edge_count: usize,
    warnings: Vec<ValidationWarning>,
    errors: Vec<ValidationError>,
}

#[derive(Debug, Serialize)]
struct ValidationWarning {
    code: String,
    message: String,
    suggestion: Option<String>,
}

#[derive(Debug, Serialize)]
struct ValidationError {
    code: String,
    message: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Detect { input, json } => cmd_detect(&input, json),
        Command::Normalize { input } => cmd_normalize(&input),
        Command::Parse {
            input,
            pretty,
            diagram_type,
        } => cmd_parse(&input, pretty, diagram_type),
        Command::Serialize {
            input,
            indent,
            output,
        } => cmd_serialize(&input, indent, output.as_deref()),
        Command::Roundtrip {
            input,
            indent,
            json,
        } => cmd_roundtrip(&input, indent, json),
        Command::Validate {
            input,
            json,
            strict,
        } => cmd_validate(&input, json, strict),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

/// Accepts the model's type names and the Mermaid header keywords.
fn parse_diagram_type(raw: &str) -> Result<DiagramType, String> {
    DiagramType::ALL
        .into_iter()
        .find(|candidate| {
            candidate.as_str().eq_ignore_ascii_case(raw)
                || candidate.header_keyword().eq_ignore_ascii_case(raw)
        })
        .ok_or_else(|| {
            let names: Vec<&str> = DiagramType::ALL.iter().map(|kind| kind.as_str()).collect();
            format!("unknown diagram type '{raw}' (expected one of: {})", names.join(", "))
        })
}

fn load_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else if Path::new(input).exists() {
        std::fs::read_to_string(input).context(format!("Failed to read file: {input}"))
    } else {
        // Inline diagram text
        Ok(input.to_string())
    }
}

fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).context(format!("Failed to write to: {path}"))?;
            info!("Wrote output to: {path}");
        }
        None => {
            io::stdout()
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn log_warnings(source: &str, warnings: &[String]) {
    for warning in warnings {
        warn!("{source} warning: {warning}");
    }
}

// =============================================================================
// Command: detect
// =============================================================================

fn cmd_detect(input: &str, json_output: bool) -> Result<()> {
    let source = normalize(&load_input(input)?);
    let detected = detect_type_with_confidence(&source);
    let first_line = source
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("%%"))
        .unwrap_or_default();

    let result = DetectResult {
        diagram_type: detected.diagram_type.as_str().to_string(),
        confidence: detected.confidence,
        detection_method: detected.method.as_str().to_string(),
        first_line: first_line.chars().take(100).collect(),
        warnings: detected.warnings,
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Diagram type: {}", result.diagram_type);
        println!("Confidence:   {:.1}", result.confidence);
        println!("Method:       {}", result.detection_method);
        if !result.first_line.is_empty() {
            println!(
                "First line:   {}",
                result.first_line.chars().take(60).collect::<String>()
            );
        }
        for warning in &result.warnings {
            println!("Warning:      {warning}");
        }
    }
    Ok(())
}

// =============================================================================
// Command: normalize
// =============================================================================

fn cmd_normalize(input: &str) -> Result<()> {
    let source = load_input(input)?;
    println!("{}", normalize(&source));
    Ok(())
}

// =============================================================================
// Command: parse
// =============================================================================

fn cmd_parse(input: &str, pretty: bool, diagram_type: Option<DiagramType>) -> Result<()> {
    let source = load_input(input)?;
    let model = match diagram_type {
        Some(diagram_type) => parse_as(&source, diagram_type),
        None => parse(&source),
    };
    debug!(diagram_type = %model.diagram_type, "parsed input");

    let output = if pretty {
        serde_json::to_string_pretty(&model)?
    } else {
        serde_json::to_string(&model)?
    };
    println!("{output}");

    log_warnings("Parse", &model.warnings);
    Ok(())
}

// =============================================================================
// Command: serialize
// =============================================================================

fn cmd_serialize(input: &str, indent: usize, output: Option<&str>) -> Result<()> {
    let json = load_input(input)?;
    let model: GraphModel =
        serde_json::from_str(&json).context("Input is not a graph model JSON document")?;
    if let Err(error) = model.check() {
        warn!("Model is inconsistent: {error}");
    }

    let serialized = serialize_with_options(&model, &SerializeOptions { indent })
        .context("Failed to serialize model")?;
    write_output(output, &serialized.code)?;

    log_warnings("Serialize", &serialized.warnings);
    Ok(())
}

// =============================================================================
// Command: roundtrip
// =============================================================================

fn cmd_roundtrip(input: &str, indent: usize, json_output: bool) -> Result<()> {
    let source = load_input(input)?;
    let result = roundtrip(&source, indent)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", result.code);
        log_warnings("Parse", &result.parse_warnings);
        log_warnings("Serialize", &result.serialize_warnings);
        for drift in &result.drift {
            warn!("Round trip drift: {drift}");
        }
    }

    if !result.stable {
        std::process::exit(1);
    }
    Ok(())
}

fn roundtrip(source: &str, indent: usize) -> Result<RoundtripResult> {
    let model = parse(source);
    let serialized = serialize_with_options(&model, &SerializeOptions { indent })
        .context("Failed to serialize parsed model")?;
    let reparsed = parse_as(&serialized.code, model.diagram_type);
    let drift = compare_models(&model, &reparsed);

    Ok(RoundtripResult {
        diagram_type: model.diagram_type.as_str().to_string(),
        stable: drift.is_empty(),
        node_count: model.nodes.len(),
        edge_count: model.edges.len(),
        parse_warnings: model.warnings,
        serialize_warnings: serialized.warnings,
        drift,
        code: serialized.code,
    })
}

/// Differences in node identity, variant and label, and in the edge set.
fn compare_models(before: &GraphModel, after: &GraphModel) -> Vec<String> {
    let mut drift = Vec::new();
    for node in &before.nodes {
        match after.node(&node.id) {
            None => drift.push(format!("node '{}' was lost", node.id)),
            Some(other) if other.variant != node.variant => {
                drift.push(format!("node '{}' changed variant", node.id));
            }
            Some(other) if other.label != node.label => drift.push(format!(
                "node '{}' label changed from '{}' to '{}'",
                node.id, node.label, other.label
            )),
            Some(_) => {}
        }
    }
    for node in &after.nodes {
        if before.node(&node.id).is_none() {
            drift.push(format!("node '{}' appeared", node.id));
        }
    }

    let edge_keys = |model: &GraphModel| {
        let mut keys: Vec<String> = model
            .edges
            .iter()
            .map(|edge| {
                format!(
                    "{} -> {} ({:?}) {}",
                    edge.source,
                    edge.target,
                    edge.variant,
                    edge.label.as_deref().unwrap_or_default()
                )
            })
            .collect();
        keys.sort();
        keys
    };
    let (before_edges, after_edges) = (edge_keys(before), edge_keys(after));
    for key in &before_edges {
        if !after_edges.contains(key) {
            drift.push(format!("edge {key} was lost"));
        }
    }
    for key in &after_edges {
        if !before_edges.contains(key) {
            drift.push(format!("edge {key} appeared"));
        }
    }
    drift
}

// =============================================================================
// Command: validate
// =============================================================================

fn cmd_validate(input: &str, json_output: bool, strict: bool) -> Result<()> {
    let source = load_input(input)?;
    let result = validate(&source, strict);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if result.valid {
            println!("✓ Valid {} diagram", result.diagram_type);
        } else {
            println!("✗ Invalid diagram");
        }

        println!("  Nodes: {}", result.node_count);
        println!("  Edges: {}", result.edge_count);

        if !result.errors.is_empty() {
            println!("\nErrors:");
            for error in &result.errors {
                println!("  [{}] {}", error.code, error.message);
            }
        }

        if !result.warnings.is_empty() {
            println!("\nWarnings:");
            for warning in &result.warnings {
                println!("  [{}] {}", warning.code, warning.message);
                if let Some(suggestion) = &warning.suggestion {
                    println!("       → {suggestion}");
                }
            }
        }
    }

    if !result.valid {
        std::process::exit(1);
    }
    Ok(())
}

fn validate(source: &str, strict: bool) -> ValidateResult {
    let model = parse(source);
    let warnings: Vec<ValidationWarning> = model
        .warnings
        .iter()
        .map(|message| ValidationWarning {
            code: categorize_warning(message).to_string(),
            message: message.clone(),
            suggestion: suggest_fix(message),
        })
        .collect();

    let mut errors = Vec::new();
    if model.nodes.is_empty() {
        errors.push(ValidationError {
            code: "E001".to_string(),
            message: "Diagram has no nodes".to_string(),
        });
    }
    if let Err(error) = model.check() {
        errors.push(ValidationError {
            code: "E002".to_string(),
            message: error.to_string(),
        });
    }

    ValidateResult {
        valid: errors.is_empty() && (!strict || warnings.is_empty()),
        diagram_type: model.diagram_type.as_str().to_string(),
        node_count: model.nodes.len(),
        edge_count: model.edges.len(),
        warnings,
        errors,
    }
}

fn categorize_warning(message: &str) -> &'static str {
    let lower = message.to_lowercase();

    if lower.contains("empty") {
        "W001"
    } else if lower.contains("duplicate") || lower.contains("already exists") {
        "W002"
    } else if lower.contains("unknown") || lower.contains("unrecognized") {
        "W003"
    } else if lower.contains("not preserved") {
        "W004"
    } else if lower.contains("unsupported") {
        "W005"
    } else {
        "W000"
    }
}

fn suggest_fix(message: &str) -> Option<String> {
    let lower = message.to_lowercase();

    if lower.contains("empty") {
        Some("Add a diagram header and at least one node".to_string())
    } else if lower.contains("could not detect") || lower.contains("unrecognized diagram header") {
        Some("Start your diagram with a type declaration like 'flowchart LR'".to_string())
    } else if lower.contains("not preserved") {
        Some("This construct is dropped when the diagram is serialized again".to_string())
    } else {
        None
    }
}
