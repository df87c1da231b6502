use ido_core::DiagramType;
use serde::Serialize;

use crate::text::{first_significant_line, levenshtein_distance};

/// How a diagram type was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DetectionMethod {
    /// Header keyword matched.
    ExactKeyword,
    /// Nothing matched; flowchart assumed.
    Fallback,
}

impl DetectionMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExactKeyword => "explicit keyword match",
            Self::Fallback => "fallback to flowchart",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedType {
    pub diagram_type: DiagramType,
    /// 1.0 for a keyword match, lower for a fallback.
    pub confidence: f32,
    pub method: DetectionMethod,
    pub warnings: Vec<String>,
}

/// Lowercase header prefixes, checked in order.
const KEYWORDS: [(&str, &str, DiagramType); 9] = [
    ("flowchart", "flowchart", DiagramType::Flowchart),
    ("graph", "graph", DiagramType::Flowchart),
    ("sequencediagram", "sequenceDiagram", DiagramType::Sequence),
    ("classdiagram", "classDiagram", DiagramType::Class),
    ("statediagram", "stateDiagram", DiagramType::State),
    ("erdiagram", "erDiagram", DiagramType::Er),
    ("gantt", "gantt", DiagramType::Gantt),
    ("pie", "pie", DiagramType::Pie),
    ("gitgraph", "gitGraph", DiagramType::GitGraph),
];

/// Classify a document by its first significant line. Never fails: anything
/// unrecognized is a flowchart.
#[must_use]
pub fn detect_type(input: &str) -> DiagramType {
    detect_type_with_confidence(input).diagram_type
}

#[must_use]
pub fn detect_type_with_confidence(input: &str) -> DetectedType {
    let Some(first_line) = first_significant_line(input) else {
        return DetectedType {
            diagram_type: DiagramType::Flowchart,
            confidence: 0.0,
            method: DetectionMethod::Fallback,
            warnings: Vec::new(),
        };
    };
    let lower = first_line.to_ascii_lowercase();

    if let Some((_, _, diagram_type)) = KEYWORDS
        .iter()
        .find(|(prefix, _, _)| lower.starts_with(prefix))
    {
        return DetectedType {
            diagram_type: *diagram_type,
            confidence: 1.0,
            method: DetectionMethod::ExactKeyword,
            warnings: Vec::new(),
        };
    }

    let mut warnings = Vec::new();
    if let Some(suggestion) = near_miss_keyword(&lower) {
        warnings.push(format!(
            "Unrecognized diagram header '{first_line}'; did you mean '{suggestion}'? Parsing as flowchart"
        ));
    } else {
        warnings.push("Could not detect diagram type; assuming flowchart".to_string());
    }
    DetectedType {
        diagram_type: DiagramType::Flowchart,
        confidence: 0.3,
        method: DetectionMethod::Fallback,
        warnings,
    }
}

fn near_miss_keyword(lower: &str) -> Option<&'static str> {
    let token = lower
        .split(|ch: char| ch.is_whitespace() || ch == ':')
        .next()
        .filter(|token| token.chars().count() >= 3)?;
    KEYWORDS
        .iter()
        .map(|(prefix, display, _)| (levenshtein_distance(token, prefix), *display))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, display)| display)
}
