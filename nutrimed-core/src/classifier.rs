// Line classification shared by section extraction and point classification.
//
// The label table below is the only place that knows which headers exist.
// Section boundaries and the header filter for section bodies both read it,
// so a new section is added by adding a row here.

use crate::types::SectionKind;
use regex::Regex;
use std::sync::LazyLock;

/// Which occurrence wins when a header appears more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    First,
    Last,
}

#[derive(Debug, Clone, Copy)]
pub struct SectionLabel {
    pub kind: SectionKind,
    /// Upper-case aliases, longest first so "DISH NAME" wins over "DISH"
    pub aliases: &'static [&'static str],
    pub title: &'static str,
    pub occurrence: Occurrence,
}

pub const SECTION_LABELS: &[SectionLabel] = &[
    SectionLabel {
        kind: SectionKind::Dish,
        aliases: &["IDENTIFIED FOOD", "DISH NAME", "DISH"],
        title: "Identified food",
        occurrence: Occurrence::First,
    },
    SectionLabel {
        kind: SectionKind::FoodSummary,
        aliases: &["FOOD SUMMARY", "MEAL SUMMARY"],
        title: "Food summary",
        occurrence: Occurrence::First,
    },
    SectionLabel {
        kind: SectionKind::KeyMetrics,
        aliases: &["NUTRITION METRICS", "KEY METRICS"],
        title: "Key metrics",
        occurrence: Occurrence::First,
    },
    SectionLabel {
        kind: SectionKind::CurrentCondition,
        aliases: &[
            "CURRENT MEDICAL CONDITION SUMMARY",
            "CURRENT CONDITION SUMMARY",
        ],
        title: "Current medical condition summary",
        occurrence: Occurrence::Last,
    },
    SectionLabel {
        kind: SectionKind::ConcernedCondition,
        aliases: &[
            "CONCERNED MEDICAL CONDITION SUMMARY",
            "CONCERNED CONDITION SUMMARY",
        ],
        title: "Concerned condition summary",
        occurrence: Occurrence::Last,
    },
    SectionLabel {
        kind: SectionKind::Alternatives,
        aliases: &["HEALTHIER ALTERNATIVES", "ALTERNATIVES"],
        title: "Healthier alternatives",
        occurrence: Occurrence::Last,
    },
    SectionLabel {
        kind: SectionKind::AdditionalInfo,
        aliases: &[
            "ADDITIONAL INFORMATION",
            "ADDITIONAL NOTES",
            "ADDITIONAL INFO",
        ],
        title: "Additional notes",
        occurrence: Occurrence::Last,
    },
];

/// Title for the fallback region used when no label matched
pub const GENERAL_TITLE: &str = "Summary";

pub fn label_for(kind: SectionKind) -> Option<&'static SectionLabel> {
    SECTION_LABELS.iter().find(|l| l.kind == kind)
}

pub fn title_for(kind: SectionKind) -> &'static str {
    label_for(kind).map(|l| l.title).unwrap_or(GENERAL_TITLE)
}

// One alternation over every alias, built from the table
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    let aliases: Vec<String> = SECTION_LABELS
        .iter()
        .flat_map(|l| l.aliases.iter())
        .map(|a| regex::escape(a).replace(' ', r"\s+"))
        .collect();
    Regex::new(&format!(
        r"(?i)^\s*(?:[•*\-]\s*)?(?:-{{2,}}\s*)?(?:#+\s*)?({})\s*(?::\s*(.*?))?\s*$",
        aliases.join("|")
    ))
    .expect("valid header regex")
});

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\-–—=_*•·~]+$").expect("valid regex"));

static SUB_SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[•*\-]\s*)?([a-z][a-z ]{0,40}?(?:score|rating))\s*:\s*(\d+(?:\.\d+)?)\s*/\s*10\b",
    )
    .expect("valid regex")
});

// "•", "- ", "* ", "1. ", "2) " at line start
static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[•·]\s*|[*\-–]+\s+|\d{1,2}[.)]\s+)").expect("valid regex")
});

pub fn has_list_marker(line: &str) -> bool {
    LIST_MARKER_RE.is_match(line)
}

/// The line without its leading bullet or list number, trimmed
pub fn strip_list_marker(line: &str) -> &str {
    match LIST_MARKER_RE.find(line) {
        Some(marker) => line[marker.end()..].trim(),
        None => line.trim(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// A recognized section label, with any content after its colon
    Header {
        kind: SectionKind,
        inline: Option<String>,
    },
    /// Rule lines like `---` or `***`
    Separator,
    /// "Health score: 8/10" style line; value is on the 0-10 scale
    SubScore { label: String, value: f64 },
    Content,
}

pub fn classify_line(line: &str) -> LineKind {
    if let Some((kind, inline)) = match_header(line) {
        return LineKind::Header { kind, inline };
    }
    if SEPARATOR_RE.is_match(line) {
        return LineKind::Separator;
    }
    if let Some(caps) = SUB_SCORE_RE.captures(line) {
        if let Ok(value) = caps[2].parse::<f64>() {
            return LineKind::SubScore {
                label: caps[1].trim().to_string(),
                value,
            };
        }
    }
    LineKind::Content
}

pub fn is_header_line(line: &str) -> bool {
    match_header(line).is_some()
}

fn match_header(line: &str) -> Option<(SectionKind, Option<String>)> {
    let caps = HEADER_RE.captures(line)?;
    let matched = caps.get(1)?.as_str();
    let kind = kind_for_alias(matched)?;
    let inline = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());
    Some((kind, inline))
}

fn kind_for_alias(matched: &str) -> Option<SectionKind> {
    let collapsed = matched
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();
    SECTION_LABELS
        .iter()
        .find(|l| l.aliases.iter().any(|a| *a == collapsed))
        .map(|l| l.kind)
}
