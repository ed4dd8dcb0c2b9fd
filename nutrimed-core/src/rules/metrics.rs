use crate::classifier::{classify_line, LineKind};
use crate::types::{Metric, MetricKind};
use regex::Regex;
use std::sync::LazyLock;

// Number or range: "350", "1,200", "400-500", "~12.5"
static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?(?:\s*[-–]\s*\d[\d,]*(?:\.\d+)?)?)\s*(kcal|cal|mg|g)?\b")
        .expect("valid regex")
});

/// Label aliases for the canonical metrics
const METRIC_ALIASES: &[(MetricKind, &[&str])] = &[
    (MetricKind::Calories, &["calories", "calorie", "energy", "kcal"]),
    (MetricKind::Protein, &["protein", "proteins"]),
    (MetricKind::Carbs, &["carbs", "carb", "carbohydrates", "carbohydrate", "total carbs"]),
    (MetricKind::Fat, &["fat", "fats", "total fat"]),
    (MetricKind::Fiber, &["fiber", "fibre", "dietary fiber"]),
    (MetricKind::Sugar, &["sugar", "sugars", "total sugar"]),
    (MetricKind::Sodium, &["sodium", "salt"]),
];

fn metric_kind_for(label: &str) -> Option<MetricKind> {
    let lower = label.trim().to_lowercase();
    METRIC_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|a| *a == lower))
        .map(|(kind, _)| *kind)
}

/// Parse a key-metrics region into the canonical metric list.
///
/// The seven canonical metrics always come first and in fixed order, with
/// `placeholder` standing in for any the source left out. Extra labels follow
/// in the order they appeared. Never fails: a token without a colon is kept
/// as a label with an empty value. A label whose value is empty, or a line
/// with no colon at all, contributes nothing.
pub fn parse_metrics(region: &str, placeholder: &str) -> Vec<Metric> {
    let mut canonical: [Option<String>; 7] = Default::default();
    let mut extras: Vec<Metric> = Vec::new();

    for token in tokenize(region) {
        let (label, raw_value) = match token.split_once(':') {
            Some((label, value)) if !value.trim().is_empty() => (label.trim(), value.trim()),
            // "Vitamin C:" names a metric but gives it nothing to show
            Some(_) => continue,
            None => (token.as_str(), ""),
        };
        if label.is_empty() || is_score_label(label) {
            continue;
        }

        match metric_kind_for(label) {
            Some(kind) => {
                let slot = &mut canonical[kind.index()];
                if slot.is_none() {
                    *slot = normalize_value(kind, raw_value);
                }
            }
            None => {
                if !extras.iter().any(|m| m.label.eq_ignore_ascii_case(label)) {
                    extras.push(Metric {
                        label: label.to_string(),
                        value: raw_value.to_string(),
                        kind: None,
                    });
                }
            }
        }
    }

    MetricKind::CANONICAL
        .iter()
        .zip(canonical)
        .map(|(kind, value)| Metric {
            label: kind.label().to_string(),
            value: value.unwrap_or_else(|| placeholder.to_string()),
            kind: Some(*kind),
        })
        .chain(extras)
        .collect()
}

/// Score lines often trail the metrics line; they belong to the score rule
fn is_score_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    lower.contains("score") || lower.contains("rating")
}

/// Split on `|` when the line uses pipes, otherwise on commas. Newlines
/// always separate. A comma between two digits is a thousands separator.
/// Lines without a colon are description, not metrics.
fn tokenize(region: &str) -> Vec<String> {
    let mut tokens = Vec::new();

    for line in region.lines() {
        let line = line.trim();
        if !line.contains(':') || classify_line(line) == LineKind::Separator {
            continue;
        }
        if line.contains('|') {
            tokens.extend(line.split('|').map(|t| t.trim().to_string()));
            continue;
        }

        let chars: Vec<char> = line.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            let digit_before = i > 0 && chars[i - 1].is_ascii_digit();
            let digit_after = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
            if c == ',' && !(digit_before && digit_after) {
                tokens.push(std::mem::take(&mut current).trim().to_string());
            } else {
                current.push(c);
            }
        }
        tokens.push(current.trim().to_string());
    }

    tokens
        .into_iter()
        .map(|t| t.trim_start_matches(['•', '-', '*']).trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn normalize_value(kind: MetricKind, raw: &str) -> Option<String> {
    let caps = QUANTITY_RE.captures(raw)?;
    let quantity: String = caps[1]
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '–' { '-' } else { c })
        .collect();
    let unit = caps.get(2).map(|u| u.as_str().to_lowercase());

    let value = match (kind, unit.as_deref()) {
        // Energy always carries its unit
        (MetricKind::Calories, _) => format!("{quantity} kcal"),
        (_, Some(unit)) => format!("{quantity}{unit}"),
        (_, None) => quantity,
    };
    Some(value)
}
