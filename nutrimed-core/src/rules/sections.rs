use crate::classifier::{classify_line, is_header_line, LineKind, Occurrence, SECTION_LABELS};
use crate::types::SectionKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// Raw bodies of the named regions found in one normalized text
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedRegions {
    regions: BTreeMap<SectionKind, String>,
    /// Every header line seen, in text order (line index, kind)
    pub headers: Vec<(usize, SectionKind)>,
}

impl ExtractedRegions {
    pub fn get(&self, kind: SectionKind) -> Option<&str> {
        self.regions.get(&kind).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_fallback(&self) -> bool {
        self.regions.contains_key(&SectionKind::General)
    }

    pub fn kinds(&self) -> impl Iterator<Item = SectionKind> + '_ {
        self.regions.keys().copied()
    }
}

struct HeaderHit {
    line: usize,
    kind: SectionKind,
    inline: Option<String>,
}

/// Split normalized text into named regions.
///
/// A region starts at its header line and ends right before the next header
/// line of any kind, so a header never lands inside a body. Duplicate headers
/// are resolved per label: condition summaries take the last occurrence (the
/// model sometimes echoes the next header inside the previous block), the
/// leading fields take the first.
pub fn extract_regions(normalized: &str) -> ExtractedRegions {
    let lines: Vec<&str> = normalized.lines().collect();

    let hits: Vec<HeaderHit> = lines
        .iter()
        .enumerate()
        .filter_map(|(line, text)| match classify_line(text) {
            LineKind::Header { kind, inline } => Some(HeaderHit { line, kind, inline }),
            _ => None,
        })
        .collect();

    let mut extracted = ExtractedRegions {
        regions: BTreeMap::new(),
        headers: hits.iter().map(|h| (h.line, h.kind)).collect(),
    };

    for label in SECTION_LABELS {
        let mut occurrences = hits.iter().enumerate().filter(|(_, h)| h.kind == label.kind);
        let chosen = match label.occurrence {
            Occurrence::First => occurrences.next(),
            Occurrence::Last => occurrences.last(),
        };
        let Some((hit_index, hit)) = chosen else {
            continue;
        };

        let end = hits
            .get(hit_index + 1)
            .map(|next| next.line)
            .unwrap_or(lines.len());

        let mut body_lines: Vec<&str> = Vec::new();
        if let Some(inline) = hit.inline.as_deref() {
            body_lines.push(inline);
        }
        body_lines.extend(&lines[hit.line + 1..end]);

        let body = body_lines.join("\n").trim().to_string();
        let has_content = body
            .lines()
            .any(|l| !l.trim().is_empty() && classify_line(l) != LineKind::Separator);
        if !has_content {
            tracing::debug!("Region {:?} has an empty body, treating as absent", label.kind);
            continue;
        }
        extracted.regions.insert(label.kind, body);
    }

    if extracted.regions.is_empty() && !normalized.trim().is_empty() {
        tracing::debug!("No recognized labels, using the whole text as a general region");
        extracted
            .regions
            .insert(SectionKind::General, normalized.trim().to_string());
    }

    extracted
}

/// First non-empty line of the dish region, if it is a plausible name.
/// The line is kept as written, trailing punctuation included.
pub fn extract_dish_name(body: &str, max_chars: usize) -> Option<String> {
    let first = body
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && classify_line(l) != LineKind::Separator)?;
    let len = first.chars().count();
    if len > 0 && len < max_chars && !is_header_line(first) {
        Some(first.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;

    #[test]
    fn splits_labeled_regions() {
        let text = normalize(
            "DISH: Margherita pizza\n---\nKEY METRICS:\nCalories: 800 kcal | Protein: 30g\n---\nCURRENT CONDITION SUMMARY:\nHigh in sodium.\n---\nCONCERNED CONDITION SUMMARY:\nWatch the cheese.",
        );
        let regions = extract_regions(&text);
        assert_eq!(regions.get(SectionKind::Dish), Some("Margherita pizza\n---"));
        assert_eq!(
            regions.get(SectionKind::KeyMetrics),
            Some("Calories: 800 kcal | Protein: 30g\n---")
        );
        assert_eq!(
            regions.get(SectionKind::CurrentCondition),
            Some("High in sodium.\n---")
        );
        assert_eq!(
            regions.get(SectionKind::ConcernedCondition),
            Some("Watch the cheese.")
        );
        assert!(!regions.is_fallback());
    }

    #[test]
    fn duplicate_concerned_header_uses_last_occurrence() {
        let text = "CURRENT CONDITION SUMMARY:\nFine for diabetes.\nCONCERNED CONDITION SUMMARY:\nEcho inside current.\n---\nCONCERNED CONDITION SUMMARY:\nLimit salt for blood pressure.";
        let regions = extract_regions(text);
        assert_eq!(
            regions.get(SectionKind::ConcernedCondition),
            Some("Limit salt for blood pressure.")
        );
        let current = regions.get(SectionKind::CurrentCondition).unwrap();
        assert_eq!(current, "Fine for diabetes.");
        assert!(!current.to_uppercase().contains("CONCERNED CONDITION SUMMARY"));
    }

    #[test]
    fn whitespace_only_body_is_absent() {
        let regions = extract_regions("FOOD SUMMARY:\n   \nKEY METRICS: Calories: 100");
        assert_eq!(regions.get(SectionKind::FoodSummary), None);
        assert_eq!(regions.get(SectionKind::KeyMetrics), Some("Calories: 100"));
    }

    #[test]
    fn separator_only_body_is_absent() {
        let regions = extract_regions("DISH: Soup\nCURRENT CONDITION SUMMARY:\n---\n***");
        assert_eq!(regions.get(SectionKind::CurrentCondition), None);
        assert_eq!(regions.get(SectionKind::Dish), Some("Soup"));
    }

    #[test]
    fn unlabeled_text_becomes_general_region() {
        let text = "This bowl of oatmeal is a solid breakfast choice.";
        let regions = extract_regions(text);
        assert!(regions.is_fallback());
        assert_eq!(regions.get(SectionKind::General), Some(text));
        assert_eq!(regions.len(), 1);
    }

    #[test]
    fn empty_text_has_no_regions() {
        assert!(extract_regions("").is_empty());
    }

    #[test]
    fn dish_name_bounds() {
        assert_eq!(
            extract_dish_name("Grilled Chicken Salad\nmore", 120),
            Some("Grilled Chicken Salad".to_string())
        );
        assert_eq!(extract_dish_name(&"x".repeat(120), 120), None);
        assert_eq!(extract_dish_name("", 120), None);
        assert_eq!(extract_dish_name("---\nRamen", 120), Some("Ramen".to_string()));
    }

    #[test]
    fn dish_name_keeps_its_punctuation() {
        assert_eq!(extract_dish_name("Pad Thai.", 120), Some("Pad Thai.".to_string()));
        assert_eq!(extract_dish_name("Fish & chips...\nmore", 120), Some("Fish & chips...".to_string()));
    }
}
