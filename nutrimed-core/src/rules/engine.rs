use super::metrics::parse_metrics;
use super::points::classify_points;
use super::score::find_score;
use super::sections::{extract_dish_name, ExtractedRegions};
use crate::classifier::{classify_line, is_header_line, strip_list_marker, title_for, LineKind};
use crate::config::{ParsingConfig, PipelineConfig};
use crate::types::*;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Everything a rule may read
pub struct RuleInput<'a> {
    pub normalized: &'a str,
    pub regions: &'a ExtractedRegions,
    pub config: &'a ParsingConfig,
}

/// Mutable accumulator the rules fill in.
///
/// Never leaves the engine: `finish` turns it into the immutable Document.
#[derive(Debug, Default)]
pub struct DocumentDraft {
    dish_name: Option<String>,
    food_summary: Option<String>,
    score: Option<u8>,
    metrics: Vec<Metric>,
    sections: Vec<ConditionSection>,
    alternatives: Vec<String>,
    additional_info: Option<String>,
}

impl DocumentDraft {
    pub fn finish(self) -> Document {
        Document {
            dish_name: self.dish_name,
            food_summary: self.food_summary,
            score: self.score,
            metrics: self.metrics,
            sections: self.sections,
            alternatives: self.alternatives,
            additional_info: self.additional_info,
        }
    }
}

pub trait ExtractionRule {
    fn apply(&self, input: &RuleInput<'_>, draft: &mut DocumentDraft);
    fn name(&self) -> &str;
}

pub struct DishNameRule;

impl ExtractionRule for DishNameRule {
    fn apply(&self, input: &RuleInput<'_>, draft: &mut DocumentDraft) {
        draft.dish_name = input
            .regions
            .get(SectionKind::Dish)
            .and_then(|body| extract_dish_name(body, input.config.dish_name_max_chars));
    }

    fn name(&self) -> &str {
        "DishName"
    }
}

pub struct FoodSummaryRule;

impl ExtractionRule for FoodSummaryRule {
    fn apply(&self, input: &RuleInput<'_>, draft: &mut DocumentDraft) {
        draft.food_summary = input
            .regions
            .get(SectionKind::FoodSummary)
            .and_then(paragraph);
    }

    fn name(&self) -> &str {
        "FoodSummary"
    }
}

pub struct KeyMetricsRule;

impl ExtractionRule for KeyMetricsRule {
    fn apply(&self, input: &RuleInput<'_>, draft: &mut DocumentDraft) {
        draft.metrics = input
            .regions
            .get(SectionKind::KeyMetrics)
            .map(|body| parse_metrics(body, &input.config.metric_placeholder))
            .unwrap_or_default();
    }

    fn name(&self) -> &str {
        "KeyMetrics"
    }
}

/// Current and concerned condition blocks, or the general fallback block
pub struct ConditionSectionsRule;

impl ExtractionRule for ConditionSectionsRule {
    fn apply(&self, input: &RuleInput<'_>, draft: &mut DocumentDraft) {
        if let Some(text) = input.regions.get(SectionKind::General) {
            // Unlabeled text is shown verbatim rather than guessed at
            draft.sections.push(ConditionSection {
                kind: SectionKind::General,
                title: title_for(SectionKind::General).to_string(),
                summary_line: None,
                health_score: None,
                points: Vec::new(),
                body: text.to_string(),
            });
            return;
        }

        for kind in [SectionKind::CurrentCondition, SectionKind::ConcernedCondition] {
            let Some(body) = input.regions.get(kind) else {
                continue;
            };
            let classified = classify_points(body, input.config);
            draft.sections.push(ConditionSection {
                kind,
                title: title_for(kind).to_string(),
                summary_line: classified.summary_line,
                health_score: classified.health_score,
                points: classified.points,
                body: body.to_string(),
            });
        }
    }

    fn name(&self) -> &str {
        "ConditionSections"
    }
}

pub struct AlternativesRule;

impl ExtractionRule for AlternativesRule {
    fn apply(&self, input: &RuleInput<'_>, draft: &mut DocumentDraft) {
        draft.alternatives = input
            .regions
            .get(SectionKind::Alternatives)
            .map(list_items)
            .unwrap_or_default();
    }

    fn name(&self) -> &str {
        "Alternatives"
    }
}

pub struct AdditionalInfoRule;

impl ExtractionRule for AdditionalInfoRule {
    fn apply(&self, input: &RuleInput<'_>, draft: &mut DocumentDraft) {
        draft.additional_info = input
            .regions
            .get(SectionKind::AdditionalInfo)
            .and_then(paragraph);
    }

    fn name(&self) -> &str {
        "AdditionalInfo"
    }
}

pub struct CanonicalScoreRule;

impl ExtractionRule for CanonicalScoreRule {
    fn apply(&self, input: &RuleInput<'_>, draft: &mut DocumentDraft) {
        draft.score = find_score(input.normalized);
    }

    fn name(&self) -> &str {
        "CanonicalScore"
    }
}

/// Content lines of a region, separators and stray headers removed
fn content_lines(body: &str) -> impl Iterator<Item = &str> {
    body.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| matches!(classify_line(l), LineKind::Content | LineKind::SubScore { .. }))
}

/// Joins the region's lines into one paragraph
fn paragraph(body: &str) -> Option<String> {
    let text = content_lines(body).collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// One entry per line, list markers stripped
fn list_items(body: &str) -> Vec<String> {
    content_lines(body)
        .map(|l| strip_list_marker(l).to_string())
        .filter(|l| !l.is_empty() && !is_header_line(l))
        .collect()
}

pub struct RuleEngine {
    pipeline: PipelineConfig,
    rule_timings: Mutex<Vec<(String, Duration)>>,
}

impl RuleEngine {
    pub fn new(pipeline: PipelineConfig) -> Self {
        Self {
            pipeline,
            rule_timings: Mutex::new(Vec::new()),
        }
    }

    /// Run every enabled rule in configured order and seal the result
    pub fn apply_rules(&self, input: &RuleInput<'_>) -> Document {
        self.timings_mut().clear();
        let mut draft = DocumentDraft::default();

        for rule_config in &self.pipeline.rules {
            if !rule_config.enabled {
                tracing::debug!("Skipping disabled rule: {}", rule_config.name);
                continue;
            }
            self.apply_rule_by_name(&rule_config.name, input, &mut draft);
        }

        draft.finish()
    }

    /// Per-rule timings of the last `apply_rules` call
    pub fn rule_timings(&self) -> Vec<(String, Duration)> {
        self.timings_mut().clone()
    }

    fn timings_mut(&self) -> std::sync::MutexGuard<'_, Vec<(String, Duration)>> {
        // Timings are diagnostics only; a poisoned lock still holds usable data
        self.rule_timings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply_rule_by_name(&self, rule_name: &str, input: &RuleInput<'_>, draft: &mut DocumentDraft) {
        let rule: Box<dyn ExtractionRule> = match rule_name {
            "DishName" => Box::new(DishNameRule),
            "FoodSummary" => Box::new(FoodSummaryRule),
            "KeyMetrics" => Box::new(KeyMetricsRule),
            "ConditionSections" => Box::new(ConditionSectionsRule),
            "Alternatives" => Box::new(AlternativesRule),
            "AdditionalInfo" => Box::new(AdditionalInfoRule),
            "CanonicalScore" => Box::new(CanonicalScoreRule),
            _ => {
                tracing::warn!("Unknown rule: {rule_name}. Skipping...");
                return;
            }
        };

        let rule_start = Instant::now();
        rule.apply(input, draft);
        tracing::debug!("Applied rule {}", rule.name());
        self.timings_mut()
            .push((rule_name.to_string(), rule_start.elapsed()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;
    use crate::rules::sections::extract_regions;

    fn run(text: &str, pipeline: PipelineConfig) -> Document {
        let regions = extract_regions(text);
        let config = ParsingConfig::default();
        let input = RuleInput {
            normalized: text,
            regions: &regions,
            config: &config,
        };
        RuleEngine::new(pipeline).apply_rules(&input)
    }

    #[test]
    fn alternatives_and_notes() {
        let doc = run(
            "HEALTHIER ALTERNATIVES:\n- Brown rice instead of white\n• Grilled instead of fried\n---\nADDITIONAL NOTES:\nPortion looked large.\nShare it.",
            PipelineConfig::default(),
        );
        assert_eq!(
            doc.alternatives,
            vec!["Brown rice instead of white", "Grilled instead of fried"]
        );
        assert_eq!(doc.additional_info.as_deref(), Some("Portion looked large. Share it."));
    }

    #[test]
    fn disabled_rule_leaves_field_absent() {
        let mut pipeline = PipelineConfig::default();
        for rule in &mut pipeline.rules {
            if rule.name == "CanonicalScore" {
                rule.enabled = false;
            }
        }
        let doc = run("DISH: Soup\nNutrition score: 70/100", pipeline);
        assert_eq!(doc.dish_name.as_deref(), Some("Soup"));
        assert_eq!(doc.score, None);
    }

    #[test]
    fn unknown_rule_is_skipped() {
        let pipeline = PipelineConfig {
            rules: vec![
                RuleConfig {
                    name: "Nonexistent".to_string(),
                    enabled: true,
                },
                RuleConfig {
                    name: "DishName".to_string(),
                    enabled: true,
                },
            ],
        };
        let engine = RuleEngine::new(pipeline);
        let text = "DISH: Tacos";
        let regions = extract_regions(text);
        let config = ParsingConfig::default();
        let doc = engine.apply_rules(&RuleInput {
            normalized: text,
            regions: &regions,
            config: &config,
        });
        assert_eq!(doc.dish_name.as_deref(), Some("Tacos"));
        assert_eq!(engine.rule_timings().len(), 1);
    }

    #[test]
    fn general_region_is_kept_verbatim() {
        let doc = run("Just some prose. Nothing labeled.", PipelineConfig::default());
        assert_eq!(doc.sections.len(), 1);
        let section = &doc.sections[0];
        assert_eq!(section.kind, SectionKind::General);
        assert!(section.points.is_empty());
        assert_eq!(section.body, "Just some prose. Nothing labeled.");
        assert!(section.needs_fallback_body());
    }
}
