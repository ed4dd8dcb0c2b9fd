use crate::config::{ParsingConfig, PipelineConfig, ReportConfig};
use crate::normalizer::normalize;
use crate::rules::sections::{extract_regions, ExtractedRegions};
use crate::rules::{RuleEngine, RuleInput};
use crate::types::Document;
use std::time::{Duration, Instant};

/// Captured intermediate outputs from each pipeline stage
/// Used by stage dumps and tests to compare each pipeline boundary
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineStages {
    pub normalized: String,
    pub regions: ExtractedRegions,
    pub document: Document,
}

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        tracing::debug!("{step_name}: {}µs", elapsed.as_micros());
        self.timings.push((step_name.to_string(), elapsed));

        result
    }

    /// Append externally measured timings (e.g. per-rule timings)
    pub fn record(&mut self, step_name: &str, elapsed: Duration) {
        if self.enabled {
            self.timings.push((step_name.to_string(), elapsed));
        }
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("\n📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            println!(
                "   {:.<35} {}µs ({:.1}%)",
                step,
                duration.as_micros(),
                percentage
            );
        }
        println!("   {:.<35} {}µs", "Total", total.as_micros());
    }
}

/// Builds one immutable `Document` per analysis text.
///
/// Holds no per-call state besides diagnostic timings, so a processor can be
/// reused for any number of texts and always yields the same Document for the
/// same input.
pub struct DocumentProcessor {
    parsing: ParsingConfig,
    rule_engine: RuleEngine,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::with_configs(ParsingConfig::default(), PipelineConfig::default())
    }
}

impl DocumentProcessor {
    pub fn new(config: &ReportConfig) -> Self {
        Self::with_configs(config.parsing.clone(), config.pipeline.clone())
    }

    pub fn with_configs(parsing: ParsingConfig, pipeline: PipelineConfig) -> Self {
        Self {
            parsing,
            rule_engine: RuleEngine::new(pipeline),
        }
    }

    pub fn parsing_config(&self) -> &ParsingConfig {
        &self.parsing
    }

    /// Raw analysis text → Document. Total: any string yields a Document.
    pub fn process(&self, raw: &str) -> Document {
        self.process_with_profiler(raw, &mut StepProfiler::new(false))
    }

    pub fn process_with_profiler(&self, raw: &str, profiler: &mut StepProfiler) -> Document {
        let normalized = profiler.time_step("1. Normalize", || normalize(raw));
        let regions = profiler.time_step("2. Extract Regions", || extract_regions(&normalized));
        tracing::debug!(
            "Extracted {} region(s) from {} header line(s)",
            regions.len(),
            regions.headers.len()
        );

        let document = profiler.time_step("3. Apply Rules", || self.apply_rules(&normalized, &regions));
        for (rule, elapsed) in self.rule_engine.rule_timings() {
            profiler.record(&format!("   3.{rule}"), elapsed);
        }

        document
    }

    /// Same as `process`, but keeps every intermediate stage for inspection
    pub fn process_capture_stages(&self, raw: &str) -> PipelineStages {
        let normalized = normalize(raw);
        let regions = extract_regions(&normalized);
        let document = self.apply_rules(&normalized, &regions);

        PipelineStages {
            normalized,
            regions,
            document,
        }
    }

    fn apply_rules(&self, normalized: &str, regions: &ExtractedRegions) -> Document {
        let input = RuleInput {
            normalized,
            regions,
            config: &self.parsing,
        };
        let document = self.rule_engine.apply_rules(&input);
        tracing::debug!(
            "Document built: {} metric(s), {} section(s), score {:?}",
            document.metrics.len(),
            document.sections.len(),
            document.score
        );
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SectionKind;

    #[test]
    fn empty_input_gives_empty_document() {
        let processor = DocumentProcessor::default();
        assert!(processor.process("").is_empty());
        assert!(processor.process("  \r\n  ").is_empty());
    }

    #[test]
    fn stages_match_plain_processing() {
        let processor = DocumentProcessor::default();
        let raw = "**DISH:** Pad Thai\nCURRENT CONDITION SUMMARY:\nA bit sweet for you.\n- Ask for less sugar";
        let stages = processor.process_capture_stages(raw);
        assert_eq!(stages.document, processor.process(raw));
        assert!(stages.normalized.starts_with("DISH: Pad Thai"));
        assert!(stages.regions.get(SectionKind::CurrentCondition).is_some());
    }

    #[test]
    fn profiler_collects_steps_without_changing_output() {
        let processor = DocumentProcessor::default();
        let raw = "DISH: Salad\nNutrition score: 81/100";
        let mut profiler = StepProfiler::new(true);
        let profiled = processor.process_with_profiler(raw, &mut profiler);
        assert_eq!(profiled, processor.process(raw));
        assert!(profiler.timings().len() >= 3);
        assert_eq!(profiler.timings()[0].0, "1. Normalize");
    }

    #[test]
    fn disabled_profiler_records_nothing() {
        let processor = DocumentProcessor::default();
        let mut profiler = StepProfiler::new(false);
        processor.process_with_profiler("DISH: Soup", &mut profiler);
        assert!(profiler.timings().is_empty());
    }
}
