//! Property tests over the parsing pipeline.

use nutrimed_core::classifier::is_header_line;
use nutrimed_core::normalizer::normalize;
use nutrimed_core::rules::score::{clamp_score, find_score};
use nutrimed_core::*;
use proptest::prelude::*;

/// Lines that look like model output: labels, bullets, tags, scores, noise
fn arb_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("DISH: Lentil soup".to_string()),
        Just("**FOOD SUMMARY:**".to_string()),
        Just("KEY METRICS: Calories: 300 kcal, Protein: 18g".to_string()),
        Just("CURRENT CONDITION SUMMARY:".to_string()),
        Just("CONCERNED CONDITION SUMMARY:".to_string()),
        Just("HEALTHIER ALTERNATIVES:".to_string()),
        Just("ADDITIONAL NOTES:".to_string()),
        Just("---".to_string()),
        Just("• • DISH:".to_string()),
        Just("- CURRENT CONDITION SUMMARY:".to_string()),
        Just("[Action] KEY METRICS:".to_string()),
        (0u32..300).prop_map(|n| format!("Nutrition score: {n}/100")),
        (0u32..30).prop_map(|n| format!("Health score: {n}/10")),
        "[A-Za-z ,.]{0,80}",
        "\\[[A-Za-z ]{1,12}\\] [A-Za-z ]{0,40}",
        "[-•*] [A-Za-z ]{0,40}",
    ]
}

fn arb_analysis() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_line(), 0..30).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn normalize_is_idempotent(text in any::<String>()) {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn markup_heavy_normalize_is_idempotent(text in "[*_a-z \n]{0,60}") {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn process_accepts_any_string(text in any::<String>()) {
        let doc = DocumentProcessor::default().process(&text);
        prop_assert!(doc.score.map_or(true, |s| s <= 100));
    }

    #[test]
    fn scores_stay_in_range(raw in arb_analysis()) {
        let doc = DocumentProcessor::default().process(&raw);
        prop_assert!(doc.score.map_or(true, |s| s <= 100));
        for section in &doc.sections {
            prop_assert!(section.health_score.map_or(true, |s| s <= 100));
        }
    }

    #[test]
    fn header_lines_never_reach_content(raw in arb_analysis()) {
        let doc = DocumentProcessor::default().process(&raw);
        for section in doc.sections.iter().filter(|s| s.kind != SectionKind::General) {
            if let Some(summary) = &section.summary_line {
                prop_assert!(!is_header_line(summary), "summary: {}", summary);
            }
            for point in &section.points {
                prop_assert!(!is_header_line(&point.text), "point: {}", point.text);
            }
        }
        for item in &doc.alternatives {
            prop_assert!(!is_header_line(item), "alternative: {}", item);
        }
        if let Some(dish) = &doc.dish_name {
            prop_assert!(!is_header_line(dish));
        }
    }

    #[test]
    fn metrics_are_all_or_nothing(raw in arb_analysis()) {
        let doc = DocumentProcessor::default().process(&raw);
        prop_assert!(doc.metrics.is_empty() || doc.metrics.len() >= 7);
    }

    #[test]
    fn processing_is_deterministic(raw in arb_analysis()) {
        let processor = DocumentProcessor::default();
        prop_assert_eq!(processor.process(&raw), processor.process(&raw));
    }

    #[test]
    fn clamp_score_stays_in_range(value in any::<f64>()) {
        prop_assert!(clamp_score(value) <= 100);
    }

    #[test]
    fn labeled_score_is_read_back(n in 0u32..1000) {
        let expected = n.min(100) as u8;
        prop_assert_eq!(find_score(&format!("Nutrition score: {n}/100")), Some(expected));
    }
}
