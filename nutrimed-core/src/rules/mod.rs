// Extraction rules - turn normalized analysis text into Document fields
// - sections.rs: label-anchored region splitting
// - metrics.rs: key-metrics line parsing
// - points.rs: summary line, sub-score and tagged points of a section body
// - score.rs: canonical 0-100 score search
// - engine.rs: RuleEngine running the configured rules in order

pub mod engine;
pub mod metrics;
pub mod points;
pub mod score;
pub mod sections;

pub use engine::*;
