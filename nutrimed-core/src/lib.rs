// Nutrimed Core Library
//
// Turns AI-generated food analysis text into an immutable Document and
// renders it as an interactive view model or a paginated PDF.

pub mod types;
pub mod normalizer;
pub mod classifier;
pub mod rules;
pub mod processor;
pub mod config;
pub mod error;
pub mod render;
pub mod serialization;

// Re-export main types and functions for easy use
pub use types::*;
pub use processor::{DocumentProcessor, PipelineStages, StepProfiler};
pub use config::{LayoutConfig, ParsingConfig, PipelineConfig, ReportConfig, ViewConfig};
pub use error::{RenderError, RenderResult};
pub use render::{InteractiveRenderer, PageLayoutEngine, PdfWriter, StandardFontMetrics, ViewState};
pub use serialization::OutputFormat;
