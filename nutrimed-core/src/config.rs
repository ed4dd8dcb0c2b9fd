use anyhow::Result;
use serde::{Deserialize, Serialize};

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_summary_line_min_chars() -> usize {
    10
}

fn default_summary_line_max_chars() -> usize {
    300
}

fn default_dish_name_max_chars() -> usize {
    120 // longer captures are runaway matches swallowing the next block
}

fn default_metric_placeholder() -> String {
    "unknown".to_string()
}

fn default_collapsed_point_limit() -> usize {
    4
}

fn default_margin_mm() -> f32 {
    20.0
}

fn default_brand() -> String {
    "NutriMed".to_string()
}

fn default_report_title() -> String {
    "Nutrition Report".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub parsing: ParsingConfig,
    /// Pipeline configuration - defines which extraction rules run and in what order
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// A section's first line becomes its summary only within these bounds
    #[serde(default = "default_summary_line_min_chars")]
    pub summary_line_min_chars: usize,
    #[serde(default = "default_summary_line_max_chars")]
    pub summary_line_max_chars: usize,

    /// Dish names must be shorter than this (in characters)
    #[serde(default = "default_dish_name_max_chars")]
    pub dish_name_max_chars: usize,

    /// Value used for canonical metrics missing from the source
    #[serde(default = "default_metric_placeholder")]
    pub metric_placeholder: String,

    /// Split a one-line section body on sentence punctuation
    #[serde(default = "default_true")]
    pub split_single_line_sentences: bool,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            summary_line_min_chars: default_summary_line_min_chars(),
            summary_line_max_chars: default_summary_line_max_chars(),
            dish_name_max_chars: default_dish_name_max_chars(),
            metric_placeholder: default_metric_placeholder(),
            split_single_line_sentences: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// List of rules to run in order
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Name of the rule
    pub name: String,
    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl RuleConfig {
    fn enabled(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                RuleConfig::enabled("DishName"),
                RuleConfig::enabled("FoodSummary"),
                RuleConfig::enabled("KeyMetrics"),
                RuleConfig::enabled("ConditionSections"),
                RuleConfig::enabled("Alternatives"),
                RuleConfig::enabled("AdditionalInfo"),
                RuleConfig::enabled("CanonicalScore"),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    #[default]
    A4,
    Letter,
}

impl PageFormat {
    /// (width, height) in millimetres
    pub fn size_mm(&self) -> (f32, f32) {
        match self {
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::Letter => (215.9, 279.4),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub page_format: PageFormat,

    /// Printable margin on every side, shared by all pages
    #[serde(default = "default_margin_mm")]
    pub margin_mm: f32,

    #[serde(default = "default_brand")]
    pub brand: String,

    #[serde(default = "default_report_title")]
    pub report_title: String,

    /// Score shown when the analysis carried none; `None` hides the score bar
    #[serde(default)]
    pub default_display_score: Option<u8>,

    /// Draw "Page i of n" in the bottom margin
    #[serde(default = "default_true")]
    pub page_numbers: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_format: PageFormat::A4,
            margin_mm: default_margin_mm(),
            brand: default_brand(),
            report_title: default_report_title(),
            default_display_score: None,
            page_numbers: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Points past this count are collapsed until the section is expanded
    #[serde(default = "default_collapsed_point_limit")]
    pub collapsed_point_limit: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            collapsed_point_limit: default_collapsed_point_limit(),
        }
    }
}

impl ReportConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: ReportConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {p}, using defaults: {e}");
                Self::default()
            }),
            None => Self::default(),
        }
    }
}
