use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ===== DOCUMENT MODEL =====
// The Document is the single source of truth consumed by both renderers.
// It is built once per analysis text and never mutated afterwards.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Name of the identified dish, first line after the DISH label
    pub dish_name: Option<String>,
    /// Short free-text description of the meal
    pub food_summary: Option<String>,
    /// Canonical quality score, always within 0..=100
    pub score: Option<u8>,
    /// Canonical seven metrics first, then any extra metrics in source order
    pub metrics: Vec<Metric>,
    /// Condition sections in extraction order (current before concerned)
    pub sections: Vec<ConditionSection>,
    pub alternatives: Vec<String>,
    pub additional_info: Option<String>,
}

impl Document {
    /// True when nothing at all was extracted
    pub fn is_empty(&self) -> bool {
        self.dish_name.is_none()
            && self.food_summary.is_none()
            && self.score.is_none()
            && self.metrics.is_empty()
            && self.sections.is_empty()
            && self.alternatives.is_empty()
            && self.additional_info.is_none()
    }

    pub fn section(&self, kind: SectionKind) -> Option<&ConditionSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Stable SHA-256 over the canonical JSON form of the document.
    ///
    /// Two documents built from the same text with the same config always
    /// share a fingerprint; exported reports carry it so a PDF can be traced
    /// back to the view it was exported from.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        format!("{:x}", hasher.finalize())
    }

    /// Every point text, section by section, in document order
    pub fn point_texts(&self) -> Vec<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.text.as_str()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
    /// Set for the canonical metrics, `None` for extra labels found in the source
    pub kind: Option<MetricKind>,
}

impl Metric {
    pub fn is_known(&self, placeholder: &str) -> bool {
        !self.value.is_empty() && self.value != placeholder
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricKind {
    Calories,
    Protein,
    Carbs,
    Fat,
    Fiber,
    Sugar,
    Sodium,
}

impl MetricKind {
    /// Fixed display order used for cards in both renderers
    pub const CANONICAL: [MetricKind; 7] = [
        MetricKind::Calories,
        MetricKind::Protein,
        MetricKind::Carbs,
        MetricKind::Fat,
        MetricKind::Fiber,
        MetricKind::Sugar,
        MetricKind::Sodium,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Calories => "Calories",
            MetricKind::Protein => "Protein",
            MetricKind::Carbs => "Carbs",
            MetricKind::Fat => "Fat",
            MetricKind::Fiber => "Fiber",
            MetricKind::Sugar => "Sugar",
            MetricKind::Sodium => "Sodium",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::Calories => "kcal",
            MetricKind::Sodium => "mg",
            _ => "g",
        }
    }

    pub fn index(&self) -> usize {
        Self::CANONICAL
            .iter()
            .position(|k| k == self)
            .unwrap_or_default()
    }
}

// ===== SECTIONS AND POINTS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SectionKind {
    Dish,
    FoodSummary,
    KeyMetrics,
    CurrentCondition,
    ConcernedCondition,
    Alternatives,
    AdditionalInfo,
    /// Fallback region holding the whole text when no label was recognized
    General,
}

impl SectionKind {
    pub fn is_condition(&self) -> bool {
        matches!(
            self,
            SectionKind::CurrentCondition | SectionKind::ConcernedCondition | SectionKind::General
        )
    }

    /// Short identifier used by config files and CLI flags
    pub fn slug(&self) -> &'static str {
        match self {
            SectionKind::Dish => "dish",
            SectionKind::FoodSummary => "food-summary",
            SectionKind::KeyMetrics => "key-metrics",
            SectionKind::CurrentCondition => "current",
            SectionKind::ConcernedCondition => "concerned",
            SectionKind::Alternatives => "alternatives",
            SectionKind::AdditionalInfo => "additional",
            SectionKind::General => "general",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim().to_ascii_lowercase();
        [
            SectionKind::Dish,
            SectionKind::FoodSummary,
            SectionKind::KeyMetrics,
            SectionKind::CurrentCondition,
            SectionKind::ConcernedCondition,
            SectionKind::Alternatives,
            SectionKind::AdditionalInfo,
            SectionKind::General,
        ]
        .into_iter()
        .find(|k| k.slug() == slug)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSection {
    pub kind: SectionKind,
    pub title: String,
    /// TL;DR sentence shown before the points
    pub summary_line: Option<String>,
    /// Per-section sub-score (0..=100) from a "Health score: N/10" line
    pub health_score: Option<u8>,
    pub points: Vec<Point>,
    /// Normalized body as extracted; displayed verbatim only when the
    /// section has neither a summary line nor points
    pub body: String,
}

impl ConditionSection {
    pub fn needs_fallback_body(&self) -> bool {
        self.summary_line.is_none() && self.points.is_empty() && !self.body.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub tag: PointTag,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointTag {
    Reasoning,
    Action,
    Benefit,
    AskDoctor,
    Important,
    #[default]
    None,
}

impl PointTag {
    pub fn is_tagged(&self) -> bool {
        !matches!(self, PointTag::None)
    }

    pub fn display_label(&self) -> Option<&'static str> {
        match self {
            PointTag::Reasoning => Some("Why"),
            PointTag::Action => Some("Action"),
            PointTag::Benefit => Some("Benefit"),
            PointTag::AskDoctor => Some("Ask your doctor"),
            PointTag::Important => Some("Important"),
            PointTag::None => None,
        }
    }
}

// ===== DISPLAY FIELDS =====
// Supplied by the surrounding application (image capture, history, profile
// form). The pipeline passes them through to the renderers untouched.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFields {
    pub thumbnail: Option<Thumbnail>,
    pub capture_date: Option<NaiveDate>,
    pub profile: Option<MedicalProfile>,
    /// Free-text description or question the user typed with the photo
    pub description: Option<String>,
}

impl DisplayFields {
    /// Label for the "Food / meal" box: dish name, then description, then a generic label
    pub fn food_label(&self, doc: &Document) -> String {
        doc.dish_name
            .clone()
            .or_else(|| {
                self.description
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Uploaded food image".to_string())
    }

    pub fn image_name(&self) -> &str {
        self.thumbnail
            .as_ref()
            .map(|t| t.name.as_str())
            .unwrap_or("—")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub name: String,
    /// Raw JPEG bytes; other formats are shown as a labeled frame
    #[serde(skip)]
    pub jpeg: Option<Vec<u8>>,
}

/// Condition choices offered by the profile form
pub const CONDITION_OPTIONS: [&str; 11] = [
    "Diabetes",
    "Hypertension (High BP)",
    "Heart disease",
    "Kidney disease",
    "Obesity / Weight management",
    "Celiac disease",
    "Lactose intolerance",
    "GERD / Acid reflux",
    "High cholesterol",
    "Thyroid disorder",
    "None / No current conditions",
];

pub const NO_CURRENT_CONDITIONS: &str = "None / No current conditions";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalProfile {
    pub current_conditions: Vec<String>,
    pub concerned_conditions: Vec<String>,
    pub notes: Option<String>,
}

impl MedicalProfile {
    pub fn has_current(&self) -> bool {
        self.current_conditions.iter().any(|c| {
            let lower = c.to_lowercase();
            !lower.contains("no current") && !lower.contains("none")
        })
    }

    pub fn has_concerned(&self) -> bool {
        self.concerned_conditions
            .iter()
            .any(|c| !c.to_lowercase().contains("none"))
    }

    /// Short tag labels: current conditions first, then "Concern: ..." entries
    pub fn tag_labels(&self) -> Vec<String> {
        let current = self
            .current_conditions
            .iter()
            .filter(|c| c.as_str() != NO_CURRENT_CONDITIONS)
            .map(|c| format_condition_label(c));
        let concerned = self
            .concerned_conditions
            .iter()
            .map(|c| format!("Concern: {}", format_condition_label(c)));
        current.chain(concerned).collect()
    }

    pub fn current_display(&self) -> String {
        if self.has_current() {
            self.current_conditions
                .iter()
                .filter(|c| c.as_str() != NO_CURRENT_CONDITIONS)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            "No current medical conditions".to_string()
        }
    }

    pub fn concerned_display(&self) -> String {
        if self.concerned_conditions.is_empty() {
            "None specified".to_string()
        } else {
            self.concerned_conditions.join(", ")
        }
    }
}

pub fn format_condition_label(condition: &str) -> String {
    if condition == NO_CURRENT_CONDITIONS {
        return "None".to_string();
    }
    condition
        .replace(" (High BP)", "")
        .replace(" / Weight management", "")
        .replace("GERD / Acid reflux", "GERD")
}
