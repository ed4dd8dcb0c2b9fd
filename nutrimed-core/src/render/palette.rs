// One color policy for both renderers. Neither renderer picks a color on
// its own; they ask this module.

use crate::types::{MetricKind, Point, PointTag, SectionKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Lighter tint used for card fills
    pub fn tint(self, amount: u8) -> Rgb {
        Rgb(
            self.0.saturating_add(amount),
            self.1.saturating_add(amount),
            self.2.saturating_add(amount),
        )
    }

    /// Components in 0.0..=1.0, as PDF color operators expect
    pub fn unit(self) -> [f32; 3] {
        [
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        ]
    }

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

pub const TEXT: Rgb = Rgb(30, 41, 59);
pub const MUTED: Rgb = Rgb(100, 116, 139);
pub const BORDER: Rgb = Rgb(226, 232, 240);
pub const BRAND: Rgb = Rgb(20, 184, 166);
pub const TRACK: Rgb = Rgb(226, 232, 240);

/// Untagged points cycle through these by position
pub const STEP_COLORS: [Rgb; 5] = [
    Rgb(20, 184, 166),
    Rgb(249, 115, 22),
    Rgb(59, 130, 246),
    Rgb(217, 119, 6),
    Rgb(236, 72, 153),
];

pub fn tag_color(tag: PointTag) -> Option<Rgb> {
    match tag {
        PointTag::Reasoning => Some(Rgb(59, 130, 246)),
        PointTag::Action => Some(Rgb(20, 184, 166)),
        PointTag::Benefit => Some(Rgb(34, 197, 94)),
        PointTag::AskDoctor => Some(Rgb(168, 85, 247)),
        PointTag::Important => Some(Rgb(239, 68, 68)),
        PointTag::None => None,
    }
}

/// Tag color when tagged, otherwise the step palette by position
pub fn point_color(point: &Point, index: usize) -> Rgb {
    tag_color(point.tag).unwrap_or(STEP_COLORS[index % STEP_COLORS.len()])
}

pub fn metric_color(kind: Option<MetricKind>) -> Rgb {
    match kind {
        Some(MetricKind::Calories) => Rgb(251, 146, 60),
        Some(MetricKind::Protein) => Rgb(236, 72, 153),
        Some(MetricKind::Carbs) => Rgb(250, 204, 21),
        Some(MetricKind::Fat) => Rgb(96, 165, 250),
        Some(MetricKind::Fiber) => Rgb(34, 197, 94),
        Some(MetricKind::Sugar) => Rgb(45, 212, 191),
        Some(MetricKind::Sodium) => Rgb(192, 132, 252),
        None => MUTED,
    }
}

/// Fill and stroke of a section title bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionAccent {
    pub fill: Rgb,
    pub stroke: Rgb,
}

pub fn section_accent(kind: SectionKind) -> SectionAccent {
    match kind {
        SectionKind::ConcernedCondition => SectionAccent {
            fill: Rgb(254, 243, 199),
            stroke: Rgb(245, 158, 114),
        },
        SectionKind::CurrentCondition => SectionAccent {
            fill: Rgb(204, 251, 241),
            stroke: Rgb(20, 184, 166),
        },
        _ => SectionAccent {
            fill: Rgb(241, 245, 249),
            stroke: Rgb(148, 163, 184),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn for_score(score: u8) -> Self {
        match score {
            60.. => ScoreBand::Good,
            40..=59 => ScoreBand::Fair,
            _ => ScoreBand::Poor,
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            ScoreBand::Good => Rgb(16, 185, 129),
            ScoreBand::Fair => Rgb(245, 158, 11),
            ScoreBand::Poor => Rgb(239, 68, 68),
        }
    }
}
