// The one ordered walk over a Document. The interactive view and the page
// layout both consume this sequence, so neither can reorder or drop content
// the other shows.

use super::palette::{point_color, section_accent, Rgb, ScoreBand, SectionAccent};
use crate::types::*;
use chrono::NaiveDate;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub enum ReportBlock<'a> {
    Header {
        date: Option<NaiveDate>,
    },
    Food {
        label: String,
        image_name: String,
        summary: Option<&'a str>,
    },
    Profile {
        tags: Vec<String>,
        notes: Option<&'a str>,
    },
    Score {
        value: u8,
        band: ScoreBand,
    },
    Metrics {
        metrics: &'a [Metric],
    },
    SectionHeader {
        kind: SectionKind,
        title: &'a str,
        accent: SectionAccent,
    },
    SectionScore {
        kind: SectionKind,
        value: u8,
        band: ScoreBand,
    },
    SectionSummary {
        kind: SectionKind,
        text: &'a str,
    },
    PointCard {
        kind: SectionKind,
        /// Position within the section, starting at 0
        index: usize,
        point: &'a Point,
        color: Rgb,
    },
    FallbackBody {
        kind: SectionKind,
        text: &'a str,
    },
    Alternatives {
        items: &'a [String],
    },
    AdditionalInfo {
        text: &'a str,
    },
}

impl ReportBlock<'_> {
    /// Section a block belongs to, for the per-section blocks
    pub fn section_kind(&self) -> Option<SectionKind> {
        match self {
            ReportBlock::SectionHeader { kind, .. }
            | ReportBlock::SectionScore { kind, .. }
            | ReportBlock::SectionSummary { kind, .. }
            | ReportBlock::PointCard { kind, .. }
            | ReportBlock::FallbackBody { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Which sections the caller wants shown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionFilter {
    hidden: BTreeSet<SectionKind>,
}

impl SectionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn hiding(hidden: impl IntoIterator<Item = SectionKind>) -> Self {
        Self {
            hidden: hidden.into_iter().collect(),
        }
    }

    pub fn is_visible(&self, kind: SectionKind) -> bool {
        !self.hidden.contains(&kind)
    }
}

/// Walk `doc` in report order.
///
/// Header, food, profile, score, metrics, then each visible condition section
/// (header, sub-score, summary line, points or the verbatim body), then
/// alternatives and additional notes. `score_default` stands in for a missing
/// document score and is clamped to 100 like any parsed score; with neither,
/// no score block is produced.
pub fn report_blocks<'a>(
    doc: &'a Document,
    fields: &'a DisplayFields,
    filter: &SectionFilter,
    score_default: Option<u8>,
) -> Vec<ReportBlock<'a>> {
    let mut blocks = vec![
        ReportBlock::Header {
            date: fields.capture_date,
        },
        ReportBlock::Food {
            label: fields.food_label(doc),
            image_name: fields.image_name().to_string(),
            summary: doc.food_summary.as_deref(),
        },
    ];

    if let Some(profile) = &fields.profile {
        let tags = profile.tag_labels();
        let notes = profile.notes.as_deref().filter(|n| !n.trim().is_empty());
        if !tags.is_empty() || notes.is_some() {
            blocks.push(ReportBlock::Profile { tags, notes });
        }
    }

    if let Some(value) = doc.score.or(score_default).map(|v| v.min(100)) {
        blocks.push(ReportBlock::Score {
            value,
            band: ScoreBand::for_score(value),
        });
    }

    if !doc.metrics.is_empty() && filter.is_visible(SectionKind::KeyMetrics) {
        blocks.push(ReportBlock::Metrics {
            metrics: &doc.metrics,
        });
    }

    for section in doc.sections.iter().filter(|s| filter.is_visible(s.kind)) {
        push_section(&mut blocks, section);
    }

    if !doc.alternatives.is_empty() && filter.is_visible(SectionKind::Alternatives) {
        blocks.push(ReportBlock::Alternatives {
            items: &doc.alternatives,
        });
    }

    if let Some(text) = doc.additional_info.as_deref() {
        if filter.is_visible(SectionKind::AdditionalInfo) {
            blocks.push(ReportBlock::AdditionalInfo { text });
        }
    }

    blocks
}

fn push_section<'a>(blocks: &mut Vec<ReportBlock<'a>>, section: &'a ConditionSection) {
    let kind = section.kind;
    blocks.push(ReportBlock::SectionHeader {
        kind,
        title: &section.title,
        accent: section_accent(kind),
    });

    if let Some(value) = section.health_score {
        blocks.push(ReportBlock::SectionScore {
            kind,
            value,
            band: ScoreBand::for_score(value),
        });
    }

    if section.needs_fallback_body() {
        blocks.push(ReportBlock::FallbackBody {
            kind,
            text: &section.body,
        });
        return;
    }

    if let Some(text) = section.summary_line.as_deref() {
        blocks.push(ReportBlock::SectionSummary { kind, text });
    }

    for (index, point) in section.points.iter().enumerate() {
        blocks.push(ReportBlock::PointCard {
            kind,
            index,
            point,
            color: point_color(point, index),
        });
    }
}

/// Point texts in traversal order
pub fn point_texts<'a>(blocks: &[ReportBlock<'a>]) -> Vec<&'a str> {
    blocks
        .iter()
        .filter_map(|b| match b {
            ReportBlock::PointCard { point, .. } => Some(point.text.as_str()),
            _ => None,
        })
        .collect()
}
