use super::palette::metric_color;
use super::traversal::{report_blocks, ReportBlock, SectionFilter};
use crate::config::ReportConfig;
use crate::types::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Per-view UI state. Lives next to the Document, never inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    hidden: BTreeSet<SectionKind>,
    expanded: BTreeSet<SectionKind>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hidden(&self, kind: SectionKind) -> bool {
        self.hidden.contains(&kind)
    }

    pub fn is_expanded(&self, kind: SectionKind) -> bool {
        self.expanded.contains(&kind)
    }

    pub fn hide(&mut self, kind: SectionKind) {
        self.hidden.insert(kind);
    }

    pub fn show(&mut self, kind: SectionKind) {
        self.hidden.remove(&kind);
    }

    pub fn toggle_hidden(&mut self, kind: SectionKind) {
        if !self.hidden.remove(&kind) {
            self.hidden.insert(kind);
        }
    }

    pub fn toggle_expanded(&mut self, kind: SectionKind) {
        if !self.expanded.remove(&kind) {
            self.expanded.insert(kind);
        }
    }

    /// Expand every section the document has
    pub fn expand_all(&mut self, doc: &Document) {
        self.expanded.extend(doc.sections.iter().map(|s| s.kind));
    }

    pub fn filter(&self) -> SectionFilter {
        SectionFilter::hiding(self.hidden.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractiveView {
    pub fingerprint: String,
    pub elements: Vec<ViewElement>,
    /// Titles of sections the view state hides, so they can be toggled back
    pub hidden_sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewElement {
    Header {
        brand: String,
        title: String,
        date: Option<String>,
    },
    Food {
        label: String,
        image_name: String,
        summary: Option<String>,
    },
    Profile {
        tags: Vec<String>,
        notes: Option<String>,
    },
    Score {
        value: u8,
        color: String,
    },
    Metrics {
        cards: Vec<MetricCard>,
    },
    Section(SectionView),
    Alternatives {
        items: Vec<String>,
    },
    AdditionalInfo {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub label: String,
    pub value: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub kind: SectionKind,
    pub title: String,
    pub accent: String,
    /// Sub-score on the 0-10 display scale
    pub score: Option<String>,
    pub summary: Option<String>,
    pub points: Vec<PointView>,
    /// Points folded away until the section is expanded
    pub collapsed_points: usize,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointView {
    /// Two-digit step label, "01", "02", ...
    pub step: String,
    pub tag: Option<String>,
    pub text: String,
    pub color: String,
}

pub struct InteractiveRenderer {
    brand: String,
    report_title: String,
    collapsed_point_limit: usize,
    score_default: Option<u8>,
}

impl Default for InteractiveRenderer {
    fn default() -> Self {
        Self::new(&ReportConfig::default())
    }
}

impl InteractiveRenderer {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            brand: config.layout.brand.clone(),
            report_title: config.layout.report_title.clone(),
            collapsed_point_limit: config.view.collapsed_point_limit,
            score_default: config.layout.default_display_score,
        }
    }

    pub fn render(&self, doc: &Document, fields: &DisplayFields, state: &ViewState) -> InteractiveView {
        let blocks = report_blocks(doc, fields, &state.filter(), self.score_default);
        let mut elements: Vec<ViewElement> = Vec::new();

        for block in blocks {
            match block {
                ReportBlock::Header { date } => elements.push(ViewElement::Header {
                    brand: self.brand.clone(),
                    title: self.report_title.clone(),
                    date: date.map(|d| d.format("%d %b %Y").to_string()),
                }),
                ReportBlock::Food {
                    label,
                    image_name,
                    summary,
                } => elements.push(ViewElement::Food {
                    label,
                    image_name,
                    summary: summary.map(str::to_string),
                }),
                ReportBlock::Profile { tags, notes } => elements.push(ViewElement::Profile {
                    tags,
                    notes: notes.map(str::to_string),
                }),
                ReportBlock::Score { value, band } => elements.push(ViewElement::Score {
                    value,
                    color: band.color().hex(),
                }),
                ReportBlock::Metrics { metrics } => elements.push(ViewElement::Metrics {
                    cards: metrics
                        .iter()
                        .map(|m| MetricCard {
                            label: m.label.clone(),
                            value: m.value.clone(),
                            color: metric_color(m.kind).hex(),
                        })
                        .collect(),
                }),
                ReportBlock::SectionHeader {
                    kind,
                    title,
                    accent,
                } => elements.push(ViewElement::Section(SectionView {
                    kind,
                    title: title.to_string(),
                    accent: accent.stroke.hex(),
                    score: None,
                    summary: None,
                    points: Vec::new(),
                    collapsed_points: 0,
                    body: None,
                })),
                ReportBlock::SectionScore { value, .. } => {
                    if let Some(section) = current_section(&mut elements) {
                        section.score = Some(format!("{:.1}/10", value as f32 / 10.0));
                    }
                }
                ReportBlock::SectionSummary { text, .. } => {
                    if let Some(section) = current_section(&mut elements) {
                        section.summary = Some(text.to_string());
                    }
                }
                ReportBlock::PointCard {
                    kind,
                    index,
                    point,
                    color,
                } => {
                    let limit = if state.is_expanded(kind) {
                        usize::MAX
                    } else {
                        self.collapsed_point_limit
                    };
                    if let Some(section) = current_section(&mut elements) {
                        if index < limit {
                            section.points.push(PointView {
                                step: format!("{:02}", index + 1),
                                tag: point.tag.display_label().map(str::to_string),
                                text: point.text.clone(),
                                color: color.hex(),
                            });
                        } else {
                            section.collapsed_points += 1;
                        }
                    }
                }
                ReportBlock::FallbackBody { text, .. } => {
                    if let Some(section) = current_section(&mut elements) {
                        section.body = Some(text.to_string());
                    }
                }
                ReportBlock::Alternatives { items } => elements.push(ViewElement::Alternatives {
                    items: items.to_vec(),
                }),
                ReportBlock::AdditionalInfo { text } => elements.push(ViewElement::AdditionalInfo {
                    text: text.to_string(),
                }),
            }
        }

        let hidden_sections = doc
            .sections
            .iter()
            .filter(|s| state.is_hidden(s.kind))
            .map(|s| s.title.clone())
            .collect();

        InteractiveView {
            fingerprint: doc.fingerprint(),
            elements,
            hidden_sections,
        }
    }
}

fn current_section(elements: &mut [ViewElement]) -> Option<&mut SectionView> {
    match elements.last_mut() {
        Some(ViewElement::Section(section)) => Some(section),
        _ => None,
    }
}

/// Point texts currently shown, in display order
pub fn visible_point_texts(view: &InteractiveView) -> Vec<&str> {
    view.elements
        .iter()
        .filter_map(|e| match e {
            ViewElement::Section(section) => Some(section),
            _ => None,
        })
        .flat_map(|s| s.points.iter().map(|p| p.text.as_str()))
        .collect()
}

/// Plain-text rendering for terminals
pub fn render_text(view: &InteractiveView) -> String {
    let mut out = String::new();
    let rule = "─".repeat(60);

    for element in &view.elements {
        match element {
            ViewElement::Header { brand, title, date } => {
                let _ = writeln!(out, "{brand} · {title}");
                if let Some(date) = date {
                    let _ = writeln!(out, "{date}");
                }
                let _ = writeln!(out, "{rule}");
            }
            ViewElement::Food {
                label,
                image_name,
                summary,
            } => {
                let _ = writeln!(out, "Food / meal: {label}");
                let _ = writeln!(out, "Image: {image_name}");
                if let Some(summary) = summary {
                    let _ = writeln!(out, "{summary}");
                }
                out.push('\n');
            }
            ViewElement::Profile { tags, notes } => {
                if !tags.is_empty() {
                    let _ = writeln!(out, "Conditions: {}", tags.join(" · "));
                }
                if let Some(notes) = notes {
                    let _ = writeln!(out, "Notes: {notes}");
                }
                out.push('\n');
            }
            ViewElement::Score { value, .. } => {
                let filled = (*value as usize / 5).min(20);
                let _ = writeln!(
                    out,
                    "Score {value}/100 [{}{}]\n",
                    "█".repeat(filled),
                    "░".repeat(20 - filled)
                );
            }
            ViewElement::Metrics { cards } => {
                let _ = writeln!(out, "Key metrics");
                for card in cards {
                    let _ = writeln!(out, "  {:<12} {}", card.label, card.value);
                }
                out.push('\n');
            }
            ViewElement::Section(section) => {
                let _ = writeln!(out, "■ {}", section.title);
                if let Some(score) = &section.score {
                    let _ = writeln!(out, "  Health score: {score}");
                }
                if let Some(summary) = &section.summary {
                    let _ = writeln!(out, "  {summary}");
                }
                for point in &section.points {
                    match &point.tag {
                        Some(tag) => {
                            let _ = writeln!(out, "  {} [{tag}] {}", point.step, point.text);
                        }
                        None => {
                            let _ = writeln!(out, "  {} {}", point.step, point.text);
                        }
                    }
                }
                if section.collapsed_points > 0 {
                    let _ = writeln!(out, "  … {} more (expand to show)", section.collapsed_points);
                }
                if let Some(body) = &section.body {
                    for line in body.lines() {
                        let _ = writeln!(out, "  {line}");
                    }
                }
                out.push('\n');
            }
            ViewElement::Alternatives { items } => {
                let _ = writeln!(out, "Healthier alternatives");
                for item in items {
                    let _ = writeln!(out, "  • {item}");
                }
                out.push('\n');
            }
            ViewElement::AdditionalInfo { text } => {
                let _ = writeln!(out, "Additional notes\n  {text}\n");
            }
        }
    }

    if !view.hidden_sections.is_empty() {
        let _ = writeln!(out, "Hidden: {}", view.hidden_sections.join(", "));
    }
    out
}
