use crate::config::ReportConfig;
use crate::error::{RenderError, RenderResult};
use crate::render::traversal::{report_blocks, ReportBlock, SectionFilter};
use crate::render::{render_text, InteractiveRenderer, PageLayoutEngine, PdfWriter, StandardFontMetrics, ViewState};
use crate::types::*;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The Document itself as JSON
    Document,
    /// One text chunk per report block
    Flat,
    /// Interactive view model as JSON
    View,
    /// Plain-text terminal rendering
    Text,
    Pdf,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Document | OutputFormat::Flat | OutputFormat::View => "json",
            OutputFormat::Text => "txt",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "document" | "json" => Ok(OutputFormat::Document),
            "flat" => Ok(OutputFormat::Flat),
            "view" => Ok(OutputFormat::View),
            "text" | "txt" => Ok(OutputFormat::Text),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(RenderError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatDocument {
    pub format: String,
    pub fingerprint: String,
    pub chunks: Vec<String>,
}

/// Everything besides the Document that an output format may need
pub struct RenderContext<'a> {
    pub config: &'a ReportConfig,
    pub fields: &'a DisplayFields,
    pub view_state: &'a ViewState,
}

impl Document {
    pub fn to_flat_format(&self, fields: &DisplayFields, score_default: Option<u8>) -> FlatDocument {
        let chunks = report_blocks(self, fields, &SectionFilter::all(), score_default)
            .iter()
            .flat_map(block_chunks)
            .collect();

        FlatDocument {
            format: "flat".to_string(),
            fingerprint: self.fingerprint(),
            chunks,
        }
    }

    pub fn render_bytes(&self, format: OutputFormat, ctx: &RenderContext<'_>) -> RenderResult<Vec<u8>> {
        let bytes = match format {
            OutputFormat::Document => serde_json::to_vec_pretty(self)?,
            OutputFormat::Flat => {
                let flat = self.to_flat_format(ctx.fields, ctx.config.layout.default_display_score);
                serde_json::to_vec_pretty(&flat)?
            }
            OutputFormat::View => {
                let view = InteractiveRenderer::new(ctx.config).render(self, ctx.fields, ctx.view_state);
                serde_json::to_vec_pretty(&view)?
            }
            OutputFormat::Text => {
                let view = InteractiveRenderer::new(ctx.config).render(self, ctx.fields, ctx.view_state);
                render_text(&view).into_bytes()
            }
            OutputFormat::Pdf => {
                let engine = PageLayoutEngine::new(ctx.config.layout.clone());
                let layout = engine.layout(self, ctx.fields, &StandardFontMetrics);
                PdfWriter::new(&ctx.config.layout).write(&layout, self, ctx.fields)?
            }
        };
        Ok(bytes)
    }

    pub fn save_with_format(&self, path: &str, format: OutputFormat, ctx: &RenderContext<'_>) -> RenderResult<()> {
        let bytes = self.render_bytes(format, ctx)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

fn block_chunks(block: &ReportBlock<'_>) -> Vec<String> {
    match block {
        ReportBlock::Header { date } => date
            .map(|d| vec![d.format("%d %b %Y").to_string()])
            .unwrap_or_default(),
        ReportBlock::Food { label, summary, .. } => std::iter::once(format!("Food / meal: {label}"))
            .chain(summary.map(str::to_string))
            .collect(),
        ReportBlock::Profile { tags, notes } => {
            let mut chunks = Vec::new();
            if !tags.is_empty() {
                chunks.push(format!("Conditions: {}", tags.join(", ")));
            }
            chunks.extend(notes.map(|n| format!("Notes: {n}")));
            chunks
        }
        ReportBlock::Score { value, .. } => vec![format!("Nutrition score: {value}/100")],
        ReportBlock::Metrics { metrics } => vec![metrics
            .iter()
            .map(|m| format!("{}: {}", m.label, m.value))
            .collect::<Vec<_>>()
            .join(" | ")],
        ReportBlock::SectionHeader { title, .. } => vec![title.to_string()],
        ReportBlock::SectionScore { value, .. } => {
            vec![format!("Health score: {:.1}/10", *value as f32 / 10.0)]
        }
        ReportBlock::SectionSummary { text, .. } | ReportBlock::FallbackBody { text, .. } => {
            vec![text.to_string()]
        }
        ReportBlock::PointCard { point, .. } => match point.tag.display_label() {
            Some(label) => vec![format!("[{label}] {}", point.text)],
            None => vec![point.text.clone()],
        },
        ReportBlock::Alternatives { items } => items.to_vec(),
        ReportBlock::AdditionalInfo { text } => vec![text.to_string()],
    }
}
