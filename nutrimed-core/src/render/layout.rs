// Paginated layout: Document + display fields → fixed-size pages of
// positioned draw operations. All units are millimetres measured from the
// top-left corner of the page; text positions are baselines.

use super::measure::{wrap_clamped, wrap_text, FontFace, TextMeasure};
use super::palette::{self, metric_color, Rgb, SectionAccent};
use super::traversal::{report_blocks, ReportBlock, SectionFilter};
use crate::config::LayoutConfig;
use crate::types::*;
use serde::Serialize;

const LINE_H: f32 = 5.5;
const BODY_SIZE: f32 = 10.0;
const HEADER_H: f32 = 28.0;
const IMAGE_W: f32 = 48.0;
const IMAGE_H: f32 = 36.0;
const FOOD_BOX_MIN_H: f32 = 18.0;
const LABEL_MAX_LINES: usize = 3;
const SCORE_H: f32 = 19.0;
const METRIC_COLUMNS: usize = 4;
const METRIC_CARD_H: f32 = 14.0;
const METRIC_GAP: f32 = 2.0;
const METRIC_MAX_LINES: usize = 2;
const METRIC_LINE_H: f32 = 4.5;
const METRIC_SMALL_LINE_H: f32 = 3.5;
const SECTION_BAR_H: f32 = 9.0;
const SECTION_HEADER_H: f32 = 12.0;
const SECTION_SCORE_H: f32 = 10.0;
const SECTION_GAP: f32 = 8.0;
const POINT_SIZE: f32 = 9.0;
const POINT_LINE_H: f32 = 4.5;
const STEP_BOX: f32 = 10.0;
const POINT_TEXT_INDENT: f32 = 14.0;
const CARD_GAP: f32 = 2.0;
const EPSILON: f32 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Rgb,
        width: f32,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        face: FontFace,
        size: f32,
        color: Rgb,
    },
    /// The thumbnail; the writer supplies the pixels
    Image { x: f32, y: f32, w: f32, h: f32 },
}

impl DrawOp {
    /// Lowest y the op reaches
    pub fn bottom(&self) -> f32 {
        match self {
            DrawOp::Rect { y, h, .. } | DrawOp::Image { y, h, .. } => y + h,
            DrawOp::Line { y1, y2, .. } => y1.max(*y2),
            DrawOp::Text { y, .. } => *y,
        }
    }
}

/// A point card placed on a page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedPoint {
    pub section: SectionKind,
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub number: usize,
    pub ops: Vec<DrawOp>,
    pub points: Vec<PlacedPoint>,
    /// Footer ops live apart from the body so the margin check can skip them
    pub footer: Vec<DrawOp>,
}

impl Page {
    fn new(number: usize) -> Self {
        Self {
            number,
            ops: Vec::new(),
            points: Vec::new(),
            footer: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub pages: Vec<Page>,
}

impl PageLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Lowest y body content may reach
    pub fn printable_bottom(&self) -> f32 {
        self.page_height - self.margin
    }

    /// Point texts across all pages, in placement order
    pub fn point_texts(&self) -> Vec<&str> {
        self.pages
            .iter()
            .flat_map(|p| p.points.iter().map(|pt| pt.text.as_str()))
            .collect()
    }
}

/// Vertical flow over pages with a shared cursor
struct Flow<'m> {
    measure: &'m dyn TextMeasure,
    page_width: f32,
    page_height: f32,
    margin: f32,
    done: Vec<Page>,
    current: Page,
    y: f32,
}

impl<'m> Flow<'m> {
    fn new(measure: &'m dyn TextMeasure, config: &LayoutConfig) -> Self {
        let (page_width, page_height) = config.page_format.size_mm();
        Self {
            measure,
            page_width,
            page_height,
            margin: config.margin_mm,
            done: Vec::new(),
            current: Page::new(1),
            y: config.margin_mm,
        }
    }

    fn left(&self) -> f32 {
        self.margin
    }

    fn top(&self) -> f32 {
        self.margin
    }

    fn bottom(&self) -> f32 {
        self.page_height - self.margin
    }

    fn width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    fn page_capacity(&self) -> f32 {
        self.bottom() - self.top()
    }

    fn new_page(&mut self) {
        let next = Page::new(self.current.number + 1);
        self.done.push(std::mem::replace(&mut self.current, next));
        self.y = self.top();
        tracing::debug!("Page break, starting page {}", self.current.number);
    }

    /// Start a new page unless `height` still fits below the cursor.
    /// A fresh page never breaks again, so oversize content cannot loop.
    fn ensure_space(&mut self, height: f32) {
        let fits = self.y + height <= self.bottom() + EPSILON;
        let at_top = self.y <= self.top() + EPSILON;
        if !fits && !at_top {
            self.new_page();
        }
    }

    fn push(&mut self, op: DrawOp) {
        self.current.ops.push(op);
    }

    fn text(&mut self, x: f32, y: f32, text: impl Into<String>, face: FontFace, size: f32, color: Rgb) {
        self.push(DrawOp::Text {
            x,
            y,
            text: text.into(),
            face,
            size,
            color,
        });
    }

    fn wrap(&self, text: &str, face: FontFace, size: f32, width: f32) -> Vec<String> {
        wrap_text(self.measure, text, face, size, width)
    }

    fn text_width(&self, text: &str, face: FontFace, size: f32) -> f32 {
        self.measure.text_width(text, face, size)
    }

    /// One line per slot; the page may break between any two lines
    fn flow_lines(&mut self, lines: &[String], x: f32, face: FontFace, size: f32, color: Rgb, line_h: f32) {
        for line in lines {
            self.ensure_space(line_h);
            let baseline = self.y + line_h * 0.75;
            self.text(x, baseline, line.clone(), face, size, color);
            self.y += line_h;
        }
    }

    fn finish(mut self, page_numbers: bool) -> PageLayout {
        let mut pages = std::mem::take(&mut self.done);
        pages.push(self.current);

        if page_numbers {
            let total = pages.len();
            for page in &mut pages {
                let label = format!("Page {} of {}", page.number, total);
                let width = self.measure.text_width(&label, FontFace::Regular, 8.0);
                page.footer.push(DrawOp::Text {
                    x: (self.page_width - width) / 2.0,
                    y: self.page_height - self.margin / 2.0,
                    text: label,
                    face: FontFace::Regular,
                    size: 8.0,
                    color: palette::MUTED,
                });
            }
        }

        PageLayout {
            page_width: self.page_width,
            page_height: self.page_height,
            margin: self.margin,
            pages,
        }
    }
}

pub struct PageLayoutEngine {
    config: LayoutConfig,
}

impl Default for PageLayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl PageLayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out every section of `doc`. The same inputs always produce the
    /// same pages.
    pub fn layout(&self, doc: &Document, fields: &DisplayFields, measure: &dyn TextMeasure) -> PageLayout {
        let blocks = report_blocks(
            doc,
            fields,
            &SectionFilter::all(),
            self.config.default_display_score,
        );
        let mut flow = Flow::new(measure, &self.config);

        for (i, block) in blocks.iter().enumerate() {
            let next = blocks.get(i + 1);
            match block {
                ReportBlock::Header { date } => self.place_header(&mut flow, *date),
                ReportBlock::Food {
                    label,
                    image_name,
                    summary,
                } => place_food(&mut flow, fields, label, image_name, *summary),
                ReportBlock::Profile { tags, notes } => place_profile(&mut flow, tags, *notes),
                ReportBlock::Score { value, band } => place_score(&mut flow, *value, band.color()),
                ReportBlock::Metrics { metrics } => place_metrics(&mut flow, metrics),
                ReportBlock::SectionHeader { title, accent, .. } => {
                    let follower = next
                        .filter(|n| n.section_kind() == block.section_kind())
                        .map(|n| block_height(&flow, n))
                        .unwrap_or(0.0);
                    place_section_header(&mut flow, title, *accent, follower);
                }
                ReportBlock::SectionScore { value, band, .. } => {
                    place_section_score(&mut flow, *value, band.color())
                }
                ReportBlock::SectionSummary { text, .. } => {
                    let lines = flow.wrap(text, FontFace::Bold, BODY_SIZE, flow.width());
                    flow.ensure_space(lines.len() as f32 * LINE_H);
                    let x = flow.left();
                    flow.flow_lines(&lines, x, FontFace::Bold, BODY_SIZE, palette::TEXT, LINE_H);
                    flow.y += 3.0;
                }
                ReportBlock::PointCard {
                    kind,
                    index,
                    point,
                    color,
                } => place_point(&mut flow, *kind, *index, point, *color),
                ReportBlock::FallbackBody { text, .. } => {
                    let lines = flow.wrap(text, FontFace::Regular, BODY_SIZE, flow.width());
                    let x = flow.left();
                    flow.flow_lines(&lines, x, FontFace::Regular, BODY_SIZE, palette::TEXT, LINE_H);
                }
                ReportBlock::Alternatives { items } => {
                    let lines: Vec<String> = items
                        .iter()
                        .flat_map(|item| flow.wrap(&format!("• {item}"), FontFace::Regular, BODY_SIZE, flow.width() - 4.0))
                        .collect();
                    place_titled_lines(&mut flow, "Healthier alternatives", &lines);
                }
                ReportBlock::AdditionalInfo { text } => {
                    let lines = flow.wrap(text, FontFace::Regular, BODY_SIZE, flow.width() - 4.0);
                    place_titled_lines(&mut flow, "Additional notes", &lines);
                }
            }

            let ends_section = block.section_kind().is_some()
                && next.and_then(|n| n.section_kind()) != block.section_kind();
            if ends_section {
                flow.y += SECTION_GAP;
            }
        }

        let layout = flow.finish(self.config.page_numbers);
        tracing::debug!("Laid out {} page(s)", layout.page_count());
        layout
    }

    fn place_header(&self, flow: &mut Flow<'_>, date: Option<chrono::NaiveDate>) {
        let (x, y, w) = (flow.left(), flow.y, flow.width());
        flow.push(DrawOp::Line {
            x1: x,
            y1: y,
            x2: x + w,
            y2: y,
            color: palette::BRAND,
            width: 0.8,
        });
        flow.text(x, y + 9.0, self.config.brand.clone(), FontFace::Bold, 20.0, palette::BRAND);
        flow.text(x, y + 16.0, self.config.report_title.clone(), FontFace::Regular, 11.0, palette::MUTED);
        if let Some(date) = date {
            let label = date.format("%d %b %Y").to_string();
            let width = flow.text_width(&label, FontFace::Regular, 10.0);
            flow.text(x + w - width, y + 16.0, label, FontFace::Regular, 10.0, palette::MUTED);
        }
        flow.y += HEADER_H;
    }
}

fn place_food(flow: &mut Flow<'_>, fields: &DisplayFields, label: &str, image_name: &str, summary: Option<&str>) {
    let has_frame = fields.thumbnail.is_some();
    let text_offset = if has_frame { IMAGE_W + 4.0 } else { 4.0 };
    let text_width = flow.width() - text_offset - 4.0;

    let label_lines = wrap_clamped(flow.measure, label, FontFace::Bold, 12.0, text_width, LABEL_MAX_LINES);
    let inner_h = 6.0 + label_lines.len() as f32 * LINE_H + 5.0;
    let min_h = if has_frame { IMAGE_H + 4.0 } else { FOOD_BOX_MIN_H };
    let box_h = (inner_h + 4.0).max(min_h);

    flow.ensure_space(box_h);
    let (x, y, w) = (flow.left(), flow.y, flow.width());
    flow.push(DrawOp::Rect {
        x,
        y,
        w,
        h: box_h,
        fill: Some(Rgb(248, 250, 252)),
        stroke: Some(palette::BORDER),
    });

    if let Some(thumbnail) = &fields.thumbnail {
        let (ix, iy) = (x + 2.0, y + 2.0);
        if thumbnail.jpeg.is_some() {
            flow.push(DrawOp::Image {
                x: ix,
                y: iy,
                w: IMAGE_W,
                h: IMAGE_H,
            });
        } else {
            flow.push(DrawOp::Rect {
                x: ix,
                y: iy,
                w: IMAGE_W,
                h: IMAGE_H,
                fill: None,
                stroke: Some(palette::MUTED),
            });
            let caption_w = flow.text_width("Image", FontFace::Regular, 8.0);
            flow.text(
                ix + (IMAGE_W - caption_w) / 2.0,
                iy + IMAGE_H / 2.0,
                "Image",
                FontFace::Regular,
                8.0,
                palette::MUTED,
            );
        }
    }

    let tx = x + text_offset;
    flow.text(tx, y + 6.0, "Food / meal", FontFace::Bold, 9.0, palette::MUTED);
    let mut baseline = y + 6.0;
    for line in label_lines {
        baseline += LINE_H;
        flow.text(tx, baseline, line, FontFace::Bold, 12.0, palette::TEXT);
    }
    flow.text(tx, baseline + 5.0, format!("Image: {image_name}"), FontFace::Regular, 8.0, palette::MUTED);
    flow.y += box_h + 6.0;

    if let Some(summary) = summary {
        let lines = flow.wrap(summary, FontFace::Regular, BODY_SIZE, w);
        flow.flow_lines(&lines, x, FontFace::Regular, BODY_SIZE, palette::TEXT, LINE_H);
        flow.y += 4.0;
    }
}

fn place_profile(flow: &mut Flow<'_>, tags: &[String], notes: Option<&str>) {
    let x = flow.left();
    let width = flow.width();
    if !tags.is_empty() {
        let lines = flow.wrap(&format!("Conditions: {}", tags.join(" · ")), FontFace::Regular, 9.0, width);
        flow.flow_lines(&lines, x, FontFace::Regular, 9.0, palette::TEXT, 5.0);
    }
    if let Some(notes) = notes {
        let lines = flow.wrap(&format!("Notes: {notes}"), FontFace::Regular, 9.0, width);
        flow.flow_lines(&lines, x, FontFace::Regular, 9.0, palette::MUTED, 5.0);
    }
    flow.y += 4.0;
}

fn place_score(flow: &mut Flow<'_>, value: u8, color: Rgb) {
    let value = value.min(100);
    flow.ensure_space(SCORE_H);
    let (x, y, w) = (flow.left(), flow.y, flow.width());
    flow.text(x, y + 4.0, "Nutrition score", FontFace::Bold, 11.0, palette::TEXT);
    let label = format!("{value}/100");
    let label_w = flow.text_width(&label, FontFace::Bold, 11.0);
    flow.text(x + w - label_w, y + 4.0, label, FontFace::Bold, 11.0, color);
    flow.push(DrawOp::Rect {
        x,
        y: y + 7.0,
        w,
        h: 5.0,
        fill: Some(palette::TRACK),
        stroke: None,
    });
    if value > 0 {
        flow.push(DrawOp::Rect {
            x,
            y: y + 7.0,
            w: w * value as f32 / 100.0,
            h: 5.0,
            fill: Some(color),
            stroke: None,
        });
    }
    flow.y += SCORE_H;
}

/// Wrapped text of one metric card
struct MetricCard<'a> {
    metric: &'a Metric,
    label: Vec<String>,
    value: Vec<String>,
    value_size: f32,
}

impl MetricCard<'_> {
    fn value_line_h(&self) -> f32 {
        if self.value_size < 10.0 {
            METRIC_SMALL_LINE_H
        } else {
            METRIC_LINE_H
        }
    }

    fn height(&self) -> f32 {
        let extra_label = self.label.len().saturating_sub(1) as f32;
        let extra_value = self.value.len().saturating_sub(1) as f32;
        METRIC_CARD_H + extra_label * METRIC_SMALL_LINE_H + extra_value * self.value_line_h()
    }
}

fn metric_card<'a>(flow: &Flow<'_>, metric: &'a Metric, inner_w: f32) -> MetricCard<'a> {
    let label = wrap_clamped(flow.measure, &metric.label, FontFace::Regular, 8.0, inner_w, METRIC_MAX_LINES);
    let value_size = if flow.text_width(&metric.value, FontFace::Bold, 10.0) > inner_w {
        8.0
    } else {
        10.0
    };
    let value = wrap_clamped(flow.measure, &metric.value, FontFace::Bold, value_size, inner_w, METRIC_MAX_LINES);
    MetricCard {
        metric,
        label,
        value,
        value_size,
    }
}

/// Cards go four to a row. The grid moves as one block; only a grid taller
/// than a page breaks, and then only between rows.
fn place_metrics(flow: &mut Flow<'_>, metrics: &[Metric]) {
    let card_w = (flow.width() - METRIC_GAP * (METRIC_COLUMNS as f32 - 1.0)) / METRIC_COLUMNS as f32;
    let inner_w = card_w - 6.0;

    let rows: Vec<Vec<MetricCard<'_>>> = metrics
        .chunks(METRIC_COLUMNS)
        .map(|row| row.iter().map(|m| metric_card(flow, m, inner_w)).collect())
        .collect();
    let row_heights: Vec<f32> = rows
        .iter()
        .map(|cards| cards.iter().map(MetricCard::height).fold(METRIC_CARD_H, f32::max))
        .collect();
    let grid_h = row_heights.iter().sum::<f32>() + row_heights.len().saturating_sub(1) as f32 * METRIC_GAP;
    flow.ensure_space(grid_h.min(flow.page_capacity()));

    for (cards, row_h) in rows.into_iter().zip(row_heights) {
        flow.ensure_space(row_h);
        let y = flow.y;

        for (col, card) in cards.into_iter().enumerate() {
            let x = flow.left() + col as f32 * (card_w + METRIC_GAP);
            let color = metric_color(card.metric.kind);
            flow.push(DrawOp::Rect {
                x,
                y,
                w: card_w,
                h: row_h,
                fill: Some(color.tint(40)),
                stroke: Some(color),
            });

            let mut baseline = y + 5.5 - METRIC_SMALL_LINE_H;
            for line in &card.label {
                baseline += METRIC_SMALL_LINE_H;
                flow.text(x + 3.0, baseline, line.clone(), FontFace::Regular, 8.0, palette::TEXT);
            }
            let value_line_h = card.value_line_h();
            baseline += 5.5 - value_line_h;
            for line in card.value {
                baseline += value_line_h;
                flow.text(x + 3.0, baseline, line, FontFace::Bold, card.value_size, palette::TEXT);
            }
        }
        flow.y = y + row_h + METRIC_GAP;
    }
    flow.y += 8.0 - METRIC_GAP;
}

/// The header moves with whatever follows it, up to a full page
fn place_section_header(flow: &mut Flow<'_>, title: &str, accent: SectionAccent, follower_h: f32) {
    let keep = (SECTION_HEADER_H + follower_h).min(flow.page_capacity());
    flow.ensure_space(keep);
    let (x, y, w) = (flow.left(), flow.y, flow.width());
    flow.push(DrawOp::Rect {
        x,
        y,
        w,
        h: SECTION_BAR_H,
        fill: Some(accent.fill),
        stroke: Some(accent.stroke),
    });
    flow.text(x + 3.0, y + 6.2, title.to_string(), FontFace::Bold, 11.0, palette::TEXT);
    flow.y += SECTION_HEADER_H;
}

fn place_section_score(flow: &mut Flow<'_>, value: u8, color: Rgb) {
    flow.ensure_space(SECTION_SCORE_H);
    let (x, y) = (flow.left(), flow.y);
    let label = format!("Health score: {:.1}/10", value as f32 / 10.0);
    flow.text(x, y + 4.0, label, FontFace::Bold, 9.0, palette::TEXT);
    flow.push(DrawOp::Rect {
        x: x + 45.0,
        y: y + 1.5,
        w: 60.0,
        h: 3.0,
        fill: Some(palette::TRACK),
        stroke: None,
    });
    if value > 0 {
        flow.push(DrawOp::Rect {
            x: x + 45.0,
            y: y + 1.5,
            w: 60.0 * value as f32 / 100.0,
            h: 3.0,
            fill: Some(color),
            stroke: None,
        });
    }
    flow.y += SECTION_SCORE_H;
}

struct PointMetrics {
    lines: Vec<String>,
    tag_h: f32,
    card_h: f32,
}

fn point_metrics(flow: &Flow<'_>, point: &Point) -> PointMetrics {
    let lines = flow.wrap(&point.text, FontFace::Regular, POINT_SIZE, flow.width() - POINT_TEXT_INDENT);
    let tag_h = if point.tag.is_tagged() { POINT_LINE_H } else { 0.0 };
    let card_h = (4.0 + tag_h + lines.len() as f32 * POINT_LINE_H).max(STEP_BOX);
    PointMetrics { lines, tag_h, card_h }
}

fn place_point(flow: &mut Flow<'_>, kind: SectionKind, index: usize, point: &Point, color: Rgb) {
    let metrics = point_metrics(flow, point);
    let total_h = metrics.card_h + CARD_GAP;
    let step = format!("{:02}", index + 1);

    let oversize = total_h > flow.page_capacity();
    // An oversize card only needs its step box on the current page
    flow.ensure_space(if oversize { STEP_BOX + CARD_GAP } else { total_h });
    flow.current.points.push(PlacedPoint {
        section: kind,
        index,
        text: point.text.clone(),
    });

    let x = flow.left();
    let tx = x + POINT_TEXT_INDENT;
    if !oversize {
        let (y, w) = (flow.y, flow.width());
        flow.push(DrawOp::Rect {
            x,
            y,
            w,
            h: metrics.card_h,
            fill: Some(Rgb(248, 250, 252)),
            stroke: Some(palette::BORDER),
        });
    }

    let y = flow.y;
    draw_step_box(flow, x, y, &step, color);
    let mut cursor = y + 2.0;
    if let Some(label) = point.tag.display_label() {
        flow.text(tx, cursor + POINT_LINE_H - 1.0, label, FontFace::Bold, 8.0, color);
        cursor += metrics.tag_h;
    }

    if oversize {
        // Continues on the following pages line by line
        flow.y = cursor;
        flow.flow_lines(&metrics.lines, tx, FontFace::Regular, POINT_SIZE, palette::TEXT, POINT_LINE_H);
        flow.y += CARD_GAP;
        return;
    }

    for line in metrics.lines {
        cursor += POINT_LINE_H;
        flow.text(tx, cursor - 1.0, line, FontFace::Regular, POINT_SIZE, palette::TEXT);
    }
    flow.y = y + total_h;
}

fn draw_step_box(flow: &mut Flow<'_>, x: f32, y: f32, step: &str, color: Rgb) {
    flow.push(DrawOp::Rect {
        x,
        y,
        w: STEP_BOX,
        h: STEP_BOX,
        fill: Some(color),
        stroke: None,
    });
    let step_w = flow.text_width(step, FontFace::Bold, 9.0);
    flow.text(
        x + (STEP_BOX - step_w) / 2.0,
        y + 6.5,
        step.to_string(),
        FontFace::Bold,
        9.0,
        Rgb(255, 255, 255),
    );
}

fn place_titled_lines(flow: &mut Flow<'_>, title: &str, lines: &[String]) {
    let first_line = if lines.is_empty() { 0.0 } else { LINE_H };
    flow.ensure_space(8.0 + first_line);
    let (x, y) = (flow.left(), flow.y);
    flow.text(x, y + 5.5, title.to_string(), FontFace::Bold, 11.0, palette::TEXT);
    flow.y += 8.0;
    flow.flow_lines(lines, x + 4.0, FontFace::Regular, BODY_SIZE, palette::TEXT, LINE_H);
    flow.y += 4.0;
}

/// Height a block needs before anything may break inside it
fn block_height(flow: &Flow<'_>, block: &ReportBlock<'_>) -> f32 {
    match block {
        ReportBlock::SectionScore { .. } => SECTION_SCORE_H,
        ReportBlock::SectionSummary { text, .. } => {
            flow.wrap(text, FontFace::Bold, BODY_SIZE, flow.width()).len() as f32 * LINE_H + 3.0
        }
        ReportBlock::PointCard { point, .. } => point_metrics(flow, point).card_h + CARD_GAP,
        ReportBlock::FallbackBody { .. } => LINE_H,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::DocumentProcessor;
    use crate::render::measure::StandardFontMetrics;

    fn long_doc(points: usize) -> Document {
        let body: String = (1..=points)
            .map(|i| format!("- Point {i}: keep sodium under control by choosing fresh ingredients and skipping the extra sauce\n"))
            .collect();
        DocumentProcessor::default().process(&format!(
            "DISH: Ramen\nKEY METRICS: Calories: 650 kcal, Sodium: 2100mg\nCURRENT CONDITION SUMMARY:\nVery salty for your blood pressure.\n{body}CONCERNED CONDITION SUMMARY:\nHeavy on refined carbs.\n{body}"
        ))
    }

    #[test]
    fn long_documents_paginate_within_margins() {
        let doc = long_doc(30);
        let layout = PageLayoutEngine::default().layout(&doc, &DisplayFields::default(), &StandardFontMetrics);
        assert!(layout.page_count() > 1);
        let bottom = layout.printable_bottom();
        for page in &layout.pages {
            for op in &page.ops {
                assert!(op.bottom() <= bottom + 0.01, "op below margin on page {}: {op:?}", page.number);
            }
            assert_eq!(page.footer.len(), 1);
        }
    }

    #[test]
    fn footer_numbers_every_page() {
        let doc = long_doc(30);
        let layout = PageLayoutEngine::default().layout(&doc, &DisplayFields::default(), &StandardFontMetrics);
        let total = layout.page_count();
        let last = layout.pages.last().unwrap();
        assert!(matches!(
            &last.footer[0],
            DrawOp::Text { text, .. } if *text == format!("Page {total} of {total}")
        ));
    }

    #[test]
    fn footer_can_be_disabled() {
        let engine = PageLayoutEngine::new(LayoutConfig {
            page_numbers: false,
            ..LayoutConfig::default()
        });
        let layout = engine.layout(&long_doc(2), &DisplayFields::default(), &StandardFontMetrics);
        assert!(layout.pages.iter().all(|p| p.footer.is_empty()));
    }

    #[test]
    fn every_point_is_placed_once_in_order() {
        let doc = long_doc(12);
        let layout = PageLayoutEngine::default().layout(&doc, &DisplayFields::default(), &StandardFontMetrics);
        assert_eq!(layout.point_texts(), doc.point_texts());
    }

    #[test]
    fn section_header_is_never_last_on_a_page() {
        let doc = long_doc(25);
        let layout = PageLayoutEngine::default().layout(&doc, &DisplayFields::default(), &StandardFontMetrics);
        for page in &layout.pages {
            let last_rect_is_bar = page.ops.iter().rev().find_map(|op| match op {
                DrawOp::Rect { h, .. } => Some((*h - SECTION_BAR_H).abs() < 0.01),
                _ => None,
            });
            assert_ne!(last_rect_is_bar, Some(true), "orphaned header on page {}", page.number);
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let doc = long_doc(8);
        let engine = PageLayoutEngine::default();
        let a = engine.layout(&doc, &DisplayFields::default(), &StandardFontMetrics);
        let b = engine.layout(&doc, &DisplayFields::default(), &StandardFontMetrics);
        assert_eq!(a, b);
    }

    #[test]
    fn thumbnail_without_jpeg_gets_a_placeholder_frame() {
        let doc = DocumentProcessor::default().process("DISH: Toast");
        let fields = DisplayFields {
            thumbnail: Some(Thumbnail {
                name: "toast.png".to_string(),
                jpeg: None,
            }),
            ..DisplayFields::default()
        };
        let layout = PageLayoutEngine::default().layout(&doc, &fields, &StandardFontMetrics);
        let ops = &layout.pages[0].ops;
        assert!(!ops.iter().any(|op| matches!(op, DrawOp::Image { .. })));
        assert!(ops
            .iter()
            .any(|op| matches!(op, DrawOp::Text { text, .. } if text == "Image: toast.png")));
    }

    #[test]
    fn letter_format_changes_page_size() {
        let engine = PageLayoutEngine::new(LayoutConfig {
            page_format: crate::config::PageFormat::Letter,
            ..LayoutConfig::default()
        });
        let layout = engine.layout(&Document::default(), &DisplayFields::default(), &StandardFontMetrics);
        assert_eq!(layout.page_width, 215.9);
        assert_eq!(layout.page_count(), 1);
    }

    fn doc_with_metrics(metrics: Vec<Metric>) -> Document {
        Document {
            dish_name: Some("Noodle bowl".to_string()),
            metrics,
            ..Document::default()
        }
    }

    fn extra_metric(label: &str, value: &str) -> Metric {
        Metric {
            label: label.to_string(),
            value: value.to_string(),
            kind: None,
        }
    }

    #[test]
    fn metric_cards_stay_inside_the_right_margin() {
        let mut metrics = DocumentProcessor::default()
            .process("KEY METRICS: Calories: 650 kcal, Sodium: 2100mg")
            .metrics;
        metrics.push(extra_metric(
            "Serving note",
            "roughly one very large restaurant bowl with extra sauce and toppings",
        ));
        metrics.push(extra_metric("Glycemic load estimate for a typical adult serving", "high"));
        let layout = PageLayoutEngine::default().layout(&doc_with_metrics(metrics), &DisplayFields::default(), &StandardFontMetrics);

        let right = layout.page_width - layout.margin;
        for op in layout.pages.iter().flat_map(|p| p.ops.iter()) {
            if let DrawOp::Text { x, text, face, size, .. } = op {
                let end = x + StandardFontMetrics.text_width(text, *face, *size);
                assert!(end <= right + EPSILON, "{text:?} ends at {end}, past {right}");
            }
        }
        let texts: Vec<&str> = layout.pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(texts.iter().any(|t| t.ends_with('…')), "long value should be cut short");
    }

    fn micronutrients(count: usize) -> Vec<Metric> {
        (1..=count)
            .map(|i| extra_metric(&format!("Micronutrient {i}"), "a rather long descriptive amount per serving"))
            .collect()
    }

    fn pages_with_card_labels(layout: &PageLayout) -> Vec<usize> {
        layout
            .pages
            .iter()
            .filter(|p| {
                p.ops
                    .iter()
                    .any(|op| matches!(op, DrawOp::Text { text, .. } if text.starts_with("Micronutrient")))
            })
            .map(|p| p.number)
            .collect()
    }

    fn assert_within_margins(layout: &PageLayout) {
        let bottom = layout.printable_bottom();
        for page in &layout.pages {
            for op in &page.ops {
                assert!(op.bottom() <= bottom + 0.01, "op below margin on page {}: {op:?}", page.number);
            }
        }
    }

    #[test]
    fn metric_grid_moves_to_the_next_page_whole() {
        let doc = Document {
            food_summary: Some("A large bowl of wheat noodles in a rich pork broth. ".repeat(30)),
            ..doc_with_metrics(micronutrients(30))
        };
        let layout = PageLayoutEngine::default().layout(&doc, &DisplayFields::default(), &StandardFontMetrics);

        assert!(layout.page_count() > 1);
        assert_within_margins(&layout);
        assert_eq!(pages_with_card_labels(&layout), vec![2]);
    }

    #[test]
    fn oversize_metric_grid_breaks_between_rows() {
        let layout =
            PageLayoutEngine::default().layout(&doc_with_metrics(micronutrients(80)), &DisplayFields::default(), &StandardFontMetrics);

        assert_within_margins(&layout);
        assert!(pages_with_card_labels(&layout).len() > 1);
        let labels = layout
            .pages
            .iter()
            .flat_map(|p| p.ops.iter())
            .filter(|op| matches!(op, DrawOp::Text { text, .. } if text.starts_with("Micronutrient")))
            .count();
        assert_eq!(labels, 80);
    }

    #[test]
    fn score_bar_never_exceeds_its_track() {
        let engine = PageLayoutEngine::new(LayoutConfig {
            default_display_score: Some(200),
            ..LayoutConfig::default()
        });
        let layout = engine.layout(&Document::default(), &DisplayFields::default(), &StandardFontMetrics);
        let width = layout.page_width - 2.0 * layout.margin;
        let ops = &layout.pages[0].ops;
        for op in ops {
            if let DrawOp::Rect { w, .. } = op {
                assert!(*w <= width + EPSILON);
            }
        }
        assert!(ops
            .iter()
            .any(|op| matches!(op, DrawOp::Text { text, .. } if text == "100/100")));
    }
}
