// PDF encoding of a laid-out report.
//
// Uses the standard Helvetica faces (no embedding needed) with WinAnsi
// encoding, so text widths match StandardFontMetrics exactly.

use super::layout::{DrawOp, PageLayout};
use super::measure::FontFace;
use super::palette::Rgb;
use crate::config::LayoutConfig;
use crate::error::{RenderError, RenderResult};
use crate::types::{DisplayFields, Document};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, ObjectId, Stream};

const MM_TO_PT: f32 = 72.0 / 25.4;
const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";
const THUMBNAIL: &str = "Im1";

/// Size and color layout read from a JPEG start-of-frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u16,
    pub height: u16,
    pub components: u8,
}

impl JpegInfo {
    pub fn parse(data: &[u8]) -> RenderResult<Self> {
        if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
            return Err(RenderError::Image("missing JPEG start marker".to_string()));
        }

        let mut i = 2;
        while i + 1 < data.len() {
            if data[i] != 0xFF {
                return Err(RenderError::Image(format!("expected marker at byte {i}")));
            }
            let marker = data[i + 1];
            match marker {
                // fill byte
                0xFF => {
                    i += 1;
                    continue;
                }
                // markers without a length field
                0x01 | 0xD0..=0xD7 => {
                    i += 2;
                    continue;
                }
                0xD9 | 0xDA => break,
                _ => {}
            }

            let len = read_u16(data, i + 2)? as usize;
            let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
            if is_sof {
                return Ok(JpegInfo {
                    height: read_u16(data, i + 5)?,
                    width: read_u16(data, i + 7)?,
                    components: *data
                        .get(i + 9)
                        .ok_or_else(|| RenderError::Image("truncated frame header".to_string()))?,
                });
            }
            i += 2 + len;
        }

        Err(RenderError::Image("no frame header found".to_string()))
    }

    fn color_space(&self) -> &'static str {
        match self.components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        }
    }
}

fn read_u16(data: &[u8], at: usize) -> RenderResult<u16> {
    match (data.get(at), data.get(at + 1)) {
        (Some(hi), Some(lo)) => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(RenderError::Image("truncated JPEG segment".to_string())),
    }
}

/// Map text onto WinAnsiEncoding; anything outside it becomes '?'
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '·' => 0xB7,
            c if (c as u32) < 0x80 => c as u8,
            c if (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}

pub struct PdfWriter {
    title: String,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

impl PdfWriter {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            title: format!("{} {}", config.brand, config.report_title),
        }
    }

    /// Encode every page of `layout`. The output is byte-for-byte stable for
    /// the same inputs; the document fingerprint goes into the Info dictionary.
    pub fn write(&self, layout: &PageLayout, doc: &Document, fields: &DisplayFields) -> RenderResult<Vec<u8>> {
        let mut pdf = lopdf::Document::with_version("1.5");
        let pages_id = pdf.new_object_id();

        let regular_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        let image_id = self.embed_thumbnail(&mut pdf, fields);
        let mut xobjects = lopdf::Dictionary::new();
        if let Some(id) = image_id {
            xobjects.set(THUMBNAIL, id);
        }
        let resources_id = pdf.add_object(dictionary! {
            "Font" => dictionary! {
                REGULAR_FONT => regular_id,
                BOLD_FONT => bold_id,
            },
            "XObject" => xobjects,
        });

        let media_box: Vec<Object> = vec![
            0_i64.into(),
            0_i64.into(),
            (layout.page_width * MM_TO_PT).into(),
            (layout.page_height * MM_TO_PT).into(),
        ];

        let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
        for page in &layout.pages {
            let mut operations = Vec::new();
            for op in page.ops.iter().chain(&page.footer) {
                encode_op(&mut operations, op, layout.page_height, image_id.is_some());
            }
            let content = Content { operations }
                .encode()
                .map_err(|e| RenderError::Pdf(e.to_string()))?;
            let content_id = pdf.add_object(Stream::new(lopdf::Dictionary::new(), content));

            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => media_box.clone(),
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        pdf.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
            }),
        );

        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = pdf.add_object(dictionary! {
            "Title" => Object::string_literal(encode_win_ansi(&self.title_for(doc))),
            "Producer" => Object::string_literal("nutrimed"),
            "Keywords" => Object::string_literal(doc.fingerprint()),
        });
        pdf.trailer.set("Root", catalog_id);
        pdf.trailer.set("Info", info_id);
        pdf.compress();

        let mut bytes = Vec::new();
        pdf.save_to(&mut bytes)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        tracing::debug!("Encoded {} page(s), {} bytes", layout.pages.len(), bytes.len());
        Ok(bytes)
    }

    fn title_for(&self, doc: &Document) -> String {
        match &doc.dish_name {
            Some(dish) => format!("{} – {dish}", self.title),
            None => self.title.clone(),
        }
    }

    fn embed_thumbnail(&self, pdf: &mut lopdf::Document, fields: &DisplayFields) -> Option<ObjectId> {
        let jpeg = fields.thumbnail.as_ref()?.jpeg.as_ref()?;
        let info = match JpegInfo::parse(jpeg) {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!("Thumbnail not embedded: {e}");
                return None;
            }
        };

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => info.width as i64,
                "Height" => info.height as i64,
                "ColorSpace" => info.color_space(),
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            jpeg.clone(),
        )
        // already DCT-compressed
        .with_compression(false);
        Some(pdf.add_object(stream))
    }
}

fn color_operands(color: Rgb) -> Vec<Object> {
    color.unit().into_iter().map(Object::from).collect()
}

fn encode_op(operations: &mut Vec<Operation>, op: &DrawOp, page_height: f32, has_image: bool) {
    let pt = |mm: f32| mm * MM_TO_PT;
    // layout measures y from the top, PDF from the bottom
    let flip = |y_mm: f32| (page_height - y_mm) * MM_TO_PT;

    match op {
        DrawOp::Rect {
            x,
            y,
            w,
            h,
            fill,
            stroke,
        } => {
            operations.push(Operation::new("q", vec![]));
            if let Some(fill) = fill {
                operations.push(Operation::new("rg", color_operands(*fill)));
            }
            if let Some(stroke) = stroke {
                operations.push(Operation::new("RG", color_operands(*stroke)));
                operations.push(Operation::new("w", vec![0.3_f32.into()]));
            }
            operations.push(Operation::new(
                "re",
                vec![pt(*x).into(), flip(y + h).into(), pt(*w).into(), pt(*h).into()],
            ));
            let paint = match (fill.is_some(), stroke.is_some()) {
                (true, true) => "B",
                (true, false) => "f",
                (false, true) => "S",
                (false, false) => "n",
            };
            operations.push(Operation::new(paint, vec![]));
            operations.push(Operation::new("Q", vec![]));
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            width,
        } => {
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new("RG", color_operands(*color)));
            operations.push(Operation::new("w", vec![pt(*width).into()]));
            operations.push(Operation::new("m", vec![pt(*x1).into(), flip(*y1).into()]));
            operations.push(Operation::new("l", vec![pt(*x2).into(), flip(*y2).into()]));
            operations.push(Operation::new("S", vec![]));
            operations.push(Operation::new("Q", vec![]));
        }
        DrawOp::Text {
            x,
            y,
            text,
            face,
            size,
            color,
        } => {
            let font = match face {
                FontFace::Regular => REGULAR_FONT,
                FontFace::Bold => BOLD_FONT,
            };
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("rg", color_operands(*color)));
            operations.push(Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), (*size).into()]));
            operations.push(Operation::new("Td", vec![pt(*x).into(), flip(*y).into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]));
            operations.push(Operation::new("ET", vec![]));
        }
        DrawOp::Image { x, y, w, h } => {
            if !has_image {
                // unreadable JPEG: keep the frame so the layout still reads
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new("RG", color_operands(super::palette::MUTED)));
                operations.push(Operation::new(
                    "re",
                    vec![pt(*x).into(), flip(y + h).into(), pt(*w).into(), pt(*h).into()],
                ));
                operations.push(Operation::new("S", vec![]));
                operations.push(Operation::new("Q", vec![]));
                return;
            }
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![
                    pt(*w).into(),
                    0_f32.into(),
                    0_f32.into(),
                    pt(*h).into(),
                    pt(*x).into(),
                    flip(y + h).into(),
                ],
            ));
            operations.push(Operation::new("Do", vec![Object::Name(THUMBNAIL.as_bytes().to_vec())]));
            operations.push(Operation::new("Q", vec![]));
        }
    }
}
