// Rendering - both views of a Document
// - traversal.rs: the shared block order both renderers walk
// - palette.rs: shared color policy
// - interactive.rs: view model + terminal text
// - measure.rs: text widths and wrapping
// - layout.rs: fixed-size pages of draw ops
// - pdf.rs: PDF bytes from a page layout

pub mod interactive;
pub mod layout;
pub mod measure;
pub mod palette;
pub mod pdf;
pub mod traversal;

pub use interactive::{render_text, visible_point_texts, InteractiveRenderer, InteractiveView, ViewState};
pub use layout::{DrawOp, PageLayout, PageLayoutEngine};
pub use measure::{FontFace, StandardFontMetrics, TextMeasure};
pub use pdf::PdfWriter;
pub use traversal::{report_blocks, ReportBlock, SectionFilter};
