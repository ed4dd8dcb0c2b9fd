//! The interactive view and the paginated layout are two projections of the
//! same Document. With every section visible and expanded they must show the
//! same points in the same order.

use nutrimed_core::render::layout::PageLayout;
use nutrimed_core::render::{visible_point_texts, InteractiveView};
use nutrimed_core::*;
use proptest::prelude::*;
use std::path::PathBuf;

fn load_analysis(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures/analyses")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Missing fixture: {}", path.display()))
}

fn render_both(doc: &Document, fields: &DisplayFields) -> (InteractiveView, PageLayout) {
    let mut state = ViewState::new();
    state.expand_all(doc);
    let view = InteractiveRenderer::default().render(doc, fields, &state);
    let layout = PageLayoutEngine::default().layout(doc, fields, &StandardFontMetrics);
    (view, layout)
}

fn points_of(layout: &PageLayout, kind: SectionKind) -> Vec<&str> {
    layout
        .pages
        .iter()
        .flat_map(|p| p.points.iter())
        .filter(|p| p.section == kind)
        .map(|p| p.text.as_str())
        .collect()
}

// ============================================================================
// Fixture parity
// ============================================================================

#[test]
fn fixtures_show_the_same_points() {
    for name in ["full_report.txt", "duplicate_headers.txt"] {
        let doc = DocumentProcessor::default().process(&load_analysis(name));
        let (view, layout) = render_both(&doc, &DisplayFields::default());

        assert_eq!(visible_point_texts(&view), layout.point_texts(), "{name}");
        assert_eq!(layout.point_texts(), doc.point_texts(), "{name}");

        for section in &doc.sections {
            let expected: Vec<&str> = section.points.iter().map(|p| p.text.as_str()).collect();
            assert_eq!(points_of(&layout, section.kind), expected, "{name} {:?}", section.kind);
        }
    }
}

#[test]
fn collapsed_view_is_a_prefix_of_the_layout() {
    let doc = DocumentProcessor::default().process(&load_analysis("full_report.txt"));
    let fields = DisplayFields::default();

    let view = InteractiveRenderer::default().render(&doc, &fields, &ViewState::new());
    let layout = PageLayoutEngine::default().layout(&doc, &fields, &StandardFontMetrics);

    let shown = visible_point_texts(&view);
    let printed = layout.point_texts();
    assert!(shown.len() < printed.len());

    // Collapsing only truncates each section; the order never changes
    let mut printed_iter = printed.iter();
    for text in shown {
        assert!(printed_iter.any(|p| *p == text), "{text} out of order");
    }
}

#[test]
fn hidden_sections_stay_in_the_pdf() {
    let doc = DocumentProcessor::default().process(&load_analysis("full_report.txt"));
    let fields = DisplayFields::default();

    let mut state = ViewState::new();
    state.expand_all(&doc);
    state.hide(SectionKind::ConcernedCondition);

    let view = InteractiveRenderer::default().render(&doc, &fields, &state);
    let layout = PageLayoutEngine::default().layout(&doc, &fields, &StandardFontMetrics);

    let concerned: Vec<&str> = doc
        .section(SectionKind::ConcernedCondition)
        .unwrap()
        .points
        .iter()
        .map(|p| p.text.as_str())
        .collect();
    assert!(visible_point_texts(&view).iter().all(|t| !concerned.contains(t)));
    assert_eq!(points_of(&layout, SectionKind::ConcernedCondition), concerned);
}

// ============================================================================
// Generated documents
// ============================================================================

fn arb_tag() -> impl Strategy<Value = PointTag> {
    prop_oneof![
        Just(PointTag::Reasoning),
        Just(PointTag::Action),
        Just(PointTag::Benefit),
        Just(PointTag::AskDoctor),
        Just(PointTag::Important),
        Just(PointTag::None),
    ]
}

fn arb_point() -> impl Strategy<Value = Point> {
    (arb_tag(), "[A-Za-z][A-Za-z ,.]{0,240}").prop_map(|(tag, text)| Point { tag, text })
}

fn arb_section(kind: SectionKind) -> impl Strategy<Value = ConditionSection> {
    (
        proptest::option::of("[A-Za-z ]{10,80}"),
        proptest::option::of(0u8..=100),
        prop::collection::vec(arb_point(), 0..25),
    )
        .prop_map(move |(summary_line, health_score, points)| ConditionSection {
            kind,
            title: kind.slug().to_string(),
            summary_line,
            health_score,
            points,
            body: "body".to_string(),
        })
}

fn arb_document() -> impl Strategy<Value = Document> {
    (
        proptest::option::of("[A-Za-z ]{1,60}"),
        proptest::option::of(0u8..=100),
        proptest::option::of(arb_section(SectionKind::CurrentCondition)),
        proptest::option::of(arb_section(SectionKind::ConcernedCondition)),
        prop::collection::vec("[A-Za-z ]{1,60}", 0..6),
    )
        .prop_map(|(dish_name, score, current, concerned, alternatives)| Document {
            dish_name,
            score,
            sections: current.into_iter().chain(concerned).collect(),
            alternatives,
            ..Document::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_documents_render_the_same_points(doc in arb_document()) {
        let (view, layout) = render_both(&doc, &DisplayFields::default());
        prop_assert_eq!(visible_point_texts(&view), layout.point_texts());
    }

    #[test]
    fn every_page_keeps_its_content_inside_the_margins(doc in arb_document()) {
        let (_, layout) = render_both(&doc, &DisplayFields::default());
        let bottom = layout.printable_bottom();
        for page in &layout.pages {
            for op in &page.ops {
                prop_assert!(op.bottom() <= bottom + 0.01, "page {} overflows", page.number);
            }
        }
    }
}
