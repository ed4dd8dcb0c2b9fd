use super::score::rescale_out_of_ten;
use crate::classifier::{classify_line, has_list_marker, is_header_line, strip_list_marker, LineKind};
use crate::config::ParsingConfig;
use crate::types::{Point, PointTag};
use regex::Regex;
use std::sync::LazyLock;

// "[Action] text", "[Ask your doctor]: text"
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^\]]{1,40})\]\s*[:\-–]?\s*(.*)$").expect("valid regex")
});

/// Tag keywords checked in order; first substring hit wins
/// Keywords too short to match inside other words
const WHOLE_WORD_KEYWORDS: &[&str] = &["ask", "do"];

const TAG_KEYWORDS: &[(&str, PointTag)] = &[
    ("doctor", PointTag::AskDoctor),
    ("ask", PointTag::AskDoctor),
    ("important", PointTag::Important),
    ("warning", PointTag::Important),
    ("caution", PointTag::Important),
    ("benefit", PointTag::Benefit),
    ("action", PointTag::Action),
    ("tip", PointTag::Action),
    ("do", PointTag::Action),
    ("reason", PointTag::Reasoning),
    ("why", PointTag::Reasoning),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedBody {
    pub summary_line: Option<String>,
    /// Section sub-score on the 0-100 scale
    pub health_score: Option<u8>,
    pub points: Vec<Point>,
}

/// Split a section body into summary line, sub-score and tagged points
pub fn classify_points(body: &str, config: &ParsingConfig) -> ClassifiedBody {
    let mut classified = ClassifiedBody::default();

    let mut lines: Vec<String> = Vec::new();
    for line in split_lines(body, config.split_single_line_sentences) {
        match classify_line(&line) {
            LineKind::Header { .. } | LineKind::Separator => {}
            LineKind::SubScore { value, .. } if classified.health_score.is_none() => {
                classified.health_score = Some(rescale_out_of_ten(value));
            }
            _ => lines.push(line),
        }
    }

    let mut remaining = lines.into_iter().peekable();
    if let Some(first) = remaining.peek() {
        if is_summary_like(first, config) {
            classified.summary_line = remaining.next();
        }
    }

    classified.points = remaining.filter_map(|line| parse_point(&line)).collect();
    classified
}

/// Newline split; a body with a single physical line is split into sentences
fn split_lines(body: &str, split_sentences: bool) -> Vec<String> {
    let lines: Vec<String> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    if lines.len() == 1 && split_sentences {
        return split_sentences_in(&lines[0]);
    }
    lines
}

fn split_sentences_in(line: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let ends_sentence = matches!(c, '.' | '!' | '?');
        if ends_sentence && chars.peek().is_some_and(|n| n.is_whitespace()) {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// Prose-looking first line: length within bounds and not itemized
fn is_summary_like(line: &str, config: &ParsingConfig) -> bool {
    let len = line.chars().count();
    len >= config.summary_line_min_chars
        && len <= config.summary_line_max_chars
        && !TAG_RE.is_match(line)
        && !has_list_marker(line)
}

fn parse_point(line: &str) -> Option<Point> {
    let stripped = strip_list_marker(line);

    let (tag, text) = match TAG_RE.captures(stripped) {
        Some(caps) => match tag_for_label(&caps[1]) {
            Some(tag) => (tag, caps[2].trim().to_string()),
            // Unknown labels stay part of the text
            None => (PointTag::None, stripped.to_string()),
        },
        None => (PointTag::None, stripped.to_string()),
    };

    // Stripping a marker can expose a header ("• • DISH:")
    if text.is_empty() || is_header_line(&text) {
        return None;
    }
    Some(Point { tag, text })
}

pub fn tag_for_label(label: &str) -> Option<PointTag> {
    let lower = label.to_lowercase();
    TAG_KEYWORDS
        .iter()
        .find(|(keyword, _)| {
            if WHOLE_WORD_KEYWORDS.contains(keyword) {
                // "dose", "double" and "task" must not match
                lower.split(|c: char| !c.is_alphanumeric()).any(|w| w == *keyword)
            } else {
                lower.contains(keyword)
            }
        })
        .map(|(_, tag)| *tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(body: &str) -> ClassifiedBody {
        classify_points(body, &ParsingConfig::default())
    }

    #[test]
    fn summary_then_tagged_points() {
        let body = "Good protein balance.\n[Action] Add more greens.\n[Important] Watch the dressing sodium.\nHealth score: 8/10";
        let classified = classify(body);
        assert_eq!(classified.summary_line.as_deref(), Some("Good protein balance."));
        assert_eq!(classified.health_score, Some(80));
        assert_eq!(
            classified.points,
            vec![
                Point {
                    tag: PointTag::Action,
                    text: "Add more greens.".to_string()
                },
                Point {
                    tag: PointTag::Important,
                    text: "Watch the dressing sodium.".to_string()
                },
            ]
        );
    }

    #[test]
    fn tagged_first_line_is_not_a_summary() {
        let classified = classify("[Benefit] High in fiber.\n[Reasoning] Oats digest slowly.");
        assert_eq!(classified.summary_line, None);
        assert_eq!(classified.points.len(), 2);
        assert_eq!(classified.points[1].tag, PointTag::Reasoning);
    }

    #[test]
    fn bulleted_first_line_is_not_a_summary() {
        let classified = classify("• Limit the fries to half a portion.\n• Drink water instead of soda.");
        assert_eq!(classified.summary_line, None);
        assert_eq!(classified.points[0].text, "Limit the fries to half a portion.");
        assert_eq!(classified.points[1].text, "Drink water instead of soda.");
    }

    #[test]
    fn single_line_is_split_into_sentences() {
        let classified = classify("Mostly safe for you. Keep portions small! Is the sauce sweet? Check it.");
        assert_eq!(classified.summary_line.as_deref(), Some("Mostly safe for you."));
        let texts: Vec<&str> = classified.points.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["Keep portions small!", "Is the sauce sweet?", "Check it."]);
    }

    #[test]
    fn header_and_separator_lines_are_filtered() {
        let classified = classify("Fine overall for you.\n---\nCONCERNED CONDITION SUMMARY:\n- Less salt");
        assert_eq!(classified.points.len(), 1);
        assert_eq!(classified.points[0].text, "Less salt");
    }

    #[test]
    fn tag_label_variants() {
        assert_eq!(tag_for_label("Ask your doctor"), Some(PointTag::AskDoctor));
        assert_eq!(tag_for_label("ASK_DOCTOR"), Some(PointTag::AskDoctor));
        assert_eq!(tag_for_label("Warning"), Some(PointTag::Important));
        assert_eq!(tag_for_label("Why"), Some(PointTag::Reasoning));
        assert_eq!(tag_for_label("What to do"), Some(PointTag::Action));
        assert_eq!(tag_for_label("Dosage"), None);
        assert_eq!(tag_for_label("Fun fact"), None);
        assert_eq!(tag_for_label("Questions to ask"), Some(PointTag::AskDoctor));
        assert_eq!(tag_for_label("Daily task"), None);
        assert_eq!(tag_for_label("Basket"), None);
    }

    #[test]
    fn task_tag_is_not_an_ask_doctor_point() {
        let classified = classify("[Daily task] Log your meals.");
        assert_eq!(classified.points[0].tag, PointTag::None);
        assert_eq!(classified.points[0].text, "[Daily task] Log your meals.");
    }

    #[test]
    fn unknown_tag_keeps_the_whole_line() {
        let classified = classify("[Fun fact] Tomatoes are fruit.\n[Tip] Roast them.");
        assert_eq!(classified.points[0].tag, PointTag::None);
        assert_eq!(classified.points[0].text, "[Fun fact] Tomatoes are fruit.");
        assert_eq!(classified.points[1].tag, PointTag::Action);
    }

    #[test]
    fn empty_tagged_point_is_dropped() {
        let classified = classify("[Action]\n[Action] Eat slowly.");
        assert_eq!(classified.points.len(), 1);
    }

    #[test]
    fn short_imperative_first_line_is_a_known_edge_case() {
        // Ten characters of advice still reads as a summary under the length
        // heuristic; the threshold is tunable through ParsingConfig.
        let classified = classify("Eat less!!\nSecond line here.");
        assert_eq!(classified.summary_line.as_deref(), Some("Eat less!!"));

        let strict = ParsingConfig {
            summary_line_min_chars: 15,
            ..ParsingConfig::default()
        };
        let classified = classify_points("Eat less!!\nSecond line here.", &strict);
        assert_eq!(classified.summary_line, None);
        assert_eq!(classified.points.len(), 2);
    }

    #[test]
    fn empty_body() {
        assert_eq!(classify("   "), ClassifiedBody::default());
    }
}
