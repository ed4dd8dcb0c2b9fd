use regex::Regex;
use std::sync::LazyLock;

static SCORE_OUT_OF_100_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:nutrition\s+score|score)\s*[:=\-]?\s*\b(\d+(?:\.\d+)?)\s*/\s*100\b")
        .expect("valid regex")
});

static BARE_OUT_OF_100_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+(?:\.\d+)?)\s*/\s*100\b").expect("valid regex"));

static SCORE_OUT_OF_10_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:health\s+score|score)\s*[:=\-]?\s*\b(\d+(?:\.\d+)?)\s*/\s*10\b")
        .expect("valid regex")
});

/// How a matched number maps onto the 0-100 scale
#[derive(Debug, Clone, Copy)]
enum Scale {
    OutOf100,
    OutOf10,
}

/// Search order: the first pattern that matches anywhere wins, and within a
/// pattern the first match in text order wins. Nothing is averaged.
static SEARCH_ORDER: LazyLock<[(&'static Regex, Scale); 3]> = LazyLock::new(|| {
    [
        (&*SCORE_OUT_OF_100_RE, Scale::OutOf100),
        (&*BARE_OUT_OF_100_RE, Scale::OutOf100),
        (&*SCORE_OUT_OF_10_RE, Scale::OutOf10),
    ]
});

/// Find the canonical 0-100 score in `text`, or `None` when no form matches
pub fn find_score(text: &str) -> Option<u8> {
    SEARCH_ORDER.iter().find_map(|(pattern, scale)| {
        let caps = pattern.captures(text)?;
        let raw = caps[1].parse::<f64>().ok()?;
        Some(match scale {
            Scale::OutOf100 => clamp_score(raw),
            Scale::OutOf10 => rescale_out_of_ten(raw),
        })
    })
}

/// Map an "N/10" value onto 0-100
pub fn rescale_out_of_ten(value: f64) -> u8 {
    clamp_score(value * 10.0)
}

pub fn clamp_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
