use serde::Serialize;

const PT_TO_MM: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FontFace {
    Regular,
    Bold,
}

/// Width of a run of text when set in a given face and size.
///
/// The page layout only needs widths; anything that can answer this (a real
/// font rasterizer, a test double) can drive line wrapping.
pub trait TextMeasure {
    /// Width in millimetres
    fn text_width(&self, text: &str, face: FontFace, size_pt: f32) -> f32;
}

/// Advance widths of the standard Helvetica faces (1/1000 em), which every
/// PDF reader ships, so measured text matches what ends up on the page.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFontMetrics;

// ASCII 32..=126
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // digits
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // '{'..'~'
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

impl StandardFontMetrics {
    pub fn char_width(&self, c: char, face: FontFace) -> u16 {
        let table = match face {
            FontFace::Regular => &HELVETICA,
            FontFace::Bold => &HELVETICA_BOLD,
        };
        let bold = face == FontFace::Bold;
        match c {
            ' '..='~' => table[c as usize - 32],
            '•' => 350,
            '–' => 556,
            '—' | '…' => 1000,
            '‘' | '’' => {
                if bold {
                    278
                } else {
                    222
                }
            }
            '“' | '”' => {
                if bold {
                    500
                } else {
                    333
                }
            }
            '\u{a0}' => 278,
            _ => 556,
        }
    }
}

impl TextMeasure for StandardFontMetrics {
    fn text_width(&self, text: &str, face: FontFace, size_pt: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.char_width(c, face) as u32).sum();
        units as f32 / 1000.0 * size_pt * PT_TO_MM
    }
}

/// Greedy word wrap into lines no wider than `max_width_mm`.
///
/// Explicit newlines are kept as hard breaks; blank lines collapse. A word
/// wider than the whole line is broken between characters.
pub fn wrap_text(
    measure: &dyn TextMeasure,
    text: &str,
    face: FontFace,
    size_pt: f32,
    max_width_mm: f32,
) -> Vec<String> {
    let fits = |s: &str| measure.text_width(s, face, size_pt) <= max_width_mm;
    let mut lines = Vec::new();

    for paragraph in text.lines().map(str::trim).filter(|p| !p.is_empty()) {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if fits(word) {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if !fits(&current) && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// [`wrap_text`] capped at `max_lines`. Dropped text is marked with a trailing
/// ellipsis that still fits the line width.
pub fn wrap_clamped(
    measure: &dyn TextMeasure,
    text: &str,
    face: FontFace,
    size_pt: f32,
    max_width_mm: f32,
    max_lines: usize,
) -> Vec<String> {
    let mut lines = wrap_text(measure, text, face, size_pt, max_width_mm);
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        loop {
            let candidate = format!("{}…", last.trim_end());
            if measure.text_width(&candidate, face, size_pt) <= max_width_mm || last.is_empty() {
                *last = candidate;
                break;
            }
            last.pop();
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is 1mm wide
    struct FixedWidth;

    impl TextMeasure for FixedWidth {
        fn text_width(&self, text: &str, _face: FontFace, _size_pt: f32) -> f32 {
            text.chars().count() as f32
        }
    }

    #[test]
    fn helvetica_widths() {
        let metrics = StandardFontMetrics;
        assert_eq!(metrics.char_width('A', FontFace::Regular), 667);
        assert_eq!(metrics.char_width('i', FontFace::Regular), 222);
        assert_eq!(metrics.char_width('i', FontFace::Bold), 278);
        assert_eq!(metrics.char_width('~', FontFace::Bold), 584);
        // 1000 units at 72pt is exactly one inch
        let width = metrics.text_width("—", FontFace::Regular, 72.0);
        assert!((width - 25.4).abs() < 1e-3);
    }

    #[test]
    fn bold_is_never_narrower() {
        let metrics = StandardFontMetrics;
        let text = "Grilled Chicken Salad with 30g protein";
        assert!(
            metrics.text_width(text, FontFace::Bold, 10.0)
                >= metrics.text_width(text, FontFace::Regular, 10.0)
        );
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text(&FixedWidth, "one two three four", FontFace::Regular, 9.0, 9.0);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn long_words_are_broken() {
        let lines = wrap_text(&FixedWidth, "abcdefghij", FontFace::Regular, 9.0, 4.0);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn newlines_are_hard_breaks() {
        let lines = wrap_text(&FixedWidth, "a b\n\nc", FontFace::Regular, 9.0, 50.0);
        assert_eq!(lines, vec!["a b", "c"]);
        assert!(wrap_text(&FixedWidth, "  ", FontFace::Regular, 9.0, 50.0).is_empty());
    }

    #[test]
    fn clamped_wrap_ends_with_a_fitting_ellipsis() {
        let lines = wrap_clamped(&FixedWidth, "one two three four", FontFace::Regular, 9.0, 5.0, 2);
        assert_eq!(lines, vec!["one", "two…"]);

        let lines = wrap_clamped(&FixedWidth, "abcdefghij", FontFace::Regular, 9.0, 4.0, 2);
        assert_eq!(lines, vec!["abcd", "efg…"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 4));

        let lines = wrap_clamped(&FixedWidth, "short", FontFace::Regular, 9.0, 50.0, 2);
        assert_eq!(lines, vec!["short"]);
    }
}
