// Text normalization - the first pipeline stage.
//
// Model output often carries markdown emphasis even when asked not to.
// Everything downstream works on the normalized string only.

use regex::Regex;
use std::sync::LazyLock;

static DOUBLE_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));
static SINGLE_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("valid regex"));
static UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^_]+)_").expect("valid regex"));

/// Strip emphasis wrappers, unify line endings and trim.
///
/// Wrappers are removed until none is left, so nested or adjacent markup
/// (`***x***`, `__x__`) ends up fully unwrapped and a second call is a no-op.
pub fn normalize(text: &str) -> String {
    let mut current = text.replace("\r\n", "\n").replace('\r', "\n");

    loop {
        let next = strip_emphasis_once(&current);
        // Every replacement drops at least two characters, so this terminates
        if next == current {
            break;
        }
        current = next;
    }

    current.trim().to_string()
}

fn strip_emphasis_once(text: &str) -> String {
    let text = DOUBLE_STAR.replace_all(text, "$1");
    let text = SINGLE_STAR.replace_all(&text, "$1");
    UNDERSCORE.replace_all(&text, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_all_three_wrappers() {
        assert_eq!(
            normalize("  **Bold** and *italic* and _under_  "),
            "Bold and italic and under"
        );
    }

    #[test]
    fn nested_markup_is_fully_removed() {
        assert_eq!(normalize("***x***"), "x");
        assert_eq!(normalize("__x__"), "x");
    }

    #[test]
    fn line_endings_are_unified() {
        assert_eq!(normalize("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\t "), "");
    }

    #[test]
    fn lone_markers_are_kept() {
        assert_eq!(normalize("5 * 3 = 15"), "5 * 3 = 15");
    }

    #[test]
    fn idempotent_on_tricky_inputs() {
        for input in ["***a***", "__a__", "*_a_*", "**a*b**", " _x_ ", "a**b"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {input:?}");
        }
    }
}
