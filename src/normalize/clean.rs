use std::sync::LazyLock;

use regex::{Captures, Regex};

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static ESCAPED_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\u(?i:(2014|2013|2018|2019|201c|201d))").unwrap());
static SENTENCE_GAP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.([A-Z])").unwrap());
static CONTROL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\x00-\x1F\x7F-\x9F]").unwrap());
static ESCAPED_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:\\[nrt])+").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Clean forum text into a single line suitable for embedding.
///
/// Stripping control characters can glue together fragments that an earlier
/// rule would have rewritten (`.\x01A`, `\\\x01u2014`), so the pass repeats
/// until nothing changes. For ordinary input the second pass is a no-op.
pub fn clean_text(raw: &str) -> String {
    let mut current = clean_pass(raw);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Lighter cleanup for extracted PDF page text: whitespace and control
/// characters only. Page layout carries no forum escapes.
pub fn clean_page_text(raw: &str) -> String {
    let text = WS_RE.replace_all(raw, " ");
    CONTROL_RE.replace_all(&text, "").trim().to_string()
}

fn clean_pass(text: &str) -> String {
    let text = BLANK_RUN_RE.replace_all(text, "\n\n");
    let text = ESCAPED_PUNCT_RE.replace_all(&text, |caps: &Captures| {
        match caps[1].to_ascii_lowercase().as_str() {
            "2014" => "\u{2014}",
            "2013" => "\u{2013}",
            "2018" => "\u{2018}",
            "2019" => "\u{2019}",
            "201c" => "\u{201C}",
            _ => "\u{201D}",
        }
        .to_string()
    });
    let text = SENTENCE_GAP_RE.replace_all(&text, ". $1");
    let text = text.replace('\n', " ");
    let text = CONTROL_RE.replace_all(&text, "");
    let text = ESCAPED_WS_RE.replace_all(&text, " ");
    WS_RE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newlines_become_spaces() {
        assert_eq!(clean_text("first\n\n\n\nsecond\nthird"), "first second third");
    }

    #[test]
    fn escaped_quotes_and_dashes() {
        assert_eq!(
            clean_text(r"it\u2019s \u201Cquoted\u201d \u2014 and \u2013 \u2018x\u2019"),
            "it\u{2019}s \u{201C}quoted\u{201D} \u{2014} and \u{2013} \u{2018}x\u{2019}"
        );
    }

    #[test]
    fn other_escapes_left_alone() {
        assert_eq!(clean_text(r"caf\u00e9"), r"caf\u00e9");
    }

    #[test]
    fn sentence_boundary_repair() {
        assert_eq!(clean_text("Done.Next one.lower stays"), "Done. Next one.lower stays");
    }

    #[test]
    fn control_characters_removed() {
        assert_eq!(clean_text("a\u{0007}b\u{0085}c\td"), "abcd");
    }

    #[test]
    fn literal_escape_runs_collapse() {
        assert_eq!(clean_text(r"line one\n\n\r\tline two"), "line one line two");
    }

    #[test]
    fn whitespace_collapsed_and_trimmed() {
        assert_eq!(clean_text("   lots    of\u{a0}\u{a0} space  "), "lots of space");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("\n\n\n"), "");
    }

    #[test]
    fn page_text_only_squashes() {
        assert_eq!(clean_page_text("  Homework 1\n\n  Due.Friday\u{0002} "), "Homework 1 Due.Friday");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "Plain text.With a boundary\n\n\n\nand breaks",
            r"escaped \u2014 dash\nand \t tabs",
            ".\u{0001}A glued after control strip",
            "\\\u{0001}u2014 glued escape",
            "\\\u{0001}n glued newline escape",
            "<p>Some <b>html</b></p>\r\n<p>More.</p>",
            "   ",
            "\u{009F}\u{007F}\u{0000}",
        ];
        for input in inputs {
            let once = clean_text(input);
            assert_eq!(clean_text(&once), once, "not idempotent for {:?}", input);
        }
    }
}
