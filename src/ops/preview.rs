use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Longest header preview before it is cut with `...`
pub const HEADER_PREVIEW_MAX: usize = 50;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    Rule {
        pattern: Regex::new(pattern).expect("markdown pattern is a valid literal"),
        replacement,
    }
}

/// Applied in order; later rules see the output of earlier ones.
static MARKDOWN_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"(?m)^#{1,6}\s+", ""),
        rule(r"\*\*(.*?)\*\*", "$1"),
        rule(r"__(.*?)__", "$1"),
        rule(r"\*(.*?)\*", "$1"),
        rule(r"_(.*?)_", "$1"),
        rule(r"~~(.*?)~~", "$1"),
        rule(r"`(.*?)`", "$1"),
        rule(r"!\[([^\]]*)\]\([^)]*\)", "$1"),
        rule(r"\[([^\]]*)\]\([^)]*\)", "$1"),
        rule(r"(?m)^>\s+", ""),
        rule(r"(?m)^\s*[-*+]\s+", ""),
        rule(r"(?m)^\s*\d+\.\s+", ""),
        rule(r"(?m)^\s*[-*_]{3,}\s*$", ""),
        rule(r"```[\s\S]*?```", ""),
        rule(r"<[^>]*>", ""),
        rule(r"\n\s*\n", "\n"),
        rule(r"\s+", " "),
    ]
});

static EXTRA_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline pattern is a valid literal"));

/// Reduce markdown to plain single-spaced text.
pub fn strip_markdown(text: &str) -> String {
    let mut out = text.to_string();
    for rule in MARKDOWN_RULES.iter() {
        out = rule
            .pattern
            .replace_all(&out, rule.replacement)
            .into_owned();
    }
    out.trim().to_string()
}

/// One-line preview for a minimized note's header: the first non-empty
/// line, markdown stripped, cut at [`HEADER_PREVIEW_MAX`] characters.
pub fn header_preview(content: &str) -> String {
    let first = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");
    let plain = strip_markdown(first);
    let graphemes: Vec<&str> = plain.graphemes(true).collect();
    if graphemes.len() > HEADER_PREVIEW_MAX {
        format!("{}...", graphemes[..HEADER_PREVIEW_MAX].concat())
    } else {
        plain
    }
}

/// Squeeze runs of three or more newlines down to one blank line.
pub fn collapse_newlines(text: &str) -> String {
    EXTRA_NEWLINES.replace_all(text, "\n\n").into_owned()
}
