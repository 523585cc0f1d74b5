use std::sync::LazyLock;

use regex::Regex;

static BLOCK_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</p>|</div>").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));
static GHERKIN_STEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(Given |When |Then )").expect("valid regex"));

/// Entities the tracker's rich-text editor emits. `&amp;` goes last so an
/// escaped entity like `&amp;lt;` decodes to `&lt;` rather than `<`.
const ENTITIES: [(&str, &str); 5] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&amp;", "&"),
];

/// Convert the HTML stored in an acceptance-criteria field to plain text.
///
/// Block-level breaks become newlines, Given/When/Then steps each start a
/// line, and every Scenario after the first is preceded by one blank line.
pub fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let text = BLOCK_BREAK.replace_all(html, "\n");
    let mut text = TAG.replace_all(&text, "").into_owned();
    for (entity, replacement) in ENTITIES {
        text = text.replace(entity, replacement);
    }

    let text = BLANK_RUN.replace_all(&text, "\n");
    let text = GHERKIN_STEP.replace_all(text.trim(), "\n${1}");

    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if is_scenario_heading(line) && !lines.is_empty() {
            lines.push("");
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines.join("\n")
}

fn is_scenario_heading(line: &str) -> bool {
    line.starts_with("Scenario ") || line.starts_with("Scenario:")
}
