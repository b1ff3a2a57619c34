use std::sync::LazyLock;

use regex::Regex;

static NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\)\s*").expect("valid regex"));

/// `\r\n`, a bare `\r` or `\n`. Unlike `str::lines`, a trailing break still
/// yields a final empty line.
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("valid regex"));

/// Number each non-blank line: `"Eggs\n\nFlour"` becomes `"1) Eggs\n2) Flour"`.
///
/// Lines are trimmed; blank lines are dropped before numbering.
#[must_use]
pub fn format_list(text: &str) -> String {
    LINE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| format!("{}) {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip a leading `N) ` from every line.
///
/// Unlike `format_list`, blank lines are kept, including a trailing one.
/// Line breaks come back as `\n`.
#[must_use]
pub fn parse_list(text: &str) -> String {
    LINE_BREAK
        .split(text)
        .map(|line| NUMBER_PREFIX.replace(line, ""))
        .collect::<Vec<_>>()
        .join("\n")
}
