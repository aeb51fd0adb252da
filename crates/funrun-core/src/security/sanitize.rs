//! Free-text sanitization.
//!
//! Strips markup and script vectors from form input. Length limits are the
//! caller's job: see [`MAX_INPUT_LEN`].

use std::sync::LazyLock;

use regex::Regex;

/// Longest sanitized value accepted from any free-text field.
pub const MAX_INPUT_LEN: usize = 255;

static ANGLE_BRACKETS: LazyLock<Regex> = LazyLock::new(|| compile(r"[<>]"));
static SCRIPT_VECTORS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)javascript:|vbscript:|data:|on[[:word:]]+="));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

/// Sanitize a free-text value.
///
/// Removes `<` and `>`, strips `javascript:`, `data:` and `vbscript:`
/// prefixes and inline `on…=` handlers (case-insensitive), then collapses
/// whitespace runs to a single space. Leading and trailing whitespace is
/// collapsed, not trimmed.
///
/// Stripping repeats until nothing matches, so nested payloads such as
/// `javajavascript:script:` cannot reassemble.
pub fn sanitize_input(input: &str) -> String {
    let mut out = ANGLE_BRACKETS.replace_all(input, "").into_owned();

    loop {
        let stripped = SCRIPT_VECTORS.replace_all(&out, "");
        if stripped.len() == out.len() {
            break;
        }
        out = stripped.into_owned();
    }

    WHITESPACE.replace_all(&out, " ").into_owned()
}
