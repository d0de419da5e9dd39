//! Score extraction from free-form oracle responses.
//!
//! Score-bearing stages instruct the oracle to begin its reply with
//! [`SCORE_MARKER`] followed by a number. [`extract_score`] finds that pair and
//! nothing else: it does not clamp and it never fails loudly. Substituting a
//! default on `None` is the calling stage's job.

use std::sync::LazyLock;

use regex::Regex;

/// Literal token that precedes the numeric score in an oracle response.
pub const SCORE_MARKER: &str = "Score:";

static SCORE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Score:\s*(\d+(?:\.\d+)?)").expect("score pattern is a valid regex")
});

/// Returns the first number that directly follows [`SCORE_MARKER`] in `text`.
///
/// The number is an unsigned integer or decimal literal; whitespace between
/// the marker and the number is skipped. Returns `None` if no such pair exists.
pub fn extract_score(text: &str) -> Option<f64> {
    SCORE_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
