//! Numbered choice detection in assistant replies.
//!
//! The assistant asks questions like:
//!
//! ```text
//! What would you like to do?
//! 1. Pay rent
//! 2) Report a repair
//! ```
//!
//! Each numbered line becomes an [`AiOption`] the user can pick instead of
//! typing the number.

use std::sync::LazyLock;

use regex::Regex;
use tenantchat_shared::AiOption;

/// `<digits>` then `)` or `.` then whitespace then the label, on a trimmed line.
static OPTION_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)[.)]\s+(.+)$").expect("option line regex")
});

/// "please select" / "please choose", any spacing.
static PLEASE_SELECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)please\s+(?:select|choose)").expect("please select regex")
});

const DIAGNOSIS_SUMMARY: &str = "diagnosis summary";

/// Whether the text is a diagnosis summary (case-insensitive).
///
/// Summaries list numbered findings that must never become clickable.
pub fn is_diagnosis_summary(text: &str) -> bool {
    text.to_lowercase().contains(DIAGNOSIS_SUMMARY)
}

/// Whether the text reads like a prompt for a choice.
fn asks_for_choice(text: &str) -> bool {
    text.contains('?') || PLEASE_SELECT_RE.is_match(text)
}

/// Match a single line against the option pattern. The line is trimmed first.
pub fn match_option_line(line: &str) -> Option<AiOption> {
    let caps = OPTION_LINE_RE.captures(line.trim())?;
    Some(AiOption {
        value: caps[1].to_string(),
        label: caps[2].trim().to_string(),
    })
}

/// Extract the numbered choices from assistant text.
///
/// Returns nothing for diagnosis summaries and for text that neither asks a
/// question nor says "please select/choose". Order follows the lines;
/// duplicate values are kept.
pub fn parse_ai_options(text: &str) -> Vec<AiOption> {
    if is_diagnosis_summary(text) || !asks_for_choice(text) {
        return Vec::new();
    }

    text.split('\n').filter_map(match_option_line).collect()
}
