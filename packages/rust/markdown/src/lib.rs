//! Assistant text parsing and chat bubble layout.
//!
//! Assistant replies are semi-structured text. This crate pulls the
//! structure back out:
//! - [`parse_ai_options`]: numbered choice lists
//! - [`parse_inline`]: `**bold**` and `[label](url)` runs
//! - [`extract_documents`]: document name/URL pairs for a download card
//! - [`layout_bubble`]: the per-line rendering decision for one message
//! - [`speakable_text`]: cleanup before text-to-speech

mod bubble;
mod documents;
mod inline;
mod options;
mod speech;

pub use bubble::{BubbleCard, BubbleLine, layout_bubble};
pub use documents::extract_documents;
pub use inline::{Inline, parse_inline, to_plain};
pub use options::{is_diagnosis_summary, match_option_line, parse_ai_options};
pub use speech::speakable_text;
