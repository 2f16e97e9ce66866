//! Chat bubble layout: turns a [`Message`] into renderable lines.
//!
//! Front-ends (CLI, TUI) only style what this module decides: which lines
//! are option buttons, which runs are bold or links, whether a download card
//! or a copy action is attached.

use tenantchat_shared::{AiOption, DocumentLink, Message};

use crate::documents::extract_documents;
use crate::inline::{Inline, parse_inline};
use crate::options::{is_diagnosis_summary, match_option_line};

/// Marker that enables the copy action on a bubble (case-sensitive).
const COPYABLE_MARKER: &str = "Diagnosis Summary";

/// One rendered line of a bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BubbleLine {
    /// Ordinary text, already split into inline runs.
    Text(Vec<Inline>),
    /// A clickable choice; picking it sends `value` as the next message.
    Option(AiOption),
}

impl BubbleLine {
    /// Button caption for option lines: `"{value}. {label}"`.
    pub fn caption(option: &AiOption) -> String {
        format!("{}. {}", option.value, option.label)
    }
}

/// Everything a front-end needs to draw one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BubbleCard {
    pub is_user: bool,
    pub lines: Vec<BubbleLine>,
    /// Download card entries (assistant messages only).
    pub documents: Vec<DocumentLink>,
    /// Whether a "Copy" action is offered.
    pub copyable: bool,
    /// Whether option lines are clickable.
    pub interactive: bool,
}

impl BubbleCard {
    /// Option lines in display order.
    pub fn options(&self) -> impl Iterator<Item = &AiOption> {
        self.lines.iter().filter_map(|line| match line {
            BubbleLine::Option(opt) => Some(opt),
            BubbleLine::Text(_) => None,
        })
    }
}

/// Lay out a message.
///
/// Option buttons appear only on assistant messages that carry parsed
/// options and are not diagnosis summaries. User text is never parsed for
/// markup.
pub fn layout_bubble(message: &Message) -> BubbleCard {
    if message.is_user() {
        return BubbleCard {
            is_user: true,
            lines: message
                .text
                .split('\n')
                .map(|line| BubbleLine::Text(vec![Inline::Text(line.to_string())]))
                .collect(),
            documents: Vec::new(),
            copyable: false,
            interactive: false,
        };
    }

    let interactive = !message.options.is_empty() && !is_diagnosis_summary(&message.text);

    let lines = message
        .text
        .split('\n')
        .map(|line| match interactive.then(|| match_option_line(line)).flatten() {
            Some(opt) => BubbleLine::Option(opt),
            None => BubbleLine::Text(parse_inline(line)),
        })
        .collect();

    BubbleCard {
        is_user: false,
        lines,
        documents: extract_documents(&message.text),
        copyable: message.text.contains(COPYABLE_MARKER),
        interactive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::parse_ai_options;

    fn assistant(text: &str) -> Message {
        Message::assistant(2, text, parse_ai_options(text))
    }

    #[test]
    fn options_become_buttons() {
        let card = layout_bubble(&assistant("What next?\n1. Pay rent\n2) Repairs"));
        assert!(card.interactive);
        assert_eq!(card.lines.len(), 3);
        assert!(matches!(card.lines[0], BubbleLine::Text(_)));
        let captions: Vec<String> = card.options().map(BubbleLine::caption).collect();
        assert_eq!(captions, vec!["1. Pay rent", "2. Repairs"]);
    }

    #[test]
    fn numbered_lines_without_prompt_stay_text() {
        let card = layout_bubble(&assistant("Summary:\n1. Paid\n2. Pending"));
        assert!(!card.interactive);
        assert_eq!(card.options().count(), 0);
    }

    #[test]
    fn diagnosis_summary_is_copyable_not_interactive() {
        // Options forced onto the message must still not render as buttons.
        let mut msg = assistant("Diagnosis Summary\n1. Leak under sink?");
        msg.options = vec![AiOption {
            value: "1".into(),
            label: "Leak under sink?".into(),
        }];
        let card = layout_bubble(&msg);
        assert!(!card.interactive);
        assert!(card.copyable);
        assert_eq!(card.options().count(), 0);
    }

    #[test]
    fn assistant_links_render_as_anchors() {
        let card = layout_bubble(&assistant("Read the [Label](https://x) page"));
        let BubbleLine::Text(runs) = &card.lines[0] else {
            panic!("expected text line");
        };
        assert!(runs.contains(&Inline::Link {
            label: "Label".into(),
            href: "https://x".into(),
        }));
    }

    #[test]
    fn user_text_is_never_parsed() {
        let card = layout_bubble(&Message::user(5, "**1. not bold?**"));
        assert!(card.is_user);
        assert_eq!(
            card.lines,
            vec![BubbleLine::Text(vec![Inline::Text("**1. not bold?**".into())])]
        );
        assert!(card.documents.is_empty());
    }

    #[test]
    fn documents_attach_to_assistant_bubbles() {
        let card = layout_bubble(&assistant(
            "Document Name: House rules\nDocument URL: https://f.example.com/rules.pdf",
        ));
        assert_eq!(card.documents.len(), 1);
        assert_eq!(card.documents[0].name, "House rules");
    }
}
