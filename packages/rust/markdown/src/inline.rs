//! Inline markdown: `**bold**` and `[label](https://…)` links.
//!
//! Anything else is passed through as text. Unbalanced markers are left
//! literal rather than guessed at.

use std::sync::LazyLock;

use regex::Regex;

/// A run of inline content within one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(String),
    Link { label: String, href: String },
}

/// Matches `**bold**` (group 1) or `[label](http(s)://href)` (groups 2, 3).
static INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*([^*]+?)\*\*|\[([^\]]+)\]\((https?://[^)\s]+)\)").expect("inline regex")
});

/// Split a line into text, bold, and link runs, in order.
pub fn parse_inline(line: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut last = 0;

    for caps in INLINE_RE.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            out.push(Inline::Text(line[last..whole.start()].to_string()));
        }

        if let Some(bold) = caps.get(1) {
            out.push(Inline::Bold(bold.as_str().to_string()));
        } else if let (Some(label), Some(href)) = (caps.get(2), caps.get(3)) {
            out.push(Inline::Link {
                label: label.as_str().to_string(),
                href: href.as_str().to_string(),
            });
        }

        last = whole.end();
    }

    if last < line.len() {
        out.push(Inline::Text(line[last..].to_string()));
    }

    out
}

/// Flatten inline runs back to display text. Links render as `label (href)`.
pub fn to_plain(runs: &[Inline]) -> String {
    let mut out = String::new();
    for run in runs {
        match run {
            Inline::Text(t) | Inline::Bold(t) => out.push_str(t),
            Inline::Link { label, href } => {
                out.push_str(label);
                out.push_str(" (");
                out.push_str(href);
                out.push(')');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_one_run() {
        assert_eq!(
            parse_inline("No markup here."),
            vec![Inline::Text("No markup here.".into())]
        );
        assert!(parse_inline("").is_empty());
    }

    #[test]
    fn link_becomes_anchor() {
        let runs = parse_inline("See [Label](https://x) for details");
        assert_eq!(
            runs,
            vec![
                Inline::Text("See ".into()),
                Inline::Link {
                    label: "Label".into(),
                    href: "https://x".into(),
                },
                Inline::Text(" for details".into()),
            ]
        );
    }

    #[test]
    fn bold_and_link_mixed() {
        let runs = parse_inline("**Due:** 1 May, [pay here](http://pay.example.com/r?id=4)");
        assert_eq!(runs[0], Inline::Bold("Due:".into()));
        assert_eq!(runs[1], Inline::Text(" 1 May, ".into()));
        assert_eq!(
            runs[2],
            Inline::Link {
                label: "pay here".into(),
                href: "http://pay.example.com/r?id=4".into(),
            }
        );
    }

    #[test]
    fn non_http_links_and_unbalanced_bold_stay_literal() {
        let line = "[local](./lease.pdf) and **half";
        assert_eq!(parse_inline(line), vec![Inline::Text(line.into())]);
    }

    #[test]
    fn to_plain_renders_links_with_href() {
        let runs = parse_inline("**Hi** [doc](https://d.example.com/a.pdf)");
        assert_eq!(to_plain(&runs), "Hi doc (https://d.example.com/a.pdf)");
    }
}
