//! Text cleanup before handing a message to text-to-speech.

use std::sync::LazyLock;

use regex::Regex;

/// Emoji and pictographs, plus the joiners/selectors that glue them together.
static PICTOGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\u{200D}\u{FE0F}]").expect("pictograph regex")
});

/// Markdown emphasis characters a voice would otherwise read aloud.
static FORMATTING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*`_~]").expect("formatting regex"));

/// Strip emoji and formatting characters so a voice reads only the words.
pub fn speakable_text(text: &str) -> String {
    let without_pictographs = PICTOGRAPH_RE.replace_all(text, "");
    FORMATTING_RE.replace_all(&without_pictographs, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_emoji_and_markup() {
        assert_eq!(speakable_text("Hello 👋 **world**"), "Hello  world");
        assert_eq!(speakable_text("`code` and _em_ ~x~"), "code and em x");
    }

    #[test]
    fn keeps_plain_text_and_digits() {
        let text = "Option 1. Pay rent? #4";
        assert_eq!(speakable_text(text), text);
    }

    #[test]
    fn strips_joined_emoji_sequences() {
        assert_eq!(speakable_text("Done ✅ 👍 ❤️"), "Done   ");
    }
}
