use super::MarkSet;
use unicode_segmentation::UnicodeSegmentation;

/// One grapheme cluster and the marks applied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub text: String,
    pub marks: MarkSet,
}

impl Character {
    pub fn new(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    /// Splits `text` into grapheme clusters, each carrying `marks`.
    pub fn list_from_text(text: &str, marks: &MarkSet) -> Vec<Character> {
        text.graphemes(true)
            .map(|grapheme| Character::new(grapheme, marks.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combining_sequences_stay_together() {
        let chars = Character::list_from_text("e\u{301}x", &MarkSet::new());
        assert_eq!(chars.len(), 2);
        assert_eq!(chars[0].text, "e\u{301}");
    }
}
