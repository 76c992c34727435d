//! Boundary distances over a block's flattened text.
//!
//! Offsets and results are in characters (grapheme clusters). A single
//! character step is always 1, so only word and line distances need work.

use unicode_segmentation::UnicodeSegmentation;

/// Characters between `offset` and the start of the word before it,
/// including any separators directly before the caret.
pub fn word_offset_backward(text: &str, offset: usize) -> usize {
    let before: String = text.graphemes(true).take(offset).collect();
    word_distance(before.split_word_bounds().rev())
}

/// Characters between `offset` and the end of the word after it,
/// including any separators directly after the caret.
pub fn word_offset_forward(text: &str, offset: usize) -> usize {
    let after: String = text.graphemes(true).skip(offset).collect();
    word_distance(after.split_word_bounds())
}

pub fn char_count(text: &str) -> usize {
    text.graphemes(true).count()
}

fn is_word(segment: &str) -> bool {
    segment.chars().any(char::is_alphanumeric)
}

fn word_distance<'a>(segments: impl Iterator<Item = &'a str>) -> usize {
    let mut length = 0;
    let mut started = false;
    for segment in segments {
        let count = segment.graphemes(true).count();
        if is_word(segment) {
            started = true;
            length += count;
        } else if started {
            break;
        } else {
            length += count;
        }
    }
    length
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backward_takes_trailing_space_and_word() {
        assert_eq!(word_offset_backward("hello world", 11), 5);
        assert_eq!(word_offset_backward("hello world ", 12), 6);
        assert_eq!(word_offset_backward("hello world", 8), 2);
        assert_eq!(word_offset_backward("", 0), 0);
    }

    #[test]
    fn forward_takes_leading_space_and_word() {
        assert_eq!(word_offset_forward("hello world", 5), 6);
        assert_eq!(word_offset_forward("hello world", 0), 5);
        assert_eq!(word_offset_forward("hello", 5), 0);
    }

    #[test]
    fn contractions_count_as_one_word() {
        assert_eq!(word_offset_backward("it can't", 8), 5);
    }
}
