use proptest::prelude::*;
use richtext_core::{Document, EditError, Range};
mod support;

use support::{
    block_texts, change, change_without_selection, image_block, paragraph, paragraphs, points, text,
};

#[test]
fn delete_inside_one_text() {
    let mut change = change(paragraphs(&["hello"]), Range::new("t0", 1, "t0", 4));
    change.delete().unwrap();
    assert_eq!(block_texts(&change), vec!["ho"]);
    assert_eq!(points(&change), ("t0".into(), 1, "t0".into(), 1));
}

#[test]
fn delete_across_blocks_joins_the_edges() {
    let mut change = change(
        paragraphs(&["hello", "big", "world"]),
        Range::new("t0", 3, "t2", 2),
    );
    change.delete().unwrap();
    assert_eq!(block_texts(&change), vec!["helrld"]);
    assert_eq!(points(&change), ("t0".into(), 3, "t0".into(), 3));
}

#[test]
fn delete_of_a_backward_selection_matches_forward() {
    let mut forward = change(paragraphs(&["one", "two"]), Range::new("t0", 1, "t1", 2));
    let mut backward = change(paragraphs(&["one", "two"]), Range::new("t1", 2, "t0", 1));
    forward.delete().unwrap();
    backward.delete().unwrap();
    assert_eq!(block_texts(&forward), block_texts(&backward));
    assert_eq!(block_texts(&forward), vec!["oo"]);
}

#[test]
fn delete_with_a_collapsed_selection_is_a_no_op() {
    let mut change = change(paragraphs(&["abc"]), Range::collapsed("t0", 1));
    change.delete().unwrap();
    assert!(change.operations().is_empty());
    assert_eq!(block_texts(&change), vec!["abc"]);
}

#[test]
fn delete_needs_a_selection() {
    let mut change = change_without_selection(paragraphs(&["abc"]));
    assert_eq!(change.delete().unwrap_err(), EditError::NoSelection);
}

#[test]
fn delete_at_range_saves_a_snapshot_of_the_selection() {
    let mut change = change(paragraphs(&["abcdef"]), Range::new("t0", 1, "t0", 3));
    change.delete().unwrap();
    let snapshot = change.snapshot().unwrap();
    assert_eq!((snapshot.anchor_offset, snapshot.focus_offset), (1, 3));
}

#[test]
fn backspace_removes_one_character() {
    let mut change = change(paragraphs(&["abc"]), Range::collapsed("t0", 2));
    change.delete_backward(1).unwrap();
    assert_eq!(block_texts(&change), vec!["ac"]);
    assert_eq!(points(&change), ("t0".into(), 1, "t0".into(), 1));
}

#[test]
fn backspace_at_block_start_merges_into_the_previous_block() {
    let mut change = change(paragraphs(&["ab", "cd"]), Range::collapsed("t1", 0));
    change.delete_char_backward().unwrap();
    assert_eq!(block_texts(&change), vec!["abcd"]);
    assert_eq!(points(&change), ("t0".into(), 2, "t0".into(), 2));
}

#[test]
fn backspace_at_document_start_does_nothing() {
    let mut change = change(paragraphs(&["ab"]), Range::collapsed("t0", 0));
    change.delete_backward(1).unwrap();
    assert_eq!(block_texts(&change), vec!["ab"]);
}

#[test]
fn backspace_walks_back_through_previous_texts() {
    let mut change = change(paragraphs(&["ab", "cd"]), Range::collapsed("t1", 1));
    change.delete_backward(3).unwrap();
    assert_eq!(block_texts(&change), vec!["d"]);
}

#[test]
fn backspace_removes_an_empty_block() {
    let mut change = change(paragraphs(&["ab", "", "cd"]), Range::collapsed("t1", 0));
    change.delete_backward(1).unwrap();
    assert_eq!(block_texts(&change), vec!["ab", "cd"]);
    assert_eq!(points(&change), ("t0".into(), 2, "t0".into(), 2));
}

#[test]
fn forward_delete_at_block_end_merges_the_next_block() {
    let mut change = change(paragraphs(&["ab", "cd"]), Range::collapsed("t0", 2));
    change.delete_char_forward().unwrap();
    assert_eq!(block_texts(&change), vec!["abcd"]);
    assert_eq!(points(&change), ("t0".into(), 2, "t0".into(), 2));
}

#[test]
fn forward_delete_at_document_end_does_nothing() {
    let mut change = change(paragraphs(&["ab"]), Range::collapsed("t0", 2));
    change.delete_forward(1).unwrap();
    assert!(change.operations().is_empty());
}

#[test]
fn word_and_line_deletes_measure_within_the_block() {
    let mut words = change(paragraphs(&["hello world"]), Range::collapsed("t0", 11));
    words.delete_word_backward().unwrap();
    assert_eq!(block_texts(&words), vec!["hello "]);

    let mut forward = change(paragraphs(&["hello world"]), Range::collapsed("t0", 0));
    forward.delete_word_forward().unwrap();
    assert_eq!(block_texts(&forward), vec![" world"]);

    let mut line = change(paragraphs(&["hello world"]), Range::collapsed("t0", 5));
    line.delete_line_backward().unwrap();
    assert_eq!(block_texts(&line), vec![" world"]);

    let mut line_forward = change(paragraphs(&["hello world"]), Range::collapsed("t0", 5));
    line_forward.delete_line_forward().unwrap();
    assert_eq!(block_texts(&line_forward), vec!["hello"]);
}

#[test]
fn word_delete_at_block_start_joins_blocks() {
    let mut change = change(paragraphs(&["ab", "cd"]), Range::collapsed("t1", 0));
    change.delete_word_backward().unwrap();
    assert_eq!(block_texts(&change), vec!["abcd"]);
}

fn with_image() -> Document {
    Document::new(
        "doc",
        vec![
            paragraph("p0", vec![text("t0", "ab")]),
            image_block("img", "it"),
            paragraph("p2", vec![text("t2", "cd")]),
        ],
    )
}

#[test]
fn backspace_after_a_void_removes_it_whole() {
    let mut change = change(with_image(), Range::collapsed("t2", 0));
    change.delete_backward(1).unwrap();
    assert!(!change.document().has_descendant("img"));
    assert_eq!(block_texts(&change), vec!["ab", "cd"]);
    assert_eq!(points(&change), ("t2".into(), 0, "t2".into(), 0));
}

#[test]
fn forward_delete_before_a_void_removes_it_whole() {
    let mut change = change(with_image(), Range::collapsed("t0", 2));
    change.delete_forward(1).unwrap();
    assert!(!change.document().has_descendant("img"));
    assert_eq!(block_texts(&change), vec!["ab", "cd"]);
}

#[test]
fn deleting_the_only_void_clears_the_selection() {
    let document = Document::new("doc", vec![image_block("img", "it")]);
    let mut change = change(document, Range::new("it", 0, "it", 1));
    change.delete().unwrap();
    assert!(change.selection().is_none());
    let document = change.document();
    assert_eq!(document.nodes().len(), 1);
    assert_eq!(document.nodes()[0].node_type(), Some("paragraph"));
}

#[test]
fn a_range_starting_before_a_void_removes_it() {
    let mut change = change(with_image(), Range::new("it", 0, "t2", 1));
    change.delete().unwrap();
    assert!(!change.document().has_descendant("img"));
    assert_eq!(block_texts(&change), vec!["ab", "d"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(proptest_config::cases()))]
    #[test]
    fn prop_deleting_next_to_a_void_is_atomic(backward in any::<bool>(), n in 1usize..4) {
        let (caret, expected) = if backward { ("t2", 0) } else { ("t0", 2) };
        let mut change = change(with_image(), Range::collapsed(caret, expected));
        if backward {
            change.delete_backward(n).unwrap();
        } else {
            change.delete_forward(n).unwrap();
        }
        let document = change.document();
        prop_assert!(!document.has_descendant("img"));
        prop_assert!(!document.has_descendant("it"));
        prop_assert_eq!(document.text(), "abcd");
    }
}
