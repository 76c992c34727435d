use richtext_core::{Block, Document, Range};
mod support;

use support::{block_point, block_texts, change, link, paragraph, paragraphs, text};

fn focus(change: &richtext_core::Change) -> (usize, usize) {
    let selection = change.selection().expect("selection").clone();
    block_point(change, &selection.focus_key, selection.focus_offset)
}

#[test]
fn split_block_moves_the_caret_into_the_new_block() {
    let mut change = change(paragraphs(&["abcd"]), Range::collapsed("t0", 2));
    change.split_block(1).unwrap();
    assert_eq!(block_texts(&change), vec!["ab", "cd"]);
    assert_eq!(focus(&change), (1, 0));
    assert_eq!(change.document().nodes()[0].key(), "p0");
}

#[test]
fn split_block_deletes_an_expanded_selection_first() {
    let mut change = change(paragraphs(&["abcd"]), Range::new("t0", 1, "t0", 3));
    change.split_block(1).unwrap();
    assert_eq!(block_texts(&change), vec!["a", "d"]);
    assert_eq!(focus(&change), (1, 0));
}

#[test]
fn split_block_at_the_edges_leaves_an_empty_block() {
    let mut change = change(paragraphs(&["ab"]), Range::collapsed("t0", 2));
    change.split_block(1).unwrap();
    assert_eq!(block_texts(&change), vec!["ab", ""]);
}

#[test]
fn split_block_to_a_depth_splits_the_wrappers_too() {
    let quote = Block::new("q", "quote", vec![paragraph("p0", vec![text("t0", "abcd")])]);
    let mut change = change(Document::new("doc", vec![quote.into()]), Range::collapsed("t0", 2));
    change.split_block(2).unwrap();
    let document = change.document();
    assert_eq!(document.nodes().len(), 2);
    assert!(document.nodes().iter().all(|node| node.node_type() == Some("quote")));
    assert_eq!(block_texts(&change), vec!["ab", "cd"]);
}

#[test]
fn split_block_depth_is_capped_by_the_tree() {
    let mut change = change(paragraphs(&["abcd"]), Range::collapsed("t0", 1));
    change.split_block(5).unwrap();
    assert_eq!(block_texts(&change), vec!["a", "bcd"]);
}

#[test]
fn split_inline_splits_every_inline_ancestor() {
    let para = paragraph(
        "p0",
        vec![text("a", "x"), link("l", vec![text("lt", "abcd")]), text("c", "y")],
    );
    let mut change = change(Document::new("doc", vec![para]), Range::collapsed("lt", 2));
    change.split_inline(usize::MAX).unwrap();
    let document = change.document();
    let links: Vec<String> = document.nodes()[0]
        .nodes()
        .iter()
        .filter(|node| node.is_inline())
        .map(|node| node.text())
        .collect();
    assert_eq!(links, vec!["ab", "cd"]);
    assert_eq!(document.text(), "xabcdy");
}

#[test]
fn split_inline_outside_inlines_only_splits_the_text() {
    let mut change = change(paragraphs(&["abcd"]), Range::collapsed("t0", 2));
    let range = Range::collapsed("t0", 2);
    change
        .split_inline_at_range(&range, usize::MAX, richtext_core::ChangeOptions::without_normalize())
        .unwrap();
    let document = change.document();
    assert_eq!(document.nodes()[0].nodes().len(), 2);
    assert_eq!(block_texts(&change), vec!["abcd"]);
}
