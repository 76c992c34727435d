//! Builders shared by the integration tests.
#![allow(dead_code)]

use richtext_core::{
    Block, Change, CounterKeyGenerator, Document, Inline, Node, Range, Text, Value,
};

pub fn text(key: &str, content: &str) -> Node {
    Text::new(key, content).into()
}

pub fn paragraph(key: &str, children: Vec<Node>) -> Node {
    Block::new(key, "paragraph", children).into()
}

pub fn link(key: &str, children: Vec<Node>) -> Node {
    Inline::new(key, "link", children).into()
}

pub fn image_block(key: &str, text_key: &str) -> Node {
    Block::new(key, "image", vec![text(text_key, "")])
        .with_void(true)
        .into()
}

/// Paragraphs `p0`, `p1`, ... each holding one text `t0`, `t1`, ...
pub fn paragraphs(contents: &[&str]) -> Document {
    let nodes = contents
        .iter()
        .enumerate()
        .map(|(i, content)| paragraph(&format!("p{i}"), vec![text(&format!("t{i}"), content)]))
        .collect();
    Document::new("doc", nodes)
}

pub fn change(document: Document, selection: Range) -> Change {
    Change::new(Value::new(document).with_selection(selection))
        .with_key_generator(CounterKeyGenerator::starting_at(1000))
}

pub fn change_without_selection(document: Document) -> Change {
    Change::new(Value::new(document)).with_key_generator(CounterKeyGenerator::starting_at(1000))
}

/// Flattened text of every leaf block, in order.
pub fn block_texts(change: &Change) -> Vec<String> {
    change
        .document()
        .get_blocks()
        .into_iter()
        .map(Node::text)
        .collect()
}

/// The selection as `(anchor key, anchor offset, focus key, focus offset)`.
pub fn points(change: &Change) -> (String, usize, String, usize) {
    let selection = change.selection().expect("selection");
    (
        selection.anchor_key.clone(),
        selection.anchor_offset,
        selection.focus_key.clone(),
        selection.focus_offset,
    )
}

/// `(leaf block index, offset in its flattened text)` of a point.
pub fn block_point(change: &Change, key: &str, offset: usize) -> (usize, usize) {
    let document = change.document();
    let block = document.get_closest_block(key).expect("point inside a block");
    let index = document
        .get_blocks()
        .iter()
        .position(|candidate| candidate.key() == block.key())
        .expect("leaf block");
    (index, block.get_offset(key).expect("offset") + offset)
}

/// Every container holds at least one text.
pub fn assert_no_empty_containers(node: &Node) {
    if node.is_text() {
        return;
    }
    assert!(
        node.get_first_text().is_some(),
        "container `{}` has no text",
        node.key()
    );
    for child in node.nodes() {
        assert_no_empty_containers(child);
    }
}
