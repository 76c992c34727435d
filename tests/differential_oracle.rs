use proptest::collection::vec;
use proptest::prelude::*;
use richtext_core::{Change, MarksInput, Range};
use richtext_naive_oracle::{Editor, Point};
mod support;

use support::{block_point, block_texts, change, paragraphs};

#[derive(Clone, Debug)]
enum Edit {
    Select((usize, usize), (usize, usize)),
    Type(String),
    Delete,
    Backspace,
    ForwardDelete,
    Enter,
}

fn edit() -> impl Strategy<Value = Edit> {
    let point = (0usize..6, 0usize..8);
    prop_oneof![
        2 => (point.clone(), point).prop_map(|(anchor, focus)| Edit::Select(anchor, focus)),
        3 => "[a-c ]{1,3}".prop_map(Edit::Type),
        1 => Just(Edit::Delete),
        2 => Just(Edit::Backspace),
        2 => Just(Edit::ForwardDelete),
        1 => Just(Edit::Enter),
    ]
}

/// Seeds wrapped into the oracle's current shape.
fn clamp(oracle: &Editor, (block, offset): (usize, usize)) -> Point {
    let block = block % oracle.block_count();
    Point::new(block, offset % (oracle.block_len(block) + 1))
}

/// A block-relative point; range resolution finds the text inside.
fn block_key(change: &Change, block: usize) -> String {
    change.document().get_blocks()[block].key().to_string()
}

fn apply(change: &mut Change, oracle: &mut Editor, edit: &Edit) {
    match edit {
        Edit::Select(anchor, focus) => {
            let (anchor, focus) = (clamp(oracle, *anchor), clamp(oracle, *focus));
            oracle.select(anchor, focus);
            let range = Range::new(
                block_key(change, anchor.block),
                anchor.offset,
                block_key(change, focus.block),
                focus.offset,
            );
            change.select(range).unwrap();
        }
        Edit::Type(text) => {
            oracle.insert_text(text);
            change.insert_text(text, MarksInput::Null).unwrap();
        }
        Edit::Delete => {
            oracle.delete();
            change.delete().unwrap();
        }
        Edit::Backspace => {
            oracle.delete_backward();
            change.delete_backward(1).unwrap();
        }
        Edit::ForwardDelete => {
            oracle.delete_forward();
            change.delete_forward(1).unwrap();
        }
        Edit::Enter => {
            oracle.split_block();
            change.split_block(1).unwrap();
        }
    }
}

fn caret(change: &Change) -> (Point, Point) {
    let selection = change.selection().expect("selection").clone();
    let (anchor_block, anchor_offset) =
        block_point(change, &selection.anchor_key, selection.anchor_offset);
    let (focus_block, focus_offset) =
        block_point(change, &selection.focus_key, selection.focus_offset);
    (
        Point::new(anchor_block, anchor_offset),
        Point::new(focus_block, focus_offset),
    )
}

#[test]
fn typing_enter_and_backspace_match_the_oracle() {
    let mut change = change(paragraphs(&["ab"]), Range::collapsed("t0", 2));
    let mut oracle = Editor::new(&["ab"]);
    oracle.select(Point::new(0, 2), Point::new(0, 2));
    for edit in [
        Edit::Enter,
        Edit::Type("c".into()),
        Edit::Backspace,
        Edit::Backspace,
        Edit::Backspace,
    ] {
        apply(&mut change, &mut oracle, &edit);
        assert_eq!(block_texts(&change), oracle.paragraphs(), "after {edit:?}");
    }
    assert_eq!(caret(&change), (oracle.anchor(), oracle.focus()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(proptest_config::cases()))]
    #[test]
    fn differential_edits_match_the_oracle(
        seed in vec("[a-c ]{0,5}", 1..4),
        edits in vec(edit(), 0..40),
    ) {
        let contents: Vec<&str> = seed.iter().map(String::as_str).collect();
        let mut change = change(paragraphs(&contents), Range::collapsed("t0", 0));
        let mut oracle = Editor::new(&contents);

        for edit in &edits {
            apply(&mut change, &mut oracle, edit);
            prop_assert_eq!(
                block_texts(&change),
                oracle.paragraphs(),
                "paragraphs diverged after {:?}",
                edit
            );
            prop_assert_eq!(caret(&change), (oracle.anchor(), oracle.focus()), "selection diverged after {:?}", edit);
        }
    }
}
