use proptest::prelude::*;
use richtext_core::{
    Block, ChangeOptions, Document, Mark, MarkSet, MarksInput, Operation, Range, Text,
};
mod support;

use support::{change, paragraphs};

const CONTENTS: [&str; 3] = ["hello", "big", "world"];

fn bold() -> Mark {
    Mark::new("bold")
}

/// `true` per character, in document order, when it carries `mark`.
fn marked(change: &richtext_core::Change, mark: &Mark) -> Vec<bool> {
    change
        .document()
        .get_texts()
        .into_iter()
        .flat_map(|text| text.characters().iter().map(|c| c.marks.contains(mark)))
        .collect()
}

/// Global character index of `(block, offset)` over `CONTENTS`.
fn global(block: usize, offset: usize) -> usize {
    CONTENTS[..block].iter().map(|text| text.len()).sum::<usize>() + offset
}

fn point() -> impl Strategy<Value = (usize, usize)> {
    (0..CONTENTS.len()).prop_flat_map(|block| (Just(block), 0..=CONTENTS[block].len()))
}

#[test]
fn add_mark_covers_exactly_the_range() {
    let mut change = change(paragraphs(&CONTENTS), Range::new("t0", 3, "t1", 2));
    change.add_mark(bold()).unwrap();
    let expected: Vec<bool> = (0..global(3, 0))
        .map(|i| (3..global(1, 2)).contains(&i))
        .collect();
    assert_eq!(marked(&change, &bold()), expected);
}

#[test]
fn mark_ops_skip_texts_the_range_only_touches() {
    let mut change = change(paragraphs(&CONTENTS), Range::new("t0", 5, "t2", 0));
    change.add_mark("bold").unwrap();
    let spans: Vec<_> = change
        .operations()
        .iter()
        .filter_map(|operation| match operation {
            Operation::AddMark { key, offset, length, .. } => Some((key.clone(), *offset, *length)),
            _ => None,
        })
        .collect();
    assert_eq!(spans, vec![("t1".to_string(), 0, 3)]);
}

#[test]
fn collapsed_ranges_do_not_touch_the_document() {
    let mut change = change(paragraphs(&CONTENTS), Range::collapsed("t0", 2));
    let range = Range::collapsed("t0", 2);
    change
        .add_mark_at_range(&range, bold(), ChangeOptions::default())
        .unwrap();
    assert!(change.operations().is_empty());
}

#[test]
fn a_caret_mark_applies_to_the_next_insertion() {
    let mut change = change(paragraphs(&["ab"]), Range::collapsed("t0", 2));
    change.add_mark("bold").unwrap();
    assert!(change.selection().unwrap().marks.as_ref().unwrap().contains(&bold()));

    change.insert_text("c", MarksInput::Null).unwrap();
    let document = change.document();
    let text = document.assert_text("t0").unwrap();
    assert!(text.characters()[2].marks.contains(&bold()));
    assert!(!text.characters()[1].marks.contains(&bold()));
    assert_eq!(change.selection().unwrap().marks, None);
}

#[test]
fn removing_a_mark_at_a_caret_stops_it_from_continuing() {
    let marks = MarkSet::new().with(bold());
    let para = Block::new("p0", "paragraph", vec![Text::with_marks("t0", "ab", &marks).into()]);
    let mut change = change(Document::new("doc", vec![para.into()]), Range::collapsed("t0", 2));
    change.remove_mark("bold").unwrap();
    change.insert_text("c", MarksInput::Null).unwrap();
    let document = change.document();
    let text = document.assert_text("t0").unwrap();
    assert_eq!(text.text(), "abc");
    assert!(text.characters()[2].marks.is_empty());
}

#[test]
fn toggle_removes_a_mark_only_when_every_character_has_it() {
    let mut change = change(paragraphs(&CONTENTS), Range::new("t0", 0, "t0", 2));
    change.add_mark("bold").unwrap();
    change.select(Range::new("t0", 0, "t0", 4)).unwrap();
    change.toggle_mark("bold").unwrap();
    assert_eq!(
        marked(&change, &bold())[..5],
        [true, true, true, true, false]
    );
    change.toggle_mark("bold").unwrap();
    assert!(marked(&change, &bold()).iter().all(|has| !has));
}

#[test]
fn toggling_a_backward_selection_twice_restores_it() {
    let mut change = change(paragraphs(&["abcd"]), Range::new("t0", 3, "t0", 1));
    change.toggle_mark("bold").unwrap();
    assert_eq!(marked(&change, &bold()), [false, true, true, false]);
    change.toggle_mark("bold").unwrap();
    assert!(marked(&change, &bold()).iter().all(|has| !has));
}

#[test]
fn toggle_reads_marks_through_a_reselected_backward_range() {
    let mut change = change(paragraphs(&["abcd"]), Range::collapsed("t0", 0));
    change.select(Range::new("t0", 0, "t0", 4)).unwrap();
    change.add_mark("bold").unwrap();
    change.select(Range::new("t0", 4, "t0", 0)).unwrap();
    change.toggle_mark("bold").unwrap();
    assert!(marked(&change, &bold()).iter().all(|has| !has));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(proptest_config::cases()))]
    #[test]
    fn prop_mark_spans_tile_the_range(anchor in point(), focus in point()) {
        let keys = |(block, offset): (usize, usize)| (format!("t{block}"), offset);
        let (anchor_key, anchor_offset) = keys(anchor);
        let (focus_key, focus_offset) = keys(focus);
        let range = Range::new(anchor_key, anchor_offset, focus_key, focus_offset);
        let mut change = change(paragraphs(&CONTENTS), range.clone());
        change.add_mark_at_range(&range, bold(), ChangeOptions::default()).unwrap();

        let (a, b) = (global(anchor.0, anchor.1), global(focus.0, focus.1));
        let (start, end) = (a.min(b), a.max(b));
        let expected: Vec<bool> = (0..global(3, 0)).map(|i| (start..end).contains(&i)).collect();
        prop_assert_eq!(marked(&change, &bold()), expected);

        let lengths: Vec<usize> = change
            .operations()
            .iter()
            .filter_map(|operation| match operation {
                Operation::AddMark { length, .. } => Some(*length),
                _ => None,
            })
            .collect();
        prop_assert!(lengths.iter().all(|length| *length > 0));
        let covered: usize = lengths.iter().sum();
        prop_assert_eq!(covered, end - start);
    }

    #[test]
    fn prop_toggle_twice_restores_marks(
        anchor in point(),
        focus in point(),
        seeded in any::<bool>(),
    ) {
        let keys = |(block, offset): (usize, usize)| (format!("t{block}"), offset);
        let ((anchor_key, anchor_offset), (focus_key, focus_offset)) = (keys(anchor), keys(focus));
        let range = Range::new(anchor_key, anchor_offset, focus_key, focus_offset);
        let mut change = change(paragraphs(&CONTENTS), range.clone());
        if seeded {
            change.add_mark_at_range(&range, bold(), ChangeOptions::default()).unwrap();
        }
        let before = marked(&change, &bold());

        change.toggle_mark_at_range(&range, bold(), ChangeOptions::default()).unwrap();
        change.toggle_mark_at_range(&range, bold(), ChangeOptions::default()).unwrap();
        prop_assert_eq!(marked(&change, &bold()), before);
    }
}
