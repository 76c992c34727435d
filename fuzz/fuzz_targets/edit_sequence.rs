#![no_main]

use libfuzzer_sys::fuzz_target;
use richtext_core::{
    Block, Change, CounterKeyGenerator, Document, Inline, MarksInput, Node, Range, Text, Value,
};

fn seed() -> Document {
    Document::new(
        "doc",
        vec![
            Block::new("p0", "paragraph", vec![Text::new("t0", "hello").into()]).into(),
            Block::new(
                "p1",
                "paragraph",
                vec![
                    Text::new("a", "x").into(),
                    Inline::new("l", "link", vec![Text::new("lt", "link").into()]).into(),
                    Text::new("b", "y").into(),
                ],
            )
            .into(),
            Block::new("img", "image", vec![Text::empty("it").into()])
                .with_void(true)
                .into(),
        ],
    )
}

fn point(change: &Change, index: u8, offset: u8) -> (String, usize) {
    let document = change.document();
    let texts = document.get_texts();
    let text = texts[index as usize % texts.len()];
    (text.key().to_string(), offset as usize % (text.len() + 1))
}

fn has_text(node: &Node) -> bool {
    node.is_text() || (node.get_first_text().is_some() && node.nodes().iter().all(has_text))
}

fuzz_target!(|data: &[u8]| {
    let mut change = Change::new(Value::new(seed()).with_selection(Range::collapsed("t0", 0)))
        .with_key_generator(CounterKeyGenerator::starting_at(1));
    for chunk in data.chunks(3) {
        let [op, x, y] = *chunk else {
            break;
        };
        if change.selection().is_none() {
            let (key, _) = point(&change, 0, 0);
            let _ = change.select(Range::collapsed(key, 0));
        }
        let result = match op % 12 {
            0 => {
                let (anchor_key, anchor_offset) = point(&change, x, y);
                let (focus_key, focus_offset) = point(&change, y, x);
                change.select(Range::new(anchor_key, anchor_offset, focus_key, focus_offset))
            }
            1 => change.insert_text("ab", MarksInput::Null),
            2 => change.delete(),
            3 => change.delete_backward(1 + x as usize % 4),
            4 => change.delete_forward(1 + x as usize % 4),
            5 => change.split_block(1 + x as usize % 3),
            6 => change.split_inline(1),
            7 => change.insert_block("paragraph"),
            8 => change.wrap_inline("link"),
            9 => change.unwrap_inline("link"),
            10 => change.wrap_block("quote"),
            _ => change.toggle_mark("bold"),
        };
        if result.is_err() {
            break;
        }
        assert!(has_text(&change.document()));
    }
});
