#![no_main]

use libfuzzer_sys::fuzz_target;
use richtext_core::normalize;
use richtext_core::{Block, Change, CounterKeyGenerator, Document, Range, Text, Value};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let mut keys = CounterKeyGenerator::starting_at(1);
    let Ok(fragment) = normalize::fragment(&json, &mut keys) else {
        return;
    };
    let document = Document::new(
        "doc",
        vec![Block::new("p0", "paragraph", vec![Text::new("t0", "abcd").into()]).into()],
    );
    let mut change = Change::new(Value::new(document).with_selection(Range::collapsed("t0", 2)))
        .with_key_generator(keys);
    let _ = change.insert_fragment(fragment);
});
