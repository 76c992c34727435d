use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use richtext_core::{
    Block, Change, CounterKeyGenerator, Document, MarksInput, Range, Text, Value,
};

fn document(blocks: usize) -> Document {
    let nodes = (0..blocks)
        .map(|i| {
            Block::new(
                format!("p{i}"),
                "paragraph",
                vec![Text::new(format!("t{i}"), "The quick brown fox jumps over the lazy dog").into()],
            )
            .into()
        })
        .collect();
    Document::new("doc", nodes)
}

fn change(document: &Document, selection: Range) -> Change {
    Change::new(Value::new(document.clone()).with_selection(selection))
        .with_key_generator(CounterKeyGenerator::starting_at(1_000_000))
}

fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("typing");
    for blocks in [10, 100, 1000] {
        let document = document(blocks);
        let middle = format!("t{}", blocks / 2);
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &blocks, |b, _| {
            b.iter(|| {
                let mut change = change(&document, Range::collapsed(middle.as_str(), 4));
                for _ in 0..20 {
                    let _ = change.insert_text("x", MarksInput::Null);
                }
                black_box(change.value());
            })
        });
    }
    group.finish();
}

fn bench_range_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_delete");
    for blocks in [10, 100, 1000] {
        let document = document(blocks);
        let last = format!("t{}", blocks - 1);
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &blocks, |b, _| {
            b.iter(|| {
                let mut change = change(&document, Range::new("t0", 4, last.as_str(), 10));
                let _ = change.delete();
                black_box(change.value());
            })
        });
    }
    group.finish();
}

fn bench_toggle_mark(c: &mut Criterion) {
    let document = document(100);
    c.bench_function("toggle_mark", |b| {
        b.iter(|| {
            let mut change = change(&document, Range::new("t10", 0, "t90", 5));
            let _ = change.toggle_mark("bold");
            black_box(change.value());
        })
    });
}

criterion_group!(benches, bench_typing, bench_range_delete, bench_toggle_mark);
criterion_main!(benches);
