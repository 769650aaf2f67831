//! Benchmarks for glyph stream ingestion and layout reconstruction.
//!
//! Run with: cargo bench
//!
//! Pages are synthetic: rows of words in shuffled span order, so line and
//! paragraph joining do real work.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use glyphdocx::{ContentOptions, IngestOptions};

/// Creates a stream with `page_count` pages of 40 rows of 8 words each.
fn create_test_stream(page_count: usize) -> Vec<u8> {
    let mut content = String::from("<?xml version=\"1.0\"?>\n");
    for _ in 0..page_count {
        content.push_str("<page>\n");
        for i in 0..320usize {
            // Scatter spans across the page so joins are not in stream order.
            let k = (i * 97) % 320;
            let (row, col) = (k / 8, k % 8);
            let x = col as f32 * 60.0;
            let y = row as f32 * 12.0 + (row / 10) as f32 * 30.0;
            content.push_str(
                "<span ctm=\"1 0 0 1 0 0\" trm=\"10 0 0 10 0 0\" font_name=\"Times\" wmode=\"0\">\n",
            );
            for (j, c) in "glyphs".chars().enumerate() {
                content.push_str(&format!(
                    "<char x=\"{}\" y=\"{}\" adv=\"0.6\" ucs=\"{}\"/>\n",
                    x + 6.0 * j as f32,
                    y,
                    c as u32
                ));
            }
            content.push_str("</span>\n");
        }
        content.push_str("</page>\n");
    }
    content.into_bytes()
}

/// Benchmark tag stream ingestion.
fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for page_count in [1, 5].iter() {
        let data = create_test_stream(*page_count);

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| glyphdocx::read_bytes(black_box(&data), &IngestOptions::default()).unwrap());
        });
    }

    group.finish();
}

/// Benchmark line and paragraph joining.
fn bench_layout(c: &mut Criterion) {
    let data = create_test_stream(1);
    let doc = glyphdocx::read_bytes(&data, &IngestOptions::default()).unwrap();

    c.bench_function("join_page", |b| {
        b.iter_batched(
            || doc.clone(),
            |mut doc| glyphdocx::join_document(black_box(&mut doc)).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark content emission for a joined page.
fn bench_content(c: &mut Criterion) {
    let data = create_test_stream(1);
    let mut doc = glyphdocx::read_bytes(&data, &IngestOptions::default()).unwrap();
    glyphdocx::join_document(&mut doc).unwrap();
    let options = ContentOptions::default();

    c.bench_function("docx_content", |b| {
        b.iter(|| glyphdocx::document_to_docx_content(black_box(&doc), &options).unwrap());
    });
}

criterion_group!(benches, bench_ingest, bench_layout, bench_content);
criterion_main!(benches);
