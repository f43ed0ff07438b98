//! Benchmarks for ragpack export performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks export synthetic element sequences of various sizes.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ragpack::model::Element;
use ragpack::render::{self, MarkdownOptions, RagGrouping, RagOptions};
use ragpack::{ChunkOptions, CleanOptions, PackageOptions};

/// Creates a synthetic document with the given number of pages.
fn create_test_elements(page_count: u32) -> Vec<Element> {
    let payload = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";
    let mut elements = Vec::new();

    for page in 1..=page_count {
        elements.push(Element::title(format!("Section {}", page)).with_page(page).with_depth(0));
        for paragraph in 0..8 {
            elements.push(
                Element::narrative(format!(
                    "Page {} paragraph {}: benchmark content for ragpack export measurement.\nIt wraps over two lines.",
                    page, paragraph
                ))
                .with_page(page),
            );
        }
        elements.push(Element::list_item("A bullet point").with_page(page));
        elements.push(
            Element::table("a b\nc d", Some("<table><tr><td>a</td><td>b</td></tr></table>"))
                .with_page(page),
        );
        elements.push(Element::image(format!("Figure {}", page), payload, "image/png").with_page(page));
        elements.push(Element::page_break());
    }

    elements
}

/// Benchmark the text renderers.
fn bench_renderers(c: &mut Criterion) {
    let elements = create_test_elements(20);

    c.bench_function("to_markdown_20_pages", |b| {
        b.iter(|| render::to_markdown(black_box(&elements), &MarkdownOptions::with_images()));
    });

    c.bench_function("to_json_20_pages", |b| {
        b.iter(|| render::to_json(black_box(&elements), render::JsonFormat::Compact).unwrap());
    });
}

/// Benchmark RAG export at various sizes.
fn bench_rag_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("rag_export");

    for page_count in [1, 10, 50].iter() {
        let elements = create_test_elements(*page_count);

        group.bench_function(format!("{}_pages_element", page_count), |b| {
            let options = RagOptions::new("bench.pdf");
            b.iter(|| render::to_rag(black_box(&elements), &options).unwrap());
        });

        group.bench_function(format!("{}_pages_page", page_count), |b| {
            let options = RagOptions::new("bench.pdf").with_grouping(RagGrouping::Page);
            b.iter(|| render::to_rag(black_box(&elements), &options).unwrap());
        });
    }

    group.finish();
}

/// Benchmark cleaning, chunking and packaging.
fn bench_pipeline(c: &mut Criterion) {
    let elements = create_test_elements(10);

    c.bench_function("clean_10_pages", |b| {
        b.iter(|| ragpack::clean_elements(black_box(&elements), &CleanOptions::default()));
    });

    c.bench_function("chunk_10_pages", |b| {
        b.iter(|| ragpack::chunk_elements(black_box(&elements), &ChunkOptions::default()).unwrap());
    });

    c.bench_function("import_package_10_pages", |b| {
        let options = PackageOptions::new("bench.pdf");
        b.iter(|| ragpack::export_import_package(black_box(&elements), &options));
    });
}

criterion_group!(benches, bench_renderers, bench_rag_export, bench_pipeline);
criterion_main!(benches);
