//! Benchmarks for Markdown rendering.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use docgen_bundler::LinkError;
use docgen_site::render_markdown;

/// Create a document of `sections` sections, each with a paragraph, a list,
/// a table and a few links.
fn create_document(sections: usize) -> String {
    let mut doc = String::from("# Guide\n\n");
    for i in 0..sections {
        doc.push_str(&format!(
            "## Section {i}\n\n\
             Some *emphasis*, `code` and a [link](../other-{i}.md#top).\n\n\
             - item one\n- item [two](https://example.com/{i})\n- ![image](img/{i}.png)\n\n\
             | a | b |\n|---|---|\n| {i} | {i} |\n\n"
        ));
    }
    doc
}

fn rewrite(link: &str) -> Result<String, LinkError> {
    Ok(format!("https://example.com/v1/{link}"))
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_markdown");

    for sections in [10, 100] {
        let doc = create_document(sections);
        group.bench_with_input(BenchmarkId::from_parameter(sections), &doc, |b, doc| {
            b.iter(|| render_markdown(doc, rewrite));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
