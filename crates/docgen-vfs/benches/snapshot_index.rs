//! Benchmarks for snapshot index construction and lookup.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use docgen_vfs::{MemoryTree, SnapshotIndex, SnapshotTree};

/// Create a tree with `breadth` sections of `breadth` pages, `depth` levels deep.
fn create_tree(depth: usize, breadth: usize) -> MemoryTree {
    fn add_level(tree: MemoryTree, dir: &str, current: usize, max: usize, breadth: usize) -> MemoryTree {
        let mut tree = tree;
        for i in 0..breadth {
            tree = tree.with_file(format!("{dir}/page-{i}.md"), format!("# Page {i}"));
        }
        if current == max {
            return tree;
        }
        for i in 0..breadth {
            tree = add_level(tree, &format!("{dir}/section-{i}"), current + 1, max, breadth);
        }
        tree
    }

    add_level(MemoryTree::new(), "docs", 0, depth, breadth)
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_index_build");

    for (depth, breadth) in [(2, 5), (3, 8)] {
        let tree: Arc<dyn SnapshotTree> = Arc::new(create_tree(depth, breadth));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{depth}x{breadth}")),
            &tree,
            |b, tree| b.iter(|| SnapshotIndex::build(Arc::clone(tree)).unwrap()),
        );
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let index = Arc::new(SnapshotIndex::build(Arc::new(create_tree(3, 8))).unwrap());

    let mut group = c.benchmark_group("snapshot_index_lookup");

    group.bench_function("stat_hit", |b| {
        b.iter(|| index.stat("docs/section-3/section-4/page-5.md").unwrap())
    });

    group.bench_function("stat_miss", |b| {
        b.iter(|| index.stat("docs/section-3/missing.md").is_err())
    });

    group.bench_function("read_dir_section", |b| {
        b.iter(|| index.read_dir("docs/section-3").unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_lookup);
criterion_main!(benches);
