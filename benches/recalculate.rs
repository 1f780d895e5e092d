//! Benchmarks for the synchronous recalculation path
//!
//! Every mutation runs validation plus cost evaluation inline, so this
//! is the latency an interactive editor observes per edit.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use smtree::{NodeId, Tree};

/// Path of `nodes` nodes, every third one a destination
fn chain(nodes: usize) -> (Tree, Vec<NodeId>) {
    let mut tree = Tree::new();
    let ids: Vec<NodeId> = (0..nodes)
        .map(|i| tree.add_node(i as f64, (i % 7) as f64, i % 3 == 0))
        .collect();
    for pair in ids.windows(2) {
        tree.add_link(pair[0], pair[1]);
    }
    (tree, ids)
}

fn bench_relocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("relocate");
    for &n in &[25usize, 100, 250] {
        let (mut tree, ids) = chain(n);
        let target = ids[n / 2];
        group.bench_function(format!("chain_{n}"), |b| {
            let mut offset = 0.0;
            b.iter(|| {
                offset += 0.01;
                tree.relocate_node(black_box(target), offset, 1.0);
            });
        });
    }
    group.finish();
}

fn bench_link_toggle(c: &mut Criterion) {
    let (mut tree, ids) = chain(100);
    let (a, b) = (ids[40], ids[41]);

    c.bench_function("link_toggle_chain_100", |bencher| {
        bencher.iter(|| {
            tree.remove_link(black_box(a), black_box(b));
            tree.add_link(black_box(a), black_box(b));
        });
    });
}

criterion_group!(benches, bench_relocate, bench_link_toggle);
criterion_main!(benches);
