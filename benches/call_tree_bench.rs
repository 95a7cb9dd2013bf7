/// Benchmarks for the probegraph call-tree walk and type resolver.
///
/// Run with: `cargo bench`
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use probegraph::domain::builder::GraphBuilder;
use probegraph::domain::call_tree::{walk_frames, CallFrame};
use probegraph::domain::graph::Relation;
use probegraph::domain::resolver::{IdentifierContext, TypeResolver};

// ═══════════════════════════════════════════════════════════════════════════
// Synthetic Data Generators
// ═══════════════════════════════════════════════════════════════════════════

/// A call tree that descends `depth` levels and then unwinds, repeated
/// `repeats` times, so the same edges recur and get counted.
fn synthetic_frames(repeats: usize, depth: usize) -> Vec<CallFrame> {
    let mut frames = Vec::with_capacity(repeats * depth);
    for _ in 0..repeats {
        for level in 0..depth {
            let name = format!("org.acme.layer{level}.Service{level}.handle(org.acme.Request)");
            frames.push(CallFrame::new(level, name.clone(), name));
        }
    }
    frames
}

fn synthetic_labels(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("org.acme.mod{}.Controller{i}.action (Owner, String[], int, Model)", i % 7))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Benchmarks
// ═══════════════════════════════════════════════════════════════════════════

fn bench_call_tree_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("call_tree/walk");

    for repeats in [10, 100, 1000].iter() {
        let frames = synthetic_frames(*repeats, 12);
        group.throughput(Throughput::Elements(frames.len() as u64));

        group.bench_with_input(BenchmarkId::new("repeats", repeats), &frames, |b, frames| {
            b.iter(|| {
                let mut graph = GraphBuilder::new("DynamiCall");
                walk_frames(black_box(frames.clone()), Relation::DynamicCall, &mut graph);
                graph.finish()
            })
        });
    }

    group.finish();
}

fn bench_signature_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver/qualify_signature");
    let resolver = TypeResolver::default();

    for count in [100, 1000].iter() {
        let labels = synthetic_labels(*count);
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("labels", count), &labels, |b, labels| {
            b.iter(|| {
                for label in labels {
                    let member = label.split('(').next().unwrap_or(label).trim();
                    let ctx = IdentifierContext::default().with_enclosing(member);
                    black_box(resolver.qualify_signature(label, &ctx));
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_call_tree_walk, bench_signature_resolution);
criterion_main!(benches);
