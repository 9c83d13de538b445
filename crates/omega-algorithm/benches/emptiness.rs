//! Criterion benchmarks for SCC decomposition and emptiness checking.
//!
//! Run with: cargo bench -p omega-algorithm

use criterion::{criterion_group, criterion_main, Criterion};
use omega_algorithm::{emptiness, SccDecomposition};
use omega_automaton::{Acceptance, Automaton, Edge};

/// A ring of `cliques` fully connected clusters of `width` states each, with
/// one bridge edge between consecutive clusters. One large SCC, dense inside.
fn ring_of_cliques(cliques: u32, width: u32, acceptance: Acceptance) -> Automaton<u32> {
    let mut edges: Vec<(u32, Edge<u32>)> = Vec::new();
    for clique in 0..cliques {
        let base = clique * width;
        for i in 0..width {
            for j in 0..width {
                if i != j {
                    edges.push((base + i, Edge::plain(base + j)));
                }
            }
        }
        let next = ((clique + 1) % cliques) * width;
        edges.push((base, Edge::plain(next)));
    }
    Automaton::from_edges(vec![], vec![0], acceptance, edges)
}

/// A long cycle whose closing edge carries the single Büchi colour.
fn marked_cycle(length: u32) -> Automaton<u32> {
    let mut edges: Vec<(u32, Edge<u32>)> =
        (0..length - 1).map(|i| (i, Edge::plain(i + 1))).collect();
    edges.push((length - 1, Edge::with_colour(0, 0)));
    Automaton::from_edges(vec![], vec![0], Acceptance::buchi(), edges)
}

fn bench_scc_decomposition(c: &mut Criterion) {
    let automaton = ring_of_cliques(64, 16, Acceptance::All);
    // Warm the memo table once so the benchmark measures the algorithm.
    automaton.generate(&omega_automaton::CancelFlag::new());

    c.bench_function("scc_ring_of_cliques", |b| {
        b.iter(|| {
            let decomposition = SccDecomposition::of_automaton(&automaton);
            assert_eq!(decomposition.sccs().len(), 1);
        })
    });
}

fn bench_buchi_scc(c: &mut Criterion) {
    let automaton = ring_of_cliques(64, 16, Acceptance::buchi());
    automaton.generate(&omega_automaton::CancelFlag::new());

    c.bench_function("emptiness_buchi_scc_ring", |b| {
        b.iter(|| assert_eq!(emptiness::is_empty(&automaton), Ok(true)))
    });
}

fn bench_buchi_lasso(c: &mut Criterion) {
    let automaton = marked_cycle(100_000);
    automaton.generate(&omega_automaton::CancelFlag::new());

    c.bench_function("emptiness_buchi_lasso_cycle", |b| {
        b.iter(|| assert!(emptiness::buchi::contains_accepting_lasso(&automaton, &[0])))
    });
}

criterion_group!(
    benches,
    bench_scc_decomposition,
    bench_buchi_scc,
    bench_buchi_lasso
);
criterion_main!(benches);
