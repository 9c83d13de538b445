//! The automaton model: initial states, an acceptance condition, and a
//! memoized transition table computed lazily from a per-state edge producer.

use crate::acceptance::Acceptance;
use crate::edge::Edge;
use crate::valuation::{alphabet, Valuation, ValuationSet};
use dashmap::DashMap;
use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// The memoized outgoing edges of one state: each distinct (target, colours)
/// pair together with the subset of the alphabet producing it, in first-seen
/// order of the alphabet enumeration.
pub type EdgeMap<S> = Vec<(Edge<S>, ValuationSet)>;

/// Cooperative cancellation flag, polled by [`Automaton::generate`] at each
/// work-item boundary. Cloning shares the underlying flag.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of eager exploration.
#[derive(Debug)]
pub enum ExploreOutcome<S> {
    /// Every reachable state is memoized. States are reported in BFS
    /// discovery order.
    Complete { states: Vec<S> },
    /// Cancellation was requested. The automaton is only partially explored
    /// and must not be used for completeness-dependent queries afterwards.
    Cancelled { states_explored: usize },
}

/// An ω-automaton over an abstract state type.
///
/// The transition table is a pure cache: each state's outgoing edges are
/// computed at most once from the edge producer by enumerating the full
/// alphabet, then retained for the automaton's lifetime. The cache is safe to
/// populate from multiple query threads sharing one logically read-only
/// automaton; a lost race simply keeps the first inserted (identical) result.
pub struct Automaton<S> {
    atomic_propositions: Vec<String>,
    initial_states: Vec<S>,
    acceptance: Acceptance,
    producer: Box<dyn Fn(&S, Valuation) -> Vec<Edge<S>> + Send + Sync>,
    cache: DashMap<S, Arc<EdgeMap<S>>>,
    partial: AtomicBool,
}

impl<S: Clone + Eq + Hash> Automaton<S> {
    /// Create an automaton from a nondeterministic edge producer. The
    /// producer must be a pure function of (state, valuation); inconsistent
    /// results between calls are a producer bug this layer does not detect.
    pub fn new(
        atomic_propositions: Vec<String>,
        initial_states: Vec<S>,
        acceptance: Acceptance,
        producer: impl Fn(&S, Valuation) -> Vec<Edge<S>> + Send + Sync + 'static,
    ) -> Self {
        debug_assert!(atomic_propositions.len() <= Valuation::MAX_PROPOSITIONS);
        Automaton {
            atomic_propositions,
            initial_states,
            acceptance,
            producer: Box::new(producer),
            cache: DashMap::new(),
            partial: AtomicBool::new(false),
        }
    }

    /// Create an automaton from a deterministic edge producer returning at
    /// most one edge per valuation.
    pub fn deterministic(
        atomic_propositions: Vec<String>,
        initial_states: Vec<S>,
        acceptance: Acceptance,
        producer: impl Fn(&S, Valuation) -> Option<Edge<S>> + Send + Sync + 'static,
    ) -> Self {
        Self::new(
            atomic_propositions,
            initial_states,
            acceptance,
            move |state, valuation| producer(state, valuation).into_iter().collect(),
        )
    }

    /// Create an automaton from an explicit edge table. Every edge is
    /// labelled with the whole alphabet; convenient for graph-shaped automata
    /// where valuations do not matter.
    pub fn from_edges(
        atomic_propositions: Vec<String>,
        initial_states: Vec<S>,
        acceptance: Acceptance,
        edges: impl IntoIterator<Item = (S, Edge<S>)>,
    ) -> Self
    where
        S: Send + Sync + 'static,
    {
        let mut table: std::collections::HashMap<S, Vec<Edge<S>>> =
            std::collections::HashMap::new();
        for (source, edge) in edges {
            table.entry(source).or_default().push(edge);
        }
        Self::new(
            atomic_propositions,
            initial_states,
            acceptance,
            move |state, _| table.get(state).cloned().unwrap_or_default(),
        )
    }

    pub fn atomic_propositions(&self) -> &[String] {
        &self.atomic_propositions
    }

    pub fn ap_count(&self) -> usize {
        self.atomic_propositions.len()
    }

    pub fn initial_states(&self) -> &[S] {
        &self.initial_states
    }

    pub fn acceptance(&self) -> &Acceptance {
        &self.acceptance
    }

    /// The memoized outgoing edge map of `state`, computed on first access by
    /// enumerating the alphabet against the edge producer and merging
    /// valuations reaching the same (target, colours) pair.
    ///
    /// Concurrent first accesses may compute redundantly; the cache keeps
    /// whichever entry lands first, and recomputation is idempotent because
    /// the producer is pure.
    pub fn successors(&self, state: &S) -> Arc<EdgeMap<S>> {
        if let Some(hit) = self.cache.get(state) {
            return Arc::clone(hit.value());
        }

        let computed = Arc::new(self.compute_edge_map(state));

        match self.cache.entry(state.clone()) {
            dashmap::mapref::entry::Entry::Occupied(occupied) => Arc::clone(occupied.get()),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(Arc::clone(&computed));
                computed
            }
        }
    }

    fn compute_edge_map(&self, state: &S) -> EdgeMap<S> {
        let mut edge_map: EdgeMap<S> = Vec::new();

        for valuation in alphabet(self.ap_count()) {
            for edge in (self.producer)(state, valuation) {
                self.acceptance.debug_assert_edge_colours(edge.colours());

                // Edges per state are few; linear merge keeps first-seen order.
                match edge_map.iter_mut().find(|(known, _)| *known == edge) {
                    Some((_, valuations)) => valuations.push(valuation),
                    None => {
                        let mut valuations = ValuationSet::new();
                        valuations.push(valuation);
                        edge_map.push((edge, valuations));
                    }
                }
            }
        }

        edge_map
    }

    /// All outgoing edges of `state`, in first-seen order.
    pub fn edges(&self, state: &S) -> Vec<Edge<S>> {
        self.successors(state)
            .iter()
            .map(|(edge, _)| edge.clone())
            .collect()
    }

    /// The outgoing edges of `state` under one concrete valuation.
    pub fn edges_at(&self, state: &S, valuation: Valuation) -> Vec<Edge<S>> {
        self.successors(state)
            .iter()
            .filter(|(_, valuations)| valuations.contains(valuation))
            .map(|(edge, _)| edge.clone())
            .collect()
    }

    /// The first edge of `state` under `valuation`, if any.
    pub fn edge(&self, state: &S, valuation: Valuation) -> Option<Edge<S>> {
        self.successors(state)
            .iter()
            .find(|(_, valuations)| valuations.contains(valuation))
            .map(|(edge, _)| edge.clone())
    }

    /// Deterministic projection of [`Automaton::edge`] to the target state.
    pub fn successor(&self, state: &S, valuation: Valuation) -> Option<S> {
        self.edge(state, valuation).map(Edge::into_successor)
    }

    /// Distinct successor states of `state`, in first-seen order.
    pub fn successor_states(&self, state: &S) -> Vec<S> {
        let mut out: Vec<S> = Vec::new();
        for (edge, _) in self.successors(state).iter() {
            if !out.contains(edge.successor()) {
                out.push(edge.successor().clone());
            }
        }
        out
    }

    /// Eagerly explore and memoize the fragment reachable from the initial
    /// states, breadth-first with an explicit worklist. The cancellation flag
    /// is polled once per dequeued state, never mid-state.
    pub fn generate(&self, cancel: &CancelFlag) -> ExploreOutcome<S> {
        let mut seen: HashSet<S> = self.initial_states.iter().cloned().collect();
        let mut queue: VecDeque<S> = self.initial_states.iter().cloned().collect();
        let mut discovered: Vec<S> = Vec::new();

        // Initial states may repeat; keep discovery order without duplicates.
        for state in &self.initial_states {
            if !discovered.contains(state) {
                discovered.push(state.clone());
            }
        }

        while let Some(state) = queue.pop_front() {
            if cancel.is_cancelled() {
                self.partial.store(true, Ordering::Relaxed);
                debug!(
                    states_explored = discovered.len(),
                    "exploration cancelled, automaton left partially explored"
                );
                return ExploreOutcome::Cancelled {
                    states_explored: discovered.len(),
                };
            }

            for (edge, _) in self.successors(&state).iter() {
                if seen.insert(edge.successor().clone()) {
                    discovered.push(edge.successor().clone());
                    queue.push_back(edge.successor().clone());
                }
            }
        }

        debug!(states = discovered.len(), "exploration complete");
        ExploreOutcome::Complete { states: discovered }
    }

    /// Whether a previous `generate` was cancelled mid-exploration. A
    /// partially explored automaton must not be queried for
    /// completeness-dependent results.
    pub fn is_partially_explored(&self) -> bool {
        self.partial.load(Ordering::Relaxed)
    }

    /// Number of states whose edges have been memoized so far.
    pub fn memoized_states(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::ColourSet;
    use std::sync::atomic::AtomicUsize;

    fn two_cycle() -> Automaton<u32> {
        // s0 -> s1 (no colours), s1 -> s0 carrying colour 0.
        Automaton::from_edges(
            vec![],
            vec![0],
            Acceptance::buchi(),
            vec![(0, Edge::plain(1)), (1, Edge::with_colour(0, 0))],
        )
    }

    #[test]
    fn test_successors_memoized() {
        let automaton = two_cycle();
        let first = automaton.successors(&0);
        let second = automaton.successors(&0);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(automaton.memoized_states(), 1);
    }

    #[test]
    fn test_producer_called_once_per_state() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let automaton = Automaton::deterministic(
            vec!["a".to_string()],
            vec![0u32],
            Acceptance::All,
            move |state, _| {
                counted.fetch_add(1, Ordering::Relaxed);
                Some(Edge::plain(*state))
            },
        );

        automaton.successors(&0);
        automaton.successors(&0);
        automaton.successors(&0);
        // One call per valuation of the 1-proposition alphabet, not per query.
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_valuation_merging() {
        // Both valuations of a 1-proposition alphabet produce the same edge;
        // the memoized map must merge them into one entry.
        let automaton = Automaton::deterministic(
            vec!["a".to_string()],
            vec![0u32],
            Acceptance::All,
            |_, _| Some(Edge::plain(1u32)),
        );

        let edge_map = automaton.successors(&0);
        assert_eq!(edge_map.len(), 1);
        assert_eq!(edge_map[0].1.len(), 2);
    }

    #[test]
    fn test_edges_at_splits_on_valuation() {
        // Proposition 0 selects between two targets.
        let automaton = Automaton::deterministic(
            vec!["a".to_string()],
            vec![0u32],
            Acceptance::All,
            |_, valuation| {
                Some(if valuation.contains(0) {
                    Edge::plain(1u32)
                } else {
                    Edge::plain(2u32)
                })
            },
        );

        let on = Valuation::empty().with(0);
        assert_eq!(automaton.edges_at(&0, on), vec![Edge::plain(1)]);
        assert_eq!(automaton.edges_at(&0, Valuation::empty()), vec![Edge::plain(2)]);
        assert_eq!(automaton.successor(&0, on), Some(1));
        assert_eq!(automaton.edges(&0).len(), 2);
    }

    #[test]
    fn test_generate_complete() {
        let automaton = two_cycle();
        match automaton.generate(&CancelFlag::new()) {
            ExploreOutcome::Complete { states } => assert_eq!(states, vec![0, 1]),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!automaton.is_partially_explored());
        assert_eq!(automaton.memoized_states(), 2);
    }

    #[test]
    fn test_generate_cancelled() {
        let automaton = two_cycle();
        let cancel = CancelFlag::new();
        cancel.cancel();
        match automaton.generate(&cancel) {
            ExploreOutcome::Cancelled { states_explored } => assert_eq!(states_explored, 1),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(automaton.is_partially_explored());
    }

    #[test]
    fn test_nondeterministic_edges() {
        let automaton = Automaton::new(vec![], vec![0u32], Acceptance::buchi(), |state, _| {
            if *state == 0 {
                vec![Edge::plain(1), Edge::with_colour(2, 0)]
            } else {
                vec![]
            }
        });
        assert_eq!(automaton.successor_states(&0), vec![1, 2]);
        assert!(automaton.successor_states(&1).is_empty());
    }

    #[test]
    fn test_concurrent_memoization() {
        use std::thread;

        let automaton = Arc::new(Automaton::from_edges(
            vec![],
            vec![0u32],
            Acceptance::All,
            (0u32..64).map(|i| (i, Edge::plain((i + 1) % 64))),
        ));

        let mut handles = vec![];
        for _ in 0..4 {
            let automaton = Arc::clone(&automaton);
            handles.push(thread::spawn(move || {
                for state in 0u32..64 {
                    assert_eq!(automaton.successor_states(&state), vec![(state + 1) % 64]);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(automaton.memoized_states(), 64);
    }

    #[test]
    fn test_colour_set_roundtrip_through_edge_map() {
        let colours: ColourSet = [1, 0].into_iter().collect();
        let automaton = Automaton::from_edges(
            vec![],
            vec![0u32],
            Acceptance::GeneralizedBuchi { sets: 2 },
            vec![(0u32, Edge::new(0, colours.clone()))],
        );
        let edges = automaton.edges(&0);
        assert_eq!(edges.len(), 1);
        assert_eq!(*edges[0].colours(), colours);
    }
}
