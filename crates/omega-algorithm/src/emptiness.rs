//! Language emptiness of ω-automata.
//!
//! Dispatch is an exhaustive match on the acceptance condition. Two families
//! of strategies exist: an accepting-lasso search (a nested depth-first
//! search, here with explicit work stacks instead of call-stack recursion)
//! and SCC-based scans built on [`crate::scc::SccDecomposition`]. Each
//! acceptance kind has a default strategy; the alternates stay public so the
//! two can be cross-checked against each other.

use crate::scc::{Scc, SccDecomposition};
use ahash::AHashSet;
use omega_automaton::{
    Acceptance, Automaton, ColourSet, Edge, EdgeMap, GeneralizedRabinPair, ParityKind, RabinPair,
};
use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmptinessError {
    /// Max-parity has no implemented strategy; callers convert to a
    /// min-parity condition first.
    #[error("max-parity acceptance is not supported")]
    MaxParity,
}

/// Whether the automaton's language is empty: no initial state has a
/// reachable accepting infinite run.
pub fn is_empty<S: Clone + Eq + Hash>(automaton: &Automaton<S>) -> Result<bool, EmptinessError> {
    is_empty_from(automaton, automaton.initial_states())
}

/// [`is_empty`] restricted to an explicit set of start states.
pub fn is_empty_from<S: Clone + Eq + Hash>(
    automaton: &Automaton<S>,
    roots: &[S],
) -> Result<bool, EmptinessError> {
    let empty = match automaton.acceptance() {
        Acceptance::All => {
            // Every run accepts, so any reachable cycle witnesses a word.
            !has_accepting_lasso(automaton, roots, InfFilter::Any, FinFilter::None)
        }
        Acceptance::GeneralizedBuchi { sets } => {
            !buchi::contains_accepting_scc(automaton, roots, *sets)
        }
        Acceptance::Parity { kind, sets } => {
            if !kind.is_min() {
                return Err(EmptinessError::MaxParity);
            }
            !parity::contains_accepting_lasso(automaton, roots, *kind, *sets)
        }
        Acceptance::Rabin { pairs } => {
            let pairs: Vec<GeneralizedRabinPair> = pairs.iter().map(Into::into).collect();
            !rabin::contains_accepting_scc(automaton, roots, &pairs)
        }
        Acceptance::GeneralizedRabin { pairs } => {
            !rabin::contains_accepting_scc(automaton, roots, pairs)
        }
    };

    trace!(empty, "language emptiness decided");
    Ok(empty)
}

/// Requirement for an edge to switch the lasso search into accepting mode.
#[derive(Clone, Copy, Debug)]
enum InfFilter {
    /// Any edge qualifies.
    Any,
    /// The edge must carry this colour.
    Colour(u32),
}

impl InfFilter {
    fn satisfied(self, colours: &ColourSet) -> bool {
        match self {
            InfFilter::Any => true,
            InfFilter::Colour(colour) => colours.contains(colour),
        }
    }
}

/// Edges the lasso's cycle must avoid.
#[derive(Clone, Copy, Debug)]
enum FinFilter {
    None,
    /// Rabin: the edge carries the pair's Fin colour.
    Colour(u32),
    /// Parity: the edge's priority (smallest colour) is at most the
    /// threshold. Colourless edges are never excluded.
    Below(i64),
}

impl FinFilter {
    fn excludes(self, colours: &ColourSet) -> bool {
        match self {
            FinFilter::None => false,
            FinFilter::Colour(colour) => colours.contains(colour),
            FinFilter::Below(threshold) => colours
                .smallest()
                .is_some_and(|priority| i64::from(priority) <= threshold),
        }
    }
}

/// Nested depth-first accepting-lasso search, one fresh search per root.
fn has_accepting_lasso<S: Clone + Eq + Hash>(
    automaton: &Automaton<S>,
    roots: &[S],
    inf: InfFilter,
    fin: FinFilter,
) -> bool {
    roots
        .iter()
        .any(|root| LassoSearch::new(automaton, inf, fin).run(root))
}

struct Dfs1Frame<S> {
    state: S,
    accepting: bool,
    edges: Arc<EdgeMap<S>>,
    cursor: usize,
}

struct LassoSearch<'a, S> {
    automaton: &'a Automaton<S>,
    inf: InfFilter,
    fin: FinFilter,
    /// States expanded before any accepting edge was crossed.
    visited: AHashSet<S>,
    /// States expanded after crossing an accepting edge. A state may appear
    /// in both sets; the two modes explore independently.
    visited_accepting: AHashSet<S>,
}

impl<'a, S: Clone + Eq + Hash> LassoSearch<'a, S> {
    fn new(automaton: &'a Automaton<S>, inf: InfFilter, fin: FinFilter) -> Self {
        LassoSearch {
            automaton,
            inf,
            fin,
            visited: AHashSet::new(),
            visited_accepting: AHashSet::new(),
        }
    }

    fn edge_accepts(&self, colours: &ColourSet) -> bool {
        self.inf.satisfied(colours) && !self.fin.excludes(colours)
    }

    /// The root itself is never marked visited; only its successors seed the
    /// outer search, so a cycle back through the root is found by the inner
    /// search like any other.
    fn run(mut self, root: &S) -> bool {
        let edges = self.automaton.successors(root);
        for (edge, _) in edges.iter() {
            let accepting = self.edge_accepts(edge.colours());
            let already = if accepting {
                self.visited_accepting.contains(edge.successor())
            } else {
                self.visited.contains(edge.successor())
            };
            if !already && self.dfs1(edge.successor().clone(), accepting) {
                return true;
            }
        }
        false
    }

    /// Outer search. Iterative postorder: when an accepting-mode frame has
    /// exhausted its edges, its state seeds the inner cycle search.
    fn dfs1(&mut self, state: S, accepting: bool) -> bool {
        self.mark(state.clone(), accepting);
        let mut stack = vec![Dfs1Frame {
            edges: self.automaton.successors(&state),
            state,
            accepting,
            cursor: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let Some((edge, _)) = frame.edges.get(frame.cursor) else {
                let finished = stack.pop().expect("work stack underflow");
                if finished.accepting && self.dfs2(&finished.state) {
                    return true;
                }
                continue;
            };
            let edge = edge.clone();
            frame.cursor += 1;

            let successor_accepting = self.edge_accepts(edge.colours());
            let already = if successor_accepting {
                self.visited_accepting.contains(edge.successor())
            } else {
                self.visited.contains(edge.successor())
            };
            if !already {
                let successor = edge.into_successor();
                self.mark(successor.clone(), successor_accepting);
                stack.push(Dfs1Frame {
                    edges: self.automaton.successors(&successor),
                    state: successor,
                    accepting: successor_accepting,
                    cursor: 0,
                });
            }
        }

        false
    }

    /// Inner search: from `seed` (reached in accepting mode), find a cycle
    /// back to `seed` using only edges the Fin filter permits. The closing
    /// edge must additionally satisfy the Inf requirement.
    fn dfs2(&self, seed: &S) -> bool {
        let mut visited: AHashSet<S> = AHashSet::new();
        visited.insert(seed.clone());
        let mut stack: Vec<(Arc<EdgeMap<S>>, usize)> = vec![(self.automaton.successors(seed), 0)];

        while let Some((edges, cursor)) = stack.last_mut() {
            let Some((edge, _)) = edges.get(*cursor) else {
                stack.pop();
                continue;
            };
            let edge: Edge<S> = edge.clone();
            *cursor += 1;

            if self.fin.excludes(edge.colours()) {
                continue;
            }
            if self.inf.satisfied(edge.colours()) && edge.successor() == seed {
                return true;
            }
            if visited.insert(edge.successor().clone()) {
                stack.push((self.automaton.successors(edge.successor()), 0));
            }
        }

        false
    }

    fn mark(&mut self, state: S, accepting: bool) {
        if accepting {
            self.visited_accepting.insert(state);
        } else {
            self.visited.insert(state);
        }
    }
}

fn edge_priority(colours: &ColourSet) -> i64 {
    colours.smallest().map_or(i64::MAX, i64::from)
}

pub mod buchi {
    //! Generalized Büchi: an SCC accepts iff its internal edges collectively
    //! cover every Inf set.

    use super::*;

    /// SCC-based check: any reachable SCC whose internal edges clear the
    /// awaited colour set witnesses non-emptiness. Every internal edge of an
    /// SCC lies on a cycle through all its states, so covering edges need not
    /// share one cycle.
    pub fn contains_accepting_scc<S: Clone + Eq + Hash>(
        automaton: &Automaton<S>,
        roots: &[S],
        sets: u32,
    ) -> bool {
        let decomposition =
            SccDecomposition::of(roots.to_vec(), |state: &S| automaton.successor_states(state));
        decomposition.any_match(|scc| {
            let mut awaited: AHashSet<u32> = (0..sets).collect();
            for state in scc.iter() {
                for (edge, _) in automaton.successors(state).iter() {
                    if !scc.contains(edge.successor()) {
                        continue;
                    }
                    for colour in edge.colours().iter() {
                        awaited.remove(&colour);
                    }
                    // With zero Inf sets any internal edge accepts.
                    if awaited.is_empty() {
                        return true;
                    }
                }
            }
            false
        })
    }

    /// Lasso-based check for plain Büchi (a single Inf set).
    pub fn contains_accepting_lasso<S: Clone + Eq + Hash>(
        automaton: &Automaton<S>,
        roots: &[S],
    ) -> bool {
        has_accepting_lasso(automaton, roots, InfFilter::Colour(0), FinFilter::None)
    }
}

pub mod parity {
    //! Min-parity: a cycle accepts iff its minimal priority has the
    //! designated parity.

    use super::*;

    /// Lasso-based check: one lasso search per candidate accepting priority,
    /// requiring that priority on the closing edge and excluding every edge
    /// with a smaller one from the cycle.
    pub fn contains_accepting_lasso<S: Clone + Eq + Hash>(
        automaton: &Automaton<S>,
        roots: &[S],
        kind: ParityKind,
        sets: u32,
    ) -> bool {
        debug_assert!(kind.is_min());
        let sets = i64::from(sets);

        if kind.is_even() {
            let mut inf = 0;
            while inf < sets {
                let fin = inf - 1;
                let required = InfFilter::Colour(inf as u32);
                if has_accepting_lasso(automaton, roots, required, FinFilter::Below(fin)) {
                    return true;
                }
                // Highest even priority: also accept cycles avoiding every
                // priority (colourless cycles rank below all odd colours).
                if sets - inf == 2
                    && has_accepting_lasso(automaton, roots, InfFilter::Any, FinFilter::Below(fin + 2))
                {
                    return true;
                }
                inf += 2;
            }
        } else {
            let mut fin = 0;
            while fin < sets {
                let required = if sets - fin >= 2 {
                    InfFilter::Colour((fin + 1) as u32)
                } else {
                    InfFilter::Any
                };
                if has_accepting_lasso(automaton, roots, required, FinFilter::Below(fin)) {
                    return true;
                }
                fin += 2;
            }
        }

        false
    }

    /// SCC-refinement sweep: repeatedly drop the edges at or below the
    /// minimal rejecting priority seen so far and refine the SCC, until a
    /// sub-SCC's minimal internal priority is accepting or no priorities
    /// remain. Terminates because the minimal priority strictly increases.
    pub fn contains_accepting_scc<S: Clone + Eq + Hash>(
        automaton: &Automaton<S>,
        roots: &[S],
        kind: ParityKind,
        sets: u32,
    ) -> bool {
        debug_assert!(kind.is_min());
        let _ = sets;

        let initial_priority: i64 = if kind.is_even() { 0 } else { 1 };
        let mut queue: VecDeque<(Scc<S>, i64)> = VecDeque::new();

        let decomposition =
            SccDecomposition::of(roots.to_vec(), |state: &S| automaton.successor_states(state));
        for scc in decomposition.sccs() {
            queue.push_back((scc.clone(), initial_priority - 1));
        }

        while let Some((scc, minimal_priority)) = queue.pop_front() {
            debug_assert!(!kind.accepts_min(minimal_priority));

            let sub_sccs: Vec<Scc<S>> = if minimal_priority == -1 {
                // Nothing filtered yet, the SCC is its own refinement.
                vec![scc]
            } else {
                // An accepting cycle in this SCC cannot touch any priority at
                // or below the threshold, so those edges can be dropped
                // before refining.
                let filtered = SccDecomposition::of(scc.states().to_vec(), |state: &S| {
                    automaton
                        .successors(state)
                        .iter()
                        .filter(|(edge, _)| {
                            scc.contains(edge.successor())
                                && edge_priority(edge.colours()) > minimal_priority
                        })
                        .map(|(edge, _)| edge.successor().clone())
                        .collect()
                });
                filtered.sccs().to_vec()
            };

            for sub_scc in sub_sccs {
                let mut min = i64::MAX;

                for state in sub_scc.iter() {
                    for (edge, _) in automaton.successors(state).iter() {
                        // The scan covers the filtered subgraph: a parallel
                        // edge at or below the threshold is not part of this
                        // sub-SCC's cycles, and counting it would keep the
                        // minimum from increasing.
                        if !sub_scc.contains(edge.successor())
                            || edge_priority(edge.colours()) <= minimal_priority
                        {
                            continue;
                        }
                        min = min.min(edge_priority(edge.colours()));
                    }
                    if min == minimal_priority + 1 {
                        // The smallest unfiltered priority, accepting by the
                        // parity alternation.
                        debug_assert!(kind.accepts_min(min));
                        return true;
                    }
                }

                if min == i64::MAX {
                    // No priorities on internal edges.
                    continue;
                }
                if kind.accepts_min(min) {
                    // Some cycle through the minimal edge stays inside the
                    // sub-SCC and meets nothing smaller.
                    return true;
                }
                queue.push_back((sub_scc, min));
            }
        }

        false
    }
}

pub mod rabin {
    //! Rabin and generalized Rabin: some pair's Fin colour is avoided while
    //! all its Inf colours recur.

    use super::*;

    /// SCC-based check: per pair, refine each SCC by dropping Fin-marked
    /// edges and scan the sub-SCCs' internal edges for the pair's awaited
    /// Inf colours. A pair with no Inf colours accepts on any cycle avoiding
    /// its Fin colour.
    pub fn contains_accepting_scc<S: Clone + Eq + Hash>(
        automaton: &Automaton<S>,
        roots: &[S],
        pairs: &[GeneralizedRabinPair],
    ) -> bool {
        let decomposition =
            SccDecomposition::of(roots.to_vec(), |state: &S| automaton.successor_states(state));
        decomposition.any_match(|scc| {
            pairs.iter().any(|pair| {
                let filtered = SccDecomposition::of(scc.states().to_vec(), |state: &S| {
                    automaton
                        .successors(state)
                        .iter()
                        .filter(|(edge, _)| {
                            !edge.colours().contains(pair.fin) && scc.contains(edge.successor())
                        })
                        .map(|(edge, _)| edge.successor().clone())
                        .collect()
                });

                filtered.any_match(|sub_scc| {
                    let mut awaited: AHashSet<u32> = pair.inf.iter().copied().collect();
                    for state in sub_scc.iter() {
                        for (edge, _) in automaton.successors(state).iter() {
                            if !sub_scc.contains(edge.successor())
                                || edge.colours().contains(pair.fin)
                            {
                                continue;
                            }
                            for colour in edge.colours().iter() {
                                awaited.remove(&colour);
                            }
                            if awaited.is_empty() {
                                return true;
                            }
                        }
                    }
                    false
                })
            })
        })
    }

    /// Lasso-based check for plain Rabin pairs: one lasso search per pair,
    /// requiring the Inf colour on the closing edge and excluding Fin-marked
    /// edges from the cycle.
    pub fn contains_accepting_lasso<S: Clone + Eq + Hash>(
        automaton: &Automaton<S>,
        roots: &[S],
        pairs: &[RabinPair],
    ) -> bool {
        pairs.iter().any(|pair| {
            has_accepting_lasso(
                automaton,
                roots,
                InfFilter::Colour(pair.inf),
                FinFilter::Colour(pair.fin),
            )
        })
    }
}
