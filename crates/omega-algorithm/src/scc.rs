//! Strongly-connected-component decomposition of automaton state graphs.
//!
//! The decomposition is computed with an iterative (explicit-stack) variant
//! of Tarjan's algorithm over an abstract successor function, runs in linear
//! time in the explored edges, and reports SCCs in topological order of the
//! condensation graph.

use ahash::{AHashMap, AHashSet};
use omega_automaton::Automaton;
use std::cell::{Cell, OnceCell, RefCell};
use std::collections::VecDeque;
use std::hash::Hash;

/// Initial low-link value. Low-links are only ever lowered, so the sentinel
/// doubles as "no back-edge seen yet" and compares above every real index.
const NO_LINK: usize = usize::MAX;

/// A strongly connected component: a non-empty set of mutually reachable
/// states. States are kept in discovery order for deterministic iteration;
/// membership tests are O(1).
#[derive(Clone, Debug)]
pub struct Scc<S> {
    states: Vec<S>,
    members: AHashSet<S>,
}

impl<S: Clone + Eq + Hash> Scc<S> {
    fn singleton(state: S) -> Self {
        let mut members = AHashSet::with_capacity(1);
        members.insert(state.clone());
        Scc {
            states: vec![state],
            members,
        }
    }

    fn from_states(states: Vec<S>) -> Self {
        let members = states.iter().cloned().collect();
        Scc { states, members }
    }

    pub fn contains(&self, state: &S) -> bool {
        self.members.contains(state)
    }

    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn iter(&self) -> std::slice::Iter<'_, S> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<S: Clone + Eq + Hash> PartialEq for Scc<S> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.states.iter().all(|s| other.contains(s))
    }
}

impl<S: Clone + Eq + Hash> Eq for Scc<S> {}

enum Status {
    /// Discovered, SCC not yet finalized. Payload is the discovery index.
    Live(usize),
    Finalized,
}

struct Frame<S> {
    node: S,
    id: usize,
    successors: Vec<S>,
    cursor: usize,
}

enum Step<S> {
    Descend(S),
    Finalize,
}

/// Iterative Tarjan over a successor function, with an early-terminating
/// predicate evaluated once per finalized SCC (in discovery order).
///
/// A `true` predicate result aborts the traversal and leaves the internal
/// bookkeeping inconsistent; callers construct a fresh instance per query and
/// never run an aborted one again.
struct Tarjan<S, F, P> {
    successors: F,
    predicate: P,
    status: AHashMap<S, Status>,
    /// Low-link per discovery index. `NO_LINK` means no back-edge seen.
    low_link: Vec<usize>,
    exploration_stack: Vec<S>,
    path: Vec<Frame<S>>,
    aborted: bool,
}

impl<S, F, P> Tarjan<S, F, P>
where
    S: Clone + Eq + Hash,
    F: FnMut(&S) -> Vec<S>,
    P: FnMut(&Scc<S>) -> bool,
{
    fn new(successors: F, predicate: P) -> Self {
        Tarjan {
            successors,
            predicate,
            status: AHashMap::new(),
            low_link: Vec::new(),
            exploration_stack: Vec::new(),
            path: Vec::new(),
            aborted: false,
        }
    }

    /// Seed states whose SCCs were finalized by a previous decomposition, so
    /// an extension run never re-enters them.
    fn mark_finalized(&mut self, states: impl IntoIterator<Item = S>) {
        for state in states {
            self.status.insert(state, Status::Finalized);
        }
    }

    fn discover(&mut self, node: S) {
        let id = self.low_link.len();
        self.low_link.push(NO_LINK);
        let successors = (self.successors)(&node);
        self.status.insert(node.clone(), Status::Live(id));
        self.exploration_stack.push(node.clone());
        self.path.push(Frame {
            node,
            id,
            successors,
            cursor: 0,
        });
    }

    /// Run from one root. Returns `true` iff the predicate matched some SCC.
    fn run(&mut self, root: S) -> bool {
        debug_assert!(!self.aborted, "reuse after early termination");
        debug_assert!(self.path.is_empty());

        if self.status.contains_key(&root) {
            return false;
        }
        self.discover(root);

        loop {
            let step = loop {
                let frame = self.path.last_mut().expect("work stack underflow");
                if frame.cursor >= frame.successors.len() {
                    break Step::Finalize;
                }
                let successor = frame.successors[frame.cursor].clone();
                frame.cursor += 1;

                if successor == frame.node {
                    // Self-loops feed the low-link but need no descent.
                    if self.low_link[frame.id] == NO_LINK {
                        self.low_link[frame.id] = frame.id;
                    }
                    continue;
                }

                match self.status.get(&successor) {
                    Some(Status::Finalized) => continue,
                    Some(Status::Live(successor_id)) => {
                        // A link to a live state: our low-link is at most its.
                        let successor_id = *successor_id;
                        let successor_low = if self.low_link[successor_id] == NO_LINK {
                            successor_id
                        } else {
                            self.low_link[successor_id]
                        };
                        let frame = self.path.last().expect("work stack underflow");
                        if successor_low < self.low_link[frame.id] {
                            self.low_link[frame.id] = successor_low;
                        }
                    }
                    None => break Step::Descend(successor),
                }
            };

            match step {
                Step::Descend(successor) => self.discover(successor),
                Step::Finalize => {
                    let frame = self.path.pop().expect("work stack underflow");
                    let low = self.low_link[frame.id];

                    if low == NO_LINK {
                        // No back-edge at all: a transient singleton, reported
                        // without searching the exploration stack.
                        let top = self.exploration_stack.pop();
                        debug_assert!(top.as_ref() == Some(&frame.node));
                        self.status.insert(frame.node.clone(), Status::Finalized);
                        if (self.predicate)(&Scc::singleton(frame.node)) {
                            self.aborted = true;
                            return true;
                        }
                    } else if low == frame.id {
                        // Root of an SCC: pop the exploration stack down to it.
                        let mut states = Vec::new();
                        loop {
                            let state = self
                                .exploration_stack
                                .pop()
                                .expect("exploration stack underflow");
                            let is_root = state == frame.node;
                            self.status.insert(state.clone(), Status::Finalized);
                            states.push(state);
                            if is_root {
                                break;
                            }
                        }
                        states.reverse();
                        if (self.predicate)(&Scc::from_states(states)) {
                            self.aborted = true;
                            return true;
                        }
                    } else {
                        // Not a root: backtrack the low-link to the predecessor.
                        debug_assert!(low < frame.id);
                        let predecessor = self.path.last().expect("non-root without predecessor");
                        if low < self.low_link[predecessor.id] {
                            self.low_link[predecessor.id] = low;
                        }
                    }

                    if self.path.is_empty() {
                        return false;
                    }
                }
            }
        }
    }
}

struct Computed<S> {
    sccs: Vec<Scc<S>>,
    index: AHashMap<S, usize>,
    /// Adjacency lists over SCC indices, self-loops included. Every edge
    /// points at an equal or larger index (topological order).
    condensation: Vec<Vec<usize>>,
    transient: Vec<bool>,
    bottom: Vec<bool>,
}

/// SCC decomposition of the graph reachable from a set of root states under
/// an abstract successor function.
///
/// Results are computed lazily on first structural query and cached for the
/// decomposition's lifetime. `any_match`/`all_match` never materialize the
/// full decomposition; they run their own short-circuiting traversal.
pub struct SccDecomposition<S, F> {
    roots: Vec<S>,
    successors: F,
    computed: OnceCell<Computed<S>>,
}

impl<'a, S: Clone + Eq + Hash> SccDecomposition<S, Box<dyn Fn(&S) -> Vec<S> + 'a>> {
    /// Decompose the reachable state graph of an automaton.
    pub fn of_automaton(automaton: &'a Automaton<S>) -> Self {
        SccDecomposition::of(
            automaton.initial_states().to_vec(),
            Box::new(move |state: &S| automaton.successor_states(state)),
        )
    }
}

impl<S, F> SccDecomposition<S, F>
where
    S: Clone + Eq + Hash,
    F: Fn(&S) -> Vec<S>,
{
    pub fn of(roots: Vec<S>, successors: F) -> Self {
        SccDecomposition {
            roots,
            successors,
            computed: OnceCell::new(),
        }
    }

    /// Whether any SCC reachable from the roots matches the predicate.
    /// Short-circuits on the first match; with empty roots the predicate is
    /// never evaluated and the result is `false`.
    pub fn any_match(&self, predicate: impl FnMut(&Scc<S>) -> bool) -> bool {
        let mut tarjan = Tarjan::new(|state: &S| (self.successors)(state), predicate);
        self.roots.iter().any(|root| tarjan.run(root.clone()))
    }

    /// Whether every SCC reachable from the roots matches the predicate.
    /// With empty roots the predicate is never evaluated and the result is
    /// `true`.
    pub fn all_match(&self, mut predicate: impl FnMut(&Scc<S>) -> bool) -> bool {
        !self.any_match(|scc| !predicate(scc))
    }

    /// All SCCs reachable from the roots, topologically ordered: for every
    /// condensation edge `a -> b` with `a != b`, the SCC of `a` precedes the
    /// SCC of `b`.
    pub fn sccs(&self) -> &[Scc<S>] {
        &self.computed().sccs
    }

    /// The SCCs that are not transient.
    pub fn sccs_without_transient(&self) -> Vec<&Scc<S>> {
        let computed = self.computed();
        computed
            .sccs
            .iter()
            .enumerate()
            .filter(|(i, _)| !computed.transient[*i])
            .map(|(_, scc)| scc)
            .collect()
    }

    /// Index of the SCC containing `state` in [`SccDecomposition::sccs`], or
    /// `None` if `state` is not reachable from the roots.
    pub fn index(&self, state: &S) -> Option<usize> {
        self.computed().index.get(state).copied()
    }

    /// The SCC containing `state`, if reachable.
    pub fn scc_of(&self, state: &S) -> Option<&Scc<S>> {
        let computed = self.computed();
        computed.index.get(state).map(|&i| &computed.sccs[i])
    }

    /// Condensation graph as adjacency lists over SCC indices. Self-loops are
    /// kept (they distinguish transient SCCs), and every path is labelled by
    /// monotonically increasing indices.
    pub fn condensation(&self) -> &[Vec<usize>] {
        &self.computed().condensation
    }

    /// Indices of SCCs with no internal edge (singletons without self-loop).
    pub fn transient_sccs(&self) -> Vec<usize> {
        indices_where(&self.computed().transient)
    }

    /// Indices of SCCs the condensation has no edge leaving.
    pub fn bottom_sccs(&self) -> Vec<usize> {
        indices_where(&self.computed().bottom)
    }

    pub fn is_transient_scc(&self, scc: &Scc<S>) -> bool {
        self.index(&scc.states()[0])
            .map(|i| self.computed().transient[i])
            .unwrap_or(false)
    }

    pub fn is_bottom_scc(&self, scc: &Scc<S>) -> bool {
        self.index(&scc.states()[0])
            .map(|i| self.computed().bottom[i])
            .unwrap_or(false)
    }

    /// Reachability on states, answered through the condensation.
    pub fn path_exists(&self, source: &S, target: &S) -> bool {
        let (Some(source_idx), Some(target_idx)) = (self.index(source), self.index(target)) else {
            return false;
        };
        if target_idx < source_idx {
            return false;
        }
        if source_idx == target_idx {
            // Same SCC: a path exists iff the SCC has an internal edge.
            return !self.computed().transient[source_idx];
        }

        let condensation = self.condensation();
        let mut visited = vec![false; condensation.len()];
        visited[source_idx] = true;
        let mut queue = VecDeque::from([source_idx]);
        while let Some(i) = queue.pop_front() {
            for &j in &condensation[i] {
                if j == target_idx {
                    return true;
                }
                if !visited[j] {
                    visited[j] = true;
                    queue.push_back(j);
                }
            }
        }
        false
    }

    /// Extend the decomposition with an additional root set while preserving
    /// one global topological order: if the new roots reach previously
    /// decomposed states, the newly discovered SCCs are spliced *before*
    /// those states' SCCs.
    pub fn extend_roots(&mut self, new_roots: Vec<S>) {
        if self.computed.get().is_some() {
            let prior = self.computed.take().map(|c| c.sccs);
            let recomputed = Self::compute(&self.successors, &new_roots, prior);
            let _ = self.computed.set(recomputed);
        }
        self.roots.extend(new_roots);
    }

    fn computed(&self) -> &Computed<S> {
        self.computed
            .get_or_init(|| Self::compute(&self.successors, &self.roots, None))
    }

    fn compute(successors: &F, roots: &[S], prior: Option<Vec<Scc<S>>>) -> Computed<S> {
        let mut ordered: VecDeque<Scc<S>> = prior.unwrap_or_default().into();

        let prior_states: Vec<S> = ordered
            .iter()
            .flat_map(|scc| scc.states().iter().cloned())
            .collect();

        // Shared with the traversal closures below: states whose SCCs are
        // already placed in `ordered`, the SCCs of the current batch in
        // finalization order, and whether the current batch reaches previously
        // seen states (and therefore must be spliced before them).
        let seen: RefCell<AHashSet<S>> = RefCell::new(prior_states.iter().cloned().collect());
        let local: RefCell<Vec<Scc<S>>> = RefCell::new(Vec::new());
        let insert_before = Cell::new(false);

        {
            let mut tarjan = Tarjan::new(
                |state: &S| {
                    let succs = successors(state);
                    let seen = seen.borrow();
                    if !seen.is_empty() && succs.iter().any(|s| seen.contains(s)) {
                        insert_before.set(true);
                    }
                    succs
                },
                |scc: &Scc<S>| {
                    local.borrow_mut().push(scc.clone());
                    false
                },
            );
            tarjan.mark_finalized(prior_states);

            for root in roots {
                {
                    let mut seen = seen.borrow_mut();
                    for scc in local.borrow().iter() {
                        seen.extend(scc.states().iter().cloned());
                    }
                }
                local.borrow_mut().clear();

                tarjan.run(root.clone());

                // `local` holds the batch in finalization order, which is the
                // reverse of the topological order.
                if insert_before.get() {
                    for scc in local.borrow().iter() {
                        ordered.push_front(scc.clone());
                    }
                    insert_before.set(false);
                } else {
                    for scc in local.borrow().iter().rev() {
                        ordered.push_back(scc.clone());
                    }
                }
            }
        }

        let sccs: Vec<Scc<S>> = ordered.into_iter().collect();

        let mut index = AHashMap::new();
        for (i, scc) in sccs.iter().enumerate() {
            for state in scc.states() {
                index.insert(state.clone(), i);
            }
        }

        let mut condensation: Vec<Vec<usize>> = Vec::with_capacity(sccs.len());
        for (i, scc) in sccs.iter().enumerate() {
            let mut targets: Vec<usize> = Vec::new();
            for state in scc.states() {
                for successor in successors(state) {
                    if let Some(&j) = index.get(&successor) {
                        debug_assert!(j >= i, "condensation edge against topological order");
                        if !targets.contains(&j) {
                            targets.push(j);
                        }
                    }
                }
            }
            targets.sort_unstable();
            condensation.push(targets);
        }

        let transient = condensation
            .iter()
            .enumerate()
            .map(|(i, targets)| !targets.contains(&i))
            .collect();
        let bottom = condensation
            .iter()
            .enumerate()
            .map(|(i, targets)| targets.iter().all(|&j| j == i))
            .collect();

        Computed {
            sccs,
            index,
            condensation,
            transient,
            bottom,
        }
    }
}

fn indices_where(flags: &[bool]) -> Vec<usize> {
    flags
        .iter()
        .enumerate()
        .filter(|(_, &flag)| flag)
        .map(|(i, _)| i)
        .collect()
}
