//! Edges and their acceptance marks.

use smallvec::SmallVec;
use std::fmt;

/// A set of acceptance marks ("colours") attached to an edge.
///
/// Kept as a sorted small vector: edges carry very few colours in practice,
/// and sorted storage gives a cheap `smallest` for parity conditions.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ColourSet {
    colours: SmallVec<[u32; 4]>,
}

impl ColourSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(colour: u32) -> Self {
        ColourSet {
            colours: SmallVec::from_slice(&[colour]),
        }
    }

    pub fn insert(&mut self, colour: u32) {
        if let Err(pos) = self.colours.binary_search(&colour) {
            self.colours.insert(pos, colour);
        }
    }

    pub fn contains(&self, colour: u32) -> bool {
        self.colours.binary_search(&colour).is_ok()
    }

    /// The smallest colour, used as the edge priority under parity acceptance.
    pub fn smallest(&self) -> Option<u32> {
        self.colours.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.colours.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.colours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }
}

impl FromIterator<u32> for ColourSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut colours: SmallVec<[u32; 4]> = iter.into_iter().collect();
        colours.sort_unstable();
        colours.dedup();
        ColourSet { colours }
    }
}

impl fmt::Debug for ColourSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.colours.iter()).finish()
    }
}

/// An edge of an ω-automaton: a target state plus the colours the edge
/// contributes to any run crossing it. The valuations producing the edge are
/// tracked separately in the automaton's memoized edge map.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Edge<S> {
    successor: S,
    colours: ColourSet,
}

impl<S> Edge<S> {
    pub fn new(successor: S, colours: ColourSet) -> Self {
        Edge { successor, colours }
    }

    /// An edge carrying no colours.
    pub fn plain(successor: S) -> Self {
        Edge {
            successor,
            colours: ColourSet::new(),
        }
    }

    /// An edge carrying a single colour.
    pub fn with_colour(successor: S, colour: u32) -> Self {
        Edge {
            successor,
            colours: ColourSet::of(colour),
        }
    }

    pub fn successor(&self) -> &S {
        &self.successor
    }

    pub fn colours(&self) -> &ColourSet {
        &self.colours
    }

    pub fn into_successor(self) -> S {
        self.successor
    }
}

impl<S: fmt::Debug> fmt::Debug for Edge<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-> {:?} {:?}", self.successor, self.colours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colour_set_sorted() {
        let set: ColourSet = [3, 1, 2, 1].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(set.smallest(), Some(1));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_colour_set_insert_idempotent() {
        let mut set = ColourSet::of(5);
        set.insert(2);
        set.insert(5);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 5]);
    }

    #[test]
    fn test_empty_colour_set() {
        let set = ColourSet::new();
        assert!(set.is_empty());
        assert_eq!(set.smallest(), None);
        assert!(!set.contains(0));
    }

    #[test]
    fn test_edge_constructors() {
        let e = Edge::with_colour("q1", 0);
        assert_eq!(*e.successor(), "q1");
        assert!(e.colours().contains(0));
        assert!(Edge::plain("q2").colours().is_empty());
    }
}
