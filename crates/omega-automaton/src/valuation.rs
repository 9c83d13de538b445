//! Valuations over a fixed, ordered set of atomic propositions.

use smallvec::SmallVec;
use std::fmt;

/// An assignment of boolean values to the automaton's atomic propositions,
/// packed into a bitmask. Proposition `i` corresponds to bit `i`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Valuation(u32);

impl Valuation {
    /// Upper bound on the number of atomic propositions.
    pub const MAX_PROPOSITIONS: usize = 32;

    /// The valuation assigning `false` to every proposition.
    pub fn empty() -> Self {
        Valuation(0)
    }

    #[inline]
    pub fn from_bits(bits: u32) -> Self {
        Valuation(bits)
    }

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether proposition `ap` is assigned `true`.
    #[inline]
    pub fn contains(self, ap: usize) -> bool {
        debug_assert!(ap < Self::MAX_PROPOSITIONS);
        self.0 & (1 << ap) != 0
    }

    /// This valuation with proposition `ap` set to `true`.
    #[inline]
    pub fn with(self, ap: usize) -> Self {
        debug_assert!(ap < Self::MAX_PROPOSITIONS);
        Valuation(self.0 | (1 << ap))
    }
}

impl fmt::Debug for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Valuation({:#b})", self.0)
    }
}

// Display shows the raw bit pattern; proposition names live on the automaton.
impl fmt::Display for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#b}", self.0)
    }
}

/// Enumerate the full valuation space over `ap_count` propositions, in
/// increasing bitmask order. This is the abstract alphabet of the automaton.
pub fn alphabet(ap_count: usize) -> impl Iterator<Item = Valuation> {
    debug_assert!(ap_count <= Valuation::MAX_PROPOSITIONS);
    (0..(1u64 << ap_count)).map(|bits| Valuation(bits as u32))
}

/// The set of valuations labelling a single edge.
///
/// Valuations are stored in the order the alphabet enumerates them, so
/// iteration over a memoized edge map is deterministic.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ValuationSet {
    vals: SmallVec<[Valuation; 4]>,
}

impl ValuationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a valuation. Callers must insert in non-decreasing order; the
    /// memoization loop does so by construction. Re-appending the current
    /// last valuation is a no-op, so producers may report duplicate edges.
    pub fn push(&mut self, valuation: Valuation) {
        debug_assert!(self.vals.last().map_or(true, |last| *last <= valuation));
        if self.vals.last() == Some(&valuation) {
            return;
        }
        self.vals.push(valuation);
    }

    pub fn contains(&self, valuation: Valuation) -> bool {
        self.vals.binary_search(&valuation).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = Valuation> + '_ {
        self.vals.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.vals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vals.is_empty()
    }
}

impl FromIterator<Valuation> for ValuationSet {
    fn from_iter<I: IntoIterator<Item = Valuation>>(iter: I) -> Self {
        let mut vals: SmallVec<[Valuation; 4]> = iter.into_iter().collect();
        vals.sort_unstable();
        vals.dedup();
        ValuationSet { vals }
    }
}

impl fmt::Debug for ValuationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.vals.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_is_power_set() {
        let all: Vec<Valuation> = alphabet(2).collect();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], Valuation::empty());
        assert!(all[3].contains(0) && all[3].contains(1));
    }

    #[test]
    fn test_alphabet_zero_propositions() {
        // A proposition-free automaton still has a one-letter alphabet.
        let all: Vec<Valuation> = alphabet(0).collect();
        assert_eq!(all, vec![Valuation::empty()]);
    }

    #[test]
    fn test_valuation_bits() {
        let v = Valuation::empty().with(0).with(3);
        assert!(v.contains(0));
        assert!(!v.contains(1));
        assert!(v.contains(3));
        assert_eq!(v.bits(), 0b1001);
    }

    #[test]
    fn test_valuation_set_ordered() {
        let mut set = ValuationSet::new();
        set.push(Valuation::from_bits(0));
        set.push(Valuation::from_bits(2));
        assert!(set.contains(Valuation::from_bits(0)));
        assert!(!set.contains(Valuation::from_bits(1)));
        assert_eq!(set.iter().collect::<Vec<_>>().len(), 2);
    }
}
