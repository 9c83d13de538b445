//! Acceptance conditions for ω-automata.
//!
//! A closed tagged union: emptiness checking dispatches over this enum with
//! an exhaustive match, so adding or removing an acceptance family is a
//! compile-time-checked change.

use crate::edge::ColourSet;
use smallvec::SmallVec;

/// Polarity and direction of a parity condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParityKind {
    MinEven,
    MinOdd,
    MaxEven,
    MaxOdd,
}

impl ParityKind {
    pub fn is_min(self) -> bool {
        matches!(self, ParityKind::MinEven | ParityKind::MinOdd)
    }

    pub fn is_even(self) -> bool {
        matches!(self, ParityKind::MinEven | ParityKind::MaxEven)
    }

    /// Whether a run whose minimal recurring priority is `priority` accepts.
    /// Only meaningful for the min polarities.
    pub fn accepts_min(self, priority: i64) -> bool {
        debug_assert!(self.is_min());
        priority >= 0 && (priority % 2 == 0) == self.is_even()
    }
}

/// A Rabin pair: the Fin colour must occur finitely often, the Inf colour
/// infinitely often.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RabinPair {
    pub fin: u32,
    pub inf: u32,
}

/// A generalized Rabin pair: one Fin colour and any number of Inf colours,
/// all of which must occur infinitely often. An empty Inf list accepts on any
/// cycle avoiding the Fin colour (co-Büchi shape).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GeneralizedRabinPair {
    pub fin: u32,
    pub inf: SmallVec<[u32; 2]>,
}

impl From<&RabinPair> for GeneralizedRabinPair {
    fn from(pair: &RabinPair) -> Self {
        GeneralizedRabinPair {
            fin: pair.fin,
            inf: SmallVec::from_slice(&[pair.inf]),
        }
    }
}

/// The acceptance condition of an automaton. Attached once at construction
/// and immutable for the automaton's lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Acceptance {
    /// Every run accepts; emptiness reduces to cycle reachability.
    All,
    /// Accepting iff each of the `sets` Inf-sets is visited infinitely often.
    GeneralizedBuchi { sets: u32 },
    /// Accepting iff the minimal (or maximal) colour seen infinitely often
    /// has the designated parity. `sets` is the number of priorities.
    Parity { kind: ParityKind, sets: u32 },
    Rabin { pairs: Vec<RabinPair> },
    GeneralizedRabin { pairs: Vec<GeneralizedRabinPair> },
}

impl Acceptance {
    /// Plain Büchi: a single Inf set.
    pub fn buchi() -> Self {
        Acceptance::GeneralizedBuchi { sets: 1 }
    }

    /// The number of colour indices this condition refers to. Edges carrying
    /// colours at or above this index are a producer bug.
    pub fn colour_sets(&self) -> u32 {
        match self {
            Acceptance::All => 0,
            Acceptance::GeneralizedBuchi { sets } | Acceptance::Parity { sets, .. } => *sets,
            Acceptance::Rabin { pairs } => pairs
                .iter()
                .map(|p| p.fin.max(p.inf) + 1)
                .max()
                .unwrap_or(0),
            Acceptance::GeneralizedRabin { pairs } => pairs
                .iter()
                .map(|p| p.inf.iter().copied().fold(p.fin, u32::max) + 1)
                .max()
                .unwrap_or(0),
        }
    }

    /// Debug-only well-formedness check for a freshly produced edge.
    /// Out-of-range colours are not validated in release builds.
    pub fn debug_assert_edge_colours(&self, colours: &ColourSet) {
        if cfg!(debug_assertions) {
            let bound = self.colour_sets();
            for colour in colours.iter() {
                debug_assert!(
                    colour < bound,
                    "edge colour {colour} outside acceptance range {bound}"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_kind() {
        assert!(ParityKind::MinEven.is_min());
        assert!(ParityKind::MinEven.is_even());
        assert!(!ParityKind::MaxOdd.is_min());
        assert!(ParityKind::MinEven.accepts_min(0));
        assert!(!ParityKind::MinEven.accepts_min(1));
        assert!(ParityKind::MinOdd.accepts_min(3));
        assert!(!ParityKind::MinOdd.accepts_min(-1));
    }

    #[test]
    fn test_colour_sets() {
        assert_eq!(Acceptance::All.colour_sets(), 0);
        assert_eq!(Acceptance::buchi().colour_sets(), 1);
        let rabin = Acceptance::Rabin {
            pairs: vec![RabinPair { fin: 0, inf: 3 }],
        };
        assert_eq!(rabin.colour_sets(), 4);
        let gen = Acceptance::GeneralizedRabin {
            pairs: vec![GeneralizedRabinPair {
                fin: 2,
                inf: SmallVec::from_slice(&[0, 5]),
            }],
        };
        assert_eq!(gen.colour_sets(), 6);
    }

    #[test]
    fn test_rabin_pair_generalization() {
        let pair = RabinPair { fin: 1, inf: 2 };
        let gen = GeneralizedRabinPair::from(&pair);
        assert_eq!(gen.fin, 1);
        assert_eq!(gen.inf.as_slice(), &[2]);
    }
}
