//! ω-automaton model: states, valuations, edges, acceptance conditions,
//! and a lazily memoizing transition table.

pub mod acceptance;
pub mod automaton;
pub mod edge;
pub mod valuation;

pub use acceptance::{Acceptance, GeneralizedRabinPair, ParityKind, RabinPair};
pub use automaton::{Automaton, CancelFlag, EdgeMap, ExploreOutcome};
pub use edge::{ColourSet, Edge};
pub use valuation::{alphabet, Valuation, ValuationSet};
