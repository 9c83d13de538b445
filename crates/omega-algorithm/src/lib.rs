//! Graph algorithms over ω-automata: SCC decomposition and language
//! emptiness.

pub mod emptiness;
pub mod scc;

pub use emptiness::{is_empty, is_empty_from, EmptinessError};
pub use scc::{Scc, SccDecomposition};
