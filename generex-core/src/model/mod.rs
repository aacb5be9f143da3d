//! Automaton model and the traversals built on top of it.
//!
//! - Automaton representation (`State`, `Transition`, `Automaton`)
//! - Counted enumeration tree for indexed lookup (`ChoiceNode`)
//! - Lazy exhaustive enumeration (`Matches`)
//! - Random walk sampling and its configuration (`SampleInput`)
//! - A high-level interface (`Generator`)

/// High-level interface: counting, indexed lookup, enumeration and sampling
/// over one automaton, with lazily built caches.
pub mod generator;

/// Deterministic automaton, its builder and liveness/finiteness analysis.
pub mod automaton;

/// States and character-range transitions.
pub mod state;

/// Enumeration tree annotated with exact match counts.
///
/// Maps a lexicographic index to its string and finds the first match.
pub mod choice_node;

/// Depth-first, lexicographically ordered iterator over all matches.
pub mod enumerator;

/// Sampling configuration (length bounds, step cap, stopping probability).
pub mod sample_input;

/// Random walk over the automaton.
///
/// Not exposed, used through `Generator`.
mod sampler;
