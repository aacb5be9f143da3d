//! Regular-language string generation library.
//!
//! This crate turns a pattern (or a pre-built deterministic automaton) into:
//! - The exact number of strings it accepts
//! - The k-th accepted string in lexicographic order
//! - The full ordered list of accepted strings
//! - Random accepted strings with length constraints
//!
//! Counting and indexed lookup go through an enumeration tree, exhaustive
//! enumeration and random sampling walk the automaton directly.

/// Automaton model, enumeration tree, traversal strategies and the
/// high-level `Generator` interface.
pub mod model;

/// Pattern string to automaton compilation.
pub mod compile;

/// Error type shared by the whole crate.
pub mod error;

/// Persistence and output helpers (automaton files, match listings).
pub mod io;

pub use error::{GenerexError, Result};
pub use model::automaton::{Automaton, AutomatonBuilder};
pub use model::generator::Generator;
pub use model::sample_input::SampleInput;
pub use model::state::{State, StateId, Transition};
