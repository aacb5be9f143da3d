//! Error types for counting, enumeration and sampling.

use thiserror::Error;

use crate::model::state::StateId;

/// Errors that can occur while building or traversing an automaton.
///
/// Every variant describes a structural property of the input (automaton,
/// pattern, index or sampling bounds). None of them is transient, so none is
/// worth retrying.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerexError {
	/// A cycle is reachable through states that can still accept.
	///
	/// Raised by every operation that needs the enumeration tree or the full
	/// list of matches.
	#[error("Language is not finite: state {0} lies on a cycle")]
	NonFiniteLanguage(StateId),

	/// The exact number of matches does not fit in 128 bits.
	#[error("Match count overflows a 128-bit integer")]
	CountOverflow,

	/// The requested 1-based index is past the last match.
	#[error("Index {index} is out of range, the language has {size} matches")]
	IndexOutOfRange { index: u128, size: u128 },

	/// The automaton accepts no string at all.
	#[error("Language is empty")]
	EmptyLanguage,

	/// A random walk reached its configured step cap without stopping.
	#[error("Random walk exceeded {0} steps")]
	StepLimitExceeded(usize),

	/// The automaton breaks one of the model invariants.
	#[error("Invalid automaton: {0}")]
	InvalidAutomaton(String),

	/// The pattern could not be parsed.
	#[error("Invalid pattern: {0}")]
	InvalidPattern(String),

	/// The pattern uses a construct that has no automaton equivalent here.
	#[error("Unsupported pattern construct: {0}")]
	UnsupportedPattern(String),

	/// Compiling the pattern would need more than the given number of states.
	#[error("Pattern too large: more than {0} states")]
	PatternTooLarge(usize),

	/// Sampling parameters are inconsistent.
	#[error("Invalid sample input: {0}")]
	InvalidInput(String),

	#[error("I/O error: {0}")]
	Io(String),

	#[error("Serialization error: {0}")]
	Serialization(String),
}

impl From<std::io::Error> for GenerexError {
	fn from(error: std::io::Error) -> Self {
		GenerexError::Io(error.to_string())
	}
}

impl From<postcard::Error> for GenerexError {
	fn from(error: postcard::Error) -> Self {
		GenerexError::Serialization(error.to_string())
	}
}

/// A specialized `Result` type for generation operations.
pub type Result<T> = std::result::Result<T, GenerexError>;
