use rand::Rng;

use serde::{Deserialize, Serialize};

/// Index of a state inside its `Automaton`.
pub type StateId = usize;

/// Bounds of the UTF-16 surrogate gap, which holds no `char`.
const SURROGATE_START: u32 = 0xD800;
const SURROGATE_END: u32 = 0xDFFF;
const SURROGATE_COUNT: u32 = SURROGATE_END - SURROGATE_START + 1;

/// Returns the next Unicode scalar value after `c`, skipping surrogates.
///
/// Returns `None` for `char::MAX`.
pub(crate) fn next_char(c: char) -> Option<char> {
	match c as u32 {
		0xD7FF => Some('\u{E000}'),
		code => char::from_u32(code + 1),
	}
}

/// Maps a scalar value to a dense index that ignores the surrogate gap.
fn dense_index(c: char) -> u32 {
	let code = c as u32;
	if code > SURROGATE_END { code - SURROGATE_COUNT } else { code }
}

/// Inverse of `dense_index`.
fn from_dense_index(index: u32) -> Option<char> {
	if index >= SURROGATE_START {
		char::from_u32(index + SURROGATE_COUNT)
	} else {
		char::from_u32(index)
	}
}

/// A labelled edge between two states.
///
/// Every character in `min..=max` leads to the same destination `to`.
///
/// ## Invariants
/// - `min <= max`
/// - `to` is a valid state of the owning automaton
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
	/// Smallest character of the range (inclusive).
	pub min: char,
	/// Largest character of the range (inclusive).
	pub max: char,
	/// Destination state.
	pub to: StateId,
}

impl Transition {
	pub fn new(min: char, max: char, to: StateId) -> Self {
		Self { min, max, to }
	}

	/// Number of distinct characters covered by the range.
	///
	/// Surrogate code points are not characters and are not counted.
	pub fn char_count(&self) -> u32 {
		dense_index(self.max) - dense_index(self.min) + 1
	}

	/// Returns the `offset`-th character of the range (0-based).
	///
	/// Returns `None` if `offset >= char_count()`.
	pub fn nth_char(&self, offset: u32) -> Option<char> {
		if offset >= self.char_count() {
			return None;
		}
		from_dense_index(dense_index(self.min) + offset)
	}

	/// Tests whether `c` belongs to the range.
	pub fn contains(&self, c: char) -> bool {
		self.min <= c && c <= self.max
	}

	/// Picks one character of the range uniformly at random.
	pub fn random_char<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
		rng.random_range(self.min..=self.max)
	}
}

/// Represents a state of a deterministic automaton.
///
/// A `State` is a node of the automaton graph: it may be accepting and it owns
/// its outgoing transitions.
///
/// ## Invariants
/// Once the owning automaton is built:
/// - Transitions are sorted ascending by `min`
/// - Transition ranges never overlap (the automaton is deterministic)
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
	/// Whether the empty continuation from this state is accepted.
	accept: bool,
	/// Outgoing transitions, sorted by `min` after the automaton is built.
	transitions: Vec<Transition>,
}

impl State {
	/// Creates a new state without transitions.
	pub fn new(accept: bool) -> Self {
		Self { accept, transitions: Vec::new() }
	}

	pub fn is_accept(&self) -> bool {
		self.accept
	}

	/// Outgoing transitions in ascending `min` order.
	pub fn transitions(&self) -> &[Transition] {
		&self.transitions
	}

	pub(crate) fn add_transition(&mut self, transition: Transition) {
		self.transitions.push(transition);
	}

	/// Sorts transitions and checks that no two ranges overlap.
	///
	/// # Errors
	/// Returns a description of the first overlapping pair.
	pub(crate) fn normalize(&mut self) -> Result<(), String> {
		self.transitions.sort_by_key(|t| t.min);
		for pair in self.transitions.windows(2) {
			if pair[0].max >= pair[1].min {
				return Err(format!(
					"Overlapping transitions {:?}-{:?} and {:?}-{:?}",
					pair[0].min, pair[0].max, pair[1].min, pair[1].max
				));
			}
		}
		Ok(())
	}

	/// Finds the transition taken on `c`, if any.
	pub fn step(&self, c: char) -> Option<StateId> {
		let index = self.transitions.partition_point(|t| t.max < c);
		self.transitions
			.get(index)
			.filter(|t| t.contains(c))
			.map(|t| t.to)
	}
}
