use std::borrow::Cow;

use super::automaton::Automaton;
use super::state::{StateId, next_char};
use crate::error::Result;

/// Position of the depth-first walk inside one state.
struct Frame {
	state: StateId,
	/// Index of the transition being explored.
	transition: usize,
	/// Next character to try in that transition, `None` before the first one.
	cursor: Option<char>,
}

/// Lazy, ordered iterator over every string accepted by a finite automaton.
///
/// The automaton is walked depth-first with an explicit stack. A state's own
/// match is yielded before any of its extensions, and transitions and
/// characters are tried in ascending order, so the output is strictly
/// ascending in lexicographic order.
///
/// Transitions into states that cannot accept are skipped.
pub struct Matches<'a> {
	automaton: &'a Automaton,
	live: Cow<'a, [bool]>,
	stack: Vec<Frame>,
	word: String,
	pending: Option<String>,
}

impl<'a> Matches<'a> {
	/// Starts an enumeration of `automaton`.
	///
	/// # Errors
	/// Returns `NonFiniteLanguage` if the language is infinite, since the walk
	/// would never end.
	pub fn new(automaton: &'a Automaton) -> Result<Self> {
		let live = automaton.live_states();
		automaton.check_finite_with(&live)?;
		Ok(Self::start(automaton, Cow::Owned(live)))
	}

	/// Same as `new` with an already computed live-state mask.
	pub(crate) fn with_live(automaton: &'a Automaton, live: &'a [bool]) -> Result<Self> {
		automaton.check_finite_with(live)?;
		Ok(Self::start(automaton, Cow::Borrowed(live)))
	}

	fn start(automaton: &'a Automaton, live: Cow<'a, [bool]>) -> Self {
		let initial = automaton.initial();
		let mut matches = Self {
			automaton,
			live,
			stack: Vec::new(),
			word: String::new(),
			pending: None,
		};
		if matches.live[initial] {
			matches.enter(initial);
		}
		matches
	}

	/// Pushes a state on the walk and records its match, if any.
	fn enter(&mut self, state: StateId) {
		if self.automaton.state(state).is_accept() {
			self.pending = Some(self.word.clone());
		}
		self.stack.push(Frame { state, transition: 0, cursor: None });
	}
}

impl Iterator for Matches<'_> {
	type Item = String;

	fn next(&mut self) -> Option<String> {
		loop {
			if let Some(word) = self.pending.take() {
				return Some(word);
			}

			let frame = self.stack.last_mut()?;
			let transitions = self.automaton.state(frame.state).transitions();

			let Some(t) = transitions.get(frame.transition) else {
				// State exhausted: backtrack, dropping the character that led here
				self.stack.pop();
				if !self.stack.is_empty() {
					self.word.pop();
				}
				continue;
			};
			if !self.live[t.to] {
				frame.transition += 1;
				continue;
			}

			let c = frame.cursor.unwrap_or(t.min);
			if c == t.max {
				frame.transition += 1;
				frame.cursor = None;
			} else {
				frame.cursor = next_char(c);
			}

			let to = t.to;
			self.word.push(c);
			self.enter(to);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::GenerexError;
	use crate::model::automaton::AutomatonBuilder;

	#[test]
	fn enumerates_in_order() {
		// (a|b)c?
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(false);
		let s1 = b.add_state(true);
		let s2 = b.add_state(true);
		b.add_transition(s0, 'a', 'b', s1).unwrap();
		b.add_transition(s1, 'c', 'c', s2).unwrap();
		let a = b.build(s0).unwrap();
		let all: Vec<String> = Matches::new(&a).unwrap().collect();
		assert_eq!(all, vec!["a", "ac", "b", "bc"]);
	}

	#[test]
	fn skips_dead_paths() {
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(false);
		let dead = b.add_state(false);
		let ok = b.add_state(true);
		b.add_transition(s0, 'a', 'a', dead).unwrap();
		b.add_transition(s0, 'b', 'b', ok).unwrap();
		let a = b.build(s0).unwrap();
		let all: Vec<String> = Matches::new(&a).unwrap().collect();
		assert_eq!(all, vec!["b"]);
	}

	#[test]
	fn empty_language_yields_nothing() {
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(false);
		let a = b.build(s0).unwrap();
		assert_eq!(Matches::new(&a).unwrap().count(), 0);
	}

	#[test]
	fn infinite_language_is_refused() {
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(true);
		b.add_transition(s0, 'a', 'a', s0).unwrap();
		let a = b.build(s0).unwrap();
		assert!(matches!(Matches::new(&a), Err(GenerexError::NonFiniteLanguage(0))));
	}
}
