use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::state::{State, StateId, Transition};
use crate::error::{GenerexError, Result};

/// A deterministic finite automaton over `char` ranges.
///
/// The automaton is immutable once built. It may contain cycles, in which case
/// it accepts an infinite language: random sampling still works, counting and
/// enumeration report `NonFiniteLanguage`.
///
/// # Invariants
/// - `initial` and every transition target are valid state indices
/// - Each state's transitions are sorted by `min` and never overlap
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Automaton {
	states: Vec<State>,
	initial: StateId,
}

impl Automaton {
	/// Returns the initial state id.
	pub fn initial(&self) -> StateId {
		self.initial
	}

	/// Returns a state by id, or `None` if `id` is not a state of this automaton.
	pub fn get(&self, id: StateId) -> Option<&State> {
		self.states.get(id)
	}

	/// Returns a state by id known to be valid.
	///
	/// Every id handed out by a built or validated automaton is.
	pub(crate) fn state(&self, id: StateId) -> &State {
		&self.states[id]
	}

	pub fn states(&self) -> &[State] {
		&self.states
	}

	/// Number of states.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Runs the automaton on `input` and tells whether it ends in an accepting state.
	pub fn accepts(&self, input: &str) -> bool {
		let mut current = self.initial;
		for c in input.chars() {
			match self.states[current].step(c) {
				Some(next) => current = next,
				None => return false,
			}
		}
		self.states[current].is_accept()
	}

	/// Checks every model invariant.
	///
	/// Used after deserialization, where the data did not go through the builder.
	///
	/// # Errors
	/// Returns `InvalidAutomaton` on the first broken invariant.
	pub fn validate(&self) -> Result<()> {
		if self.initial >= self.states.len() {
			return Err(GenerexError::InvalidAutomaton(format!(
				"Initial state {} does not exist",
				self.initial
			)));
		}
		for (id, state) in self.states.iter().enumerate() {
			for t in state.transitions() {
				check_transition(id, t, self.states.len())?;
			}
			for pair in state.transitions().windows(2) {
				if pair[0].max >= pair[1].min {
					return Err(GenerexError::InvalidAutomaton(format!(
						"State {} has unsorted or overlapping transitions",
						id
					)));
				}
			}
		}
		Ok(())
	}

	/// Computes which states can still reach an accepting state.
	///
	/// Transitions into non-live states lead nowhere useful: traversals skip
	/// them, so dead branches are never counted, enumerated or sampled.
	pub fn live_states(&self) -> Vec<bool> {
		self.accept_distances().iter().map(Option::is_some).collect()
	}

	/// Length of the shortest path from each state to an accepting state.
	///
	/// `None` for states that cannot accept anymore. Computed with a
	/// breadth-first search over reversed transitions.
	pub fn accept_distances(&self) -> Vec<Option<usize>> {
		let mut predecessors: Vec<Vec<StateId>> = vec![Vec::new(); self.states.len()];
		for (id, state) in self.states.iter().enumerate() {
			for t in state.transitions() {
				predecessors[t.to].push(id);
			}
		}

		let mut distances: Vec<Option<usize>> = vec![None; self.states.len()];
		let mut queue: VecDeque<StateId> = VecDeque::new();
		for (id, state) in self.states.iter().enumerate() {
			if state.is_accept() {
				distances[id] = Some(0);
				queue.push_back(id);
			}
		}
		while let Some(id) = queue.pop_front() {
			let next = distances[id].map(|d| d + 1);
			for &previous in &predecessors[id] {
				if distances[previous].is_none() {
					distances[previous] = next;
					queue.push_back(previous);
				}
			}
		}
		distances
	}

	/// Length of the longest path from each state to an accepting state.
	///
	/// `None` when there is no bound: the state can reach a cycle of live
	/// states, or it cannot accept at all (see `accept_distances`).
	///
	/// Live states are settled in reverse topological order: a state is
	/// resolved once all its live successors are, starting from those without
	/// any. States left unresolved lead to a cycle.
	pub fn longest_accept_distances(&self) -> Vec<Option<usize>> {
		let live = self.live_states();
		let mut predecessors: Vec<Vec<StateId>> = vec![Vec::new(); self.states.len()];
		let mut pending: Vec<usize> = vec![0; self.states.len()];
		for (id, state) in self.states.iter().enumerate() {
			if !live[id] {
				continue;
			}
			for t in state.transitions() {
				if live[t.to] {
					predecessors[t.to].push(id);
					pending[id] += 1;
				}
			}
		}

		let mut longest: Vec<Option<usize>> = vec![None; self.states.len()];
		let mut queue: VecDeque<StateId> =
			(0..self.states.len()).filter(|&id| live[id] && pending[id] == 0).collect();
		while let Some(id) = queue.pop_front() {
			let state = &self.states[id];
			let mut best = state.is_accept().then_some(0);
			for t in state.transitions() {
				if let Some(d) = longest[t.to] {
					best = best.max(Some(d + 1));
				}
			}
			longest[id] = best;
			for &previous in &predecessors[id] {
				pending[previous] -= 1;
				if pending[previous] == 0 {
					queue.push_back(previous);
				}
			}
		}
		longest
	}

	/// Checks that the accepted language is finite.
	///
	/// Runs an iterative depth-first search from the initial state over live
	/// states only. A state found again while still on the current path closes
	/// a cycle that can be pumped into infinitely many matches.
	///
	/// # Errors
	/// Returns `NonFiniteLanguage` with a state of the offending cycle.
	pub fn check_finite(&self) -> Result<()> {
		self.check_finite_with(&self.live_states())
	}

	pub(crate) fn check_finite_with(&self, live: &[bool]) -> Result<()> {
		#[derive(Clone, Copy, PartialEq)]
		enum Mark {
			Unvisited,
			OnPath,
			Done,
		}

		if !live[self.initial] {
			return Ok(());
		}

		let mut marks = vec![Mark::Unvisited; self.states.len()];
		// (state, index of the next transition to explore)
		let mut stack: Vec<(StateId, usize)> = vec![(self.initial, 0)];
		marks[self.initial] = Mark::OnPath;

		while let Some((id, next)) = stack.last_mut() {
			let transitions = self.states[*id].transitions();
			match transitions.get(*next) {
				Some(t) => {
					*next += 1;
					if !live[t.to] {
						continue;
					}
					match marks[t.to] {
						Mark::OnPath => return Err(GenerexError::NonFiniteLanguage(t.to)),
						Mark::Done => (),
						Mark::Unvisited => {
							marks[t.to] = Mark::OnPath;
							stack.push((t.to, 0));
						}
					}
				}
				None => {
					marks[*id] = Mark::Done;
					stack.pop();
				}
			}
		}
		Ok(())
	}

	/// Returns `true` if the accepted language is finite.
	pub fn is_finite(&self) -> bool {
		self.check_finite().is_ok()
	}
}

fn check_transition(from: StateId, t: &Transition, len: usize) -> Result<()> {
	if t.min > t.max {
		return Err(GenerexError::InvalidAutomaton(format!(
			"State {} has a reversed range {:?}-{:?}",
			from, t.min, t.max
		)));
	}
	if t.to >= len {
		return Err(GenerexError::InvalidAutomaton(format!(
			"State {} points to unknown state {}",
			from, t.to
		)));
	}
	Ok(())
}

/// Incremental constructor for `Automaton`.
///
/// States are created first, then connected. `build` sorts every state's
/// transitions and rejects anything that would make the automaton
/// non-deterministic.
///
/// ```
/// use generex_core::AutomatonBuilder;
///
/// let mut builder = AutomatonBuilder::new();
/// let start = builder.add_state(false);
/// let end = builder.add_state(true);
/// builder.add_transition(start, 'a', 'c', end).unwrap();
/// let automaton = builder.build(start).unwrap();
/// assert!(automaton.accepts("b"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct AutomatonBuilder {
	states: Vec<State>,
}

impl AutomatonBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a state and returns its id.
	pub fn add_state(&mut self, accept: bool) -> StateId {
		self.states.push(State::new(accept));
		self.states.len() - 1
	}

	/// Adds a transition from `from` to `to` on every character of `min..=max`.
	///
	/// # Errors
	/// Returns `InvalidAutomaton` if a state does not exist or `min > max`.
	pub fn add_transition(&mut self, from: StateId, min: char, max: char, to: StateId) -> Result<()> {
		let transition = Transition::new(min, max, to);
		check_transition(from, &transition, self.states.len())?;
		match self.states.get_mut(from) {
			Some(state) => {
				state.add_transition(transition);
				Ok(())
			}
			None => Err(GenerexError::InvalidAutomaton(format!("Unknown state {}", from))),
		}
	}

	/// Finalizes the automaton.
	///
	/// # Errors
	/// Returns `InvalidAutomaton` if `initial` does not exist or if two
	/// transitions of the same state overlap.
	pub fn build(mut self, initial: StateId) -> Result<Automaton> {
		if initial >= self.states.len() {
			return Err(GenerexError::InvalidAutomaton(format!(
				"Initial state {} does not exist",
				initial
			)));
		}
		for (id, state) in self.states.iter_mut().enumerate() {
			state
				.normalize()
				.map_err(|e| GenerexError::InvalidAutomaton(format!("State {}: {}", id, e)))?;
		}
		Ok(Automaton { states: self.states, initial })
	}
}
