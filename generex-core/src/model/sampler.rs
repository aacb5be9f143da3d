use rand::Rng;
use rand::prelude::IteratorRandom;

use super::automaton::Automaton;
use super::state::StateId;
use super::sample_input::SampleInput;
use crate::error::{GenerexError, Result};

/// Per-state bounds on the remaining length to acceptance.
///
/// `shortest` is `Automaton::accept_distances`, `longest` is
/// `Automaton::longest_accept_distances`.
#[derive(Clone, Debug)]
pub(crate) struct Reach {
	pub(crate) shortest: Vec<Option<usize>>,
	pub(crate) longest: Vec<Option<usize>>,
}

impl Reach {
	pub(crate) fn new(automaton: &Automaton) -> Self {
		Self {
			shortest: automaton.accept_distances(),
			longest: automaton.longest_accept_distances(),
		}
	}

	pub(crate) fn is_live(&self, id: StateId) -> bool {
		self.shortest[id].is_some()
	}

	/// Tells whether `id` can still accept within `at_most` more characters.
	fn fits_below(&self, id: StateId, at_most: usize) -> bool {
		self.shortest[id].is_some_and(|shortest| shortest <= at_most)
	}

	/// Tells whether `id` can still accept after at least `at_least` more characters.
	fn fits_above(&self, id: StateId, at_least: usize) -> bool {
		match self.longest[id] {
			Some(longest) => longest >= at_least,
			None => self.is_live(id),
		}
	}
}

/// Draws one random string by walking the automaton.
///
/// The walk never needs global counts, so it works on infinite languages too.
///
/// # Behavior
/// From the initial state, repeatedly:
/// - At an accepting state, stop if the length equals `max_length`, otherwise
///   stop with `stop_probability` once the length is at least `min_length`.
/// - At a state without live transitions, stop with the current string.
/// - Otherwise pick a transition uniformly, then a character of its range
///   uniformly, and move on. Candidates are the transitions that can still
///   reach an accepting state within `[min_length, max_length]`, then those
///   that can still meet `max_length`, then any live one.
///
/// Termination is probabilistic unless `max_steps` is set.
///
/// # Errors
/// - `InvalidInput` if the bounds are inconsistent
/// - `EmptyLanguage` if the initial state cannot reach an accepting state
/// - `StepLimitExceeded` if `max_steps` characters were drawn without stopping
pub(crate) fn random_walk<R: Rng + ?Sized>(
	automaton: &Automaton,
	reach: &Reach,
	input: &SampleInput,
	rng: &mut R,
) -> Result<String> {
	input.validate()?;

	let mut current = automaton.initial();
	if !reach.is_live(current) {
		return Err(GenerexError::EmptyLanguage);
	}

	let mut word = String::new();
	let mut length: usize = 0;
	loop {
		let state = automaton.state(current);
		if state.is_accept() {
			if input.max_length == Some(length) {
				break;
			}
			if length >= input.min_length && rng.random_bool(input.stop_probability()) {
				break;
			}
		}

		// Characters still allowed and still needed once this step is taken
		let below = |to: StateId| match input.max_length {
			Some(max) => max
				.checked_sub(length + 1)
				.is_some_and(|at_most| reach.fits_below(to, at_most)),
			None => reach.is_live(to),
		};
		let at_least = input.min_length.saturating_sub(length + 1);
		let transitions = state.transitions();
		let mut transition = transitions
			.iter()
			.filter(|t| below(t.to) && reach.fits_above(t.to, at_least))
			.choose(rng);
		if transition.is_none() {
			transition = transitions.iter().filter(|t| below(t.to)).choose(rng);
		}
		if transition.is_none() {
			transition = transitions.iter().filter(|t| reach.is_live(t.to)).choose(rng);
		}
		let Some(t) = transition else {
			// Accepting state without continuation, the string is final
			break;
		};

		if let Some(limit) = input.max_steps {
			if length >= limit {
				log::warn!("Random walk gave up after {} steps", limit);
				return Err(GenerexError::StepLimitExceeded(limit));
			}
		}

		let c = t.random_char(rng);
		log::trace!("Step {}: state {} -> {} on {:?}", length, current, t.to, c);
		word.push(c);
		length += 1;
		current = t.to;
	}
	Ok(word)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::automaton::AutomatonBuilder;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	/// a*
	fn star() -> Automaton {
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(true);
		b.add_transition(s0, 'a', 'a', s0).unwrap();
		b.build(s0).unwrap()
	}

	#[test]
	fn respects_length_bounds() {
		let a = star();
		let reach = Reach::new(&a);
		let mut rng = StdRng::seed_from_u64(42);
		let input = SampleInput::between(2, Some(5));
		for _ in 0..200 {
			let word = random_walk(&a, &reach, &input, &mut rng).unwrap();
			assert!((2..=5).contains(&word.len()), "{:?}", word);
			assert!(word.chars().all(|c| c == 'a'));
		}
	}

	#[test]
	fn same_seed_same_string() {
		let a = star();
		let reach = Reach::new(&a);
		let input = SampleInput::default();
		let first = random_walk(&a, &reach, &input, &mut StdRng::seed_from_u64(3)).unwrap();
		let second = random_walk(&a, &reach, &input, &mut StdRng::seed_from_u64(3)).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn never_enters_dead_states() {
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(false);
		let dead = b.add_state(false);
		let ok = b.add_state(true);
		b.add_transition(s0, 'a', 'a', dead).unwrap();
		b.add_transition(s0, 'b', 'b', ok).unwrap();
		let a = b.build(s0).unwrap();
		let reach = Reach::new(&a);
		let mut rng = StdRng::seed_from_u64(1);
		for _ in 0..50 {
			let word = random_walk(&a, &reach, &SampleInput::default(), &mut rng).unwrap();
			assert_eq!(word, "b");
		}
	}

	#[test]
	fn prefers_branches_that_fit_max_length() {
		// ab*c | d: with max_length 1 only "d" fits
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(false);
		let s1 = b.add_state(false);
		let end = b.add_state(true);
		b.add_transition(s0, 'a', 'a', s1).unwrap();
		b.add_transition(s0, 'd', 'd', end).unwrap();
		b.add_transition(s1, 'b', 'b', s1).unwrap();
		b.add_transition(s1, 'c', 'c', end).unwrap();
		let a = b.build(s0).unwrap();
		let reach = Reach::new(&a);
		let mut rng = StdRng::seed_from_u64(5);
		let input = SampleInput::between(0, Some(1));
		for _ in 0..50 {
			assert_eq!(random_walk(&a, &reach, &input, &mut rng).unwrap(), "d");
		}
		let input = SampleInput::between(0, Some(4));
		for _ in 0..50 {
			let word = random_walk(&a, &reach, &input, &mut rng).unwrap();
			assert!(word.len() <= 4 && a.accepts(&word), "{:?}", word);
		}
	}

	#[test]
	fn prefers_branches_that_fit_min_length() {
		// a | bcd: with min_length 3 only "bcd" fits
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(false);
		let short = b.add_state(true);
		let s2 = b.add_state(false);
		let s3 = b.add_state(false);
		let long = b.add_state(true);
		b.add_transition(s0, 'a', 'a', short).unwrap();
		b.add_transition(s0, 'b', 'b', s2).unwrap();
		b.add_transition(s2, 'c', 'c', s3).unwrap();
		b.add_transition(s3, 'd', 'd', long).unwrap();
		let a = b.build(s0).unwrap();
		let reach = Reach::new(&a);
		let mut rng = StdRng::seed_from_u64(8);
		for input in [SampleInput::between(3, Some(3)), SampleInput::between(2, None)] {
			for _ in 0..50 {
				assert_eq!(random_walk(&a, &reach, &input, &mut rng).unwrap(), "bcd");
			}
		}
	}

	#[test]
	fn empty_language_is_an_error() {
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(false);
		let a = b.build(s0).unwrap();
		let reach = Reach::new(&a);
		let result = random_walk(&a, &reach, &SampleInput::default(), &mut StdRng::seed_from_u64(1));
		assert_eq!(result, Err(GenerexError::EmptyLanguage));
	}

	#[test]
	fn step_cap_stops_runaway_walks() {
		let a = star();
		let reach = Reach::new(&a);
		let mut input = SampleInput::default();
		input.set_stop_probability(0.0).unwrap();
		input.max_steps = Some(10);
		let result = random_walk(&a, &reach, &input, &mut StdRng::seed_from_u64(9));
		assert_eq!(result, Err(GenerexError::StepLimitExceeded(10)));
	}

	#[test]
	fn reversed_bounds_are_rejected() {
		let a = star();
		let reach = Reach::new(&a);
		let input = SampleInput::between(4, Some(1));
		let result = random_walk(&a, &reach, &input, &mut StdRng::seed_from_u64(1));
		assert!(matches!(result, Err(GenerexError::InvalidInput(_))));
	}
}
