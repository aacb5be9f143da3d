//! Pattern compilation.
//!
//! Parses a pattern with `regex-syntax`, builds a Thompson NFA over character
//! ranges, then determinizes it with a subset construction. The resulting
//! `Automaton` matches whole strings: there is no implicit `.*` around the
//! pattern, and anchors or other look-around assertions are rejected.

use std::collections::{BTreeSet, HashMap, VecDeque};

use regex_syntax::ParserBuilder;
use regex_syntax::hir::{Class, Hir, HirKind};

use crate::error::{GenerexError, Result};
use crate::model::automaton::{Automaton, AutomatonBuilder};
use crate::model::state::{StateId, next_char};

/// Upper bound on NFA states, large counted repetitions blow up quickly.
pub const MAX_NFA_STATES: usize = 100_000;

/// Upper bound on DFA states produced by the subset construction.
pub const MAX_DFA_STATES: usize = 10_000;

/// Compiles `pattern` into a deterministic automaton.
///
/// # Errors
/// - `InvalidPattern` if the pattern does not parse
/// - `UnsupportedPattern` for look-around assertions and non-ASCII byte classes
/// - `PatternTooLarge` if a state cap is exceeded
pub fn compile(pattern: &str) -> Result<Automaton> {
	let hir = ParserBuilder::new()
		.build()
		.parse(pattern)
		.map_err(|e| GenerexError::InvalidPattern(e.to_string()))?;

	let mut nfa = Nfa::default();
	let accept = nfa.add(true)?;
	let start = nfa.compile(&hir, accept)?;
	let automaton = nfa.determinize(start)?;
	log::debug!(
		"Compiled {:?}: {} NFA states, {} DFA states",
		pattern,
		nfa.states.len(),
		automaton.len()
	);
	Ok(automaton)
}

#[derive(Debug, Default)]
struct NfaState {
	accept: bool,
	epsilons: Vec<usize>,
	ranges: Vec<(char, char, usize)>,
}

/// Thompson NFA, built backwards: each fragment is compiled knowing the state
/// it must lead to.
#[derive(Debug, Default)]
struct Nfa {
	states: Vec<NfaState>,
}

impl Nfa {
	fn add(&mut self, accept: bool) -> Result<usize> {
		if self.states.len() >= MAX_NFA_STATES {
			return Err(GenerexError::PatternTooLarge(MAX_NFA_STATES));
		}
		self.states.push(NfaState { accept, ..NfaState::default() });
		Ok(self.states.len() - 1)
	}

	fn add_ranges(&mut self, ranges: Vec<(char, char)>, next: usize) -> Result<usize> {
		let id = self.add(false)?;
		self.states[id].ranges = ranges.into_iter().map(|(min, max)| (min, max, next)).collect();
		Ok(id)
	}

	fn add_split(&mut self, targets: Vec<usize>) -> Result<usize> {
		let id = self.add(false)?;
		self.states[id].epsilons = targets;
		Ok(id)
	}

	/// Compiles `hir` so that it ends in `next`, returns its entry state.
	fn compile(&mut self, hir: &Hir, next: usize) -> Result<usize> {
		match hir.kind() {
			HirKind::Empty => Ok(next),
			HirKind::Literal(literal) => {
				let text = std::str::from_utf8(&literal.0).map_err(|_| {
					GenerexError::UnsupportedPattern("literal is not valid UTF-8".to_owned())
				})?;
				let mut entry = next;
				for c in text.chars().rev() {
					entry = self.add_ranges(vec![(c, c)], entry)?;
				}
				Ok(entry)
			}
			HirKind::Class(class) => {
				let ranges = class_ranges(class)?;
				if ranges.is_empty() {
					// Matches nothing: a state without way out
					return self.add(false);
				}
				self.add_ranges(ranges, next)
			}
			HirKind::Look(look) => Err(GenerexError::UnsupportedPattern(format!(
				"look-around assertion {:?}",
				look
			))),
			HirKind::Capture(capture) => self.compile(&capture.sub, next),
			HirKind::Concat(subs) => {
				let mut entry = next;
				for sub in subs.iter().rev() {
					entry = self.compile(sub, entry)?;
				}
				Ok(entry)
			}
			HirKind::Alternation(subs) => {
				let mut targets = Vec::with_capacity(subs.len());
				for sub in subs {
					targets.push(self.compile(sub, next)?);
				}
				self.add_split(targets)
			}
			HirKind::Repetition(repetition) => {
				let mut entry = match repetition.max {
					None => {
						// Loop: the split state either runs the body again or leaves
						let split = self.add(false)?;
						let body = self.compile(&repetition.sub, split)?;
						self.states[split].epsilons = vec![body, next];
						split
					}
					Some(max) => {
						let mut entry = next;
						for _ in repetition.min..max {
							let body = self.compile(&repetition.sub, entry)?;
							entry = self.add_split(vec![body, next])?;
						}
						entry
					}
				};
				for _ in 0..repetition.min {
					entry = self.compile(&repetition.sub, entry)?;
				}
				Ok(entry)
			}
		}
	}

	/// Epsilon closure of `seeds`, as a sorted set.
	fn closure(&self, seeds: impl IntoIterator<Item = usize>) -> Vec<usize> {
		let mut seen: BTreeSet<usize> = BTreeSet::new();
		let mut stack: Vec<usize> = seeds.into_iter().collect();
		while let Some(id) = stack.pop() {
			if seen.insert(id) {
				stack.extend(self.states[id].epsilons.iter().copied());
			}
		}
		seen.into_iter().collect()
	}

	/// Subset construction.
	///
	/// The outgoing ranges of a DFA state are split at every range boundary
	/// of its NFA members, so each elementary interval has a single target
	/// set. Adjacent intervals with the same target are merged back.
	fn determinize(&self, start: usize) -> Result<Automaton> {
		let mut builder = AutomatonBuilder::new();
		let mut ids: HashMap<Vec<usize>, StateId> = HashMap::new();
		let mut queue: VecDeque<Vec<usize>> = VecDeque::new();

		let start_set = self.closure([start]);
		let initial = builder.add_state(self.is_accepting(&start_set));
		ids.insert(start_set.clone(), initial);
		queue.push_back(start_set);

		while let Some(set) = queue.pop_front() {
			let from = ids[&set];
			let ranges: Vec<(char, char, usize)> = set
				.iter()
				.flat_map(|&id| self.states[id].ranges.iter().copied())
				.collect();

			let mut bounds: Vec<u32> = Vec::with_capacity(ranges.len() * 2);
			for &(min, max, _) in &ranges {
				bounds.push(min as u32);
				bounds.push(max as u32 + 1);
			}
			bounds.sort_unstable();
			bounds.dedup();

			let mut edges: Vec<(char, char, StateId)> = Vec::new();
			for window in bounds.windows(2) {
				let Some((lo, hi)) = clamp_to_chars(window[0], window[1] - 1) else {
					continue;
				};
				let targets: Vec<usize> = ranges
					.iter()
					.filter(|(min, max, _)| *min <= lo && hi <= *max)
					.map(|&(_, _, to)| to)
					.collect();
				if targets.is_empty() {
					continue;
				}

				let target_set = self.closure(targets);
				let to = match ids.get(&target_set) {
					Some(&to) => to,
					None => {
						if ids.len() >= MAX_DFA_STATES {
							return Err(GenerexError::PatternTooLarge(MAX_DFA_STATES));
						}
						let to = builder.add_state(self.is_accepting(&target_set));
						ids.insert(target_set.clone(), to);
						queue.push_back(target_set);
						to
					}
				};

				match edges.last_mut() {
					Some(last) if last.2 == to && next_char(last.1) == Some(lo) => last.1 = hi,
					_ => edges.push((lo, hi, to)),
				}
			}

			for (min, max, to) in edges {
				builder.add_transition(from, min, max, to)?;
			}
		}

		builder.build(initial)
	}

	fn is_accepting(&self, set: &[usize]) -> bool {
		set.iter().any(|&id| self.states[id].accept)
	}
}

/// Converts a code point interval to `char` bounds, trimming the surrogate gap.
fn clamp_to_chars(lo: u32, hi: u32) -> Option<(char, char)> {
	let lo = if (0xD800..=0xDFFF).contains(&lo) { 0xE000 } else { lo };
	let hi = if (0xD800..=0xDFFF).contains(&hi) { 0xD7FF } else { hi };
	if lo > hi {
		return None;
	}
	Some((char::from_u32(lo)?, char::from_u32(hi)?))
}

fn class_ranges(class: &Class) -> Result<Vec<(char, char)>> {
	match class {
		Class::Unicode(unicode) => Ok(unicode.iter().map(|r| (r.start(), r.end())).collect()),
		Class::Bytes(bytes) => bytes
			.iter()
			.map(|r| {
				if r.end() > 0x7F {
					Err(GenerexError::UnsupportedPattern(
						"byte class outside ASCII".to_owned(),
					))
				} else {
					Ok((char::from(r.start()), char::from(r.end())))
				}
			})
			.collect(),
	}
}
