use std::path::Path;
use std::sync::OnceLock;
use std::sync::mpsc;
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::compile;
use crate::error::{GenerexError, Result};
use crate::io;
use crate::model::automaton::Automaton;
use crate::model::choice_node::ChoiceNode;
use crate::model::enumerator::Matches;
use crate::model::sample_input::SampleInput;
use crate::model::sampler::{self, Reach};

/// High-level interface over one automaton.
///
/// # Responsibilities
/// - Count the accepted strings and map a 1-based index to the matching string
/// - Enumerate every accepted string in lexicographic order
/// - Draw random accepted strings, including from infinite languages
///
/// Derived data (length bounds to acceptance, enumeration tree, match list) is computed on
/// first use and kept for the lifetime of the generator. Each cache sits in a
/// `OnceLock`, so concurrent first calls build it exactly once and a
/// `Generator` can be shared between threads.
#[derive(Debug)]
pub struct Generator {
	automaton: Automaton,
	reach: OnceLock<Reach>,
	live: OnceLock<Vec<bool>>,
	tree: OnceLock<Result<ChoiceNode>>,
	matched_strings: OnceLock<Result<Vec<String>>>,
}

impl Generator {
	/// Creates a generator from a pattern.
	///
	/// # Errors
	/// Returns the compilation error if the pattern is invalid or unsupported.
	pub fn new(pattern: &str) -> Result<Self> {
		Ok(Self::from_automaton(compile::compile(pattern)?))
	}

	/// Creates a generator over an already built automaton.
	pub fn from_automaton(automaton: Automaton) -> Self {
		Self {
			automaton,
			reach: OnceLock::new(),
			live: OnceLock::new(),
			tree: OnceLock::new(),
			matched_strings: OnceLock::new(),
		}
	}

	/// Creates a generator from an automaton file written by `io::save_automaton`.
	///
	/// # Errors
	/// Returns an error if the file cannot be read, decoded or validated.
	pub fn from_file<P: AsRef<Path>>(filepath: P) -> Result<Self> {
		Ok(Self::from_automaton(io::load_automaton(filepath)?))
	}

	pub fn automaton(&self) -> &Automaton {
		&self.automaton
	}

	/// Returns `true` if the automaton accepts finitely many strings.
	pub fn is_finite(&self) -> bool {
		self.automaton.check_finite_with(self.live()).is_ok()
	}

	fn reach(&self) -> &Reach {
		self.reach.get_or_init(|| Reach::new(&self.automaton))
	}

	fn live(&self) -> &[bool] {
		self.live.get_or_init(|| self.reach().shortest.iter().map(Option::is_some).collect())
	}

	fn tree(&self) -> Result<&ChoiceNode> {
		self.tree
			.get_or_init(|| ChoiceNode::build_with(&self.automaton, self.live()))
			.as_ref()
			.map_err(Clone::clone)
	}

	/// Returns the exact number of accepted strings.
	///
	/// # Errors
	/// - `NonFiniteLanguage` if the language is infinite
	/// - `CountOverflow` if the count does not fit in a `u128`
	pub fn matched_strings_size(&self) -> Result<u128> {
		Ok(self.tree()?.reachable_count())
	}

	/// Returns the `index`-th accepted string in lexicographic order.
	///
	/// # Parameters
	/// - `index`: 1-based position, `0` is read as `1`.
	///
	/// # Returns
	/// An empty string if `index` is past the last match. Since the empty
	/// string can itself be a match, use `checked_matched_string` to tell both
	/// cases apart.
	pub fn get_matched_string(&self, index: u128) -> Result<String> {
		match self.checked_matched_string(index) {
			Err(GenerexError::IndexOutOfRange { .. }) => Ok(String::new()),
			other => other,
		}
	}

	/// Same as `get_matched_string`, but reports an out-of-range index.
	///
	/// # Errors
	/// `IndexOutOfRange` if `index` is greater than `matched_strings_size()`,
	/// plus the errors of `matched_strings_size`.
	pub fn checked_matched_string(&self, index: u128) -> Result<String> {
		let tree = self.tree()?;
		let index = index.max(1);
		tree.nth_match(index).ok_or(GenerexError::IndexOutOfRange {
			index,
			size: tree.reachable_count(),
		})
	}

	/// Returns the lexicographically smallest accepted string.
	///
	/// # Errors
	/// `EmptyLanguage` if nothing is accepted, plus the errors of
	/// `matched_strings_size`.
	pub fn get_first_match(&self) -> Result<String> {
		self.tree()?.first_match().ok_or(GenerexError::EmptyLanguage)
	}

	/// Returns every accepted string in ascending lexicographic order.
	///
	/// The list is built by the first call and returned as-is afterwards.
	///
	/// # Errors
	/// `NonFiniteLanguage` if the language is infinite.
	pub fn get_all_matched_strings(&self) -> Result<&[String]> {
		self.matched_strings
			.get_or_init(|| {
				let matched: Vec<String> = Matches::with_live(&self.automaton, self.live())?.collect();
				log::debug!("Enumerated {} matched strings", matched.len());
				Ok(matched)
			})
			.as_ref()
			.map(Vec::as_slice)
			.map_err(Clone::clone)
	}

	/// Returns a lazy iterator over the accepted strings, in order.
	///
	/// Nothing is cached: each call walks the automaton again, which keeps
	/// memory flat for large languages.
	///
	/// # Errors
	/// `NonFiniteLanguage` if the language is infinite.
	pub fn matches(&self) -> Result<Matches<'_>> {
		Matches::with_live(&self.automaton, self.live())
	}

	/// Draws a random accepted string using the thread-local generator.
	///
	/// # Errors
	/// See `sample_with`.
	pub fn sample(&self, input: &SampleInput) -> Result<String> {
		self.sample_with(input, &mut rand::rng())
	}

	/// Draws a random accepted string between `min_length` and `max_length`
	/// characters, with default settings.
	pub fn random(&self, min_length: usize, max_length: Option<usize>) -> Result<String> {
		self.sample(&SampleInput::between(min_length, max_length))
	}

	/// Draws a random accepted string with the given random source.
	///
	/// Pass a seeded generator to get reproducible results.
	///
	/// # Errors
	/// - `InvalidInput` if `min_length > max_length`
	/// - `EmptyLanguage` if nothing is accepted
	/// - `StepLimitExceeded` if `max_steps` is reached
	pub fn sample_with<R: Rng + ?Sized>(&self, input: &SampleInput, rng: &mut R) -> Result<String> {
		sampler::random_walk(&self.automaton, self.reach(), input, rng)
	}

	/// Draws `count` random strings in parallel.
	///
	/// # Behavior
	/// - Draws one seed per string from a master `StdRng`, itself seeded with
	///   `seed` when given.
	/// - Splits the seeds into one chunk per CPU core, each worker samples its
	///   chunk with its own generators.
	/// - Chunks are reassembled in order, so a given seed always produces the
	///   same batch, whatever the number of cores.
	///
	/// # Errors
	/// Returns the first sampling error met by a worker.
	pub fn sample_batch(&self, input: &SampleInput, count: usize, seed: Option<u64>) -> Result<Vec<String>> {
		input.validate()?;
		if count == 0 {
			return Ok(Vec::new());
		}

		let mut master = match seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_rng(&mut rand::rng()),
		};
		let seeds: Vec<u64> = (0..count).map(|_| master.random()).collect();
		let workers = num_cpus::get().clamp(1, count);
		let chunk_size = count.div_ceil(workers);
		let reach = self.reach();

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for (chunk_index, chunk_seeds) in seeds.chunks(chunk_size).enumerate() {
				let tx = tx.clone();
				scope.spawn(move || {
					let chunk: Result<Vec<String>> = chunk_seeds
						.iter()
						.map(|&seed| {
							let mut rng = StdRng::seed_from_u64(seed);
							sampler::random_walk(&self.automaton, reach, input, &mut rng)
						})
						.collect();
					tx.send((chunk_index, chunk)).ok();
				});
			}
		});
		drop(tx);

		let mut chunks: Vec<(usize, Result<Vec<String>>)> = rx.iter().collect();
		chunks.sort_by_key(|(index, _)| *index);

		let mut batch = Vec::with_capacity(count);
		for (_, chunk) in chunks {
			batch.extend(chunk?);
		}
		log::debug!("Sampled a batch of {} strings on {} workers", batch.len(), workers);
		Ok(batch)
	}
}
