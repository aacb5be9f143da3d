use crate::error::{GenerexError, Result};

/// Default probability of stopping at an accepting state during a random walk.
pub const DEFAULT_STOP_PROBABILITY: f64 = 0.3;

/// Input parameters for random sampling.
///
/// # Responsibilities
/// - Hold the length bounds of the wanted string (`min_length`, `max_length`)
/// - Hold the optional step cap of the walk (`max_steps`)
/// - Hold the stopping probability, always kept within `[0.0, 1.0]`
///
/// Lengths are counted in characters, not bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleInput {
	/// Minimum length before the walk may stop at an accepting state.
	pub min_length: usize,

	/// The walk stops as soon as it reaches an accepting state at this length.
	/// `None` means unbounded.
	pub max_length: Option<usize>,

	/// Maximum number of characters drawn before giving up.
	/// `None` (the default) lets the walk run until it stops on its own.
	pub max_steps: Option<usize>,

	/// Probability of stopping at an accepting state once `min_length` is reached.
	stop_probability: f64,
}

impl Default for SampleInput {
	fn default() -> Self {
		Self {
			min_length: 0,
			max_length: None,
			max_steps: None,
			stop_probability: DEFAULT_STOP_PROBABILITY,
		}
	}
}

impl SampleInput {
	/// Creates an input with the given length bounds and default settings.
	pub fn between(min_length: usize, max_length: Option<usize>) -> Self {
		Self { min_length, max_length, ..Self::default() }
	}

	/// Returns the current stopping probability.
	pub fn stop_probability(&self) -> f64 {
		self.stop_probability
	}

	/// Sets the stopping probability (0.0..=1.0).
	///
	/// `0.0` only stops at `max_length` (or a state without transitions),
	/// `1.0` stops at the first accepting state past `min_length`.
	///
	/// # Errors
	/// Returns `InvalidInput` if the value is outside the valid range.
	pub fn set_stop_probability(&mut self, stop_probability: f64) -> Result<()> {
		if !(0.0..=1.0).contains(&stop_probability) {
			return Err(GenerexError::InvalidInput(format!(
				"Stop probability must be between 0.0 and 1.0, got {}",
				stop_probability
			)));
		}
		self.stop_probability = stop_probability;
		Ok(())
	}

	/// Checks that the bounds are consistent.
	///
	/// # Errors
	/// Returns `InvalidInput` if `min_length > max_length`.
	pub fn validate(&self) -> Result<()> {
		if let Some(max_length) = self.max_length {
			if self.min_length > max_length {
				return Err(GenerexError::InvalidInput(format!(
					"min_length ({}) is greater than max_length ({})",
					self.min_length, max_length
				)));
			}
		}
		Ok(())
	}
}
