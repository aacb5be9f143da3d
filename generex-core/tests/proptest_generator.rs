//! Property-based tests over randomly assembled finite patterns.

use generex_core::{Generator, SampleInput};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

// Pieces whose concatenation always denotes a small finite language
fn pattern_strategy() -> impl Strategy<Value = String> {
	let piece = prop::sample::select(vec![
		"a", "b", "[b-d]", "(a|bc)", "x?", "(ab)?", "[0-2]{1,2}", "(|z)", "[a-c]d?",
	]);
	prop::collection::vec(piece, 1..=3).prop_map(|pieces| pieces.concat())
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	/// Property: the count equals the length of the full enumeration
	#[test]
	fn prop_size_matches_enumeration(pattern in pattern_strategy()) {
		let generator = Generator::new(&pattern).unwrap();
		let all = generator.get_all_matched_strings().unwrap();
		prop_assert_eq!(generator.matched_strings_size().unwrap(), all.len() as u128);
	}

	/// Property: the enumeration is strictly ascending and every entry is accepted
	#[test]
	fn prop_enumeration_strictly_ascending(pattern in pattern_strategy()) {
		let generator = Generator::new(&pattern).unwrap();
		let all = generator.get_all_matched_strings().unwrap();
		for pair in all.windows(2) {
			prop_assert!(pair[0] < pair[1], "{:?} !< {:?}", pair[0], pair[1]);
		}
		for word in all {
			prop_assert!(generator.automaton().accepts(word));
		}
	}

	/// Property: the k-th string is the k-th entry of the enumeration
	#[test]
	fn prop_indexed_lookup_agrees(pattern in pattern_strategy()) {
		let generator = Generator::new(&pattern).unwrap();
		let all = generator.get_all_matched_strings().unwrap();
		for (i, expected) in all.iter().enumerate() {
			prop_assert_eq!(&generator.get_matched_string(i as u128 + 1).unwrap(), expected);
		}
		prop_assert_eq!(&generator.get_first_match().unwrap(), &all[0]);
	}

	/// Property: samples are accepted and respect feasible length bounds
	#[test]
	fn prop_samples_are_matches(pattern in pattern_strategy(), seed in any::<u64>()) {
		let generator = Generator::new(&pattern).unwrap();
		let all = generator.get_all_matched_strings().unwrap();
		let longest = all.iter().map(|w| w.chars().count()).max().unwrap();

		let mut rng = StdRng::seed_from_u64(seed);
		let word = generator.sample_with(&SampleInput::default(), &mut rng).unwrap();
		prop_assert!(generator.automaton().accepts(&word));

		// The longest match is always reachable, so both bounds are met
		let input = SampleInput::between(longest, Some(longest));
		let word = generator.sample_with(&input, &mut rng).unwrap();
		prop_assert!(generator.automaton().accepts(&word));
		prop_assert_eq!(word.chars().count(), longest);
	}
}
