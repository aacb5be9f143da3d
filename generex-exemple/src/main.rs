use std::io::stdout;

use generex_core::io::write_matches;
use generex_core::{Generator, GenerexError, SampleInput};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug to see tree and cache construction
    env_logger::init();

    // Compile a pattern with a finite language
    let generator = Generator::new("[a-c]{2}(x|yz)?")?;

    // Exact number of matching strings
    let size = generator.matched_strings_size()?;
    println!("{} strings match", size);

    // Lookup by lexicographic index (1-based)
    println!("First match: {}", generator.get_first_match()?);
    println!("Match #5: {}", generator.get_matched_string(5)?);
    println!("Last match: {}", generator.get_matched_string(size)?);

    // Past the end: empty string, or an explicit error with the checked variant
    match generator.checked_matched_string(size + 1) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("{}", e),
    }

    // Print every match, one per line
    let written = write_matches(&generator, stdout().lock())?;
    log::info!("{} lines written", written);

    // Infinite languages can only be sampled
    let infinite = Generator::new("(ab|c)+d*")?;
    match infinite.matched_strings_size() {
        Err(GenerexError::NonFiniteLanguage(state)) => println!("Infinite language (cycle through state {})", state),
        other => println!("Should not happen: {:?}", other),
    }

    // Length bounds are counted in characters
    let mut input = SampleInput::between(3, Some(8));

    // Probability of stopping at an accepting state (must be between 0.0 and 1.0)
    input.set_stop_probability(0.5)?;
    match input.set_stop_probability(2.0) {
        Ok(_) => println!("Should not happen"),
        Err(_) => println!("Stop probability 2.0 is invalid, must be between 0.0 and 1.0"),
    }

    // Hard cap on the walk, unbounded by default
    input.max_steps = Some(1_000);

    for i in 0..5 {
        println!("Sampled word {}: {}", i + 1, infinite.sample(&input)?);
    }

    // Reproducible parallel batch
    for word in infinite.sample_batch(&input, 10, Some(42))? {
        println!("Batch: {}", word);
    }

    Ok(())
}
