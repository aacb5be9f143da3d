use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::model::automaton::Automaton;
use crate::model::generator::Generator;

/// Writes an automaton to `filepath` in the compact `postcard` format.
///
/// - Creates or truncates the file
/// - The file can be read back with `load_automaton` or `Generator::from_file`
pub fn save_automaton<P: AsRef<Path>>(automaton: &Automaton, filepath: P) -> Result<()> {
	let bytes = postcard::to_stdvec(automaton)?;
	fs::write(filepath, bytes)?;
	Ok(())
}

/// Reads an automaton written by `save_automaton`.
///
/// The decoded data did not go through `AutomatonBuilder`, so every
/// invariant is checked again before it is returned.
pub fn load_automaton<P: AsRef<Path>>(filepath: P) -> Result<Automaton> {
	let bytes = fs::read(filepath)?;
	let automaton: Automaton = postcard::from_bytes(&bytes)?;
	automaton.validate()?;
	Ok(automaton)
}

/// Writes every match, one per line, in lexicographic order.
///
/// Matches are streamed from the automaton, the generator cache is neither
/// used nor filled.
///
/// Returns the number of lines written.
pub fn write_matches<W: Write>(generator: &Generator, mut writer: W) -> Result<usize> {
	let mut written = 0;
	for matched in generator.matches()? {
		writeln!(writer, "{}", matched)?;
		written += 1;
	}
	writer.flush()?;
	Ok(written)
}
