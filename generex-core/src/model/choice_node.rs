use std::fmt;

use super::automaton::Automaton;
use super::state::{StateId, Transition};
use crate::error::{GenerexError, Result};

/// What a `ChoiceNode` stands for in the enumeration tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
	/// Synthetic root, one "character" that prints nothing.
	Root,
	/// End of a match at an accepting state.
	Accept,
	/// One transition: any character of the range, then the children.
	Range(Transition),
}

/// A node of the enumeration tree.
///
/// The tree unrolls the automaton from its initial state. The children of a
/// node are the continuations available after its step, in lexicographic
/// order: first the accept pseudo-node (when the reached state is accepting),
/// then one node per transition in ascending range order.
///
/// ## Invariants
/// - The tree is finite and acyclic, it owns its children exclusively
/// - `reachable_count == char_count * sum(children counts)` for inner nodes,
///   `1` for accept leaves
/// - `Range` nodes always have at least one child (dead transitions are pruned)
pub struct ChoiceNode {
	step: Step,
	children: Vec<ChoiceNode>,
	reachable_count: u128,
}

impl ChoiceNode {
	/// Builds the enumeration tree of `automaton`.
	///
	/// # Errors
	/// - `NonFiniteLanguage` if a live state is met again on the current path
	/// - `CountOverflow` if a count does not fit in a `u128`
	pub fn build(automaton: &Automaton) -> Result<Self> {
		Self::build_with(automaton, &automaton.live_states())
	}

	pub(crate) fn build_with(automaton: &Automaton, live: &[bool]) -> Result<Self> {
		let root = if live[automaton.initial()] {
			Self::unroll(automaton, live)?
		} else {
			Self::with_children(Step::Root, Vec::new())?
		};
		log::debug!(
			"Built enumeration tree: {} nodes, {} matches",
			root.node_count(),
			root.reachable_count
		);
		Ok(root)
	}

	/// Unrolls the automaton from its initial state with an explicit stack.
	///
	/// Each frame gathers the children of the node under construction. A
	/// node is finished, counted and handed to its parent once all
	/// transitions of its state have been explored.
	fn unroll(automaton: &Automaton, live: &[bool]) -> Result<Self> {
		let mut on_path = vec![false; automaton.len()];
		let initial = automaton.initial();
		on_path[initial] = true;
		let mut stack = vec![Frame::new(automaton, Step::Root, initial)?];

		while let Some(frame) = stack.last_mut() {
			match automaton.state(frame.state).transitions().get(frame.next).copied() {
				Some(t) => {
					frame.next += 1;
					if !live[t.to] {
						continue;
					}
					if on_path[t.to] {
						return Err(GenerexError::NonFiniteLanguage(t.to));
					}
					on_path[t.to] = true;
					stack.push(Frame::new(automaton, Step::Range(t), t.to)?);
				}
				None => {
					let Some(done) = stack.pop() else { break };
					on_path[done.state] = false;
					let node = Self::with_children(done.step, done.children)?;
					match stack.last_mut() {
						Some(parent) => parent.children.push(node),
						None => return Ok(node),
					}
				}
			}
		}
		Self::with_children(Step::Root, Vec::new())
	}

	/// Creates a node and computes its count from its children.
	fn with_children(step: Step, children: Vec<ChoiceNode>) -> Result<Self> {
		let char_count = Self::char_count_of(step);
		let reachable_count = if step == Step::Accept {
			char_count
		} else {
			let mut sum: u128 = 0;
			for child in &children {
				sum = sum.checked_add(child.reachable_count).ok_or(GenerexError::CountOverflow)?;
			}
			sum.checked_mul(char_count).ok_or(GenerexError::CountOverflow)?
		};
		Ok(Self { step, children, reachable_count })
	}

	fn char_count_of(step: Step) -> u128 {
		match step {
			Step::Root | Step::Accept => 1,
			Step::Range(t) => t.char_count() as u128,
		}
	}

	/// Number of distinct characters this node stands for.
	pub fn char_count(&self) -> u128 {
		Self::char_count_of(self.step)
	}

	/// Exact number of matches reachable through this node.
	pub fn reachable_count(&self) -> u128 {
		self.reachable_count
	}

	pub fn children(&self) -> &[ChoiceNode] {
		&self.children
	}

	/// Total number of nodes in this subtree.
	pub fn node_count(&self) -> usize {
		let mut count = 0;
		let mut pending = vec![self];
		while let Some(node) = pending.pop() {
			count += 1;
			pending.extend(&node.children);
		}
		count
	}

	/// Returns the `index`-th match (1-based) in lexicographic order.
	///
	/// Returns `None` if `index` is `0` or greater than `reachable_count`.
	///
	/// # Behavior
	/// - Every character of a range leads to the same continuations, so each
	///   one owns `reachable_count / char_count` consecutive matches and the
	///   character is found by division.
	/// - Children are then scanned in order, skipping whole subtrees until the
	///   remaining index falls inside one.
	pub fn nth_match(&self, index: u128) -> Option<String> {
		if index == 0 || index > self.reachable_count {
			return None;
		}

		let mut word = String::new();
		let mut node = self;
		let mut index = index;
		loop {
			if let Step::Range(t) = node.step {
				let per_char = node.reachable_count / node.char_count();
				let offset = (index - 1) / per_char;
				word.push(t.nth_char(u32::try_from(offset).ok()?)?);
				index -= offset * per_char;
			}

			let mut passed: u128 = 0;
			let mut next = None;
			for child in &node.children {
				if passed + child.reachable_count >= index {
					next = Some(child);
					break;
				}
				passed += child.reachable_count;
			}
			match next {
				Some(child) => {
					index -= passed;
					node = child;
				}
				None => break,
			}
		}
		Some(word)
	}

	/// Returns the lexicographically smallest match.
	///
	/// Always follows the first child, which holds either the earliest accept
	/// or the smallest character. Returns `None` for an empty language.
	pub fn first_match(&self) -> Option<String> {
		if self.reachable_count == 0 {
			return None;
		}
		let mut word = String::new();
		let mut node = self;
		while let Some(child) = node.children.first() {
			if let Step::Range(t) = child.step {
				word.push(t.min);
			}
			node = child;
		}
		Some(word)
	}
}

impl Drop for ChoiceNode {
	/// Deep trees are released level by level instead of recursively.
	fn drop(&mut self) {
		let mut pending = std::mem::take(&mut self.children);
		while let Some(mut node) = pending.pop() {
			pending.append(&mut node.children);
		}
	}
}

impl fmt::Debug for ChoiceNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ChoiceNode")
			.field("step", &self.step)
			.field("children", &self.children.len())
			.field("reachable_count", &self.reachable_count)
			.finish()
	}
}

/// A node of the enumeration tree whose children are still being gathered.
struct Frame {
	step: Step,
	state: StateId,
	/// Index of the next transition of `state` to explore
	next: usize,
	children: Vec<ChoiceNode>,
}

impl Frame {
	fn new(automaton: &Automaton, step: Step, state: StateId) -> Result<Self> {
		let current = automaton.state(state);
		let mut children = Vec::with_capacity(current.transitions().len() + 1);
		if current.is_accept() {
			children.push(ChoiceNode::with_children(Step::Accept, Vec::new())?);
		}
		Ok(Self { step, state, next: 0, children })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::automaton::AutomatonBuilder;

	/// a?b
	fn optional_prefix() -> Automaton {
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(false);
		let s1 = b.add_state(false);
		let s2 = b.add_state(true);
		b.add_transition(s0, 'a', 'a', s1).unwrap();
		b.add_transition(s0, 'b', 'b', s2).unwrap();
		b.add_transition(s1, 'b', 'b', s2).unwrap();
		b.build(s0).unwrap()
	}

	#[test]
	fn counts_propagate_bottom_up() {
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(true);
		let s1 = b.add_state(true);
		let s2 = b.add_state(true);
		b.add_transition(s0, 'a', 'c', s1).unwrap();
		b.add_transition(s1, '0', '9', s2).unwrap();
		let root = ChoiceNode::build(&b.build(s0).unwrap()).unwrap();
		// "", 3 one-char words, 30 two-char words
		assert_eq!(root.reachable_count(), 34);
		assert_eq!(root.children().len(), 2);
		assert_eq!(root.children()[1].reachable_count(), 33);
	}

	#[test]
	fn nth_match_follows_lexicographic_order() {
		let root = ChoiceNode::build(&optional_prefix()).unwrap();
		assert_eq!(root.reachable_count(), 2);
		assert_eq!(root.nth_match(1).as_deref(), Some("ab"));
		assert_eq!(root.nth_match(2).as_deref(), Some("b"));
		assert_eq!(root.nth_match(0), None);
		assert_eq!(root.nth_match(3), None);
	}

	#[test]
	fn empty_string_sorts_first() {
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(true);
		let s1 = b.add_state(true);
		b.add_transition(s0, 'x', 'y', s1).unwrap();
		let root = ChoiceNode::build(&b.build(s0).unwrap()).unwrap();
		assert_eq!(root.nth_match(1).as_deref(), Some(""));
		assert_eq!(root.nth_match(2).as_deref(), Some("x"));
		assert_eq!(root.nth_match(3).as_deref(), Some("y"));
		assert_eq!(root.first_match().as_deref(), Some(""));
	}

	#[test]
	fn first_match_takes_smallest_branch() {
		let root = ChoiceNode::build(&optional_prefix()).unwrap();
		assert_eq!(root.first_match().as_deref(), Some("ab"));
	}

	#[test]
	fn cycle_is_reported() {
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(false);
		let s1 = b.add_state(true);
		b.add_transition(s0, 'a', 'a', s1).unwrap();
		b.add_transition(s1, 'a', 'a', s0).unwrap();
		let result = ChoiceNode::build(&b.build(s0).unwrap());
		assert!(matches!(result, Err(GenerexError::NonFiniteLanguage(_))));
	}

	#[test]
	fn dead_transitions_are_pruned() {
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(false);
		let ok = b.add_state(true);
		let dead = b.add_state(false);
		b.add_transition(s0, 'a', 'a', dead).unwrap();
		b.add_transition(s0, 'b', 'b', ok).unwrap();
		let root = ChoiceNode::build(&b.build(s0).unwrap()).unwrap();
		assert_eq!(root.reachable_count(), 1);
		assert_eq!(root.first_match().as_deref(), Some("b"));
	}

	#[test]
	fn empty_language_has_no_match() {
		let mut b = AutomatonBuilder::new();
		let s0 = b.add_state(false);
		let root = ChoiceNode::build(&b.build(s0).unwrap()).unwrap();
		assert_eq!(root.reachable_count(), 0);
		assert_eq!(root.first_match(), None);
		assert_eq!(root.nth_match(1), None);
	}

	#[test]
	fn overflow_is_detected() {
		let mut b = AutomatonBuilder::new();
		let mut previous = b.add_state(false);
		let initial = previous;
		for i in 0..7 {
			let next = b.add_state(i == 6);
			b.add_transition(previous, '\0', char::MAX, next).unwrap();
			previous = next;
		}
		let result = ChoiceNode::build(&b.build(initial).unwrap());
		assert_eq!(result.err(), Some(GenerexError::CountOverflow));
	}

	#[test]
	fn long_chain_is_built_without_recursion() {
		let mut b = AutomatonBuilder::new();
		let initial = b.add_state(false);
		let mut previous = initial;
		for i in 1..100_000 {
			let next = b.add_state(i == 99_999);
			b.add_transition(previous, 'a', 'a', next).unwrap();
			previous = next;
		}
		let root = ChoiceNode::build(&b.build(initial).unwrap()).unwrap();
		// Root, one range node per transition, the final accept leaf
		assert_eq!(root.node_count(), 100_001);
		assert_eq!(root.reachable_count(), 1);
		assert_eq!(root.first_match().map(|w| w.len()), Some(99_999));
		assert_eq!(root.nth_match(1), root.first_match());
	}
}
