//! Pure sequence and map diffing.
//!
//! [`diff_slices`] converts one ordered sequence into another through a minimal operation
//! sequence (add/remove/move/no-op); the patch engine replays such a sequence against the render
//! surface to reconcile child lists. [`apply_ops`] replays a sequence against plain slices and is
//! the primary correctness oracle for the fuzz tests. [`diff_maps`] is the shallow key/value diff
//! underlying attribute and style patching.

use hashbrown::HashMap;
use std::hash::BuildHasher;
use tracing::trace;

/// One edit in a sequence reconciliation.
///
/// `original` indexes the *old* sequence, `target` the *new* one. `source` is the position in the
/// working copy at the moment the operation applies, so replaying the operations in order against
/// the old sequence (insert at `target`, delete at `source`, splice `source` → `target`)
/// reproduces the new sequence exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListOp {
	Add { target: usize },
	Remove { original: usize, source: usize },
	Move { original: usize, source: usize, target: usize },
	Noop { original: usize, target: usize },
}

/// Working-copy entries remember where an item came from, since additions splice new-sequence
/// items in alongside the remaining old ones.
#[derive(Clone, Copy, Debug)]
enum Src {
	Old(usize),
	New(usize),
}

/// Computes the edit sequence turning `old` into `new` under `eq`.
///
/// Single left-to-right pass over the new sequence against a working copy of the old one. When
/// several equal items are candidates, the earliest unconsumed occurrence wins, which keeps the
/// result deterministic and avoids spurious moves. An item vanishing while a different item
/// appears at the same position is reported as remove-then-add, never as an implicit replace.
///
/// O(n·m) worst case; reconciled lists are expected to be small to moderate.
pub fn diff_slices<T, F: Fn(&T, &T) -> bool>(old: &[T], new: &[T], eq: F) -> Vec<ListOp> {
	let mut work: Vec<Src> = (0..old.len()).map(Src::Old).collect();
	let mut ops = Vec::with_capacity(new.len());

	let resolve = |src: &Src| -> &T {
		match *src {
			Src::Old(j) => &old[j],
			Src::New(k) => &new[k],
		}
	};

	let mut i = 0;
	while i < new.len() {
		if i >= work.len() {
			// Nothing left of the old sequence here; everything further is an addition.
			ops.push(ListOp::Add { target: i });
			work.push(Src::New(i));
			i += 1;
			continue;
		}

		// Entries at or after `i` are always unconsumed old items: additions and moves splice
		// into position `i` and immediately advance past it.
		let Src::Old(j) = work[i] else {
			unreachable!("unconsumed working-copy entry originated from the new sequence")
		};

		if !new.iter().any(|n| eq(&old[j], n)) {
			// No match anywhere in the new sequence: remove and re-examine this position.
			ops.push(ListOp::Remove { original: j, source: i });
			work.remove(i);
			continue;
		}

		if eq(&old[j], &new[i]) {
			ops.push(ListOp::Noop { original: j, target: i });
			i += 1;
			continue;
		}

		match (i..work.len()).find(|&p| eq(resolve(&work[p]), &new[i])) {
			None => {
				// Consumed earlier or genuinely new: an addition either way.
				ops.push(ListOp::Add { target: i });
				work.insert(i, Src::New(i));
			}
			Some(p) => {
				let Src::Old(original) = work[p] else {
					unreachable!("unconsumed working-copy entry originated from the new sequence")
				};
				ops.push(ListOp::Move { original, source: p, target: i });
				let entry = work.remove(p);
				work.insert(i, entry);
			}
		}
		i += 1;
	}

	while work.len() > new.len() {
		match work.remove(new.len()) {
			Src::Old(j) => ops.push(ListOp::Remove { original: j, source: new.len() }),
			Src::New(_) => unreachable!("trailing working-copy entry originated from the new sequence"),
		}
	}

	trace!("diffed {} -> {} items into {} ops", old.len(), new.len(), ops.len());
	ops
}

/// Replays `ops` against `old`, resolving added items through `new`.
///
/// The result must equal `new` element-for-element; this is the correctness oracle the diff tests
/// assert against.
#[must_use]
pub fn apply_ops<T: Clone>(old: &[T], new: &[T], ops: &[ListOp]) -> Vec<T> {
	let mut sequence = old.to_vec();
	for op in ops {
		match *op {
			ListOp::Add { target } => sequence.insert(target, new[target].clone()),
			ListOp::Remove { source, .. } => {
				sequence.remove(source);
			}
			ListOp::Move { source, target, .. } => {
				let item = sequence.remove(source);
				sequence.insert(target, item);
			}
			ListOp::Noop { .. } => {}
		}
	}
	sequence
}

/// A shallow delta between two key/value mappings. Output is sorted by key so downstream
/// application (and tests) are deterministic.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MapDelta<'a, V> {
	pub added: Vec<(&'a str, &'a V)>,
	pub removed: Vec<&'a str>,
	pub changed: Vec<(&'a str, &'a V)>,
}

/// Computes which keys were added, removed or had their value changed (shallow equality).
pub fn diff_maps<'a, V: PartialEq, H1: BuildHasher, H2: BuildHasher>(
	old: &'a HashMap<String, V, H1>,
	new: &'a HashMap<String, V, H2>,
) -> MapDelta<'a, V> {
	let mut delta = MapDelta {
		added: Vec::new(),
		removed: Vec::new(),
		changed: Vec::new(),
	};
	for (key, value) in new {
		match old.get(key) {
			None => delta.added.push((key.as_str(), value)),
			Some(previous) if previous != value => delta.changed.push((key.as_str(), value)),
			Some(_) => {}
		}
	}
	for key in old.keys() {
		if !new.contains_key(key) {
			delta.removed.push(key.as_str());
		}
	}
	delta.added.sort_unstable_by_key(|&(k, _)| k);
	delta.removed.sort_unstable();
	delta.changed.sort_unstable_by_key(|&(k, _)| k);
	delta
}
