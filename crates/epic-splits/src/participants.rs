use std::borrow::Borrow;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SplitError};

/// Participants are numbered P01 to P31 in the kitchens recordings.
pub const TOTAL_PARTICIPANTS: u8 = 31;
/// Participants without usable training footage.
pub const UNAVAILABLE_PARTICIPANTS: [u8; 3] = [9, 11, 18];
pub const EXPECTED_PARTICIPANTS: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticipantId(String);

impl ParticipantId {
	pub fn from_index(index: u8) -> Self {
		Self(format!("P{:02}", index))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for ParticipantId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

impl Borrow<str> for ParticipantId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ParticipantId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
	Train,
	Val,
}

impl Split {
	pub fn as_str(&self) -> &'static str {
		match self {
			Split::Train => "train",
			Split::Val => "val",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitScheme {
	/// Positional split: the first `floor(N * train / of)` participants train.
	Baradel { train: usize, of: usize },
	/// Contiguous blocks, each held out as validation in exactly one fold.
	CrossValidation { folds: usize },
}

impl SplitScheme {
	pub fn baradel() -> Self {
		SplitScheme::Baradel { train: 26, of: 28 }
	}

	pub fn four_fold() -> Self {
		SplitScheme::CrossValidation { folds: 4 }
	}

	pub fn is_baradel(&self) -> bool {
		matches!(self, SplitScheme::Baradel { .. })
	}

	pub fn num_splits(&self) -> usize {
		match self {
			SplitScheme::Baradel { .. } => 1,
			SplitScheme::CrossValidation { folds } => *folds,
		}
	}
}

/// One fold: every participant of the universe mapped to train or val.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAssignment {
	splits: BTreeMap<ParticipantId, Split>,
}

impl SplitAssignment {
	fn from_positions<F: Fn(usize) -> Split>(participants: &[ParticipantId], split_at: F) -> Self {
		let splits = participants
			.iter()
			.enumerate()
			.map(|(i, pid)| (pid.clone(), split_at(i)))
			.collect();

		Self { splits }
	}

	pub fn split_of(&self, participant: &str) -> Option<Split> {
		self.splits.get(participant).copied()
	}

	pub fn len(&self) -> usize {
		self.splits.len()
	}

	pub fn is_empty(&self) -> bool {
		self.splits.is_empty()
	}

	pub fn participants_in(&self, split: Split) -> Vec<&ParticipantId> {
		self.splits
			.iter()
			.filter(|(_, s)| **s == split)
			.map(|(pid, _)| pid)
			.collect()
	}
}

pub fn available_participants(total: u8, unavailable: &[u8]) -> Vec<ParticipantId> {
	(1..=total)
		.filter(|i| !unavailable.contains(i))
		.map(ParticipantId::from_index)
		.collect()
}

pub fn reference_participants() -> Vec<ParticipantId> {
	available_participants(TOTAL_PARTICIPANTS, &UNAVAILABLE_PARTICIPANTS)
}

/// Partition the ordered participant universe once per split of `scheme`.
pub fn assign(participants: &[ParticipantId], scheme: SplitScheme, expected: usize) -> Result<Vec<SplitAssignment>> {
	let n = participants.len();
	if n != expected {
		return Err(SplitError::Configuration(format!(
			"expected {expected} participants, found {n}"
		)));
	}

	let unique: HashSet<&ParticipantId> = participants.iter().collect();
	if unique.len() != n {
		return Err(SplitError::Configuration(
			"participant list contains duplicates".to_string(),
		));
	}

	match scheme {
		SplitScheme::Baradel { train, of } => {
			if of == 0 || train > of {
				return Err(SplitError::Configuration(format!(
					"invalid train ratio {train}/{of}"
				)));
			}

			let cutoff = n * train / of;
			Ok(vec![SplitAssignment::from_positions(participants, |i| {
				if i < cutoff {
					Split::Train
				} else {
					Split::Val
				}
			})])
		}
		SplitScheme::CrossValidation { folds } => {
			if folds == 0 || folds > n {
				return Err(SplitError::Configuration(format!(
					"cannot build {folds} folds over {n} participants"
				)));
			}

			let bounds: Vec<usize> = (0..=folds).map(|k| k * n / folds).collect();

			let assignments = (1..=folds)
				.map(|fold| {
					let held_out = bounds[folds - fold]..bounds[folds - fold + 1];
					SplitAssignment::from_positions(participants, |i| {
						if held_out.contains(&i) {
							Split::Val
						} else {
							Split::Train
						}
					})
				})
				.collect();

			Ok(assignments)
		}
	}
}
