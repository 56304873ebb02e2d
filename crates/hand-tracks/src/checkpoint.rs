use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Result, TrainError};

/// Extension of burn's compact (MessagePack) records.
pub const CHECKPOINT_EXT: &str = "mpk";

/// Top-1 accuracy of an evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Top1 {
	Single(f64),
	Double { verb: f64, noun: f64 },
}

impl Top1 {
	pub fn zero(double_output: bool) -> Self {
		if double_output {
			Top1::Double { verb: 0.0, noun: 0.0 }
		} else {
			Top1::Single(0.0)
		}
	}

	fn key(&self) -> (f64, f64) {
		match self {
			Top1::Single(top1) => (*top1, 0.0),
			Top1::Double { verb, noun } => (*verb, *noun),
		}
	}

	/// Verb accuracy decides; noun accuracy only breaks ties.
	pub fn improves_on(&self, other: &Top1) -> bool {
		self.key() > other.key()
	}
}

impl fmt::Display for Top1 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Top1::Single(top1) => write!(f, "{:.3}", top1),
			Top1::Double { verb, noun } => write!(f, "verb {:.3} noun {:.3}", verb, noun),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointTag {
	Best,
	/// 1-based epoch.
	Epoch(usize),
}

pub fn checkpoint_path(output_dir: &Path, model_name: &str, tag: CheckpointTag) -> PathBuf {
	match tag {
		CheckpointTag::Best => output_dir.join(format!("{model_name}_best.{CHECKPOINT_EXT}")),
		CheckpointTag::Epoch(epoch) => output_dir.join(format!("{model_name}_epoch_{epoch}.{CHECKPOINT_EXT}")),
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointPolicy {
	pub save_all_weights: bool,
}

impl CheckpointPolicy {
	/// New best accuracy and what to save after evaluating 0-based `epoch`.
	pub fn decide(&self, best: Top1, new: Top1, epoch: usize) -> (Top1, Vec<CheckpointTag>) {
		let mut tags = Vec::new();

		if self.save_all_weights {
			tags.push(CheckpointTag::Epoch(epoch + 1));
		}

		if new.improves_on(&best) {
			tags.push(CheckpointTag::Best);
			(new, tags)
		} else {
			(best, tags)
		}
	}
}

/// Create `base/model_name`. A folder with content is only reused when
/// resuming, so a fresh run never mixes its checkpoints with an older one.
pub fn init_folders(base: &Path, model_name: &str, resume: bool) -> Result<PathBuf> {
	let output_dir = base.join(model_name);

	if !resume && output_dir.is_dir() && fs::read_dir(&output_dir)?.next().is_some() {
		return Err(TrainError::OutputExists(output_dir));
	}

	fs::create_dir_all(&output_dir)?;
	info!("Output folder: {}", output_dir.display());

	Ok(output_dir)
}

/// The checkpoint to resume from: a given 1-based epoch, or the best one.
pub fn resume_path(output_dir: &Path, model_name: &str, resume_from: Option<usize>) -> Result<PathBuf> {
	let tag = match resume_from {
		Some(epoch) => CheckpointTag::Epoch(epoch),
		None => CheckpointTag::Best,
	};

	let path = checkpoint_path(output_dir, model_name, tag);
	if !path.is_file() {
		return Err(TrainError::MissingCheckpoint(path));
	}

	Ok(path)
}
