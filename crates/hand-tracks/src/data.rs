use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use burn::data::dataset::Dataset;
use epic_splits::SplitLine;

use crate::error::{Result, TrainError};

/// The samples of one split file, in file order.
#[derive(Debug, Clone, Default)]
pub struct SplitList {
	pub data: Vec<SplitLine>,
}

impl SplitList {
	pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let text = fs::read_to_string(path)?;

		Self::parse(&text, path)
	}

	fn parse(text: &str, path: &Path) -> Result<Self> {
		let mut data = Vec::new();

		for (i, line) in text.lines().enumerate() {
			if line.trim().is_empty() {
				continue;
			}

			let sample = line.parse::<SplitLine>().map_err(|source| TrainError::MalformedLine {
				path: path.to_path_buf(),
				line: i + 1,
				source,
			})?;
			data.push(sample);
		}

		Ok(Self { data })
	}

	/// Samples per verb class.
	pub fn verb_counts(&self) -> BTreeMap<u32, usize> {
		let mut counts = BTreeMap::new();
		for sample in &self.data {
			*counts.entry(sample.verb_class).or_insert(0) += 1;
		}
		counts
	}

	pub fn has_action_ids(&self) -> bool {
		!self.data.is_empty() && self.data.iter().all(|s| s.action_id.is_some())
	}

	/// Batches per epoch, counting a trailing partial batch.
	pub fn iterations_per_epoch(&self, batch_size: usize) -> usize {
		self.data.len().div_ceil(batch_size.max(1))
	}
}

impl Dataset<SplitLine> for SplitList {
	fn get(&self, index: usize) -> Option<SplitLine> {
		self.data.get(index).cloned()
	}

	fn len(&self) -> usize {
		self.data.len()
	}
}
