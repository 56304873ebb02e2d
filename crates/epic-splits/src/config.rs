use std::path::{Component, Path, PathBuf};

use burn::config::Config;

use crate::error::SplitError;
use crate::participants::SplitScheme;
use crate::writer::{splits_dir, OutputFlags};

/// Everything a file-list build depends on, resolved before any row is read.
#[derive(Config, Debug)]
pub struct SplitConfig {
	pub annotation_file: PathBuf,
	/// Frame directory that prefixes every `<participant>/<video>` entry.
	pub base_dir: PathBuf,
	/// Output root; the toggles below are appended to its name.
	pub splits_root: PathBuf,
	pub prefix: String,
	pub excluded_uids: Vec<u32>,
	#[config(default = "None")]
	pub selected_classes: Option<Vec<u32>>,
	#[config(default = true)]
	pub remove_bad_entries: bool,
	#[config(default = "SplitScheme::Baradel { train: 26, of: 28 }")]
	pub scheme: SplitScheme,
	#[config(default = false)]
	pub actions: bool,
	#[config(default = "None")]
	pub action_classes_file: Option<PathBuf>,
	#[config(default = 28)]
	pub expected_participants: usize,
}

impl SplitConfig {
	pub fn validate(&self) -> crate::error::Result<()> {
		if self.actions && self.action_classes_file.is_none() {
			return Err(SplitError::Configuration(
				"action annotation needs an action classes table".to_string(),
			));
		}

		if self.prefix.is_empty() || self.prefix.contains(char::is_whitespace) {
			return Err(SplitError::Configuration(format!(
				"file prefix '{}' must be a non-empty word",
				self.prefix
			)));
		}

		// split lines are whitespace separated, the frame directory is their first field
		if self.base_dir.to_string_lossy().contains(char::is_whitespace) {
			return Err(SplitError::Configuration(format!(
				"frame directory '{}' contains whitespace",
				self.base_dir.display()
			)));
		}

		if !has_named_root(&self.splits_root) {
			return Err(SplitError::Configuration(format!(
				"splits root '{}' must end in a directory name",
				self.splits_root.display()
			)));
		}

		Ok(())
	}

	pub fn output_flags(&self) -> OutputFlags {
		OutputFlags {
			remove_bad_entries: self.remove_bad_entries,
			baradel: self.scheme.is_baradel(),
			actions: self.actions,
		}
	}

	pub fn output_dir(&self) -> PathBuf {
		splits_dir(&self.splits_root, self.output_flags())
	}
}

/// Whether the last component of `root` is a plain name the output
/// toggles can be appended to.
fn has_named_root(root: &Path) -> bool {
	matches!(root.components().next_back(), Some(Component::Normal(_)))
}
