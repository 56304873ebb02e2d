use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, warn};

use crate::annotations::ActionSegment;
use crate::error::{ParseSplitLineError, Result, SplitError};
use crate::participants::{Split, SplitAssignment};

/// One line of a split file:
/// `<action_dir> <num_frames> <verb> <noun> <uid> <start_frame> [<action_id>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLine {
	pub action_dir: PathBuf,
	pub num_frames: u32,
	pub verb_class: u32,
	pub noun_class: u32,
	pub uid: u32,
	pub start_frame: u32,
	pub action_id: Option<u32>,
}

impl SplitLine {
	pub fn from_segment(base_dir: &Path, segment: &ActionSegment, action_id: Option<u32>) -> Self {
		Self {
			action_dir: base_dir.join(&segment.participant_id).join(&segment.video_id),
			num_frames: segment.num_frames(),
			verb_class: segment.verb_class,
			noun_class: segment.noun_class,
			uid: segment.uid,
			start_frame: segment.start_frame,
			action_id,
		}
	}
}

impl fmt::Display for SplitLine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} {} {} {} {} {}",
			self.action_dir.display(),
			self.num_frames,
			self.verb_class,
			self.noun_class,
			self.uid,
			self.start_frame
		)?;

		if let Some(action_id) = self.action_id {
			write!(f, " {}", action_id)?;
		}

		Ok(())
	}
}

impl FromStr for SplitLine {
	type Err = ParseSplitLineError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		let fields: Vec<&str> = s.split_whitespace().collect();
		if fields.len() != 6 && fields.len() != 7 {
			return Err(ParseSplitLineError(format!(
				"expected 6 or 7 fields, found {}",
				fields.len()
			)));
		}

		let number = |i: usize, name: &str| -> std::result::Result<u32, ParseSplitLineError> {
			fields[i]
				.parse()
				.map_err(|_| ParseSplitLineError(format!("{name} '{}' is not a number", fields[i])))
		};

		Ok(Self {
			action_dir: PathBuf::from(fields[0]),
			num_frames: number(1, "num_frames")?,
			verb_class: number(2, "verb_class")?,
			noun_class: number(3, "noun_class")?,
			uid: number(4, "uid")?,
			start_frame: number(5, "start_frame")?,
			action_id: if fields.len() == 7 {
				Some(number(6, "action_id")?)
			} else {
				None
			},
		})
	}
}

/// The toggles that shape the output directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFlags {
	pub remove_bad_entries: bool,
	pub baradel: bool,
	pub actions: bool,
}

/// `root` with `_nd`, `_brd` and `_act` appended to its last component, in
/// that order, for each enabled toggle. Runs with different toggles never
/// share a directory.
pub fn splits_dir(root: &Path, flags: OutputFlags) -> PathBuf {
	let mut suffix = String::new();
	if flags.remove_bad_entries {
		suffix.push_str("_nd");
	}
	if flags.baradel {
		suffix.push_str("_brd");
	}
	if flags.actions {
		suffix.push_str("_act");
	}

	match root.file_name() {
		Some(name) => root.with_file_name(format!("{}{}", name.to_string_lossy(), suffix)),
		None => root.join(format!("splits{}", suffix)),
	}
}

/// `(train, val)` file paths for splits `1..=count`.
pub fn split_file_names(dir: &Path, prefix: &str, count: usize) -> Vec<(PathBuf, PathBuf)> {
	(1..=count)
		.map(|i| {
			(
				dir.join(format!("{prefix}_train_{i}.txt")),
				dir.join(format!("{prefix}_val_{i}.txt")),
			)
		})
		.collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounts {
	pub train: usize,
	pub val: usize,
}

struct SplitFiles {
	train: BufWriter<File>,
	val: BufWriter<File>,
	counts: LineCounts,
}

impl SplitFiles {
	fn write(&mut self, split: Split, text: &str) -> Result<()> {
		match split {
			Split::Train => {
				self.train.write_all(text.as_bytes())?;
				self.counts.train += 1;
			}
			Split::Val => {
				self.val.write_all(text.as_bytes())?;
				self.counts.val += 1;
			}
		}

		Ok(())
	}
}

/// The train/val output streams of every split, opened in append mode.
///
/// Appending means a second run into the same directory accumulates lines;
/// callers wanting a reproducible list must start from an empty directory.
/// Dropping the set closes every stream, so an aborted run still releases
/// its files.
pub struct SplitFileSet {
	files: Vec<SplitFiles>,
}

impl SplitFileSet {
	pub fn open(dir: &Path, prefix: &str, count: usize) -> Result<Self> {
		fs::create_dir_all(dir)?;

		let mut files = Vec::with_capacity(count);
		for (train, val) in split_file_names(dir, prefix, count) {
			files.push(SplitFiles {
				train: open_append(&train)?,
				val: open_append(&val)?,
				counts: LineCounts::default(),
			});
		}

		debug!("Opened {} split file pairs in {}", count, dir.display());

		Ok(Self { files })
	}

	/// Write `line` once per assignment, into train or val depending on where
	/// that assignment puts `participant`. Nothing is written if any
	/// assignment does not know the participant.
	pub fn append(&mut self, line: &SplitLine, participant: &str, assignments: &[SplitAssignment]) -> Result<()> {
		if assignments.len() != self.files.len() {
			return Err(SplitError::Configuration(format!(
				"{} assignments for {} split file pairs",
				assignments.len(),
				self.files.len()
			)));
		}

		let sides = assignments
			.iter()
			.map(|a| {
				a.split_of(participant)
					.ok_or_else(|| SplitError::UnknownParticipant(participant.to_string()))
			})
			.collect::<Result<Vec<Split>>>()?;

		let text = format!("{line}\n");
		for (files, side) in self.files.iter_mut().zip(sides) {
			files.write(side, &text)?;
		}

		Ok(())
	}

	pub fn line_counts(&self) -> Vec<LineCounts> {
		self.files.iter().map(|f| f.counts).collect()
	}

	/// Flush and close every stream.
	pub fn finish(self) -> Result<Vec<LineCounts>> {
		let mut counts = Vec::with_capacity(self.files.len());

		for mut files in self.files {
			files.train.flush()?;
			files.val.flush()?;
			counts.push(files.counts);
		}

		Ok(counts)
	}
}

fn open_append(path: &Path) -> Result<BufWriter<File>> {
	if path.metadata().map(|m| m.len() > 0).unwrap_or(false) {
		warn!("{} is not empty, new lines will be appended", path.display());
	}

	let file = OpenOptions::new().create(true).append(true).open(path)?;

	Ok(BufWriter::new(file))
}
