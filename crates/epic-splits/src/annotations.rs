use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SplitError};

pub const REQUIRED_COLUMNS: [&str; 7] = [
	"start_frame",
	"stop_frame",
	"verb_class",
	"noun_class",
	"participant_id",
	"uid",
	"video_id",
];

/// Segments found corrupt by hand.
pub const BAD_UIDS: [u32; 10] = [126, 961, 5099, 12599, 21740, 25710, 26811, 28585, 33647, 37431];

/// One row of the action annotation table. Any other columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionSegment {
	pub uid: u32,
	pub participant_id: String,
	pub video_id: String,
	pub start_frame: u32,
	pub stop_frame: u32,
	pub verb_class: u32,
	pub noun_class: u32,
}

impl ActionSegment {
	pub fn num_frames(&self) -> u32 {
		self.stop_frame - self.start_frame
	}
}

/// Streams [`ActionSegment`]s out of an annotation CSV, one record at a time.
///
/// The header is checked when the reader is built, so a table missing one of
/// [`REQUIRED_COLUMNS`] fails before any segment is produced.
pub struct AnnotationReader<R> {
	reader: csv::Reader<R>,
}

impl AnnotationReader<File> {
	pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
		let reader = csv::ReaderBuilder::new()
			.trim(csv::Trim::All)
			.from_path(path)?;

		Self::new(reader)
	}
}

impl<R: Read> AnnotationReader<R> {
	pub fn from_reader(rdr: R) -> Result<Self> {
		let reader = csv::ReaderBuilder::new()
			.trim(csv::Trim::All)
			.from_reader(rdr);

		Self::new(reader)
	}

	fn new(mut reader: csv::Reader<R>) -> Result<Self> {
		let missing = {
			let headers = reader.headers()?;
			REQUIRED_COLUMNS
				.iter()
				.find(|column| !headers.iter().any(|h| h == **column))
				.copied()
		};

		match missing {
			Some(column) => Err(SplitError::MissingColumn(column)),
			None => Ok(Self { reader }),
		}
	}

	/// Single pass over the table in row order.
	pub fn segments(self) -> impl Iterator<Item = Result<ActionSegment>> {
		self.reader
			.into_deserialize::<ActionSegment>()
			.map(|record| {
				let segment = record.map_err(|source| SplitError::MalformedRow {
					line: source.position().map(|p| p.line()).unwrap_or(0),
					source,
				})?;

				if segment.stop_frame < segment.start_frame {
					return Err(SplitError::InvalidSegment {
						uid: segment.uid,
						start_frame: segment.start_frame,
						stop_frame: segment.stop_frame,
					});
				}

				Ok(segment)
			})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
	Admitted,
	UnselectedClass,
	BadUid,
}

#[derive(Debug, Clone, Default)]
pub struct SegmentFilter {
	selected_classes: Option<HashSet<u32>>,
	excluded_uids: HashSet<u32>,
	remove_bad_entries: bool,
}

impl SegmentFilter {
	/// An empty class list behaves like no class filter at all.
	pub fn new(selected_classes: Option<&[u32]>, excluded_uids: &[u32], remove_bad_entries: bool) -> Self {
		let selected_classes = selected_classes
			.filter(|classes| !classes.is_empty())
			.map(|classes| classes.iter().copied().collect());

		Self {
			selected_classes,
			excluded_uids: excluded_uids.iter().copied().collect(),
			remove_bad_entries,
		}
	}

	pub fn admit(&self, segment: &ActionSegment) -> Admission {
		if let Some(classes) = &self.selected_classes {
			if !classes.contains(&segment.verb_class) {
				return Admission::UnselectedClass;
			}
		}

		if self.remove_bad_entries && self.excluded_uids.contains(&segment.uid) {
			return Admission::BadUid;
		}

		Admission::Admitted
	}
}
