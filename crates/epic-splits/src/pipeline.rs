use std::path::{Path, PathBuf};

use burn::config::Config;
use log::{debug, info};

use crate::actions::ActionIdResolver;
use crate::annotations::{ActionSegment, Admission, AnnotationReader, SegmentFilter};
use crate::config::SplitConfig;
use crate::error::Result;
use crate::participants::{assign, reference_participants, SplitAssignment};
use crate::writer::{LineCounts, SplitFileSet, SplitLine};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentCounts {
	pub read: usize,
	pub unselected_class: usize,
	pub bad_uid: usize,
	pub written: usize,
}

#[derive(Debug, Clone)]
pub struct BuildSummary {
	pub output_dir: PathBuf,
	pub segments: SegmentCounts,
	pub lines: Vec<LineCounts>,
}

/// Build the train/val file lists described by `config`.
///
/// Lines written before an error stay on disk; the output streams are closed
/// either way.
pub fn build_file_lists(config: &SplitConfig) -> Result<BuildSummary> {
	config.validate()?;

	let assignments = assign(&reference_participants(), config.scheme, config.expected_participants)?;
	info!("Split scheme {:?} gives {} split(s)", config.scheme, assignments.len());

	let resolver = match (&config.action_classes_file, config.actions) {
		(Some(path), true) => Some(ActionIdResolver::from_path(path)?),
		_ => None,
	};

	let filter = SegmentFilter::new(
		config.selected_classes.as_deref(),
		&config.excluded_uids,
		config.remove_bad_entries,
	);

	let reader = AnnotationReader::from_path(&config.annotation_file)?;

	let output_dir = config.output_dir();
	let mut files = SplitFileSet::open(&output_dir, &config.prefix, assignments.len())?;
	config.save(output_dir.join("config.json"))?;

	let segments = write_segments(
		reader.segments(),
		&filter,
		resolver.as_ref(),
		&config.base_dir,
		&assignments,
		&mut files,
	)?;
	let lines = files.finish()?;

	info!(
		"Read {} segments, dropped {} outside the selected classes and {} bad uids, wrote {}",
		segments.read, segments.unselected_class, segments.bad_uid, segments.written
	);

	Ok(BuildSummary {
		output_dir,
		segments,
		lines,
	})
}

/// Filter, annotate and route every segment into `files`.
pub fn write_segments<I>(
	segments: I,
	filter: &SegmentFilter,
	resolver: Option<&ActionIdResolver>,
	base_dir: &Path,
	assignments: &[SplitAssignment],
	files: &mut SplitFileSet,
) -> Result<SegmentCounts>
where
	I: IntoIterator<Item = Result<ActionSegment>>,
{
	let mut counts = SegmentCounts::default();

	for segment in segments {
		let segment = segment?;
		counts.read += 1;

		match filter.admit(&segment) {
			Admission::Admitted => {}
			Admission::UnselectedClass => {
				counts.unselected_class += 1;
				continue;
			}
			Admission::BadUid => {
				debug!("Dropping bad uid {}", segment.uid);
				counts.bad_uid += 1;
				continue;
			}
		}

		let action_id = match resolver {
			Some(resolver) => Some(resolver.resolve(segment.verb_class, segment.noun_class)?),
			None => None,
		};

		let line = SplitLine::from_segment(base_dir, &segment, action_id);
		files.append(&line, &segment.participant_id, assignments)?;
		counts.written += 1;
	}

	Ok(counts)
}
