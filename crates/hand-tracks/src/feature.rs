use std::fmt;
use std::str::FromStr;

use crate::config::TrainingConfig;
use crate::error::TrainError;

/// Frame size the hand coordinates are normalised by: `[x, y]` for the left
/// then the right hand.
pub const INPUT_NORM: [f32; 4] = [456.0, 256.0, 456.0, 256.0];

/// How a hand track is turned into an lstm input sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LstmFeature {
	Coords,
	CoordsDual,
	VecSum,
	VecSumDual,
	CoordsBpv,
	CoordsObjects,
}

impl LstmFeature {
	pub fn as_str(&self) -> &'static str {
		match self {
			LstmFeature::Coords => "coords",
			LstmFeature::CoordsDual => "coords_dual",
			LstmFeature::VecSum => "vec_sum",
			LstmFeature::VecSumDual => "vec_sum_dual",
			LstmFeature::CoordsBpv => "coords_bpv",
			LstmFeature::CoordsObjects => "coords_objects",
		}
	}

	pub fn is_coords(&self) -> bool {
		matches!(self, LstmFeature::Coords | LstmFeature::CoordsDual)
	}
}

impl FromStr for LstmFeature {
	type Err = TrainError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"coords" => Ok(LstmFeature::Coords),
			"coords_dual" => Ok(LstmFeature::CoordsDual),
			"vec_sum" => Ok(LstmFeature::VecSum),
			"vec_sum_dual" => Ok(LstmFeature::VecSumDual),
			"coords_bpv" => Ok(LstmFeature::CoordsBpv),
			"coords_objects" => Ok(LstmFeature::CoordsObjects),
			other => Err(TrainError::UnsupportedFeature(other.to_string())),
		}
	}
}

impl fmt::Display for LstmFeature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

pub fn norm_values(no_norm_input: bool) -> [f32; 4] {
	if no_norm_input {
		[1.0; 4]
	} else {
		INPUT_NORM
	}
}

/// Directory under an action's frame folder holding its hand tracks, one
/// `<uid>.csv` per segment.
pub const DEFAULT_TRACK_DIR: &str = "hand_tracks";

/// Coordinates per frame: `[x, y]` of the left then the right hand.
pub const COORDS_PER_FRAME: usize = 4;

/// The dataset loader a run feeds its lstm with, and the options it gets.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderKind {
	/// Normalised hand coordinates.
	Points {
		max_seq_length: usize,
		norm: [f32; 4],
		clamp: bool,
		only_left: bool,
		only_right: bool,
	},
	/// Hand displacement from the first frame, unnormalised.
	VectorSummed { max_seq_length: usize },
	/// Normalised coordinates read from a named track folder.
	PointsBpv {
		max_seq_length: usize,
		norm: [f32; 4],
		track_dir: String,
	},
	/// Normalised coordinates followed by the raw object columns of the track.
	PointsObjects {
		max_seq_length: usize,
		norm: [f32; 4],
		track_dir: String,
	},
}

impl LoaderKind {
	pub fn resolve(feature: LstmFeature, config: &TrainingConfig) -> Self {
		let norm = norm_values(config.no_norm_input);
		let track_dir = config.bpv_prefix.clone().unwrap_or_else(|| DEFAULT_TRACK_DIR.to_string());

		match feature {
			LstmFeature::Coords | LstmFeature::CoordsDual => LoaderKind::Points {
				max_seq_length: config.lstm_seq_size,
				norm,
				clamp: config.lstm_clamped,
				only_left: config.only_left,
				only_right: config.only_right,
			},
			LstmFeature::VecSum | LstmFeature::VecSumDual => LoaderKind::VectorSummed {
				max_seq_length: config.lstm_seq_size,
			},
			LstmFeature::CoordsBpv => LoaderKind::PointsBpv {
				max_seq_length: config.lstm_seq_size,
				norm,
				track_dir,
			},
			LstmFeature::CoordsObjects => LoaderKind::PointsObjects {
				max_seq_length: config.lstm_seq_size,
				norm,
				track_dir,
			},
		}
	}

	pub fn track_dir(&self) -> &str {
		match self {
			LoaderKind::Points { .. } | LoaderKind::VectorSummed { .. } => DEFAULT_TRACK_DIR,
			LoaderKind::PointsBpv { track_dir, .. } | LoaderKind::PointsObjects { track_dir, .. } => track_dir,
		}
	}

	pub fn max_seq_length(&self) -> usize {
		match self {
			LoaderKind::Points { max_seq_length, .. }
			| LoaderKind::VectorSummed { max_seq_length }
			| LoaderKind::PointsBpv { max_seq_length, .. }
			| LoaderKind::PointsObjects { max_seq_length, .. } => *max_seq_length,
		}
	}

	/// Per-frame lstm inputs of one track. `frames` is non-empty and every
	/// frame has at least [`COORDS_PER_FRAME`] columns.
	pub fn features(&self, frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
		let features: Vec<Vec<f32>> = match self {
			LoaderKind::Points {
				norm,
				clamp,
				only_left,
				only_right,
				..
			} => frames
				.iter()
				.map(|frame| {
					let mut coords = normalised(frame, norm);
					if *clamp {
						coords.iter_mut().for_each(|c| *c = c.clamp(0.0, 1.0));
					}
					if *only_left {
						coords[2..].fill(0.0);
					}
					if *only_right {
						coords[..2].fill(0.0);
					}
					coords
				})
				.collect(),
			LoaderKind::VectorSummed { .. } => {
				let origin = &frames[0];
				frames
					.iter()
					.map(|frame| (0..COORDS_PER_FRAME).map(|i| frame[i] - origin[i]).collect())
					.collect()
			}
			LoaderKind::PointsBpv { norm, .. } => frames.iter().map(|frame| normalised(frame, norm)).collect(),
			LoaderKind::PointsObjects { norm, .. } => frames
				.iter()
				.map(|frame| {
					let mut row = normalised(frame, norm);
					row.extend_from_slice(&frame[COORDS_PER_FRAME..]);
					row
				})
				.collect(),
		};

		resample(features, self.max_seq_length())
	}
}

fn normalised(frame: &[f32], norm: &[f32; 4]) -> Vec<f32> {
	frame[..COORDS_PER_FRAME].iter().zip(norm).map(|(c, n)| c / n).collect()
}

/// Pick `length` evenly spaced frames, repeating frames of shorter tracks.
/// A zero length keeps the whole track.
fn resample(features: Vec<Vec<f32>>, length: usize) -> Vec<Vec<f32>> {
	if length == 0 || features.len() == length {
		return features;
	}

	(0..length).map(|i| features[i * features.len() / length].clone()).collect()
}
