use std::path::{Path, PathBuf};

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use epic_splits::SplitLine;
use log::debug;

use crate::data::SplitList;
use crate::error::{Result, TrainError};
use crate::feature::{LoaderKind, COORDS_PER_FRAME};
use crate::model::LstmSpec;

/// Track file of one split line: `<action_dir>/<track_dir>/<uid>.csv`.
pub fn track_path(line: &SplitLine, track_dir: &str) -> PathBuf {
	line.action_dir.join(track_dir).join(format!("{}.csv", line.uid))
}

/// Frames of a hand track. Every row is one frame, headerless, with the
/// left and right hand coordinates first and any extra columns after them.
pub fn read_track<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f32>>> {
	let path = path.as_ref();
	let malformed = |reason: String| TrainError::MalformedTrack {
		path: path.to_path_buf(),
		reason,
	};

	let mut reader = csv::ReaderBuilder::new()
		.has_headers(false)
		.trim(csv::Trim::All)
		.from_path(path)
		.map_err(|e| malformed(e.to_string()))?;

	let frames = reader
		.deserialize::<Vec<f32>>()
		.collect::<std::result::Result<Vec<_>, _>>()
		.map_err(|e| malformed(e.to_string()))?;

	match frames.first() {
		None => Err(malformed("no frames".to_string())),
		Some(frame) if frame.len() < COORDS_PER_FRAME => Err(malformed(format!(
			"{} columns, expected at least {}",
			frame.len(),
			COORDS_PER_FRAME
		))),
		Some(_) => Ok(frames),
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackSample {
	/// `[frame][feature]`, never empty.
	pub features: Vec<Vec<f32>>,
	pub verb_class: u32,
	pub noun_class: u32,
}

/// Lstm inputs of every sample in a split list, in list order.
#[derive(Debug, Clone)]
pub struct TrackDataset {
	pub samples: Vec<TrackSample>,
}

impl TrackDataset {
	/// Read and featurize the track of every line, checking the result fits
	/// the model it will be fed to.
	pub fn load(list: &SplitList, loader: &LoaderKind, lstm: &LstmSpec) -> Result<Self> {
		let mut samples = Vec::with_capacity(list.data.len());

		for line in &list.data {
			let path = track_path(line, loader.track_dir());
			let features = loader.features(&read_track(&path)?);

			let width = features[0].len();
			if width != lstm.input_size {
				return Err(TrainError::MalformedTrack {
					path,
					reason: format!("{} features per frame, the lstm takes {}", width, lstm.input_size),
				});
			}

			check_class(line.uid, line.verb_class, lstm.verb_classes)?;
			if lstm.double_output {
				check_class(line.uid, line.noun_class, lstm.noun_classes)?;
			}

			samples.push(TrackSample {
				features,
				verb_class: line.verb_class,
				noun_class: line.noun_class,
			});
		}

		debug!("Loaded {} hand tracks", samples.len());

		Ok(Self { samples })
	}
}

fn check_class(uid: u32, class: u32, classes: usize) -> Result<()> {
	if class as usize >= classes {
		return Err(TrainError::ClassOutOfRange { uid, class, classes });
	}

	Ok(())
}

impl Dataset<TrackSample> for TrackDataset {
	fn get(&self, index: usize) -> Option<TrackSample> {
		self.samples.get(index).cloned()
	}

	fn len(&self) -> usize {
		self.samples.len()
	}
}

#[derive(Debug, Clone)]
pub struct TrackBatch<B: Backend> {
	/// `[batch, seq, features]`
	pub inputs: Tensor<B, 3>,
	pub verbs: Tensor<B, 1, Int>,
	pub nouns: Tensor<B, 1, Int>,
}

#[derive(Debug, Clone)]
pub struct TrackBatcher<B: Backend> {
	device: B::Device,
}

impl<B: Backend> TrackBatcher<B> {
	pub fn new(device: B::Device) -> Self {
		Self { device }
	}
}

impl<B: Backend> Batcher<TrackSample, TrackBatch<B>> for TrackBatcher<B> {
	/// Shorter tracks are padded to the longest one by repeating their last frame.
	fn batch(&self, items: Vec<TrackSample>) -> TrackBatch<B> {
		let seq = items.iter().map(|item| item.features.len()).max().unwrap_or(0);
		let width = items.first().map(|item| item.features[0].len()).unwrap_or(0);

		let mut inputs = Vec::with_capacity(items.len() * seq * width);
		for item in &items {
			let last = item.features.len() - 1;
			for t in 0..seq {
				inputs.extend_from_slice(&item.features[t.min(last)]);
			}
		}

		let verbs: Vec<i64> = items.iter().map(|item| item.verb_class as i64).collect();
		let nouns: Vec<i64> = items.iter().map(|item| item.noun_class as i64).collect();

		TrackBatch {
			inputs: Tensor::from_data(TensorData::new(inputs, [items.len(), seq, width]), &self.device),
			verbs: Tensor::from_data(TensorData::new(verbs, [items.len()]), &self.device),
			nouns: Tensor::from_data(TensorData::new(nouns, [items.len()]), &self.device),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::ModelVariant;
	use burn::backend::NdArray;
	use std::fs;

	fn spec(input_size: usize) -> LstmSpec {
		LstmSpec {
			variant: ModelVariant::Hands,
			input_size,
			hidden_size: 8,
			num_layers: 1,
			verb_classes: 5,
			noun_classes: 3,
			dropout: 0.0,
			bidirectional: false,
			double_output: true,
		}
	}

	fn points() -> LoaderKind {
		LoaderKind::Points {
			max_seq_length: 0,
			norm: [1.0; 4],
			clamp: false,
			only_left: false,
			only_right: false,
		}
	}

	fn write_track(dir: &Path, uid: u32, rows: &str) -> SplitLine {
		let line: SplitLine = format!("{} 3 2 1 {} 10", dir.display(), uid).parse().unwrap();
		let path = track_path(&line, "hand_tracks");
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		fs::write(&path, rows).unwrap();
		line
	}

	#[test]
	fn loads_tracks_next_to_frames() {
		let tmp = tempfile::tempdir().unwrap();
		let list = SplitList {
			data: vec![
				write_track(tmp.path(), 1, "1,2,3,4\n5,6,7,8\n"),
				write_track(tmp.path(), 2, "0, 0, 1, 1\n"),
			],
		};

		let dataset = TrackDataset::load(&list, &points(), &spec(4)).unwrap();

		assert_eq!(dataset.len(), 2);
		let first = dataset.get(0).unwrap();
		assert_eq!(first.features, vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]]);
		assert_eq!((first.verb_class, first.noun_class), (2, 1));
	}

	#[test]
	fn bad_tracks_are_reported_with_their_path() {
		let tmp = tempfile::tempdir().unwrap();
		let empty = write_track(tmp.path(), 3, "");
		let narrow = write_track(tmp.path(), 4, "1,2\n");
		let ragged = write_track(tmp.path(), 5, "1,2,3,4\n1,2,3\n");

		for line in [empty, narrow, ragged] {
			let result = TrackDataset::load(&SplitList { data: vec![line] }, &points(), &spec(4));
			assert!(matches!(result, Err(TrainError::MalformedTrack { .. })));
		}

		let missing: SplitLine = format!("{} 3 2 1 9 10", tmp.path().display()).parse().unwrap();
		assert!(read_track(track_path(&missing, "hand_tracks")).is_err());
	}

	#[test]
	fn samples_must_fit_the_model() {
		let tmp = tempfile::tempdir().unwrap();
		let list = SplitList {
			data: vec![write_track(tmp.path(), 6, "1,2,3,4\n")],
		};

		assert!(matches!(
			TrackDataset::load(&list, &points(), &spec(6)),
			Err(TrainError::MalformedTrack { .. })
		));

		let mut few_verbs = spec(4);
		few_verbs.verb_classes = 2;
		assert!(matches!(
			TrackDataset::load(&list, &points(), &few_verbs),
			Err(TrainError::ClassOutOfRange { uid: 6, class: 2, classes: 2 })
		));
	}

	#[test]
	fn batches_pad_with_last_frame() {
		let device = Default::default();
		let batcher = TrackBatcher::<NdArray>::new(device);
		let items = vec![
			TrackSample {
				features: vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]],
				verb_class: 4,
				noun_class: 0,
			},
			TrackSample {
				features: vec![vec![7.0, 8.0]],
				verb_class: 1,
				noun_class: 2,
			},
		];

		let batch = batcher.batch(items);

		assert_eq!(batch.inputs.dims(), [2, 3, 2]);
		let inputs = batch.inputs.into_data().to_vec::<f32>().unwrap();
		assert_eq!(&inputs[6..], &[7.0, 8.0, 7.0, 8.0, 7.0, 8.0]);
		assert_eq!(batch.verbs.into_data().to_vec::<i64>().unwrap(), vec![4, 1]);
		assert_eq!(batch.nouns.into_data().to_vec::<i64>().unwrap(), vec![0, 2]);
	}
}
