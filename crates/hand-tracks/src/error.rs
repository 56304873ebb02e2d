use std::path::PathBuf;

use epic_splits::ParseSplitLineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainError {
	#[error("Configuration error: {0}")]
	Configuration(String),
	#[error("Unsupported lstm feature '{0}'")]
	UnsupportedFeature(String),
	#[error("Unsupported learning rate schedule '{0}'")]
	UnsupportedLrType(String),
	#[error("Learning rate steps for '{lr_type}': {reason}")]
	InvalidLrSteps { lr_type: String, reason: String },
	#[error("{}:{line}: {source}", path.display())]
	MalformedLine {
		path: PathBuf,
		line: usize,
		#[source]
		source: ParseSplitLineError,
	},
	#[error("Hand track {}: {reason}", path.display())]
	MalformedTrack { path: PathBuf, reason: String },
	#[error("Sample {uid} has class {class}, the model only has {classes}")]
	ClassOutOfRange { uid: u32, class: u32, classes: usize },
	#[error("No checkpoint at {}", .0.display())]
	MissingCheckpoint(PathBuf),
	#[error("Output folder {} already has content, pass --resume to reuse it", .0.display())]
	OutputExists(PathBuf),
	#[error("Trainer failed: {0}")]
	Trainer(String),
	#[error("Std IO error")]
	StdIoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TrainError>;
