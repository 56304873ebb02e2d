use std::path::PathBuf;

use crate::checkpoint::{resume_path, CheckpointPolicy};
use crate::config::TrainingConfig;
use crate::error::Result;
use crate::feature::{LoaderKind, LstmFeature};
use crate::model::{LstmSpec, TrainFn};
use crate::schedule::LrSchedule;

/// Everything a run needs, resolved and checked from a [`TrainingConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
	pub model_name: String,
	pub output_dir: PathBuf,
	pub feature: LstmFeature,
	pub lstm: LstmSpec,
	pub train_fn: TrainFn,
	pub loader: LoaderKind,
	pub schedule: LrSchedule,
	pub policy: CheckpointPolicy,
	pub batch_size: usize,
	pub num_workers: usize,
	pub seed: u64,
	pub momentum: f64,
	pub decay: f64,
	pub max_epochs: usize,
	pub eval_freq: usize,
	pub eval_on_train: bool,
	pub resume: bool,
	pub resume_from: Option<usize>,
}

impl RunPlan {
	pub fn resolve(config: &TrainingConfig, iterations_per_epoch: usize) -> Result<Self> {
		config.validate()?;

		let feature = config.lstm_feature()?;
		let schedule = LrSchedule::from_steps(
			&config.lr_type,
			config.lr,
			&config.lr_steps,
			config.clr_mode.as_deref(),
			iterations_per_epoch,
		)?;
		let model_name = config.model_name();

		Ok(Self {
			output_dir: config.base_output_dir.join(&model_name),
			model_name,
			feature,
			lstm: LstmSpec::from_config(config),
			train_fn: TrainFn::select(config),
			loader: LoaderKind::resolve(feature, config),
			schedule,
			policy: CheckpointPolicy {
				save_all_weights: config.save_all_weights,
			},
			batch_size: config.batch_size,
			num_workers: config.num_workers,
			seed: config.seed,
			momentum: config.momentum,
			decay: config.decay,
			max_epochs: config.max_epochs,
			eval_freq: config.eval_freq,
			eval_on_train: config.eval_on_train,
			resume: config.resume,
			resume_from: config.resume_from,
		})
	}

	/// The checkpoint to load before the first epoch, if resuming.
	pub fn resume_checkpoint(&self) -> Result<Option<PathBuf>> {
		if !self.resume {
			return Ok(None);
		}

		resume_path(&self.output_dir, &self.model_name, self.resume_from).map(Some)
	}
}
