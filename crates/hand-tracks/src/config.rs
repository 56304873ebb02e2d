use std::path::PathBuf;

use burn::config::Config;

use crate::error::TrainError;
use crate::feature::LstmFeature;

#[derive(Config, Debug)]
pub struct TrainingConfig {
	pub train_list: PathBuf,
	pub test_list: PathBuf,
	pub base_output_dir: PathBuf,
	/// One of the [`LstmFeature`] names.
	pub feature: String,
	/// `step`, `multistep` or `clr`.
	pub lr_type: String,
	pub lr_steps: Vec<f64>,

	#[config(default = 4)]
	pub lstm_input: usize,
	#[config(default = 64)]
	pub lstm_hidden: usize,
	#[config(default = 2)]
	pub lstm_layers: usize,
	/// 0 keeps whole tracks.
	#[config(default = 0)]
	pub lstm_seq_size: usize,
	#[config(default = false)]
	pub lstm_bidir: bool,
	#[config(default = false)]
	pub lstm_dual: bool,
	#[config(default = false)]
	pub lstm_attn: bool,
	#[config(default = false)]
	pub lstm_clamped: bool,
	#[config(default = false)]
	pub double_output: bool,
	#[config(default = 0.0)]
	pub dropout: f64,

	#[config(default = 125)]
	pub verb_classes: usize,
	#[config(default = 331)]
	pub noun_classes: usize,

	#[config(default = false)]
	pub only_left: bool,
	#[config(default = false)]
	pub only_right: bool,
	#[config(default = false)]
	pub no_norm_input: bool,
	#[config(default = "None")]
	pub bpv_prefix: Option<String>,

	#[config(default = 32)]
	pub batch_size: usize,
	#[config(default = 0)]
	pub num_workers: usize,
	#[config(default = 0.001)]
	pub lr: f64,
	#[config(default = 0.9)]
	pub momentum: f64,
	#[config(default = 0.0005)]
	pub decay: f64,
	/// `triangular`, `triangular2` or `exp_range`; only read by `clr`.
	#[config(default = "None")]
	pub clr_mode: Option<String>,

	#[config(default = 1337)]
	pub seed: u64,

	#[config(default = 100)]
	pub max_epochs: usize,
	#[config(default = 1)]
	pub eval_freq: usize,
	#[config(default = false)]
	pub eval_on_train: bool,
	#[config(default = false)]
	pub save_all_weights: bool,
	#[config(default = false)]
	pub resume: bool,
	/// Epoch to resume from; the best checkpoint when unset.
	#[config(default = "None")]
	pub resume_from: Option<usize>,
}

impl TrainingConfig {
	pub fn lstm_feature(&self) -> crate::error::Result<LstmFeature> {
		self.feature.parse()
	}

	/// Reject option combinations no loader or model supports.
	pub fn validate(&self) -> crate::error::Result<()> {
		let feature = self.lstm_feature()?;

		if self.only_left && self.only_right {
			return Err(TrainError::Configuration(
				"It must be at most one of only_left or only_right at any time".to_string(),
			));
		}

		if feature.is_coords() && self.lstm_clamped && (!self.lstm_dual || self.lstm_seq_size == 0) {
			return Err(TrainError::Configuration(
				"Clamped tracks require dual lstms and a fixed lstm sequence size".to_string(),
			));
		}

		if self.lstm_layers == 0 || self.lstm_hidden == 0 {
			return Err(TrainError::Configuration(
				"The lstm needs at least one layer and one hidden unit".to_string(),
			));
		}

		if self.lstm_dual && self.lstm_input % 2 != 0 {
			return Err(TrainError::Configuration(format!(
				"Dual lstms split the input between the hands, {} is odd",
				self.lstm_input
			)));
		}

		if !(0.0..1.0).contains(&self.dropout) {
			return Err(TrainError::Configuration(format!("Dropout {} is not in [0, 1)", self.dropout)));
		}

		if self.eval_freq == 0 {
			return Err(TrainError::Configuration("eval_freq must be at least 1".to_string()));
		}

		if self.batch_size == 0 {
			return Err(TrainError::Configuration("batch_size must be at least 1".to_string()));
		}

		Ok(())
	}

	/// Run name derived from the options that change what gets trained.
	pub fn model_name(&self) -> String {
		let mut name = format!(
			"lstm_{}_{}_{}_{}_seq{}",
			self.feature, self.lstm_input, self.lstm_hidden, self.lstm_layers, self.lstm_seq_size
		);

		let flags = [
			(self.lstm_bidir, "bi"),
			(self.lstm_dual, "dual"),
			(self.lstm_attn, "attn"),
			(self.lstm_clamped, "clamp"),
			(self.double_output, "do"),
			(self.only_left, "left"),
			(self.only_right, "right"),
			(self.no_norm_input, "nonorm"),
		];
		for (_, flag) in flags.iter().filter(|(on, _)| *on) {
			name.push('_');
			name.push_str(flag);
		}

		name.push_str(&format!("_{}_bs{}_ep{}", self.lr_type, self.batch_size, self.max_epochs));
		name
	}
}
