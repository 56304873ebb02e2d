use crate::config::TrainingConfig;

/// Which lstm network a run trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
	/// One lstm over both hands.
	Hands,
	/// A separate lstm per hand.
	PerHand,
	/// Lstm with attention over its outputs.
	Attention,
}

/// Which train/test loop drives the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainFn {
	Single,
	DoubleOutput,
	Attention,
}

/// Shape of the [`crate::network::HandLstm`] a run trains.
#[derive(Debug, Clone, PartialEq)]
pub struct LstmSpec {
	pub variant: ModelVariant,
	pub input_size: usize,
	pub hidden_size: usize,
	pub num_layers: usize,
	pub verb_classes: usize,
	pub noun_classes: usize,
	pub dropout: f64,
	pub bidirectional: bool,
	pub double_output: bool,
}

impl ModelVariant {
	pub fn select(config: &TrainingConfig) -> Self {
		if config.lstm_dual {
			ModelVariant::PerHand
		} else if config.lstm_attn {
			ModelVariant::Attention
		} else {
			ModelVariant::Hands
		}
	}
}

impl TrainFn {
	pub fn select(config: &TrainingConfig) -> Self {
		if config.lstm_attn {
			TrainFn::Attention
		} else if config.double_output {
			TrainFn::DoubleOutput
		} else {
			TrainFn::Single
		}
	}
}

impl LstmSpec {
	pub fn from_config(config: &TrainingConfig) -> Self {
		Self {
			variant: ModelVariant::select(config),
			input_size: config.lstm_input,
			hidden_size: config.lstm_hidden,
			num_layers: config.lstm_layers,
			verb_classes: config.verb_classes,
			noun_classes: config.noun_classes,
			dropout: config.dropout,
			bidirectional: config.lstm_bidir,
			double_output: config.double_output,
		}
	}
}
