use std::path::Path;
use std::sync::Arc;

use burn::data::dataloader::{DataLoader, DataLoaderBuilder};
use burn::module::{AutodiffModule, Module};
use burn::nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig};
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::momentum::MomentumConfig;
use burn::optim::{GradientsParams, Optimizer, Sgd, SgdConfig};
use burn::prelude::Backend;
use burn::record::CompactRecorder;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Int, Tensor};
use log::info;

use crate::checkpoint::Top1;
use crate::error::{Result, TrainError};
use crate::network::HandLstm;
use crate::plan::RunPlan;
use crate::schedule::LrSchedule;
use crate::tracks::{TrackBatch, TrackBatcher, TrackDataset};
use crate::training::{EvalSplit, Trainer};

type Loader<B> = Arc<dyn DataLoader<TrackBatch<B>>>;

/// [`Trainer`] over a [`HandLstm`], optimised with SGD and cross entropy.
/// Evaluation runs on the inner backend without autodiff.
pub struct LstmTrainer<B: AutodiffBackend> {
	model: HandLstm<B>,
	optimizer: OptimizerAdaptor<Sgd<B::InnerBackend>, HandLstm<B>, B>,
	loss: CrossEntropyLoss<B>,
	train: Loader<B>,
	train_eval: Loader<B::InnerBackend>,
	test: Loader<B::InnerBackend>,
	double_output: bool,
	device: B::Device,
}

impl<B: AutodiffBackend> LstmTrainer<B> {
	pub fn new(plan: &RunPlan, train: TrackDataset, test: TrackDataset, device: B::Device) -> Self {
		B::seed(plan.seed);

		let optimizer = SgdConfig::new()
			.with_momentum(Some(MomentumConfig {
				momentum: plan.momentum,
				dampening: 0.,
				nesterov: false,
			}))
			.with_weight_decay(Some(WeightDecayConfig::new(plan.decay as _)))
			.init();

		Self {
			model: plan.lstm.init(&device),
			optimizer,
			loss: CrossEntropyLossConfig::new().init(&device),
			train: data_loader::<B>(plan, &device, train.clone(), true),
			train_eval: data_loader::<B::InnerBackend>(plan, &device, train, false),
			test: data_loader::<B::InnerBackend>(plan, &device, test, false),
			double_output: plan.lstm.double_output,
			device,
		}
	}
}

fn data_loader<B: Backend>(plan: &RunPlan, device: &B::Device, dataset: TrackDataset, shuffle: bool) -> Loader<B> {
	let mut builder = DataLoaderBuilder::new(TrackBatcher::<B>::new(device.clone())).batch_size(plan.batch_size);

	if shuffle {
		builder = builder.shuffle(plan.seed);
	}
	if plan.num_workers > 0 {
		builder = builder.num_workers(plan.num_workers);
	}

	builder.build(dataset)
}

impl<B: AutodiffBackend> Trainer for LstmTrainer<B> {
	fn train_epoch(&mut self, epoch: usize, schedule: &LrSchedule) -> Result<()> {
		let mut loss_sum = 0.0;
		let mut batches = 0;

		for (iteration, batch) in self.train.iter().enumerate() {
			let output = self.model.forward(batch.inputs);

			let mut loss = self.loss.forward(output.verb, batch.verbs);
			if let Some(noun) = output.noun {
				loss = loss + self.loss.forward(noun, batch.nouns);
			}

			loss_sum += loss.clone().into_scalar().elem::<f64>();
			batches += 1;

			let grads = GradientsParams::from_grads(loss.backward(), &self.model);
			self.model = self.optimizer.step(schedule.lr_at(epoch, iteration), self.model.clone(), grads);
		}

		if batches > 0 {
			info!("Epoch {} train loss: {:.4}", epoch + 1, loss_sum / batches as f64);
		}

		Ok(())
	}

	fn evaluate(&mut self, _epoch: usize, split: EvalSplit) -> Result<Top1> {
		let model = self.model.valid();
		let loader = match split {
			EvalSplit::Train => &self.train_eval,
			EvalSplit::Test => &self.test,
		};

		Ok(top1(&model, loader.as_ref(), self.double_output))
	}

	fn save(&mut self, path: &Path) -> Result<()> {
		self.model
			.clone()
			.save_file(path.to_path_buf(), &CompactRecorder::new())
			.map_err(|e| TrainError::Trainer(format!("Could not save {}: {:?}", path.display(), e)))
	}

	fn load(&mut self, path: &Path) -> Result<()> {
		self.model = self
			.model
			.clone()
			.load_file(path.to_path_buf(), &CompactRecorder::new(), &self.device)
			.map_err(|e| TrainError::Trainer(format!("Could not load {}: {:?}", path.display(), e)))?;

		Ok(())
	}
}

/// Top-1 accuracy in percent over every batch of `loader`.
pub fn top1<B: Backend>(model: &HandLstm<B>, loader: &dyn DataLoader<TrackBatch<B>>, double_output: bool) -> Top1 {
	let mut samples = 0;
	let mut verbs = 0;
	let mut nouns = 0;

	for batch in loader.iter() {
		samples += batch.verbs.dims()[0];
		let output = model.forward(batch.inputs);

		verbs += correct(output.verb, batch.verbs);
		if let Some(noun) = output.noun {
			nouns += correct(noun, batch.nouns);
		}
	}

	let percent = |hits: i64| {
		if samples == 0 {
			0.0
		} else {
			100.0 * hits as f64 / samples as f64
		}
	};

	if double_output {
		Top1::Double {
			verb: percent(verbs),
			noun: percent(nouns),
		}
	} else {
		Top1::Single(percent(verbs))
	}
}

fn correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> i64 {
	logits
		.argmax(1)
		.flatten::<1>(0, 1)
		.equal(targets)
		.int()
		.sum()
		.into_scalar()
		.elem::<i64>()
}
