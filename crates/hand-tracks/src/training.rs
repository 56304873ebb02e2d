use std::path::{Path, PathBuf};

use log::info;

use crate::checkpoint::{checkpoint_path, Top1};
use crate::error::Result;
use crate::plan::RunPlan;
use crate::schedule::LrSchedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalSplit {
	Train,
	Test,
}

impl EvalSplit {
	pub fn as_str(&self) -> &'static str {
		match self {
			EvalSplit::Train => "Train",
			EvalSplit::Test => "Test",
		}
	}
}

/// The model side of a run: one optimisation pass, one evaluation pass,
/// and weight persistence. Epochs are 0-based.
pub trait Trainer {
	fn train_epoch(&mut self, epoch: usize, schedule: &LrSchedule) -> Result<()>;

	fn evaluate(&mut self, epoch: usize, split: EvalSplit) -> Result<Top1>;

	fn save(&mut self, path: &Path) -> Result<()>;

	fn load(&mut self, path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
	pub best: Top1,
	/// Test accuracy of every evaluated epoch.
	pub history: Vec<(usize, Top1)>,
	pub saved: Vec<PathBuf>,
}

pub fn run<T: Trainer>(plan: &RunPlan, trainer: &mut T) -> Result<RunReport> {
	if let Some(path) = plan.resume_checkpoint()? {
		info!("Resuming training from: {}", path.display());
		trainer.load(&path)?;
	}

	let mut best = Top1::zero(plan.lstm.double_output);
	let mut history = Vec::new();
	let mut saved = Vec::new();

	for epoch in 0..plan.max_epochs {
		trainer.train_epoch(epoch, &plan.schedule)?;

		if (epoch + 1) % plan.eval_freq != 0 {
			continue;
		}

		if plan.eval_on_train {
			let top1 = trainer.evaluate(epoch, EvalSplit::Train)?;
			info!("Epoch {} {} top1: {}", epoch + 1, EvalSplit::Train.as_str(), top1);
		}

		let top1 = trainer.evaluate(epoch, EvalSplit::Test)?;
		info!("Epoch {} {} top1: {}", epoch + 1, EvalSplit::Test.as_str(), top1);
		history.push((epoch, top1));

		let (new_best, tags) = plan.policy.decide(best, top1, epoch);
		for tag in tags {
			let path = checkpoint_path(&plan.output_dir, &plan.model_name, tag);
			trainer.save(&path)?;
			saved.push(path);
		}

		if new_best != best {
			info!("New best top1: {}", new_best);
		}
		best = new_best;
	}

	Ok(RunReport { best, history, saved })
}
