use crate::error::{Result, TrainError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClrMode {
	Triangular,
	Triangular2,
	ExpRange { gamma: f64 },
}

/// Learning rate as a function of epoch and iteration within the epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum LrSchedule {
	/// Decay by `gamma` every `step_size` epochs.
	Step { base_lr: f64, step_size: usize, gamma: f64 },
	/// Decay by `gamma` at each milestone epoch.
	MultiStep { base_lr: f64, milestones: Vec<usize>, gamma: f64 },
	/// Cyclical rate between `base_lr` and `max_lr`, stepped every iteration.
	Cyclic {
		base_lr: f64,
		max_lr: f64,
		step_up: usize,
		step_down: usize,
		iterations_per_epoch: usize,
		mode: ClrMode,
	},
}

fn invalid(lr_type: &str, reason: impl Into<String>) -> TrainError {
	TrainError::InvalidLrSteps {
		lr_type: lr_type.to_string(),
		reason: reason.into(),
	}
}

fn epochs(lr_type: &str, value: f64) -> Result<usize> {
	if value < 1.0 || value.fract() != 0.0 {
		return Err(invalid(lr_type, format!("{value} is not a whole number of epochs")));
	}

	Ok(value as usize)
}

impl LrSchedule {
	/// `steps` layout per type:
	/// - `step`: `[step_size, gamma]`
	/// - `multistep`: `[milestone, ..., gamma]`
	/// - `clr`: `[base_lr, max_lr, up_epochs, down_epochs?, gamma?]`, the
	///   last two defaulting to `up_epochs` and 1.0
	pub fn from_steps(
		lr_type: &str,
		lr: f64,
		steps: &[f64],
		clr_mode: Option<&str>,
		iterations_per_epoch: usize,
	) -> Result<Self> {
		match lr_type {
			"step" => {
				if steps.len() != 2 {
					return Err(invalid(lr_type, "expected [step_size, gamma]"));
				}

				Ok(LrSchedule::Step {
					base_lr: lr,
					step_size: epochs(lr_type, steps[0])?,
					gamma: steps[1],
				})
			}
			"multistep" => {
				let Some((gamma, milestones)) = steps.split_last() else {
					return Err(invalid(lr_type, "expected milestones followed by gamma"));
				};
				if milestones.is_empty() {
					return Err(invalid(lr_type, "expected at least one milestone"));
				}

				let milestones = milestones
					.iter()
					.map(|m| epochs(lr_type, *m))
					.collect::<Result<Vec<usize>>>()?;
				if milestones.windows(2).any(|w| w[0] >= w[1]) {
					return Err(invalid(lr_type, "milestones must increase"));
				}

				Ok(LrSchedule::MultiStep {
					base_lr: lr,
					milestones,
					gamma: *gamma,
				})
			}
			"clr" => {
				if steps.len() < 3 || steps.len() > 5 {
					return Err(invalid(lr_type, "expected [base_lr, max_lr, up_epochs, down_epochs, gamma]"));
				}
				if iterations_per_epoch == 0 {
					return Err(invalid(lr_type, "cyclic schedules need a non-empty epoch"));
				}

				let up = epochs(lr_type, steps[2])?;
				let down = match steps.get(3) {
					Some(down) => epochs(lr_type, *down)?,
					None => up,
				};
				let gamma = steps.get(4).copied().unwrap_or(1.0);

				let mode = match clr_mode.unwrap_or("triangular") {
					"triangular" => ClrMode::Triangular,
					"triangular2" => ClrMode::Triangular2,
					"exp_range" => ClrMode::ExpRange { gamma },
					other => return Err(invalid(lr_type, format!("unknown cyclic mode '{other}'"))),
				};

				let iterations = |epochs: usize| {
					epochs
						.checked_mul(iterations_per_epoch)
						.ok_or_else(|| invalid(lr_type, format!("{epochs} epochs of {iterations_per_epoch} iterations overflow")))
				};
				let step_up = iterations(up)?;
				let step_down = iterations(down)?;
				if step_up.checked_add(step_down).is_none() {
					return Err(invalid(lr_type, "cycle length overflows"));
				}

				Ok(LrSchedule::Cyclic {
					base_lr: steps[0],
					max_lr: steps[1],
					step_up,
					step_down,
					iterations_per_epoch,
					mode,
				})
			}
			other => Err(TrainError::UnsupportedLrType(other.to_string())),
		}
	}

	/// Whether the rate changes inside an epoch.
	pub fn per_iteration(&self) -> bool {
		matches!(self, LrSchedule::Cyclic { .. })
	}

	pub fn lr_at(&self, epoch: usize, iteration: usize) -> f64 {
		match self {
			LrSchedule::Step { base_lr, step_size, gamma } => base_lr * gamma.powi((epoch / step_size) as i32),
			LrSchedule::MultiStep { base_lr, milestones, gamma } => {
				let passed = milestones.iter().filter(|m| **m <= epoch).count();
				base_lr * gamma.powi(passed as i32)
			}
			LrSchedule::Cyclic {
				base_lr,
				max_lr,
				step_up,
				step_down,
				iterations_per_epoch,
				mode,
			} => {
				let t = (epoch * iterations_per_epoch + iteration) as f64;
				let total = (step_up + step_down) as f64;
				let up_ratio = *step_up as f64 / total;

				let cycle = (1.0 + t / total).floor();
				let x = 1.0 + t / total - cycle;
				let scale = if x <= up_ratio {
					x / up_ratio
				} else {
					(x - 1.0) / (up_ratio - 1.0)
				};

				let height = (max_lr - base_lr) * scale;
				let amplitude = match mode {
					ClrMode::Triangular => 1.0,
					ClrMode::Triangular2 => 1.0 / 2f64.powf(cycle - 1.0),
					ClrMode::ExpRange { gamma } => gamma.powf(t),
				};

				base_lr + height * amplitude
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-12
	}

	#[test]
	fn step_decays_every_step_size_epochs() {
		let schedule = LrSchedule::from_steps("step", 0.1, &[10.0, 0.5], None, 100).unwrap();

		assert!(close(schedule.lr_at(0, 0), 0.1));
		assert!(close(schedule.lr_at(9, 99), 0.1));
		assert!(close(schedule.lr_at(10, 0), 0.05));
		assert!(close(schedule.lr_at(25, 0), 0.025));
		assert!(!schedule.per_iteration());
	}

	#[test]
	fn multistep_decays_at_milestones() {
		let schedule = LrSchedule::from_steps("multistep", 1.0, &[5.0, 8.0, 0.1], None, 100).unwrap();

		assert!(close(schedule.lr_at(4, 0), 1.0));
		assert!(close(schedule.lr_at(5, 0), 0.1));
		assert!(close(schedule.lr_at(7, 0), 0.1));
		assert!(close(schedule.lr_at(8, 0), 0.01));
	}

	#[test]
	fn cyclic_rises_then_falls_each_cycle() {
		// two epochs of 10 iterations up, one epoch down
		let schedule = LrSchedule::from_steps("clr", 0.0, &[0.001, 0.006, 2.0, 1.0], None, 10).unwrap();

		assert!(schedule.per_iteration());
		assert!(close(schedule.lr_at(0, 0), 0.001));
		assert!(close(schedule.lr_at(1, 0), 0.0035));
		assert!(close(schedule.lr_at(2, 0), 0.006));
		assert!(close(schedule.lr_at(2, 5), 0.0035));
		assert!(close(schedule.lr_at(3, 0), 0.001));
	}

	#[test]
	fn triangular2_halves_each_cycle() {
		let schedule = LrSchedule::from_steps("clr", 0.0, &[0.0, 1.0, 1.0], Some("triangular2"), 4).unwrap();

		assert!(close(schedule.lr_at(1, 0), 1.0));
		assert!(close(schedule.lr_at(3, 0), 0.5));
		assert!(close(schedule.lr_at(5, 0), 0.25));
	}

	#[test]
	fn bad_steps_are_rejected() {
		assert!(matches!(
			LrSchedule::from_steps("step", 0.1, &[10.0], None, 1),
			Err(TrainError::InvalidLrSteps { .. })
		));
		assert!(LrSchedule::from_steps("step", 0.1, &[2.5, 0.1], None, 1).is_err());
		assert!(LrSchedule::from_steps("multistep", 0.1, &[0.1], None, 1).is_err());
		assert!(LrSchedule::from_steps("multistep", 0.1, &[8.0, 5.0, 0.1], None, 1).is_err());
		assert!(LrSchedule::from_steps("clr", 0.1, &[0.1, 1.0, 1.0], Some("sine"), 1).is_err());
		assert!(LrSchedule::from_steps("clr", 0.1, &[0.1, 1.0, 1.0], None, 0).is_err());
	}

	#[test]
	fn huge_cycle_lengths_are_rejected() {
		let result = LrSchedule::from_steps("clr", 0.1, &[0.1, 1.0, 1e30], None, 1000);
		assert!(matches!(result, Err(TrainError::InvalidLrSteps { .. })));

		let half = (usize::MAX / 2 + 1) as f64;
		assert!(LrSchedule::from_steps("clr", 0.1, &[0.1, 1.0, half, half], None, 1).is_err());
	}

	#[test]
	fn unknown_type_is_unsupported() {
		assert!(matches!(
			LrSchedule::from_steps("cosine", 0.1, &[], None, 1),
			Err(TrainError::UnsupportedLrType(name)) if name == "cosine"
		));
	}
}
