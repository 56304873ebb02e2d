use std::fs;
use std::path::Path;

use burn::backend::{Autodiff, NdArray};
use hand_tracks::checkpoint::{checkpoint_path, init_folders, CheckpointTag, Top1};
use hand_tracks::data::SplitList;
use hand_tracks::learner::LstmTrainer;
use hand_tracks::tracks::TrackDataset;
use hand_tracks::training::run;
use hand_tracks::{RunPlan, TrainingConfig};
use tempfile::tempdir;

type Backend = Autodiff<NdArray>;

/// Writes a hand track per uid next to a split list naming them.
fn write_split(base: &Path, name: &str, samples: &[(u32, u32)]) -> std::path::PathBuf {
	let frames = base.join("frames").join(name);
	let mut lines = String::new();

	for (uid, verb) in samples {
		let tracks = frames.join("hand_tracks");
		fs::create_dir_all(&tracks).unwrap();
		let rows: String = (0..5)
			.map(|t| format!("{},{},{},{}\n", 10 * t + uid, 20 + t, 300 - t, 100 + verb * 10))
			.collect();
		fs::write(tracks.join(format!("{uid}.csv")), rows).unwrap();

		lines.push_str(&format!("{} 5 {} 0 {} 1\n", frames.display(), verb, uid));
	}

	let path = base.join(format!("{name}.txt"));
	fs::write(&path, lines).unwrap();
	path
}

fn config(base: &Path) -> TrainingConfig {
	TrainingConfig::new(
		write_split(base, "train", &[(1, 0), (2, 1), (3, 2), (4, 0)]),
		write_split(base, "val", &[(5, 1), (6, 2)]),
		base.join("outputs"),
		"coords".to_string(),
		"step".to_string(),
		vec![1.0, 0.1],
	)
	.with_lstm_hidden(6)
	.with_lstm_layers(1)
	.with_verb_classes(3)
	.with_batch_size(2)
	.with_max_epochs(1)
	.with_lr(0.01)
	.with_save_all_weights(true)
}

fn trainer(config: &TrainingConfig, plan: &RunPlan) -> LstmTrainer<Backend> {
	let train = SplitList::from_path(&config.train_list).unwrap();
	let test = SplitList::from_path(&config.test_list).unwrap();

	LstmTrainer::new(
		plan,
		TrackDataset::load(&train, &plan.loader, &plan.lstm).unwrap(),
		TrackDataset::load(&test, &plan.loader, &plan.lstm).unwrap(),
		Default::default(),
	)
}

#[test]
fn trains_one_epoch_and_saves_weights() {
	let tmp = tempdir().unwrap();
	let config = config(tmp.path());
	let plan = RunPlan::resolve(&config, 2).unwrap();
	init_folders(&config.base_output_dir, &plan.model_name, false).unwrap();

	let report = run(&plan, &mut trainer(&config, &plan)).unwrap();

	assert_eq!(report.history.len(), 1);
	match report.best {
		Top1::Single(top1) => assert!((0.0..=100.0).contains(&top1)),
		other => panic!("expected a single accuracy, got {other}"),
	}
	let epoch = checkpoint_path(&plan.output_dir, &plan.model_name, CheckpointTag::Epoch(1));
	assert_eq!(report.saved.first(), Some(&epoch));
	assert!(epoch.is_file());
}

#[test]
fn resumed_run_loads_saved_weights() {
	let tmp = tempdir().unwrap();
	let config = config(tmp.path());
	let plan = RunPlan::resolve(&config, 2).unwrap();
	init_folders(&config.base_output_dir, &plan.model_name, false).unwrap();
	run(&plan, &mut trainer(&config, &plan)).unwrap();

	let config = config.with_resume(true).with_resume_from(Some(1));
	let plan = RunPlan::resolve(&config, 2).unwrap();
	init_folders(&config.base_output_dir, &plan.model_name, true).unwrap();

	let report = run(&plan, &mut trainer(&config, &plan)).unwrap();

	assert_eq!(report.history.len(), 1);
}
