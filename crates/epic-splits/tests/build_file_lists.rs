use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use epic_splits::annotations::BAD_UIDS;
use epic_splits::participants::reference_participants;
use epic_splits::{build_file_lists, SplitConfig, SplitError, SplitLine, SplitScheme};
use tempfile::tempdir;

const HEADER: &str = "uid,participant_id,video_id,narration,start_frame,stop_frame,verb,verb_class,noun,noun_class";

fn write_table(dir: &Path, name: &str, rows: &[String]) -> PathBuf {
	let path = dir.join(name);
	let mut text = format!("{HEADER}\n");
	for row in rows {
		text.push_str(row);
		text.push('\n');
	}
	fs::write(&path, text).unwrap();
	path
}

fn row(uid: u32, participant: &str, video: &str, start: u32, stop: u32, verb: u32, noun: u32) -> String {
	format!("{uid},{participant},{video},do thing,{start},{stop},do,{verb},thing,{noun}")
}

fn read_lines(path: &Path) -> Vec<SplitLine> {
	fs::read_to_string(path)
		.unwrap()
		.lines()
		.map(|l| l.parse().unwrap())
		.collect()
}

#[test]
fn excluded_uid_never_reaches_the_val_or_train_file() {
	let tmp = tempdir().unwrap();
	let annotations = write_table(
		tmp.path(),
		"labels.csv",
		&[
			row(1, "P01", "v1", 10, 20, 2, 4),
			row(2, "P01", "v2", 5, 8, 2, 4),
		],
	);

	let config = SplitConfig::new(
		annotations,
		PathBuf::from("frames"),
		tmp.path().join("epic_rgb"),
		"epic_rgb".to_string(),
		vec![2],
	);
	let summary = build_file_lists(&config).unwrap();

	assert_eq!(summary.output_dir, tmp.path().join("epic_rgb_nd_brd"));

	let train = read_lines(&summary.output_dir.join("epic_rgb_train_1.txt"));
	assert_eq!(train.len(), 1);
	assert_eq!(train[0].uid, 1);
	assert_eq!(train[0].num_frames, 10);
	assert_eq!(train[0].start_frame, 10);
	assert_eq!(train[0].action_dir, Path::new("frames").join("P01").join("v1"));
	assert_eq!(train[0].action_id, None);

	let val = fs::read_to_string(summary.output_dir.join("epic_rgb_val_1.txt")).unwrap();
	assert!(val.is_empty());
	assert!(summary.output_dir.join("config.json").exists());
}

#[test]
fn four_folds_partition_every_retained_segment() {
	let tmp = tempdir().unwrap();
	let participants = reference_participants();

	let mut rows = Vec::new();
	let mut uid = 0;
	for (i, participant) in participants.iter().enumerate() {
		for verb in 0..3 {
			uid += 1;
			rows.push(row(uid, participant.as_str(), &format!("{participant}_0{verb}"), 0, 30 + i as u32, verb, verb + 1));
		}
	}
	rows.push(row(126, "P02", "P02_09", 0, 40, 1, 2));
	rows.push(row(961, "P30", "P30_09", 0, 40, 0, 1));

	let annotations = write_table(tmp.path(), "labels.csv", &rows);
	let actions = tmp.path().join("actions.csv");
	let mut action_table = String::from("action_id,class_key\n");
	for verb in 0..3 {
		action_table.push_str(&format!("{},{}_{}\n", 100 + verb, verb, verb + 1));
	}
	fs::write(&actions, action_table).unwrap();

	let config = SplitConfig::new(
		annotations,
		PathBuf::from("frames"),
		tmp.path().join("epic_rgb"),
		"epic_rgb".to_string(),
		BAD_UIDS.to_vec(),
	)
	.with_scheme(SplitScheme::four_fold())
	.with_selected_classes(Some(vec![0, 1]))
	.with_actions(true)
	.with_action_classes_file(Some(actions));

	let summary = build_file_lists(&config).unwrap();
	assert_eq!(summary.output_dir, tmp.path().join("epic_rgb_nd_act"));
	assert_eq!(summary.segments.read, 86);
	assert_eq!(summary.segments.unselected_class, 28);
	assert_eq!(summary.segments.bad_uid, 2);
	assert_eq!(summary.segments.written, 56);

	let mut val_folds: HashMap<u32, usize> = HashMap::new();
	for fold in 1..=4 {
		let train = read_lines(&summary.output_dir.join(format!("epic_rgb_train_{fold}.txt")));
		let val = read_lines(&summary.output_dir.join(format!("epic_rgb_val_{fold}.txt")));

		let mut seen: Vec<u32> = train.iter().chain(val.iter()).map(|l| l.uid).collect();
		seen.sort();
		seen.dedup();
		assert_eq!(seen.len(), 56, "fold {fold} lost or duplicated a segment");
		assert_eq!(train.len() + val.len(), 56);

		for line in train.iter().chain(val.iter()) {
			assert!(line.verb_class < 2);
			assert!(!BAD_UIDS.contains(&line.uid));
			assert_eq!(line.action_id, Some(100 + line.verb_class));
		}
		for line in &val {
			*val_folds.entry(line.uid).or_default() += 1;
		}
	}

	assert_eq!(val_folds.len(), 56);
	assert!(val_folds.values().all(|folds| *folds == 1));
}

#[test]
fn unknown_action_aborts_but_keeps_earlier_lines() {
	let tmp = tempdir().unwrap();
	let annotations = write_table(
		tmp.path(),
		"labels.csv",
		&[
			row(1, "P01", "v1", 10, 20, 3, 5),
			row(2, "P01", "v1", 30, 40, 3, 99),
		],
	);
	let actions = tmp.path().join("actions.csv");
	fs::write(&actions, "class_key,action_id\n3_5,42\n").unwrap();

	let config = SplitConfig::new(
		annotations,
		PathBuf::from("frames"),
		tmp.path().join("epic_rgb"),
		"epic_rgb".to_string(),
		Vec::new(),
	)
	.with_actions(true)
	.with_action_classes_file(Some(actions));

	let result = build_file_lists(&config);
	assert!(matches!(result, Err(SplitError::Lookup(ref key)) if key == "3_99"));

	let train = read_lines(&tmp.path().join("epic_rgb_nd_brd_act").join("epic_rgb_train_1.txt"));
	assert_eq!(train.len(), 1);
	assert_eq!(train[0].action_id, Some(42));
}

#[test]
fn wrong_participant_count_fails_before_writing() {
	let tmp = tempdir().unwrap();
	let annotations = write_table(tmp.path(), "labels.csv", &[row(1, "P01", "v1", 10, 20, 2, 4)]);

	let config = SplitConfig::new(
		annotations,
		PathBuf::from("frames"),
		tmp.path().join("epic_rgb"),
		"epic_rgb".to_string(),
		Vec::new(),
	)
	.with_expected_participants(27);

	let result = build_file_lists(&config);

	assert!(matches!(result, Err(SplitError::Configuration(_))));
	assert!(!tmp.path().join("epic_rgb_nd_brd").exists());
}

#[test]
fn repeated_runs_append() {
	let tmp = tempdir().unwrap();
	let annotations = write_table(tmp.path(), "labels.csv", &[row(1, "P31", "v1", 10, 20, 2, 4)]);

	let config = SplitConfig::new(
		annotations,
		PathBuf::from("frames"),
		tmp.path().join("epic_rgb"),
		"epic_rgb".to_string(),
		Vec::new(),
	)
	.with_remove_bad_entries(false);

	build_file_lists(&config).unwrap();
	let summary = build_file_lists(&config).unwrap();

	assert_eq!(summary.output_dir, tmp.path().join("epic_rgb_brd"));
	let val = read_lines(&summary.output_dir.join("epic_rgb_val_1.txt"));
	assert_eq!(val.len(), 2);
}
