use std::path::PathBuf;

use anyhow::Context;
use burn::config::Config;
use clap::Parser;
use epic_splits::annotations::BAD_UIDS;
use epic_splits::{build_file_lists, SplitConfig, SplitScheme};
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Build participant-split train/val file lists from the action annotations.
#[derive(Parser, Debug)]
#[command(name = "build-file-lists", version)]
struct Args {
    /// Annotation table with one action segment per row.
    #[arg(long, default_value = "EPIC_train_action_labels.csv")]
    annotations: PathBuf,

    /// Append the action id of every segment's (verb, noun) pair.
    #[arg(long)]
    actions: bool,

    /// Action classes table (class_key, action_id), read with --actions.
    #[arg(long, default_value = "EPIC_action_classes.csv")]
    action_classes: PathBuf,

    /// Frame directory written in front of every participant/video entry.
    #[arg(long, default_value = "frames_rgb_flow/rgb/train")]
    base_dir: PathBuf,

    /// Output root; toggles are appended to its name.
    #[arg(long, default_value = "splits/epic_rgb")]
    splits_root: PathBuf,

    #[arg(long, default_value = "epic_rgb")]
    prefix: String,

    /// Keep only these verb classes.
    #[arg(long, value_delimiter = ',')]
    selected_classes: Option<Vec<u32>>,

    /// Keep segments whose uid is known to be corrupt.
    #[arg(long)]
    keep_bad_entries: bool,

    /// Four participant folds instead of the single 26/28 split.
    #[arg(long)]
    cross_validation: bool,

    /// Re-run a build from a saved config.json; other flags are ignored.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    verbose: bool,
}

impl From<Args> for SplitConfig {
    /// `--config` is handled by the caller and ignored here.
    fn from(args: Args) -> Self {
        let scheme = if args.cross_validation {
            SplitScheme::four_fold()
        } else {
            SplitScheme::baradel()
        };

        SplitConfig::new(
            args.annotations,
            args.base_dir,
            args.splits_root,
            args.prefix,
            BAD_UIDS.to_vec(),
        )
        .with_selected_classes(args.selected_classes)
        .with_remove_bad_entries(!args.keep_bad_entries)
        .with_scheme(scheme)
        .with_actions(args.actions)
        .with_action_classes_file(args.actions.then_some(args.action_classes))
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    SimpleLogger::new().with_level(level).init()?;

    let config = match args.config.clone() {
        Some(path) => SplitConfig::load(&path)
            .map_err(|e| anyhow::anyhow!("{:?}", e))
            .with_context(|| format!("Could not load {}", path.display()))?,
        None => SplitConfig::from(args),
    };

    let summary = build_file_lists(&config)?;

    for (i, lines) in summary.lines.iter().enumerate() {
        println!("split {}: {} train / {} val lines", i + 1, lines.train, lines.val);
    }
    println!("Split files written to {}", summary.output_dir.display());

    Ok(())
}
