use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::Context;
use burn::backend::{Autodiff, NdArray};
use burn::config::Config;
use burn::data::dataset::Dataset;
use clap::Parser;
use hand_tracks::checkpoint::init_folders;
use hand_tracks::data::SplitList;
use hand_tracks::learner::LstmTrainer;
use hand_tracks::tracks::TrackDataset;
use hand_tracks::training::run;
use hand_tracks::{RunPlan, TrainingConfig};
use log::{debug, info, LevelFilter};
use simple_logger::SimpleLogger;

type Backend = Autodiff<NdArray>;

/// Train an lstm classifier on the hand tracks of two split lists.
#[derive(Parser, Debug)]
#[command(name = "hand-tracks", version)]
struct Args {
    #[arg(long)]
    train_list: PathBuf,
    #[arg(long)]
    test_list: PathBuf,
    #[arg(long, default_value = "outputs")]
    base_output_dir: PathBuf,

    /// coords, coords_dual, vec_sum, vec_sum_dual, coords_bpv or coords_objects
    #[arg(long, default_value = "coords")]
    lstm_feature: String,
    #[arg(long, default_value_t = 4)]
    lstm_input: usize,
    #[arg(long, default_value_t = 64)]
    lstm_hidden: usize,
    #[arg(long, default_value_t = 2)]
    lstm_layers: usize,
    /// Fixed track length, 0 keeps whole tracks.
    #[arg(long, default_value_t = 0)]
    lstm_seq_size: usize,
    #[arg(long)]
    lstm_bidir: bool,
    #[arg(long)]
    lstm_dual: bool,
    #[arg(long)]
    lstm_attn: bool,
    #[arg(long)]
    lstm_clamped: bool,
    /// Predict nouns next to verbs.
    #[arg(long)]
    double_output: bool,
    #[arg(long, default_value_t = 0.0)]
    dropout: f64,
    #[arg(long, default_value_t = 125)]
    verb_classes: usize,
    #[arg(long, default_value_t = 331)]
    noun_classes: usize,

    #[arg(long)]
    only_left: bool,
    #[arg(long)]
    only_right: bool,
    #[arg(long)]
    no_norm_input: bool,
    #[arg(long)]
    bpv_prefix: Option<String>,

    #[arg(long, default_value_t = 32)]
    batch_size: usize,
    #[arg(long, default_value_t = 0)]
    num_workers: usize,
    #[arg(long, default_value_t = 0.001)]
    lr: f64,
    #[arg(long, default_value_t = 0.9)]
    momentum: f64,
    #[arg(long, default_value_t = 0.0005)]
    decay: f64,
    /// step, multistep or clr
    #[arg(long, default_value = "step")]
    lr_type: String,
    #[arg(long, value_delimiter = ',', default_value = "30,0.1")]
    lr_steps: Vec<f64>,
    #[arg(long)]
    clr_mode: Option<String>,

    #[arg(long, default_value_t = 1337)]
    seed: u64,

    #[arg(long, default_value_t = 100)]
    max_epochs: usize,
    #[arg(long, default_value_t = 1)]
    eval_freq: usize,
    #[arg(long)]
    eval_on_train: bool,
    #[arg(long)]
    save_all_weights: bool,
    #[arg(long)]
    resume: bool,
    #[arg(long)]
    resume_from: Option<usize>,

    #[arg(long)]
    verbose: bool,
}

impl From<Args> for TrainingConfig {
    fn from(a: Args) -> Self {
        TrainingConfig::new(
            a.train_list,
            a.test_list,
            a.base_output_dir,
            a.lstm_feature,
            a.lr_type,
            a.lr_steps,
        )
        .with_lstm_input(a.lstm_input)
        .with_lstm_hidden(a.lstm_hidden)
        .with_lstm_layers(a.lstm_layers)
        .with_lstm_seq_size(a.lstm_seq_size)
        .with_lstm_bidir(a.lstm_bidir)
        .with_lstm_dual(a.lstm_dual)
        .with_lstm_attn(a.lstm_attn)
        .with_lstm_clamped(a.lstm_clamped)
        .with_double_output(a.double_output)
        .with_dropout(a.dropout)
        .with_verb_classes(a.verb_classes)
        .with_noun_classes(a.noun_classes)
        .with_only_left(a.only_left)
        .with_only_right(a.only_right)
        .with_no_norm_input(a.no_norm_input)
        .with_bpv_prefix(a.bpv_prefix)
        .with_batch_size(a.batch_size)
        .with_num_workers(a.num_workers)
        .with_lr(a.lr)
        .with_momentum(a.momentum)
        .with_decay(a.decay)
        .with_clr_mode(a.clr_mode)
        .with_seed(a.seed)
        .with_max_epochs(a.max_epochs)
        .with_eval_freq(a.eval_freq)
        .with_eval_on_train(a.eval_on_train)
        .with_save_all_weights(a.save_all_weights)
        .with_resume(a.resume)
        .with_resume_from(a.resume_from)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    SimpleLogger::new().with_level(level).init()?;

    let time = SystemTime::now();

    let config = TrainingConfig::from(args);
    config.validate()?;
    info!("{}", config);

    let train = SplitList::from_path(&config.train_list)
        .with_context(|| format!("Could not read {}", config.train_list.display()))?;
    let test = SplitList::from_path(&config.test_list)
        .with_context(|| format!("Could not read {}", config.test_list.display()))?;

    info!("Train Dataset Size: {}", train.len());
    info!("Valid Dataset Size: {}", test.len());
    for (verb, count) in train.verb_counts() {
        debug!("verb {}: {} training samples", verb, count);
    }

    let plan = RunPlan::resolve(&config, train.iterations_per_epoch(config.batch_size))?;
    info!("Model name: {}", plan.model_name);

    let output_dir = init_folders(&config.base_output_dir, &plan.model_name, config.resume)?;
    if let Some(path) = plan.resume_checkpoint()? {
        info!("Resuming training from: {}", path.display());
    }

    info!("Model: {:?}", plan.lstm);
    info!("Loader: {:?}", plan.loader);
    info!("Train loop: {:?}", plan.train_fn);

    config.save(output_dir.join("config.json"))?;

    let train_tracks = TrackDataset::load(&train, &plan.loader, &plan.lstm)?;
    let test_tracks = TrackDataset::load(&test, &plan.loader, &plan.lstm)?;

    let device = <Backend as burn::tensor::backend::Backend>::Device::default();
    let mut trainer = LstmTrainer::<Backend>::new(&plan, train_tracks, test_tracks, device);
    let report = run(&plan, &mut trainer)?;

    info!("Best top1: {}", report.best);
    for path in &report.saved {
        debug!("Saved {}", path.display());
    }

    println!("Best top1 {} in {}", report.best, output_dir.display());
    println!("Time to train: {}", time.elapsed()?.as_millis() as f64 / 1000.0);

    Ok(())
}
