//! Lstm classifiers over hand tracks: run configuration, track loading,
//! the burn network and its training loop. [`training::run`] drives any
//! [`training::Trainer`]; [`learner::LstmTrainer`] is the burn one.

pub mod checkpoint;
pub mod config;
pub mod data;
pub mod error;
pub mod feature;
pub mod learner;
pub mod model;
pub mod network;
pub mod plan;
pub mod schedule;
pub mod tracks;
pub mod training;

pub use config::TrainingConfig;
pub use error::{Result, TrainError};
pub use plan::RunPlan;
