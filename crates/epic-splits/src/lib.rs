//! Participant-split train/val file lists for the EPIC-Kitchens action
//! annotations.

pub mod actions;
pub mod annotations;
pub mod config;
pub mod error;
pub mod participants;
pub mod pipeline;
pub mod writer;

pub use config::SplitConfig;
pub use error::{ParseSplitLineError, Result, SplitError};
pub use participants::{Split, SplitAssignment, SplitScheme};
pub use pipeline::{build_file_lists, BuildSummary};
pub use writer::SplitLine;
