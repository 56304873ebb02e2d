use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
	#[error("Configuration error: {0}")]
	Configuration(String),
	#[error("Annotation table is missing required column '{0}'")]
	MissingColumn(&'static str),
	#[error("Malformed annotation record at line {line}: {source}")]
	MalformedRow {
		line: u64,
		#[source]
		source: csv::Error,
	},
	#[error("Segment uid {uid} stops at frame {stop_frame} before it starts at {start_frame}")]
	InvalidSegment {
		uid: u32,
		start_frame: u32,
		stop_frame: u32,
	},
	#[error("Participant '{0}' is not part of any split")]
	UnknownParticipant(String),
	#[error("Action class key '{0}' appears more than once in the action table")]
	DuplicateActionKey(String),
	#[error("No action id for class key '{0}'")]
	Lookup(String),
	#[error("Std IO error")]
	StdIoError(#[from] std::io::Error),
	#[error("Csv error")]
	Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ParseSplitLineError(pub String);

pub type Result<T> = std::result::Result<T, SplitError>;
