use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatcherError {
	#[error("override payload does not match its declared scope {0:?}")]
	ScopeMismatch(exitbook_core::model::OverrideScope),

	#[error("malformed override log line: {0}")]
	MalformedOverrideLine(String),

	#[error("override store io error: {0}")]
	Io(String),
}
