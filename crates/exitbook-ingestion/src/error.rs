use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
	#[error("transient error from importer: {0}")]
	Transient(String),

	#[error("duplicate (account_id, event_id) with differing payload: account={account_id} event_id={event_id}")]
	DuplicateEventIdConflict { account_id: uuid::Uuid, event_id: String },

	#[error("raw store error: {0}")]
	Store(String),

	#[error("no importer registered for account")]
	NoImporter,
}
