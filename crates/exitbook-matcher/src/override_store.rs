//! Append-only JSONL override log (spec §3 `OverrideEvent`, §6 "Override
//! log format", §4.4 "Override store"). Manual confirm/reject decisions are
//! appended here and applied *after* auto-matching so suggestions are
//! re-derived deterministically first, then overrides fold in (spec §9
//! "Override precedence").

use std::path::PathBuf;

use async_trait::async_trait;
use exitbook_core::model::OverrideEvent;
use tokio::{
	fs::OpenOptions,
	io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
	sync::Mutex,
};
use tracing::warn;

use crate::error::MatcherError;

#[async_trait]
pub trait OverrideStore: Send + Sync {
	async fn append(&self, event: OverrideEvent) -> Result<(), MatcherError>;
	async fn read_all(&self) -> Result<Vec<OverrideEvent>, MatcherError>;
}

/// File-backed JSONL store. Writes are serialized through an internal
/// mutex since JSONL append requires whole-line atomicity; reads tolerate
/// malformed lines by skipping them with a warning rather than failing the
/// whole read (spec §6).
pub struct JsonlOverrideStore {
	path: PathBuf,
	write_lock: Mutex<()>,
}

impl JsonlOverrideStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into(), write_lock: Mutex::new(()) }
	}
}

#[async_trait]
impl OverrideStore for JsonlOverrideStore {
	async fn append(&self, event: OverrideEvent) -> Result<(), MatcherError> {
		if !event.payload_matches_scope() {
			return Err(MatcherError::ScopeMismatch(event.scope));
		}
		let _guard = self.write_lock.lock().await;
		let mut line = serde_json::to_string(&event).map_err(|e| MatcherError::Io(e.to_string()))?;
		line.push('\n');

		let mut file = OpenOptions::new()
			.create(true)
			.append(true)
			.open(&self.path)
			.await
			.map_err(|e| MatcherError::Io(e.to_string()))?;
		file.write_all(line.as_bytes()).await.map_err(|e| MatcherError::Io(e.to_string()))?;
		Ok(())
	}

	async fn read_all(&self) -> Result<Vec<OverrideEvent>, MatcherError> {
		let file = match tokio::fs::File::open(&self.path).await {
			Ok(f) => f,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(MatcherError::Io(e.to_string())),
		};
		let mut lines = BufReader::new(file).lines();
		let mut events = Vec::new();
		while let Some(line) = lines.next_line().await.map_err(|e| MatcherError::Io(e.to_string()))? {
			if line.trim().is_empty() {
				continue;
			}
			match serde_json::from_str::<OverrideEvent>(&line) {
				Ok(event) if event.payload_matches_scope() => events.push(event),
				Ok(_) => warn!(line = %line, "override log line's payload does not match its declared scope; skipping"),
				Err(err) => warn!(line = %line, error = %err, "malformed override log line; skipping"),
			}
		}
		Ok(events)
	}
}

/// In-memory double for tests and for short-lived matcher runs that don't
/// need durability.
#[derive(Default)]
pub struct InMemoryOverrideStore {
	events: Mutex<Vec<OverrideEvent>>,
}

impl InMemoryOverrideStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl OverrideStore for InMemoryOverrideStore {
	async fn append(&self, event: OverrideEvent) -> Result<(), MatcherError> {
		if !event.payload_matches_scope() {
			return Err(MatcherError::ScopeMismatch(event.scope));
		}
		self.events.lock().await.push(event);
		Ok(())
	}

	async fn read_all(&self) -> Result<Vec<OverrideEvent>, MatcherError> {
		Ok(self.events.lock().await.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use exitbook_core::model::{OverridePayload, OverrideScope};
	use uuid::Uuid;

	fn link_event() -> OverrideEvent {
		OverrideEvent {
			id: Uuid::new_v4(),
			created_at: Utc::now(),
			actor: "alice".into(),
			source: "cli".into(),
			scope: OverrideScope::Link,
			payload: serde_json::to_value(OverridePayload::Link {
				source_tx_id: Uuid::new_v4(),
				target_tx_id: Uuid::new_v4(),
				confirmed: true,
			})
			.unwrap(),
			reason: None,
		}
	}

	#[tokio::test]
	async fn round_trips_through_a_jsonl_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("overrides.jsonl");
		let store = JsonlOverrideStore::new(&path);
		store.append(link_event()).await.unwrap();
		store.append(link_event()).await.unwrap();

		let events = store.read_all().await.unwrap();
		assert_eq!(events.len(), 2);
	}

	#[tokio::test]
	async fn malformed_lines_are_skipped_not_fatal() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("overrides.jsonl");
		tokio::fs::write(&path, b"not json\n").await.unwrap();
		let store = JsonlOverrideStore::new(&path);
		store.append(link_event()).await.unwrap();

		let events = store.read_all().await.unwrap();
		assert_eq!(events.len(), 1);
	}

	#[tokio::test]
	async fn missing_file_reads_as_empty() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("does-not-exist.jsonl");
		let store = JsonlOverrideStore::new(&path);
		assert!(store.read_all().await.unwrap().is_empty());
	}
}
