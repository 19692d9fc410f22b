use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverrideScope {
	Link,
	Price,
}

/// Append-only JSONL event (spec §3, §6 "Override log format"). `payload`'s
/// shape must match `scope`; a mismatch is rejected at write time, not
/// silently coerced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OverrideEvent {
	pub id: Uuid,
	pub created_at: DateTime<Utc>,
	pub actor: String,
	pub source: String,
	pub scope: OverrideScope,
	pub payload: serde_json::Value,
	pub reason: Option<String>,
}

impl OverrideEvent {
	/// Parses `payload` as an [`OverridePayload`] and checks it against
	/// `scope`; a payload that doesn't even parse as any known shape counts
	/// as a mismatch rather than panicking the caller.
	pub fn payload_matches_scope(&self) -> bool {
		serde_json::from_value::<OverridePayload>(self.payload.clone())
			.map(|payload| payload.matches_scope(self.scope))
			.unwrap_or(false)
	}
}

/// Scope-specific payload shapes validated against `OverrideEvent::scope`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OverridePayload {
	Link { source_tx_id: Uuid, target_tx_id: Uuid, confirmed: bool },
	Price { asset: String, timestamp: DateTime<Utc>, price_usd: String },
}

impl OverridePayload {
	pub fn matches_scope(&self, scope: OverrideScope) -> bool {
		matches!(
			(self, scope),
			(OverridePayload::Link { .. }, OverrideScope::Link) |
				(OverridePayload::Price { .. }, OverrideScope::Price)
		)
	}
}
