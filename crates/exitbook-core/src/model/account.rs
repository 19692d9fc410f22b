use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminates how an account's activity is sourced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountType {
	Blockchain,
	ExchangeApi,
	ExchangeCsv,
}

/// A single stream's resumption point, persisted after every batch (spec §4.2).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorState {
	pub primary: CursorPrimary,
	pub last_transaction_id: Option<String>,
	pub total_fetched: u64,
	pub provider_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum CursorPrimary {
	BlockNumber(u64),
	Timestamp(i64),
	Offset(u64),
	Signature(String),
}

/// The unit of ingestion identity: `(user_id, account_type, source_name, identifier)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
	pub id: Uuid,
	pub user_id: Uuid,
	pub account_type: AccountType,
	pub source_name: String,
	pub identifier: String,
	pub last_cursor: HashMap<String, CursorState>,
	pub credentials: HashMap<String, String>,
	pub parent_account_id: Option<Uuid>,
	pub metadata: serde_json::Value,
}

impl Account {
	/// A derived xpub address inherits the parent account's credentials and
	/// is linked for fund-flow purposes (spec §4.3 step 2).
	pub fn is_derived(&self) -> bool {
		self.parent_account_id.is_some()
	}

	pub fn cursor_for(&self, stream_type: &str) -> Option<&CursorState> {
		self.last_cursor.get(stream_type)
	}

	pub fn set_cursor(&mut self, stream_type: impl Into<String>, cursor: CursorState) {
		self.last_cursor.insert(stream_type.into(), cursor);
	}
}
