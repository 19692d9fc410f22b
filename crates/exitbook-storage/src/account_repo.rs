//! Account persistence. No port for this exists upstream yet — ingestion's
//! executor takes an `&Account` directly (spec §4.2) — so the trait is
//! defined here rather than implemented against something in
//! `exitbook-ingestion`.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use exitbook_core::model::{Account, AccountType, CursorState};
use rusqlite::{params, OptionalExtension};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{db::Database, error::StorageError};

#[async_trait]
pub trait AccountRepository: Send + Sync {
	async fn upsert(&self, account: &Account) -> Result<(), StorageError>;

	async fn get(&self, id: Uuid) -> Result<Option<Account>, StorageError>;

	async fn find_by_identity(
		&self,
		user_id: Uuid,
		account_type: AccountType,
		source_name: &str,
		identifier: &str,
	) -> Result<Option<Account>, StorageError>;

	async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Account>, StorageError>;
}

fn account_type_to_str(account_type: AccountType) -> &'static str {
	match account_type {
		AccountType::Blockchain => "blockchain",
		AccountType::ExchangeApi => "exchange-api",
		AccountType::ExchangeCsv => "exchange-csv",
	}
}

fn account_type_from_str(s: &str) -> AccountType {
	match s {
		"exchange-api" => AccountType::ExchangeApi,
		"exchange-csv" => AccountType::ExchangeCsv,
		_ => AccountType::Blockchain,
	}
}

pub struct SqliteAccountRepository {
	db: Arc<Database>,
}

impl SqliteAccountRepository {
	pub fn new(db: Arc<Database>) -> Self {
		Self { db }
	}
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
	let id: String = row.get("id")?;
	let user_id: String = row.get("user_id")?;
	let account_type: String = row.get("account_type")?;
	let parent_account_id: Option<String> = row.get("parent_account_id")?;
	let last_cursor: String = row.get("last_cursor")?;
	let credentials: String = row.get("credentials")?;
	let metadata: String = row.get("metadata")?;

	let to_sql_err = |e: Box<dyn std::error::Error + Send + Sync>| {
		rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e)
	};

	Ok(Account {
		id: id.parse().map_err(|e: uuid::Error| to_sql_err(Box::new(e)))?,
		user_id: user_id.parse().map_err(|e: uuid::Error| to_sql_err(Box::new(e)))?,
		account_type: account_type_from_str(&account_type),
		source_name: row.get("source_name")?,
		identifier: row.get("identifier")?,
		parent_account_id: parent_account_id
			.map(|s| s.parse())
			.transpose()
			.map_err(|e: uuid::Error| to_sql_err(Box::new(e)))?,
		last_cursor: serde_json::from_str::<HashMap<String, CursorState>>(&last_cursor)
			.map_err(|e| to_sql_err(Box::new(e)))?,
		credentials: serde_json::from_str(&credentials).map_err(|e| to_sql_err(Box::new(e)))?,
		metadata: serde_json::from_str(&metadata).map_err(|e| to_sql_err(Box::new(e)))?,
	})
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
	async fn upsert(&self, account: &Account) -> Result<(), StorageError> {
		let conn = self.db.conn.lock().await;
		conn.execute(
			"INSERT INTO accounts
				(id, user_id, account_type, source_name, identifier, parent_account_id,
				 last_cursor, credentials, metadata)
			 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
			 ON CONFLICT (id) DO UPDATE SET
				last_cursor = excluded.last_cursor,
				credentials = excluded.credentials,
				parent_account_id = excluded.parent_account_id,
				metadata = excluded.metadata",
			params![
				account.id.to_string(),
				account.user_id.to_string(),
				account_type_to_str(account.account_type),
				account.source_name,
				account.identifier,
				account.parent_account_id.map(|id| id.to_string()),
				serde_json::to_string(&account.last_cursor)?,
				serde_json::to_string(&account.credentials)?,
				serde_json::to_string(&account.metadata)?,
			],
		)?;
		Ok(())
	}

	async fn get(&self, id: Uuid) -> Result<Option<Account>, StorageError> {
		let conn = self.db.conn.lock().await;
		let account = conn
			.query_row(
				"SELECT id, user_id, account_type, source_name, identifier, parent_account_id,
					last_cursor, credentials, metadata
				 FROM accounts WHERE id = ?1",
				params![id.to_string()],
				row_to_account,
			)
			.optional()?;
		Ok(account)
	}

	async fn find_by_identity(
		&self,
		user_id: Uuid,
		account_type: AccountType,
		source_name: &str,
		identifier: &str,
	) -> Result<Option<Account>, StorageError> {
		let conn = self.db.conn.lock().await;
		let account = conn
			.query_row(
				"SELECT id, user_id, account_type, source_name, identifier, parent_account_id,
					last_cursor, credentials, metadata
				 FROM accounts
				 WHERE user_id = ?1 AND account_type = ?2 AND source_name = ?3 AND identifier = ?4",
				params![user_id.to_string(), account_type_to_str(account_type), source_name, identifier],
				row_to_account,
			)
			.optional()?;
		Ok(account)
	}

	async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Account>, StorageError> {
		let conn = self.db.conn.lock().await;
		let mut stmt = conn.prepare(
			"SELECT id, user_id, account_type, source_name, identifier, parent_account_id,
				last_cursor, credentials, metadata
			 FROM accounts WHERE user_id = ?1",
		)?;
		let rows = stmt.query_map(params![user_id.to_string()], row_to_account)?;
		let mut accounts = Vec::new();
		for row in rows {
			accounts.push(row?);
		}
		Ok(accounts)
	}
}

/// Test double, mirroring `exitbook_ingestion::raw_store::InMemoryRawStore`.
#[derive(Default)]
pub struct InMemoryAccountRepository {
	rows: Mutex<HashMap<Uuid, Account>>,
}

impl InMemoryAccountRepository {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
	async fn upsert(&self, account: &Account) -> Result<(), StorageError> {
		self.rows.lock().await.insert(account.id, account.clone());
		Ok(())
	}

	async fn get(&self, id: Uuid) -> Result<Option<Account>, StorageError> {
		Ok(self.rows.lock().await.get(&id).cloned())
	}

	async fn find_by_identity(
		&self,
		user_id: Uuid,
		account_type: AccountType,
		source_name: &str,
		identifier: &str,
	) -> Result<Option<Account>, StorageError> {
		Ok(self
			.rows
			.lock()
			.await
			.values()
			.find(|a| {
				a.user_id == user_id
					&& a.account_type == account_type
					&& a.source_name == source_name
					&& a.identifier == identifier
			})
			.cloned())
	}

	async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Account>, StorageError> {
		Ok(self.rows.lock().await.values().filter(|a| a.user_id == user_id).cloned().collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn account(user_id: Uuid) -> Account {
		Account {
			id: Uuid::new_v4(),
			user_id,
			account_type: AccountType::ExchangeApi,
			source_name: "kraken".into(),
			identifier: "main".into(),
			last_cursor: HashMap::new(),
			credentials: HashMap::new(),
			parent_account_id: None,
			metadata: serde_json::Value::Null,
		}
	}

	#[tokio::test]
	async fn upsert_then_find_by_identity_round_trips() {
		let db = Arc::new(Database::open_in_memory().unwrap());
		let repo = SqliteAccountRepository::new(db);
		let user_id = Uuid::new_v4();
		let acc = account(user_id);
		repo.upsert(&acc).await.unwrap();

		let found = repo
			.find_by_identity(user_id, AccountType::ExchangeApi, "kraken", "main")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(found.id, acc.id);
	}

	#[tokio::test]
	async fn upsert_twice_updates_cursor_in_place() {
		let db = Arc::new(Database::open_in_memory().unwrap());
		let repo = SqliteAccountRepository::new(db);
		let mut acc = account(Uuid::new_v4());
		repo.upsert(&acc).await.unwrap();

		acc.set_cursor(
			"transactions",
			CursorState {
				primary: exitbook_core::model::CursorPrimary::Offset(42),
				last_transaction_id: Some("tx-42".into()),
				total_fetched: 42,
				provider_name: None,
			},
		);
		repo.upsert(&acc).await.unwrap();

		let reloaded = repo.get(acc.id).await.unwrap().unwrap();
		assert_eq!(reloaded.cursor_for("transactions").unwrap().total_fetched, 42);
	}
}
