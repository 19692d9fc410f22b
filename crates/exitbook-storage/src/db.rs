//! Connection wrapper. A single `rusqlite::Connection` behind a `tokio::sync::Mutex`
//! mirrors `quoter::database::Database` elsewhere in this codebase (one
//! connection, opened once, migrated on open) rather than reaching for a
//! connection pool this dependency tree has no other use for.

use std::path::Path;

use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::{error::StorageError, schema};

pub struct Database {
	pub(crate) conn: Mutex<Connection>,
}

impl Database {
	/// Opens (creating if absent) the SQLite file at `path` and runs any
	/// migrations that have not yet been applied.
	pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
		let mut conn = Connection::open(path)?;
		conn.pragma_update(None, "foreign_keys", "ON")?;
		schema::migrate(&mut conn)?;
		Ok(Self { conn: Mutex::new(conn) })
	}

	/// An in-memory database, for tests: ephemeral, migrated the same way.
	pub fn open_in_memory() -> Result<Self, StorageError> {
		let mut conn = Connection::open_in_memory()?;
		schema::migrate(&mut conn)?;
		Ok(Self { conn: Mutex::new(conn) })
	}
}
