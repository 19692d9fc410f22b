//! Append-only raw ingestion: cursor-resumable streaming import, the raw
//! store's dedup guarantee, and deterministic event-id derivation (spec §4.2).

pub mod data_source_repo;
pub mod error;
pub mod event_id;
pub mod executor;
pub mod importer;
pub mod raw_store;
pub mod replay;

pub use data_source_repo::{DataSourceRepo, InMemoryDataSourceRepo};
pub use error::IngestionError;
pub use executor::{ImportRunOutcome, StreamingImportExecutor};
pub use importer::{ImportBatch, ImportBatchStream, Importer};
pub use raw_store::{InMemoryRawStore, InsertOutcome, RawStore};
pub use replay::apply_replay_window;
