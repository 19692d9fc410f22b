//! The provider adapter contract (spec §6). Implementations live outside the
//! core; this module only pins down the shape every adapter must expose.

use std::{pin::Pin, time::Duration};

use async_trait::async_trait;
use exitbook_core::model::CursorState;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::{error::ProviderError, rate_limit::RateLimitAdvert};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Capabilities {
	pub operations: Vec<String>,
	pub granularity_support: Option<Vec<String>>,
	pub rate_limit: RateLimitAdvert,
}

impl Capabilities {
	pub fn supports(&self, operation: &str) -> bool {
		self.operations.iter().any(|op| op == operation)
	}
}

#[derive(Clone, Debug)]
pub struct HealthCheckConfig {
	pub interval: Duration,
	pub timeout: Duration,
}

impl Default for HealthCheckConfig {
	fn default() -> Self {
		Self { interval: Duration::from_secs(30), timeout: Duration::from_secs(5) }
	}
}

/// One batch of a streaming operation (spec §4.2). `cursor` is the resume
/// point *after* this batch; it must be persisted before the next batch is
/// requested.
pub struct Batch<T> {
	pub raw_transactions: Vec<T>,
	pub operation_type: String,
	pub cursor: CursorState,
	pub is_complete: bool,
}

pub type BatchStream<T> = Pin<Box<dyn Stream<Item = Result<Batch<T>, ProviderError>> + Send>>;

/// Implemented once per provider adapter. `Op` is the adapter's own request
/// shape, `Response` its non-streaming result, `Record` the raw-record shape
/// yielded by its streaming operations.
#[async_trait]
pub trait Provider: Send + Sync {
	type Op: Send + Sync;
	type Response: Send + Sync;
	type Record: Send + Sync;

	fn name(&self) -> &str;
	fn blockchain(&self) -> &str;
	fn capabilities(&self) -> &Capabilities;
	fn requires_api_key(&self) -> bool;
	fn health_check_config(&self) -> &HealthCheckConfig;

	async fn execute(&self, op: &Self::Op) -> Result<Self::Response, ProviderError>;

	/// Response-shape validation hook (spec §4.1): also where
	/// application-level 200-with-error-message rate-limit bodies (e.g.
	/// Etherscan) get reclassified into [`ProviderError::RateLimit`].
	fn validate_response(&self, response: &Self::Response) -> Result<(), ProviderError>;

	fn execute_streaming(
		&self,
		op: Self::Op,
		cursor: Option<CursorState>,
	) -> BatchStream<Self::Record>;
}
