//! Provider manager: orchestrates a pool of interchangeable providers for a
//! given chain, executing operations with failover, caching, rate-limit
//! compliance, circuit-breaker protection, and health scoring (spec §4.1).
//!
//! The retry/backoff idiom (timeout-wrap each attempt, exponential backoff
//! with jitter between attempts) and the scoring/circuit/health bookkeeping
//! both follow the same "process-wide map of short critical sections" shape
//! used for request bookkeeping elsewhere in this codebase.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
	time::{Duration, Instant},
};

use exitbook_core::model::CursorState;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::{
	cache::ResponseCache,
	circuit::CircuitBreaker,
	config::ProviderManagerConfig,
	error::ProviderError,
	health::HealthTracker,
	provider::{BatchStream, Provider},
	rate_limit::RateLimiter,
	scoring::{score, GranularityContext, ScoreInputs},
};

struct ProviderState {
	circuit: CircuitBreaker,
	health: HealthTracker,
	rate_limiter: Arc<RateLimiter>,
}

/// A failover event, emitted for observability whenever the manager moves
/// from one provider to the next for the same logical call (spec §4.1).
#[derive(Clone, Debug)]
pub struct FailoverEvent {
	pub from: String,
	pub to: String,
	pub reason: String,
}

/// A pool of interchangeable providers for one `(Op, Response, Record)`
/// family — e.g. all blockchain explorer adapters for a given operation
/// vocabulary, or all price-feed adapters. Providers are stored as trait
/// objects so genuinely different adapter structs (Helius, a QuickNode
/// fallback, ...) can share one pool as long as they agree on the
/// associated types (spec §4.1 "pool of interchangeable providers").
pub struct ProviderManager<Op: Send + Sync, Response: Send + Sync, Record: Send + Sync> {
	providers: Vec<Arc<dyn Provider<Op = Op, Response = Response, Record = Record>>>,
	// keyed by (chain, provider_name) — process-wide per spec §5.
	state: Mutex<HashMap<(String, String), ProviderState>>,
	cache: ResponseCache,
	config: ProviderManagerConfig,
}

impl<Op: Send + Sync, Response: Send + Sync, Record: Send + Sync> ProviderManager<Op, Response, Record> {
	pub fn new(config: ProviderManagerConfig) -> Self {
		Self { providers: Vec::new(), state: Mutex::new(HashMap::new()), cache: ResponseCache::new(), config }
	}

	/// Registration order is preserved and used as the scoring tie-break.
	pub fn register(&mut self, provider: Arc<dyn Provider<Op = Op, Response = Response, Record = Record>>) {
		let key = (provider.blockchain().to_string(), provider.name().to_string());
		self.state.lock().unwrap().entry(key).or_insert_with(|| ProviderState {
			circuit: CircuitBreaker::new(self.config.circuit.clone()),
			health: HealthTracker::default(),
			rate_limiter: Arc::new(RateLimiter::new(&provider.capabilities().rate_limit)),
		});
		self.providers.push(provider);
	}

	/// Registered providers filtered by chain + operation capability.
	pub fn get_providers(
		&self,
		chain: &str,
		operation: &str,
	) -> Vec<Arc<dyn Provider<Op = Op, Response = Response, Record = Record>>> {
		self.providers
			.iter()
			.filter(|p| p.blockchain() == chain && p.capabilities().supports(operation))
			.cloned()
			.collect()
	}

	/// Scores and orders candidate providers best-first. Ties keep
	/// registration order (the source list is already in that order and the
	/// sort is stable).
	fn ranked_candidates(
		&self,
		chain: &str,
		operation: &str,
		granularity: Option<&GranularityContext>,
	) -> Vec<Arc<dyn Provider<Op = Op, Response = Response, Record = Record>>> {
		let mut candidates = self.get_providers(chain, operation);
		let state = self.state.lock().unwrap();
		candidates.sort_by_key(|p| {
			let key = (p.blockchain().to_string(), p.name().to_string());
			let provider_state = state.get(&key).expect("provider registered without state");
			let inputs = ScoreInputs {
				circuit_state: provider_state.circuit.state(),
				health: &provider_state.health,
				priority_bonus: self.config.priority_bonus_for(p.name()),
				granularity,
			};
			std::cmp::Reverse(score(&inputs))
		});
		candidates
	}

	fn is_available(&self, chain: &str, name: &str) -> bool {
		let state = self.state.lock().unwrap();
		state
			.get(&(chain.to_string(), name.to_string()))
			.map(|s| s.circuit.is_available())
			.unwrap_or(true)
	}

	async fn acquire_rate_limit(&self, chain: &str, name: &str) {
		// Clone the Arc under a short critical section (spec §5), then await
		// the limiter with no lock held — a `MutexGuard` cannot cross an
		// await point.
		let limiter = {
			let state = self.state.lock().unwrap();
			state.get(&(chain.to_string(), name.to_string())).map(|s| s.rate_limiter.clone())
		};
		if let Some(limiter) = limiter {
			limiter.acquire().await;
		}
	}

	fn record_outcome(&self, chain: &str, name: &str, success: bool, response_time_ms: f64) {
		let mut state = self.state.lock().unwrap();
		if let Some(s) = state.get_mut(&(chain.to_string(), name.to_string())) {
			if success {
				s.circuit.record_success();
			} else {
				s.circuit.record_failure();
			}
			s.health.record(success, response_time_ms);
		}
	}

	/// Try providers in scored order; on failure, record and try the next.
	/// If every candidate's circuit is open and none are otherwise
	/// available, the manager logs and attempts the best-ranked one anyway
	/// (degraded mode) rather than hard-failing (spec §4.1).
	pub async fn execute_with_failover(
		&self,
		chain: &str,
		operation: &str,
		op: &Op,
	) -> Result<Response, ProviderError> {
		let ranked = self.ranked_candidates(chain, operation, None);
		if ranked.is_empty() {
			return Err(ProviderError::NoProviderAvailable { chain: chain.to_string() });
		}

		let available: Vec<_> = ranked.iter().filter(|p| self.is_available(chain, p.name())).collect();
		let ordered: Vec<&Arc<dyn Provider<Op = Op, Response = Response, Record = Record>>> = if available.is_empty() {
			warn!(chain, "all provider circuits open; attempting best-ranked provider in degraded mode");
			ranked.iter().collect()
		} else {
			available
		};

		let mut last_err: Option<ProviderError> = None;
		let mut previous_provider: Option<String> = None;

		for provider in ordered {
			if let Some(from) = previous_provider.take() {
				info!(
					from = %from,
					to = %provider.name(),
					reason = last_err.as_ref().map(|e| e.to_string()).unwrap_or_default(),
					"provider failover"
				);
			}

			match self.call_with_retry(chain, provider, op).await {
				Ok(response) => return Ok(response),
				Err(err) => {
					previous_provider = Some(provider.name().to_string());
					last_err = Some(err);
				},
			}
		}

		Err(last_err.unwrap_or(ProviderError::NoProviderAvailable { chain: chain.to_string() }))
	}

	/// One provider, retried with exponential backoff + jitter up to
	/// `config.max_retries` times. Validation errors are fatal immediately
	/// (never retried); transient/rate-limit errors are retried and, only
	/// for transient errors, eventually open the circuit.
	async fn call_with_retry(
		&self,
		chain: &str,
		provider: &Arc<dyn Provider<Op = Op, Response = Response, Record = Record>>,
		op: &Op,
	) -> Result<Response, ProviderError> {
		let name = provider.name();
		let mut attempt = 0u32;

		loop {
			self.acquire_rate_limit(chain, name).await;

			let started = Instant::now();
			let attempt_result =
				tokio::time::timeout(self.config.call_timeout(), provider.execute(op)).await;

			let result = match attempt_result {
				Ok(Ok(response)) => {
					if let Err(validation_err) = provider.validate_response(&response) {
						self.record_outcome(chain, name, false, started.elapsed().as_millis() as f64);
						return Err(validation_err);
					}
					Ok(response)
				},
				Ok(Err(err)) => Err(err),
				Err(_elapsed) => Err(ProviderError::Transient {
					provider: name.to_string(),
					message: "call timed out".into(),
				}),
			};

			match result {
				Ok(response) => {
					self.record_outcome(chain, name, true, started.elapsed().as_millis() as f64);
					return Ok(response);
				},
				Err(err) => {
					let response_time_ms = started.elapsed().as_millis() as f64;
					if err.opens_circuit() {
						self.record_outcome(chain, name, false, response_time_ms);
					}
					if !err.retryable() || attempt >= self.config.max_retries {
						debug!(provider = name, attempt, error = %err, "giving up on provider");
						return Err(err);
					}
					let delay = backoff_with_jitter(attempt);
					debug!(provider = name, attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying");
					attempt += 1;
					tokio::time::sleep(delay).await;
				},
			}
		}
	}

	/// Resume a streaming operation from `cursor`. The returned stream
	/// already reflects scored provider selection at call time; if it ends
	/// in an error the caller should persist the last good cursor carried in
	/// the final successful batch and call this again — the circuit state
	/// recorded for the failed provider will steer selection away from it.
	pub fn execute_streaming(
		&self,
		chain: &str,
		operation: &str,
		op: Op,
		cursor: Option<CursorState>,
	) -> Result<BatchStream<Record>, ProviderError> {
		let ranked = self.ranked_candidates(chain, operation, None);
		let provider = ranked
			.into_iter()
			.find(|p| self.is_available(chain, p.name()))
			.ok_or_else(|| ProviderError::NoProviderAvailable { chain: chain.to_string() })?;
		Ok(provider.execute_streaming(op, cursor))
	}

	pub fn cache(&self) -> &ResponseCache {
		&self.cache
	}
}

fn backoff_with_jitter(attempt: u32) -> Duration {
	let base_ms = 200u64.saturating_mul(1u64 << attempt.min(8));
	let jitter_ms = rand::thread_rng().gen_range(0..=base_ms / 4 + 1);
	Duration::from_millis(base_ms + jitter_ms)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::provider::{Capabilities, HealthCheckConfig};
	use async_trait::async_trait;
	use futures::stream;
	use std::sync::atomic::{AtomicU32, Ordering};

	struct FlakyProvider {
		name: &'static str,
		capabilities: Capabilities,
		failures_before_success: u32,
		calls: AtomicU32,
	}

	#[async_trait]
	impl Provider for FlakyProvider {
		type Op = ();
		type Response = i32;
		type Record = ();

		fn name(&self) -> &str {
			self.name
		}
		fn blockchain(&self) -> &str {
			"testchain"
		}
		fn capabilities(&self) -> &Capabilities {
			&self.capabilities
		}
		fn requires_api_key(&self) -> bool {
			false
		}
		fn health_check_config(&self) -> &HealthCheckConfig {
			static CFG: HealthCheckConfig =
				HealthCheckConfig { interval: Duration::from_secs(30), timeout: Duration::from_secs(5) };
			&CFG
		}

		async fn execute(&self, _op: &()) -> Result<i32, ProviderError> {
			let call = self.calls.fetch_add(1, Ordering::SeqCst);
			if call < self.failures_before_success {
				Err(ProviderError::Transient { provider: self.name.into(), message: "boom".into() })
			} else {
				Ok(42)
			}
		}

		fn validate_response(&self, _response: &i32) -> Result<(), ProviderError> {
			Ok(())
		}

		fn execute_streaming(&self, _op: (), _cursor: Option<CursorState>) -> BatchStream<()> {
			Box::pin(stream::empty())
		}
	}

	fn capabilities() -> Capabilities {
		Capabilities { operations: vec!["get_balance".into()], granularity_support: None, rate_limit: Default::default() }
	}

	#[tokio::test]
	async fn succeeds_after_retrying_same_provider() {
		let mut manager: ProviderManager<(), i32, ()> =
			ProviderManager::new(ProviderManagerConfig { max_retries: 5, ..Default::default() });
		manager.register(Arc::new(FlakyProvider {
			name: "flaky",
			capabilities: capabilities(),
			failures_before_success: 2,
			calls: AtomicU32::new(0),
		}));

		let result = manager.execute_with_failover("testchain", "get_balance", &()).await;
		assert_eq!(result.unwrap(), 42);
	}

	#[tokio::test]
	async fn fails_over_to_second_provider_once_first_opens_circuit() {
		let mut manager: ProviderManager<(), i32, ()> = ProviderManager::new(ProviderManagerConfig {
			max_retries: 0,
			circuit: crate::circuit::CircuitBreakerConfig { max_failures: 1, recovery_timeout_ms: 60_000 },
			..Default::default()
		});
		manager.register(Arc::new(FlakyProvider {
			name: "always-fails",
			capabilities: capabilities(),
			failures_before_success: u32::MAX,
			calls: AtomicU32::new(0),
		}));
		manager.register(Arc::new(FlakyProvider {
			name: "always-succeeds",
			capabilities: capabilities(),
			failures_before_success: 0,
			calls: AtomicU32::new(0),
		}));

		let result = manager.execute_with_failover("testchain", "get_balance", &()).await;
		assert_eq!(result.unwrap(), 42);

		// Second call: the first provider's circuit is now open, so it must
		// be skipped entirely and the second provider used directly.
		let result2 = manager.execute_with_failover("testchain", "get_balance", &()).await;
		assert_eq!(result2.unwrap(), 42);
	}

	#[tokio::test]
	async fn no_providers_registered_for_chain_errors() {
		let manager: ProviderManager<(), i32, ()> = ProviderManager::new(ProviderManagerConfig::default());
		let result = manager.execute_with_failover("testchain", "get_balance", &()).await;
		assert!(matches!(result, Err(ProviderError::NoProviderAvailable { .. })));
	}
}
