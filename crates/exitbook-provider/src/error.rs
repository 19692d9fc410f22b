use thiserror::Error;

/// Error kinds per spec §7. `retryable()` drives the retry/backoff policy;
/// `opens_circuit()` drives the circuit breaker — rate-limit and validation
/// errors never open the circuit on their own, only repeated transient
/// failures do.
#[derive(Debug, Error)]
pub enum ProviderError {
	#[error("transient network error calling {provider}: {message}")]
	Transient { provider: String, message: String },

	#[error("rate limited by {provider}: {message}")]
	RateLimit { provider: String, message: String, retry_after_ms: Option<u64> },

	#[error("response validation failed for {provider}: {message}")]
	Validation { provider: String, message: String },

	#[error("no provider available for chain {chain}")]
	NoProviderAvailable { chain: String },

	#[error("configuration error: {0}")]
	Configuration(String),
}

impl ProviderError {
	pub fn retryable(&self) -> bool {
		matches!(self, ProviderError::Transient { .. } | ProviderError::RateLimit { .. })
	}

	pub fn opens_circuit(&self) -> bool {
		matches!(self, ProviderError::Transient { .. })
	}

	pub fn provider_name(&self) -> Option<&str> {
		match self {
			ProviderError::Transient { provider, .. } => Some(provider),
			ProviderError::RateLimit { provider, .. } => Some(provider),
			ProviderError::Validation { provider, .. } => Some(provider),
			_ => None,
		}
	}
}
