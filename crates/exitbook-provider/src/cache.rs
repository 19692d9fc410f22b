//! Process-wide response cache keyed by `(operation_type, params_fingerprint)`
//! (spec §4.1, §5). Reads are lock-free-ish (single mutex, short critical
//! section); writes never touch cache entries for mutating calls — callers
//! only cache idempotent reads.

use std::{
	collections::HashMap,
	sync::Mutex,
	time::{Duration, Instant},
};

use serde_json::Value;

#[derive(Clone)]
struct Entry {
	value: Value,
	expires_at: Instant,
}

#[derive(Default)]
pub struct ResponseCache {
	entries: Mutex<HashMap<(String, String), Entry>>,
}

impl ResponseCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, operation_type: &str, params_fingerprint: &str) -> Option<Value> {
		let key = (operation_type.to_string(), params_fingerprint.to_string());
		let entries = self.entries.lock().expect("response cache lock poisoned");
		entries.get(&key).filter(|entry| entry.expires_at > Instant::now()).map(|e| e.value.clone())
	}

	pub fn put(&self, operation_type: &str, params_fingerprint: &str, value: Value, ttl: Duration) {
		let key = (operation_type.to_string(), params_fingerprint.to_string());
		let mut entries = self.entries.lock().expect("response cache lock poisoned");
		entries.insert(key, Entry { value, expires_at: Instant::now() + ttl });
	}

	/// Time-only invalidation: entries are never evicted by a write path,
	/// only by their own TTL expiring.
	pub fn purge_expired(&self) {
		let mut entries = self.entries.lock().expect("response cache lock poisoned");
		let now = Instant::now();
		entries.retain(|_, entry| entry.expires_at > now);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cached_value_expires_after_ttl() {
		let cache = ResponseCache::new();
		cache.put("get_balance", "addr=abc", Value::from(42), Duration::from_millis(10));
        assert_eq!(cache.get("get_balance", "addr=abc"), Some(Value::from(42)));
		std::thread::sleep(Duration::from_millis(20));
		assert_eq!(cache.get("get_balance", "addr=abc"), None);
	}

	#[test]
	fn distinct_params_fingerprint_is_a_distinct_key() {
		let cache = ResponseCache::new();
		cache.put("get_balance", "addr=abc", Value::from(1), Duration::from_secs(60));
		cache.put("get_balance", "addr=def", Value::from(2), Duration::from_secs(60));
		assert_eq!(cache.get("get_balance", "addr=abc"), Some(Value::from(1)));
		assert_eq!(cache.get("get_balance", "addr=def"), Some(Value::from(2)));
	}
}
