//! Token-bucket rate limiting per provider (spec §4.1). Advertised limits can
//! carry more than one window (`requests_per_second`, `per_minute`,
//! `per_hour`, `burst`); a call must clear every configured window before
//! dispatch, so we keep one `governor` limiter per window and require all of
//! them to admit the request.

use std::num::NonZeroU32;

use governor::{Quota, RateLimiter as GovernorLimiter};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RateLimitAdvert {
	pub requests_per_second: Option<u32>,
	pub per_minute: Option<u32>,
	pub per_hour: Option<u32>,
	pub burst: Option<u32>,
}

type DirectLimiter = GovernorLimiter<
	governor::state::direct::NotKeyed,
	governor::state::InMemoryState,
	governor::clock::DefaultClock,
>;

pub struct RateLimiter {
	windows: Vec<DirectLimiter>,
}

impl RateLimiter {
	pub fn new(advert: &RateLimitAdvert) -> Self {
		let burst = advert.burst.and_then(NonZeroU32::new).unwrap_or(NonZeroU32::new(1).unwrap());
		let mut windows = Vec::new();

		if let Some(rps) = advert.requests_per_second.and_then(NonZeroU32::new) {
			windows.push(GovernorLimiter::direct(Quota::per_second(rps).allow_burst(burst)));
		}
		if let Some(rpm) = advert.per_minute.and_then(NonZeroU32::new) {
			windows.push(GovernorLimiter::direct(Quota::per_minute(rpm).allow_burst(burst)));
		}
		if let Some(rph) = advert.per_hour.and_then(NonZeroU32::new) {
			windows.push(GovernorLimiter::direct(Quota::per_hour(rph).allow_burst(burst)));
		}

		Self { windows }
	}

	/// Blocks until every configured window admits the request. Called
	/// before HTTP dispatch, never after (spec §4.1 "blocks before HTTP
	/// dispatch").
	pub async fn acquire(&self) {
		for window in &self.windows {
			window.until_ready().await;
		}
	}

	pub fn is_unbounded(&self) -> bool {
		self.windows.is_empty()
	}
}
