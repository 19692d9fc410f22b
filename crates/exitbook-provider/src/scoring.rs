//! Provider scoring (spec §4.1). Base 100 points, adjusted by circuit state,
//! health, response time, error rate, consecutive failures, a configured
//! priority bonus, and — for price providers against intraday timestamps —
//! a granularity bonus. Deterministic given equal state; ties break by
//! registration order in [`crate::manager::ProviderManager`].

use chrono::{DateTime, Utc, Timelike};

use crate::{circuit::CircuitState, health::HealthTracker};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Granularity {
	Minute,
	Hourly,
	DailyOnly,
}

/// Intraday timestamp context for price-provider granularity bonuses. A
/// midnight-UTC timestamp (a daily close) skips the bonus entirely since
/// daily granularity is already sufficient for it.
pub struct GranularityContext {
	pub requested_at: DateTime<Utc>,
	pub provider_granularity: Granularity,
	pub in_range: bool,
}

pub fn granularity_bonus(ctx: Option<&GranularityContext>) -> i64 {
	let Some(ctx) = ctx else { return 0 };
	if is_midnight_utc(ctx.requested_at) {
		return 0;
	}
	if !ctx.in_range {
		return 0;
	}
	match ctx.provider_granularity {
		Granularity::Minute => 30,
		Granularity::Hourly => 20,
		Granularity::DailyOnly => -10,
	}
}

fn is_midnight_utc(ts: DateTime<Utc>) -> bool {
	ts.hour() == 0 && ts.minute() == 0 && ts.second() == 0
}

pub struct ScoreInputs<'a> {
	pub circuit_state: CircuitState,
	pub health: &'a HealthTracker,
	pub priority_bonus: i64,
	pub granularity: Option<&'a GranularityContext>,
}

/// Returns the provider's score; higher is better. Never negative in
/// practice is not guaranteed by spec (a badly-performing provider can
/// legitimately bottom out), so the result is a plain `i64`.
pub fn score(inputs: &ScoreInputs<'_>) -> i64 {
	let mut score: i64 = 100;

	score += match inputs.circuit_state {
		CircuitState::Open => -100,
		CircuitState::HalfOpen => -25,
		CircuitState::Closed => 0,
	};

	if !inputs.health.is_healthy() {
		score -= 50;
	}

	let avg_rt = inputs.health.avg_response_time_ms();
	if avg_rt < 1000.0 {
		score += 20;
	} else if avg_rt > 5000.0 {
		score -= 30;
	}

	score -= (inputs.health.error_rate() * 50.0).round() as i64;

	let consecutive_penalty = (inputs.health.consecutive_failures() as i64) * 10;
	score -= consecutive_penalty.max(0);

	score += inputs.priority_bonus;

	score += granularity_bonus(inputs.granularity);

	score
}
