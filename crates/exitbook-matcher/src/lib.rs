//! Cross-account self-transfer detection (spec §4.4): deterministic match
//! criteria, confidence scoring, the internal-blockchain fast path, and the
//! append-only manual-override log that takes precedence over computed
//! suggestions.

pub mod confidence;
pub mod config;
pub mod criteria;
pub mod error;
pub mod fast_path;
pub mod matcher;
pub mod override_store;

pub use config::MatcherConfig;
pub use criteria::{build_match_criteria, CandidateInputs};
pub use error::MatcherError;
pub use matcher::{apply_overrides, find_candidates, Candidate, MatchResult};
pub use override_store::{InMemoryOverrideStore, JsonlOverrideStore, OverrideStore};
