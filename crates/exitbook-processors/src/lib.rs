//! Per-source raw-to-universal-transaction processors (spec §4.3):
//! fund-flow analysis, operation classification, fee attribution,
//! scam-detection and token-metadata hooks, and multi-stream correlation
//! for chains that emit several event streams per on-chain transaction.

pub mod classify;
pub mod correlation;
pub mod error;
pub mod fee_policy;
pub mod fund_flow;
pub mod pipeline;
pub mod scam;
pub mod token_metadata;
pub mod user_context;

pub use classify::{classify_operation, Counterparty, SourceHint};
pub use error::{ProcessorError, RecordFailure};
pub use fee_policy::attribute_fee;
pub use fund_flow::{classify_direction, net_after_onchain_fee, same_asset, Direction};
pub use pipeline::{assemble_strict, ProcessedBatch, Processor};
pub use scam::{NoopScamDetector, ScamDetector};
pub use token_metadata::{InMemoryTokenMetadataService, TokenMetadata, TokenMetadataService};
pub use user_context::UserContext;
