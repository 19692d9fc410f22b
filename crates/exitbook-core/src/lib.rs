//! Shared domain model, asset identity, decimal math, and error taxonomy for
//! the exitbook ledger core. Every other crate in the workspace depends on
//! this one; it depends on nothing workspace-local.

pub mod asset;
pub mod decimal;
pub mod error;
pub mod model;

pub use asset::{AddressNormalization, AssetId};
pub use decimal::Amount;
pub use error::CoreError;
