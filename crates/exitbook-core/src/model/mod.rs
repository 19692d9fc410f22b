pub mod account;
pub mod data_source;
pub mod link;
pub mod lot;
pub mod override_event;
pub mod raw_transaction;
pub mod transaction;

pub use account::{Account, AccountType, CursorPrimary, CursorState};
pub use data_source::{DataSource, DataSourceStatus};
pub use link::{LinkStatus, LinkType, MatchCriteria, TransactionLink};
pub use lot::{AcquisitionLot, LotDisposal, LotMethod, LotStatus, LotTransfer, TaxTreatmentCategory};
pub use override_event::{OverrideEvent, OverridePayload, OverrideScope};
pub use raw_transaction::{ProcessingStatus, RawTransactionRecord};
pub use transaction::{
	BlockchainContext, Fee, FeeScope, FeeSettlement, Movement, Movements, Operation,
	OperationCategory, TransactionStatus, UniversalTransaction,
};
