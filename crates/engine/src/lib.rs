//! Fundtrace Engine - The ledger's write paths
//!
//! Two entry points mutate the ledger: the donation recorder
//! (money-in) and the withdrawal processor (money-out). Both validate
//! against current category state under the campaign's lock, consult an
//! external scoring collaborator with a timeout, append exactly one
//! immutable event on success, and hand the event to the sync outbox
//! for secondary-store propagation.

pub mod collaborators;
pub mod config;
pub mod donation;
pub mod error;
pub mod query;
pub mod withdrawal;

pub use collaborators::{
    CollaboratorError, FraudScorer, FraudSignal, ReasonVerifier, StaticFraudScorer,
    StaticReasonVerifier, WithdrawalReview,
};
pub use config::{EngineConfig, FailPolicy};
pub use donation::{DonationReceipt, DonationRecorder, DonationRequest};
pub use error::{LedgerError, LedgerResult};
pub use query::{HistoryFilter, LedgerQueries, TransactionHistory};
pub use withdrawal::{WithdrawalProcessor, WithdrawalReceipt, WithdrawalRequest};
