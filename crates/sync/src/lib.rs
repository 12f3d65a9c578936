//! Fundtrace Sync - Two-store propagation and reconciliation
//!
//! A donation's primary append lives in the donor record, a
//! withdrawal's in the campaign. This crate carries each committed
//! event into the secondary aggregates (campaign raised totals,
//! organization rollups): best-effort with retry, idempotent by
//! transaction id, and never a reason to fail the original request.
//! The reconciliation sweep replays the primary event lists to detect
//! and repair any divergence the retries missed.

pub mod error;
pub mod journal;
pub mod outbox;
pub mod reconcile;

pub use error::{SyncError, SyncResult};
pub use journal::{Journal, LedgerEvent, SharedJournal};
pub use outbox::{Outbox, PropagationTask};
pub use reconcile::{CampaignDivergence, ReconcileReport, Reconciler};
