//! Fundtrace Registry - Campaign, donor and organization records
//!
//! Owns the ledger's data model: campaigns with their budget
//! categories and withdrawal lists, donors with their donation lists,
//! and organizations with rolled-up totals. Events are append-only;
//! corrections are new compensating events, never mutations.
//!
//! The [`Registry`] store serializes same-campaign requests behind a
//! per-campaign mutex while letting different campaigns proceed in
//! parallel.

pub mod campaign;
pub mod donor;
pub mod error;
pub mod event;
pub mod organization;
pub mod store;

pub use campaign::{Campaign, CampaignStatus, Category, DonationMirror};
pub use donor::Donor;
pub use error::{RegistryError, RegistryResult};
pub use event::{Applied, Donation, DonationSummary, Withdrawal};
pub use organization::{OrgStatus, Organization};
pub use store::Registry;
