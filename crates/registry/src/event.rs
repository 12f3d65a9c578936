//! Immutable ledger events
//!
//! A `Donation` is owned by the donor that made it and referenced by
//! the campaign it targets; a `Withdrawal` is owned by its campaign.
//! Once appended neither is mutated or deleted - corrections are new
//! compensating events.

use chrono::{DateTime, Utc};
use fundtrace_core::{Amount, TrackingId, TrustScore, UnitScore};
use serde::{Deserialize, Serialize};

/// Outcome of an idempotent append.
///
/// Re-submitting a transaction identifier that is already in the list
/// is a no-op, not a duplicate entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The event was appended
    Recorded,
    /// The transaction id was already present; nothing changed
    Duplicate,
}

impl Applied {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Applied::Duplicate)
    }
}

/// A recorded donation event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    /// Idempotency key; externally supplied or generated
    pub transaction_id: TrackingId,
    /// Campaign the donation targets (referenced, not owned)
    pub campaign_id: TrackingId,
    /// Budget category within the campaign
    pub category: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    /// Trust-scale score derived from the fraud collaborator's risk
    pub fraud_score: TrustScore,
    /// False when the fraud collaborator was unavailable and the
    /// donation was accepted unverified
    pub verified: bool,
}

impl Donation {
    pub fn new(
        transaction_id: TrackingId,
        campaign_id: TrackingId,
        category: impl Into<String>,
        amount: Amount,
        fraud_score: TrustScore,
        verified: bool,
    ) -> Self {
        Self {
            transaction_id,
            campaign_id,
            category: category.into(),
            amount,
            timestamp: Utc::now(),
            fraud_score,
            verified,
        }
    }
}

/// A recorded withdrawal event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Idempotency key; externally supplied or generated
    pub transaction_id: TrackingId,
    /// Budget category the spending is charged against
    pub category: String,
    pub amount: Amount,
    /// Free-text justification for the spending
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    /// Plausibility score from the AI-verification collaborator
    pub verification_score: UnitScore,
    /// True when the withdrawal passed entry validation
    pub approved: bool,
    /// Category compliance evaluated at the time of this withdrawal,
    /// not from current totals. Set by the campaign on append.
    pub compliant: bool,
}

impl Withdrawal {
    pub fn new(
        transaction_id: TrackingId,
        category: impl Into<String>,
        amount: Amount,
        reason: impl Into<String>,
        verification_score: UnitScore,
        approved: bool,
    ) -> Self {
        Self {
            transaction_id,
            category: category.into(),
            amount,
            reason: reason.into(),
            timestamp: Utc::now(),
            verification_score,
            approved,
            compliant: false,
        }
    }
}

/// Compact view of a donation handed to the fraud collaborator as part
/// of a donor's recent transaction window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationSummary {
    pub transaction_id: TrackingId,
    pub campaign_id: TrackingId,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

impl From<&Donation> for DonationSummary {
    fn from(donation: &Donation) -> Self {
        Self {
            transaction_id: donation.transaction_id.clone(),
            campaign_id: donation.campaign_id.clone(),
            amount: donation.amount,
            timestamp: donation.timestamp,
        }
    }
}
