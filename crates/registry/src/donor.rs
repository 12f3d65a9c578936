//! Donor records
//!
//! The donor's donation list is the primary store for donation events;
//! campaign-side raised totals are a mirror of it. The rolling
//! aggregates here are cached projections recomputed on every append.

use chrono::{DateTime, Utc};
use fundtrace_core::{Amount, TrackingId, TrustScore};
use serde::{Deserialize, Serialize};

use crate::error::RegistryResult;
use crate::event::{Applied, Donation, DonationSummary};

/// One registered donor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub donor_id: TrackingId,
    pub name: String,
    /// Ordered, append-only donation history
    pub donations: Vec<Donation>,
    /// Sum of all donation amounts (derived)
    pub total_donated: Amount,
    /// Number of donations (derived)
    pub donation_count: u64,
    /// Mean fraud score over the donation list (derived)
    pub average_fraud_score: TrustScore,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Donor {
    pub fn new(donor_id: TrackingId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            donor_id,
            name: name.into(),
            donations: Vec::new(),
            total_donated: Amount::ZERO,
            donation_count: 0,
            average_fraud_score: TrustScore::NEUTRAL,
            created_at: now,
            updated_at: now,
        }
    }

    /// Find a previously recorded donation by transaction id
    pub fn find_donation(&self, transaction_id: &TrackingId) -> Option<&Donation> {
        self.donations
            .iter()
            .find(|d| &d.transaction_id == transaction_id)
    }

    /// Append a donation event and update the rolling aggregates.
    /// Idempotent by transaction id.
    pub fn append_donation(&mut self, donation: Donation) -> RegistryResult<Applied> {
        if self.find_donation(&donation.transaction_id).is_some() {
            return Ok(Applied::Duplicate);
        }

        self.total_donated = self.total_donated.checked_add(&donation.amount)?;
        self.donation_count += 1;
        self.donations.push(donation);
        self.average_fraud_score = fundtrace_metrics::average_trust_score(
            self.donations.iter().map(|d| d.fraud_score),
            TrustScore::NEUTRAL,
        );
        self.updated_at = Utc::now();
        Ok(Applied::Recorded)
    }

    /// The donor's most recent donations, newest last, as handed to the
    /// fraud-scoring collaborator.
    pub fn recent_window(&self, limit: usize) -> Vec<DonationSummary> {
        let start = self.donations.len().saturating_sub(limit);
        self.donations[start..].iter().map(Into::into).collect()
    }
}
