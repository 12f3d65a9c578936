//! Organization records
//!
//! Holds the organization-level rollups mirrored from campaign events.
//! Organizations are never hard-deleted; deactivation is a status flip.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use fundtrace_core::{Amount, TrackingId, TrustScore};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::RegistryResult;
use crate::event::Applied;

/// Soft lifecycle status for organizations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrgStatus {
    Active,
    Suspended,
}

/// One registered charitable organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub org_id: TrackingId,
    pub name: String,
    pub verified: bool,
    pub status: OrgStatus,
    /// Campaigns owned by this organization
    pub campaign_ids: Vec<TrackingId>,
    /// Sum of donations across owned campaigns (mirrored)
    pub total_raised: Amount,
    /// Sum of withdrawals across owned campaigns (mirrored)
    pub total_withdrawn: Amount,
    /// Mean of owned campaigns' trust scores (recomputed by sync)
    pub overall_trust_score: TrustScore,
    /// Transaction ids already applied to the mirrored totals
    applied_transactions: HashSet<TrackingId>,
    pub created_at: DateTime<Utc>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Organization {
    pub fn new(org_id: TrackingId, name: impl Into<String>, verified: bool) -> Self {
        Self {
            org_id,
            name: name.into(),
            verified,
            status: OrgStatus::Active,
            campaign_ids: Vec::new(),
            total_raised: Amount::ZERO,
            total_withdrawn: Amount::ZERO,
            overall_trust_score: TrustScore::NEUTRAL,
            applied_transactions: HashSet::new(),
            created_at: Utc::now(),
            last_synced_at: None,
        }
    }

    /// Soft-deactivate; records are never hard-deleted
    pub fn suspend(&mut self) {
        self.status = OrgStatus::Suspended;
    }

    /// Mirror a donation into `total_raised`. Idempotent by
    /// transaction id.
    pub fn apply_raised(
        &mut self,
        transaction_id: &TrackingId,
        amount: &Amount,
    ) -> RegistryResult<Applied> {
        if self.applied_transactions.contains(transaction_id) {
            return Ok(Applied::Duplicate);
        }
        self.total_raised = self.total_raised.checked_add(amount)?;
        self.applied_transactions.insert(transaction_id.clone());
        self.last_synced_at = Some(Utc::now());
        Ok(Applied::Recorded)
    }

    /// Mirror a withdrawal into `total_withdrawn`. Idempotent by
    /// transaction id.
    pub fn apply_withdrawn(
        &mut self,
        transaction_id: &TrackingId,
        amount: &Amount,
    ) -> RegistryResult<Applied> {
        if self.applied_transactions.contains(transaction_id) {
            return Ok(Applied::Duplicate);
        }
        self.total_withdrawn = self.total_withdrawn.checked_add(amount)?;
        self.applied_transactions.insert(transaction_id.clone());
        self.last_synced_at = Some(Utc::now());
        Ok(Applied::Recorded)
    }

    /// Overwrite the mirrored totals from a replayed event stream.
    /// Only the reconciliation sweep calls this.
    pub fn reset_totals(&mut self, raised: Amount, withdrawn: Amount, trust: TrustScore) {
        self.total_raised = raised;
        self.total_withdrawn = withdrawn;
        self.overall_trust_score = trust;
        self.last_synced_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundtrace_core::IdKind;
    use rust_decimal_macros::dec;

    fn org() -> Organization {
        Organization::new(
            TrackingId::generate(IdKind::Organization),
            "Global Relief Foundation",
            true,
        )
    }

    #[test]
    fn test_apply_raised_idempotent() {
        let mut org = org();
        let txid = TrackingId::new("DON-1").unwrap();
        let amount = Amount::new(dec!(500)).unwrap();

        assert_eq!(org.apply_raised(&txid, &amount).unwrap(), Applied::Recorded);
        assert!(org.apply_raised(&txid, &amount).unwrap().is_duplicate());
        assert_eq!(org.total_raised.value(), dec!(500));
        assert!(org.last_synced_at.is_some());
    }

    #[test]
    fn test_apply_withdrawn() {
        let mut org = org();
        let txid = TrackingId::new("WTH-1").unwrap();
        org.apply_withdrawn(&txid, &Amount::new(dec!(200)).unwrap())
            .unwrap();
        assert_eq!(org.total_withdrawn.value(), dec!(200));
    }

    #[test]
    fn test_suspend_is_soft() {
        let mut org = org();
        org.suspend();
        assert_eq!(org.status, OrgStatus::Suspended);
        // record survives, only the status flips
        assert_eq!(org.name, "Global Relief Foundation");
    }
}
