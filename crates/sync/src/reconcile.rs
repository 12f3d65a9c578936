//! Reconciliation sweep
//!
//! The donor-owned donation lists are the primary store; campaign and
//! organization aggregates are mirrors. This sweep replays the primary
//! lists, repairs any campaign whose mirror diverged (missed or
//! double-applied propagation), and re-derives the organization
//! rollups. After a sweep both stores agree by construction.

use std::collections::HashMap;
use std::sync::Arc;

use fundtrace_core::{Amount, TrackingId, TrustScore};
use fundtrace_registry::{Donation, Registry};
use serde::{Deserialize, Serialize};

use crate::error::SyncResult;
use crate::journal::{LedgerEvent, SharedJournal};

/// A campaign whose mirrored raised total disagreed with the replayed
/// donation stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignDivergence {
    pub campaign_id: TrackingId,
    pub stored_raised: Amount,
    pub replayed_raised: Amount,
}

/// Outcome of one reconciliation sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub campaigns_checked: usize,
    pub organizations_checked: usize,
    pub repaired: Vec<CampaignDivergence>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.repaired.is_empty()
    }
}

/// Replay-based repair of the secondary store
pub struct Reconciler {
    registry: Arc<Registry>,
    journal: SharedJournal,
}

impl Reconciler {
    pub fn new(registry: Arc<Registry>, journal: SharedJournal) -> Self {
        Self { registry, journal }
    }

    /// Run one sweep over every campaign and organization.
    pub async fn run(&self) -> SyncResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        // Replay the primary store: all donations, grouped by campaign
        let mut by_campaign: HashMap<TrackingId, Vec<Donation>> = HashMap::new();
        for handle in self.registry.donor_handles().await {
            let donor = handle.lock().await;
            for donation in &donor.donations {
                by_campaign
                    .entry(donation.campaign_id.clone())
                    .or_default()
                    .push(donation.clone());
            }
        }

        for handle in self.registry.campaign_handles().await {
            let mut campaign = handle.lock().await;
            let replayed = by_campaign
                .remove(&campaign.campaign_id)
                .unwrap_or_default();

            let mut expected = Amount::ZERO;
            for donation in &replayed {
                expected = expected.checked_add(&donation.amount)?;
            }

            let diverged = campaign.raised_amount != expected
                || campaign.mirrored_donations.len() != replayed.len();
            if diverged {
                let divergence = CampaignDivergence {
                    campaign_id: campaign.campaign_id.clone(),
                    stored_raised: campaign.raised_amount,
                    replayed_raised: expected,
                };
                tracing::info!(
                    campaign_id = %divergence.campaign_id,
                    stored = %divergence.stored_raised,
                    replayed = %divergence.replayed_raised,
                    "repairing diverged campaign mirror"
                );
                self.append_event(&LedgerEvent::reconciliation_repaired(
                    divergence.campaign_id.clone(),
                    divergence.stored_raised,
                    divergence.replayed_raised,
                ))
                .await;

                campaign.rebuild_donation_mirror(&replayed)?;
                report.repaired.push(divergence);
            }
            report.campaigns_checked += 1;
        }

        self.rebuild_org_rollups(&mut report).await?;
        Ok(report)
    }

    /// Re-derive every organization's totals from its campaigns.
    async fn rebuild_org_rollups(&self, report: &mut ReconcileReport) -> SyncResult<()> {
        for handle in self.registry.organization_handles().await {
            let campaign_ids = handle.lock().await.campaign_ids.clone();

            let mut raised = Amount::ZERO;
            let mut withdrawn = Amount::ZERO;
            let mut trust_scores = Vec::new();
            for campaign_id in &campaign_ids {
                let Ok(campaign) = self.registry.campaign(campaign_id).await else {
                    tracing::warn!(%campaign_id, "organization references unknown campaign");
                    continue;
                };
                let campaign = campaign.lock().await;
                raised = raised.checked_add(&campaign.raised_amount)?;
                for withdrawal in &campaign.withdrawals {
                    withdrawn = withdrawn.checked_add(&withdrawal.amount)?;
                }
                trust_scores.push(campaign.average_trust_score);
            }

            let trust =
                fundtrace_metrics::average_trust_score(trust_scores, TrustScore::NEUTRAL);
            handle.lock().await.reset_totals(raised, withdrawn, trust);
            report.organizations_checked += 1;
        }
        Ok(())
    }

    async fn append_event(&self, event: &LedgerEvent) {
        if let Err(err) = self.journal.lock().await.append(event) {
            tracing::error!(error = %err, "journal append failed");
        }
    }
}
