//! Read-side queries
//!
//! Queries never mutate. The compliance query reads a category's
//! figures under the campaign's lock; the history query assembles a
//! campaign's full transaction stream by walking the donor-owned
//! donation lists (the primary store) plus the campaign's withdrawal
//! list.

use std::sync::Arc;

use fundtrace_core::TrackingId;
use fundtrace_metrics::ComplianceSummary;
use fundtrace_registry::{Donation, Registry, Withdrawal};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::LedgerResult;

/// Which event kinds a history query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum HistoryFilter {
    Donations,
    Withdrawals,
    All,
}

/// A campaign's transaction stream, newest last
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionHistory {
    pub campaign_id: TrackingId,
    pub donations: Vec<Donation>,
    pub withdrawals: Vec<Withdrawal>,
}

impl TransactionHistory {
    pub fn total_events(&self) -> usize {
        self.donations.len() + self.withdrawals.len()
    }
}

/// Read-only views over the registry
pub struct LedgerQueries {
    registry: Arc<Registry>,
}

impl LedgerQueries {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Compliance snapshot for one category of one campaign
    pub async fn compliance(
        &self,
        campaign_id: &TrackingId,
        category: &str,
    ) -> LedgerResult<ComplianceSummary> {
        let campaign = self.registry.campaign(campaign_id).await?;
        let campaign = campaign.lock().await;
        let category = campaign.find_category(category)?;
        Ok(ComplianceSummary::from_figures(
            category.budget,
            category.spent,
        ))
    }

    /// A campaign's transaction history.
    ///
    /// Donations come from the donor-owned lists rather than the
    /// campaign's mirror: history must reflect the primary store even
    /// while a propagation is still queued.
    pub async fn history(
        &self,
        campaign_id: &TrackingId,
        filter: HistoryFilter,
    ) -> LedgerResult<TransactionHistory> {
        // Existence check up front so an unknown campaign errors
        // instead of returning an empty history
        let campaign = self.registry.campaign(campaign_id).await?;

        let withdrawals = if filter != HistoryFilter::Donations {
            campaign.lock().await.withdrawals.clone()
        } else {
            Vec::new()
        };

        let mut donations = Vec::new();
        if filter != HistoryFilter::Withdrawals {
            for donor in self.registry.donor_handles().await {
                let donor = donor.lock().await;
                donations.extend(
                    donor
                        .donations
                        .iter()
                        .filter(|d| &d.campaign_id == campaign_id)
                        .cloned(),
                );
            }
            donations.sort_by_key(|d| d.timestamp);
        }

        Ok(TransactionHistory {
            campaign_id: campaign_id.clone(),
            donations,
            withdrawals,
        })
    }
}
