//! Campaign and category records
//!
//! A campaign owns its withdrawal list and a mirror of the donation
//! stream that targets it. `raised_amount`, per-category `spent` and
//! the trust/compliance aggregates are cached projections recomputed
//! from those lists after every append.

use chrono::{DateTime, Utc};
use fundtrace_core::{Amount, TrackingId, TrustScore};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{RegistryError, RegistryResult};
use crate::event::{Applied, Donation, Withdrawal};

/// Campaign lifecycle status. Only `active -> completed` and
/// `active -> cancelled` transitions are legal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Active,
    Completed,
    Cancelled,
}

/// A named budget line within a campaign.
///
/// # Invariant
/// `remaining() == budget - spent` (floored at zero) after every
/// mutation; `spent` only ever increases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique within the campaign; matched case-sensitively
    pub name: String,
    /// Fixed allocation pledged for this line
    pub budget: Amount,
    /// Total withdrawn against this line (derived)
    pub spent: Amount,
    /// Donations attributed to this line (derived sub-aggregate for
    /// category progress; `Campaign::raised_amount` is authoritative)
    pub raised: Amount,
}

impl Category {
    pub fn new(name: impl Into<String>, budget: Amount) -> Self {
        Self {
            name: name.into(),
            budget,
            spent: Amount::ZERO,
            raised: Amount::ZERO,
        }
    }

    /// Unspent budget, floored at zero when overspent
    pub fn remaining(&self) -> Amount {
        self.budget.saturating_sub(&self.spent)
    }

    /// Whether spending is still inside the pledged envelope
    pub fn is_compliant(&self) -> bool {
        fundtrace_metrics::category_compliance(&self.spent, &self.budget)
    }
}

/// Mirrored copy of a donation event held on the campaign side.
///
/// The donor's donation list is the primary store; this is the
/// secondary view the reconciliation sweep replays against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationMirror {
    pub transaction_id: TrackingId,
    pub category: String,
    pub amount: Amount,
    pub fraud_score: TrustScore,
}

/// One fundraising effort, owned by exactly one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub campaign_id: TrackingId,
    pub org_id: TrackingId,
    pub title: String,
    pub target_amount: Amount,
    /// Sum of all mirrored donations (derived)
    pub raised_amount: Amount,
    pub status: CampaignStatus,
    pub categories: Vec<Category>,
    pub withdrawals: Vec<Withdrawal>,
    /// Mirror of the donation stream targeting this campaign
    pub mirrored_donations: Vec<DonationMirror>,
    /// Mean of all withdrawal and donation scores in scope (cached)
    pub average_trust_score: TrustScore,
    /// Percentage of withdrawals compliant at their commit time (cached)
    pub compliance_rate: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Create a new campaign.
    ///
    /// Validates `target_amount > 0`, every category budget > 0 and
    /// category name uniqueness. Does NOT require budgets to sum to the
    /// target - under/over-allocation is permitted and surfaced through
    /// [`Campaign::allocation_delta`].
    pub fn create(
        org_id: TrackingId,
        title: impl Into<String>,
        target_amount: Amount,
        categories: Vec<(String, Amount)>,
    ) -> RegistryResult<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(RegistryError::Validation(
                "campaign title cannot be empty".to_string(),
            ));
        }
        if target_amount.is_zero() {
            return Err(RegistryError::Validation(
                "target amount must be positive".to_string(),
            ));
        }

        let mut built = Vec::with_capacity(categories.len());
        for (name, budget) in categories {
            if name.trim().is_empty() {
                return Err(RegistryError::Validation(
                    "category name cannot be empty".to_string(),
                ));
            }
            if budget.is_zero() {
                return Err(RegistryError::Validation(format!(
                    "category '{}' must have a positive budget",
                    name
                )));
            }
            if built.iter().any(|c: &Category| c.name == name) {
                return Err(RegistryError::Validation(format!(
                    "duplicate category name '{}'",
                    name
                )));
            }
            built.push(Category::new(name, budget));
        }

        let now = Utc::now();
        Ok(Self {
            campaign_id: TrackingId::generate(fundtrace_core::IdKind::Campaign),
            org_id,
            title,
            target_amount,
            raised_amount: Amount::ZERO,
            status: CampaignStatus::Active,
            categories: built,
            withdrawals: Vec::new(),
            mirrored_donations: Vec::new(),
            average_trust_score: TrustScore::NEUTRAL,
            compliance_rate: Decimal::ONE_HUNDRED,
            created_at: now,
            updated_at: now,
        })
    }

    /// Exact, case-sensitive category lookup. A miss is a usage error,
    /// never silently ignored.
    pub fn find_category(&self, name: &str) -> RegistryResult<&Category> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| RegistryError::CategoryNotFound {
                campaign_id: self.campaign_id.to_string(),
                category: name.to_string(),
            })
    }

    fn find_category_mut(&mut self, name: &str) -> RegistryResult<&mut Category> {
        let campaign_id = self.campaign_id.to_string();
        self.categories
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or(RegistryError::CategoryNotFound {
                campaign_id,
                category: name.to_string(),
            })
    }

    /// Signed target-minus-allocated delta (see [`Campaign::create`]).
    pub fn allocation_delta(&self) -> Decimal {
        fundtrace_metrics::allocation_delta(
            &self.target_amount,
            self.categories.iter().map(|c| &c.budget),
        )
    }

    /// Whether a withdrawal with this transaction id is already recorded
    pub fn has_withdrawal(&self, transaction_id: &TrackingId) -> bool {
        self.withdrawals
            .iter()
            .any(|w| &w.transaction_id == transaction_id)
    }

    /// Append a withdrawal event and update the spent totals.
    ///
    /// This is the only path that grows `spent`. The event's
    /// `compliant` flag is evaluated here, against the totals as they
    /// stand after this withdrawal. The append itself never refuses an
    /// over-budget event - entry refusal is the withdrawal processor's
    /// job; externally synced events land here unchecked and merely
    /// flag (and lower the compliance rate).
    pub fn record_withdrawal(&mut self, mut withdrawal: Withdrawal) -> RegistryResult<Applied> {
        if self.has_withdrawal(&withdrawal.transaction_id) {
            return Ok(Applied::Duplicate);
        }

        let category = self.find_category_mut(&withdrawal.category)?;
        category.spent = category.spent.checked_add(&withdrawal.amount)?;
        withdrawal.compliant = category.is_compliant();

        self.withdrawals.push(withdrawal);
        self.recompute_metrics();
        self.updated_at = Utc::now();
        Ok(Applied::Recorded)
    }

    /// Apply a donation from the primary (donor-owned) store to this
    /// campaign's mirror, updating raised totals. Idempotent by
    /// transaction id.
    pub fn apply_donation(&mut self, donation: &Donation) -> RegistryResult<Applied> {
        if self
            .mirrored_donations
            .iter()
            .any(|m| m.transaction_id == donation.transaction_id)
        {
            return Ok(Applied::Duplicate);
        }

        self.raised_amount = self.raised_amount.checked_add(&donation.amount)?;
        if self.categories.iter().any(|c| c.name == donation.category) {
            let category = self.find_category_mut(&donation.category)?;
            category.raised = category.raised.checked_add(&donation.amount)?;
        } else {
            // Donations from external rails may reference a category
            // label this campaign never defined; the campaign total
            // still counts it, the sub-aggregate cannot
            tracing::warn!(
                campaign_id = %self.campaign_id,
                category = %donation.category,
                "donation references unknown category; raised sub-aggregate skipped"
            );
        }

        self.mirrored_donations.push(DonationMirror {
            transaction_id: donation.transaction_id.clone(),
            category: donation.category.clone(),
            amount: donation.amount,
            fraud_score: donation.fraud_score,
        });
        self.recompute_metrics();
        self.updated_at = Utc::now();
        Ok(Applied::Recorded)
    }

    /// Replace the donation mirror with a replayed event list and
    /// re-derive the raised totals from it. Used by the reconciliation
    /// sweep to repair divergence between the two stores.
    pub fn rebuild_donation_mirror(&mut self, donations: &[Donation]) -> RegistryResult<()> {
        self.mirrored_donations.clear();
        self.raised_amount = Amount::ZERO;
        for category in &mut self.categories {
            category.raised = Amount::ZERO;
        }
        for donation in donations {
            self.apply_donation(donation)?;
        }
        self.recompute_metrics();
        Ok(())
    }

    /// Transition `active -> completed`
    pub fn complete(&mut self) -> RegistryResult<()> {
        self.transition(CampaignStatus::Completed)
    }

    /// Transition `active -> cancelled`
    pub fn cancel(&mut self) -> RegistryResult<()> {
        self.transition(CampaignStatus::Cancelled)
    }

    fn transition(&mut self, to: CampaignStatus) -> RegistryResult<()> {
        if self.status != CampaignStatus::Active {
            return Err(RegistryError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Recompute the cached trust and compliance projections from the
    /// event lists. Never called with stale inputs: every append ends
    /// here.
    fn recompute_metrics(&mut self) {
        let scores = self
            .withdrawals
            .iter()
            .map(|w| TrustScore::from_unit(w.verification_score))
            .chain(self.mirrored_donations.iter().map(|m| m.fraud_score));
        self.average_trust_score =
            fundtrace_metrics::average_trust_score(scores, TrustScore::NEUTRAL);
        self.compliance_rate =
            fundtrace_metrics::compliance_rate(self.withdrawals.iter().map(|w| w.compliant));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundtrace_core::{IdKind, UnitScore};
    use rust_decimal_macros::dec;

    fn amount(v: Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    fn sample_campaign() -> Campaign {
        Campaign::create(
            TrackingId::generate(IdKind::Organization),
            "Emergency Relief",
            amount(dec!(100000)),
            vec![
                ("Medical Supplies".to_string(), amount(dec!(40000))),
                ("Food & Water".to_string(), amount(dec!(35000))),
                ("Shelter".to_string(), amount(dec!(25000))),
            ],
        )
        .unwrap()
    }

    fn withdrawal(category: &str, v: Decimal) -> Withdrawal {
        Withdrawal::new(
            TrackingId::generate(IdKind::Withdrawal),
            category,
            amount(v),
            "Supplies purchase",
            UnitScore::new(dec!(0.9)),
            true,
        )
    }

    #[test]
    fn test_create_valid() {
        let campaign = sample_campaign();
        assert_eq!(campaign.status, CampaignStatus::Active);
        assert_eq!(campaign.raised_amount, Amount::ZERO);
        assert_eq!(campaign.compliance_rate, dec!(100));
        assert!(campaign.categories.iter().all(|c| c.spent.is_zero()));
    }

    #[test]
    fn test_create_rejects_zero_target() {
        let result = Campaign::create(
            TrackingId::generate(IdKind::Organization),
            "Bad",
            Amount::ZERO,
            vec![],
        );
        assert!(matches!(result, Err(RegistryError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_zero_budget() {
        let result = Campaign::create(
            TrackingId::generate(IdKind::Organization),
            "Bad",
            amount(dec!(1000)),
            vec![("Water".to_string(), Amount::ZERO)],
        );
        assert!(matches!(result, Err(RegistryError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_duplicate_category() {
        let result = Campaign::create(
            TrackingId::generate(IdKind::Organization),
            "Bad",
            amount(dec!(1000)),
            vec![
                ("Water".to_string(), amount(dec!(500))),
                ("Water".to_string(), amount(dec!(500))),
            ],
        );
        assert!(matches!(result, Err(RegistryError::Validation(_))));
    }

    #[test]
    fn test_allocation_delta_exposed_not_enforced() {
        let campaign = Campaign::create(
            TrackingId::generate(IdKind::Organization),
            "Partial plan",
            amount(dec!(10000)),
            vec![("Water".to_string(), amount(dec!(4000)))],
        )
        .unwrap();
        assert_eq!(campaign.allocation_delta(), dec!(6000));
    }

    #[test]
    fn test_find_category_case_sensitive() {
        let campaign = sample_campaign();
        assert!(campaign.find_category("Shelter").is_ok());
        assert!(matches!(
            campaign.find_category("shelter"),
            Err(RegistryError::CategoryNotFound { .. })
        ));
    }

    #[test]
    fn test_record_withdrawal_updates_spent_and_remaining() {
        let mut campaign = sample_campaign();
        let applied = campaign
            .record_withdrawal(withdrawal("Shelter", dec!(5000)))
            .unwrap();
        assert_eq!(applied, Applied::Recorded);

        let category = campaign.find_category("Shelter").unwrap();
        assert_eq!(category.spent.value(), dec!(5000));
        assert_eq!(category.remaining().value(), dec!(20000));
        assert!(campaign.withdrawals[0].compliant);
        assert_eq!(campaign.compliance_rate, dec!(100));
    }

    #[test]
    fn test_record_withdrawal_idempotent() {
        let mut campaign = sample_campaign();
        let w = withdrawal("Shelter", dec!(1000));

        campaign.record_withdrawal(w.clone()).unwrap();
        let second = campaign.record_withdrawal(w).unwrap();

        assert!(second.is_duplicate());
        assert_eq!(campaign.withdrawals.len(), 1);
        assert_eq!(
            campaign.find_category("Shelter").unwrap().spent.value(),
            dec!(1000)
        );
    }

    #[test]
    fn test_record_withdrawal_unknown_category() {
        let mut campaign = sample_campaign();
        let result = campaign.record_withdrawal(withdrawal("Rockets", dec!(10)));
        assert!(matches!(
            result,
            Err(RegistryError::CategoryNotFound { .. })
        ));
        assert!(campaign.withdrawals.is_empty());
    }

    #[test]
    fn test_overspend_flags_but_does_not_roll_back() {
        let mut campaign = sample_campaign();
        // External sync path: no entry refusal, the event lands and flags
        campaign
            .record_withdrawal(withdrawal("Shelter", dec!(30000)))
            .unwrap();

        let category = campaign.find_category("Shelter").unwrap();
        assert_eq!(category.spent.value(), dec!(30000));
        assert!(!category.is_compliant());
        assert_eq!(category.remaining(), Amount::ZERO);
        assert!(!campaign.withdrawals[0].compliant);
        assert_eq!(campaign.compliance_rate, dec!(0));
    }

    #[test]
    fn test_compliance_evaluated_per_event() {
        let mut campaign = sample_campaign();
        // First withdrawal is inside budget at its commit time
        campaign
            .record_withdrawal(withdrawal("Shelter", dec!(20000)))
            .unwrap();
        // Second pushes the category over
        campaign
            .record_withdrawal(withdrawal("Shelter", dec!(10000)))
            .unwrap();

        assert!(campaign.withdrawals[0].compliant);
        assert!(!campaign.withdrawals[1].compliant);
        assert_eq!(campaign.compliance_rate, dec!(50));
    }

    #[test]
    fn test_apply_donation_idempotent() {
        let mut campaign = sample_campaign();
        let donation = Donation::new(
            TrackingId::new("NESSIE-1").unwrap(),
            campaign.campaign_id.clone(),
            "Food & Water",
            amount(dec!(300)),
            TrustScore::new(dec!(95)),
            true,
        );

        assert_eq!(
            campaign.apply_donation(&donation).unwrap(),
            Applied::Recorded
        );
        assert!(campaign.apply_donation(&donation).unwrap().is_duplicate());

        assert_eq!(campaign.raised_amount.value(), dec!(300));
        assert_eq!(
            campaign.find_category("Food & Water").unwrap().raised.value(),
            dec!(300)
        );
    }

    #[test]
    fn test_apply_donation_unknown_category_counts_campaign_total_only() {
        let mut campaign = sample_campaign();
        let donation = Donation::new(
            TrackingId::new("DON-ext").unwrap(),
            campaign.campaign_id.clone(),
            "Logistics",
            amount(dec!(120)),
            TrustScore::NEUTRAL,
            true,
        );

        assert_eq!(
            campaign.apply_donation(&donation).unwrap(),
            Applied::Recorded
        );
        assert_eq!(campaign.raised_amount.value(), dec!(120));
        assert!(campaign.categories.iter().all(|c| c.raised.is_zero()));
        assert_eq!(campaign.mirrored_donations.len(), 1);
    }

    #[test]
    fn test_rebuild_donation_mirror() {
        let mut campaign = sample_campaign();
        let campaign_id = campaign.campaign_id.clone();
        let make = move |id: &str, v: Decimal| {
            Donation::new(
                TrackingId::new(id).unwrap(),
                campaign_id.clone(),
                "Shelter",
                amount(v),
                TrustScore::NEUTRAL,
                true,
            )
        };

        // Mirror drifted: only one of two donations applied
        campaign.apply_donation(&make("DON-a", dec!(100))).unwrap();
        let replayed = vec![make("DON-a", dec!(100)), make("DON-b", dec!(250))];
        campaign.rebuild_donation_mirror(&replayed).unwrap();

        assert_eq!(campaign.raised_amount.value(), dec!(350));
        assert_eq!(campaign.mirrored_donations.len(), 2);
    }

    #[test]
    fn test_status_transitions() {
        let mut campaign = sample_campaign();
        campaign.complete().unwrap();
        assert_eq!(campaign.status, CampaignStatus::Completed);

        let result = campaign.cancel();
        assert!(matches!(
            result,
            Err(RegistryError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_trust_score_mixes_withdrawals_and_donations() {
        let mut campaign = sample_campaign();
        campaign
            .record_withdrawal(Withdrawal::new(
                TrackingId::generate(IdKind::Withdrawal),
                "Shelter",
                amount(dec!(100)),
                "Bedding",
                UnitScore::new(dec!(0.8)), // trust 80
                true,
            ))
            .unwrap();
        campaign
            .apply_donation(&Donation::new(
                TrackingId::new("DON-x").unwrap(),
                campaign.campaign_id.clone(),
                "Shelter",
                amount(dec!(50)),
                TrustScore::new(dec!(100)),
                true,
            ))
            .unwrap();

        assert_eq!(campaign.average_trust_score.value(), dec!(90));
    }
}
