//! Withdrawal processor - the money-out write path
//!
//! The compliance check and the commit run under the campaign's lock,
//! held across the plausibility call: between the budget read and the
//! append, no other withdrawal can change the category's spent total.
//! Two concurrent withdrawals that each fit the remaining budget alone
//! but not together therefore serialize, and the second is refused.

use std::sync::Arc;

use fundtrace_core::{Amount, IdKind, TrackingId, UnitScore};
use fundtrace_registry::{CampaignStatus, Registry, Withdrawal};
use fundtrace_sync::{Outbox, PropagationTask};
use serde::{Deserialize, Serialize};

use crate::collaborators::{ReasonVerifier, WithdrawalReview};
use crate::config::{EngineConfig, FailPolicy};
use crate::error::{LedgerError, LedgerResult};

/// A withdrawal submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub campaign_id: TrackingId,
    /// Must match the campaign's owning organization
    pub org_id: TrackingId,
    pub category: String,
    pub amount: Amount,
    /// Free-text justification, scored for category plausibility
    pub reason: String,
    /// External idempotency key; generated when absent
    pub transaction_id: Option<TrackingId>,
}

/// Acknowledgement of a committed withdrawal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub transaction_id: TrackingId,
    pub verification_score: UnitScore,
    /// Category compliance at commit time
    pub compliant: bool,
    /// True when the transaction id had already been recorded
    pub duplicate: bool,
}

/// Processes withdrawals against campaign budgets
pub struct WithdrawalProcessor {
    registry: Arc<Registry>,
    outbox: Arc<Outbox>,
    verifier: Arc<dyn ReasonVerifier>,
    config: EngineConfig,
}

impl WithdrawalProcessor {
    pub fn new(
        registry: Arc<Registry>,
        outbox: Arc<Outbox>,
        verifier: Arc<dyn ReasonVerifier>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            outbox,
            verifier,
            config,
        }
    }

    /// Process a withdrawal end to end: validate, verify the reason,
    /// refuse overspend, commit, propagate.
    pub async fn process(&self, request: WithdrawalRequest) -> LedgerResult<WithdrawalReceipt> {
        if request.amount.is_zero() {
            return Err(LedgerError::Validation(
                "withdrawal amount must be positive".to_string(),
            ));
        }
        if request.reason.trim().is_empty() {
            return Err(LedgerError::Validation(
                "withdrawal reason cannot be empty".to_string(),
            ));
        }

        let transaction_id = request
            .transaction_id
            .clone()
            .unwrap_or_else(|| TrackingId::generate(IdKind::Withdrawal));

        let campaign = self.registry.campaign(&request.campaign_id).await?;
        let mut campaign = campaign.lock().await;

        if campaign.org_id != request.org_id {
            return Err(LedgerError::Validation(format!(
                "campaign {} is not owned by organization {}",
                campaign.campaign_id, request.org_id
            )));
        }
        if campaign.status != CampaignStatus::Active {
            return Err(LedgerError::Validation(format!(
                "campaign {} is {}, withdrawals are closed",
                campaign.campaign_id, campaign.status
            )));
        }

        if let Some(existing) = campaign
            .withdrawals
            .iter()
            .find(|w| w.transaction_id == transaction_id)
        {
            return Ok(WithdrawalReceipt {
                transaction_id,
                verification_score: existing.verification_score,
                compliant: existing.compliant,
                duplicate: true,
            });
        }

        let category = campaign.find_category(&request.category)?;
        let would_be = category.spent.checked_add(&request.amount)?;
        if would_be > category.budget {
            return Err(LedgerError::BudgetExceeded {
                category: category.name.clone(),
                requested: request.amount,
                remaining: category.remaining(),
            });
        }

        // The lock stays held through this await: the budget we just
        // read cannot move under us
        let review = WithdrawalReview {
            category: request.category.clone(),
            amount: request.amount,
            reason: request.reason.clone(),
        };
        let verification_score = match tokio::time::timeout(
            self.config.collaborator_timeout(),
            self.verifier.verify(&review),
        )
        .await
        {
            Ok(Ok(score)) => {
                if score < self.config.plausibility_threshold() {
                    return Err(LedgerError::ReasonMismatch {
                        category: request.category,
                        score,
                        threshold: self.config.plausibility_threshold(),
                    });
                }
                score
            }
            outcome => {
                let reason = match outcome {
                    Ok(Err(err)) => err.to_string(),
                    _ => format!(
                        "timed out after {}ms",
                        self.config.collaborator_timeout_ms
                    ),
                };
                match self.config.withdrawal_fail_policy {
                    FailPolicy::FailClosed => {
                        tracing::warn!(
                            collaborator = self.verifier.name(),
                            transaction_id = %transaction_id,
                            reason = %reason,
                            "plausibility collaborator unavailable; refusing withdrawal"
                        );
                        return Err(LedgerError::Validation(format!(
                            "plausibility verification unavailable, retry later: {}",
                            reason
                        )));
                    }
                    FailPolicy::FailOpen => UnitScore::ONE,
                }
            }
        };

        let withdrawal = Withdrawal::new(
            transaction_id.clone(),
            request.category,
            request.amount,
            request.reason,
            verification_score,
            true,
        );
        campaign.record_withdrawal(withdrawal)?;

        let committed = match campaign.withdrawals.last() {
            Some(w) => w.clone(),
            // record_withdrawal just pushed; unreachable in practice
            None => {
                return Err(LedgerError::Propagation(
                    "withdrawal vanished after commit".to_string(),
                ))
            }
        };
        let campaign_id = campaign.campaign_id.clone();
        let org_id = campaign.org_id.clone();
        drop(campaign);

        let compliant = committed.compliant;
        self.outbox
            .submit(PropagationTask::Withdrawal {
                campaign_id,
                org_id,
                withdrawal: committed,
            })
            .await;

        Ok(WithdrawalReceipt {
            transaction_id,
            verification_score,
            compliant,
            duplicate: false,
        })
    }
}
