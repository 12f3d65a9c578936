//! Donation recorder - the money-in write path
//!
//! Validates shape, consults the fraud collaborator over the donor's
//! recent window, appends the event to the donor's list (the primary
//! store) and hands it to the outbox for mirror propagation. The donor
//! lock is held from the duplicate check through the append, so a
//! donor's donations serialize while different donors run in parallel.

use std::sync::Arc;

use fundtrace_core::{Amount, IdKind, TrackingId, TrustScore, UnitScore};
use fundtrace_registry::{CampaignStatus, Donation, Registry};
use fundtrace_sync::{Outbox, PropagationTask};
use serde::{Deserialize, Serialize};

use crate::collaborators::FraudScorer;
use crate::config::{EngineConfig, FailPolicy};
use crate::error::{LedgerError, LedgerResult};

/// A donation submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationRequest {
    pub campaign_id: TrackingId,
    pub donor_id: TrackingId,
    pub category: String,
    pub amount: Amount,
    /// External idempotency key; generated when absent
    pub transaction_id: Option<TrackingId>,
}

/// Acknowledgement of a recorded donation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationReceipt {
    pub transaction_id: TrackingId,
    /// `1 - risk`; neutral when accepted unverified
    pub verification_score: UnitScore,
    /// False when the fraud collaborator was unavailable
    pub verified: bool,
    /// True when the transaction id had already been recorded
    pub duplicate: bool,
}

/// Records donations against the primary store
pub struct DonationRecorder {
    registry: Arc<Registry>,
    outbox: Arc<Outbox>,
    scorer: Arc<dyn FraudScorer>,
    config: EngineConfig,
}

impl DonationRecorder {
    pub fn new(
        registry: Arc<Registry>,
        outbox: Arc<Outbox>,
        scorer: Arc<dyn FraudScorer>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            outbox,
            scorer,
            config,
        }
    }

    /// Record a donation.
    ///
    /// Resubmitting a transaction id that is already on the donor's
    /// list returns the original receipt unchanged.
    pub async fn record(&self, request: DonationRequest) -> LedgerResult<DonationReceipt> {
        if request.amount.is_zero() {
            return Err(LedgerError::Validation(
                "donation amount must be positive".to_string(),
            ));
        }
        if request.amount.value() > self.config.max_single_donation {
            return Err(LedgerError::Validation(format!(
                "donation amount {} exceeds the single-donation limit {}",
                request.amount, self.config.max_single_donation
            )));
        }

        // Target must exist and accept donations before any scoring
        {
            let campaign = self.registry.campaign(&request.campaign_id).await?;
            let campaign = campaign.lock().await;
            if campaign.status != CampaignStatus::Active {
                return Err(LedgerError::Validation(format!(
                    "campaign {} is {}, not accepting donations",
                    campaign.campaign_id, campaign.status
                )));
            }
            campaign.find_category(&request.category)?;
        }

        let transaction_id = request
            .transaction_id
            .clone()
            .unwrap_or_else(|| TrackingId::generate(IdKind::Donation));

        let donor = self.registry.donor(&request.donor_id).await?;
        let mut donor = donor.lock().await;

        if let Some(existing) = donor.find_donation(&transaction_id) {
            return Ok(DonationReceipt {
                transaction_id,
                verification_score: existing.fraud_score.to_unit(),
                verified: existing.verified,
                duplicate: true,
            });
        }

        let mut window = donor.recent_window(self.config.fraud_window_size);
        window.push(fundtrace_registry::DonationSummary {
            transaction_id: transaction_id.clone(),
            campaign_id: request.campaign_id.clone(),
            amount: request.amount,
            timestamp: chrono::Utc::now(),
        });

        let (verification_score, verified) = match tokio::time::timeout(
            self.config.collaborator_timeout(),
            self.scorer.assess(&window),
        )
        .await
        {
            Ok(Ok(signal)) => {
                if signal.risk_score > self.config.fraud_risk_threshold()
                    || signal.is_suspicious
                {
                    return Err(LedgerError::FlaggedForReview {
                        risk: signal.risk_score,
                    });
                }
                (signal.risk_score.complement(), true)
            }
            outcome => {
                let reason = match outcome {
                    Ok(Err(err)) => err.to_string(),
                    _ => format!(
                        "timed out after {}ms",
                        self.config.collaborator_timeout_ms
                    ),
                };
                match self.config.donation_fail_policy {
                    FailPolicy::FailClosed => {
                        return Err(LedgerError::Validation(format!(
                            "fraud verification unavailable: {}",
                            reason
                        )));
                    }
                    FailPolicy::FailOpen => {
                        tracing::warn!(
                            collaborator = self.scorer.name(),
                            transaction_id = %transaction_id,
                            reason = %reason,
                            "fraud collaborator unavailable; accepting unverified"
                        );
                        (self.config.neutral_trust_score().to_unit(), false)
                    }
                }
            }
        };

        let donation = Donation::new(
            transaction_id.clone(),
            request.campaign_id.clone(),
            request.category.clone(),
            request.amount,
            TrustScore::from_unit(verification_score),
            verified,
        );
        donor.append_donation(donation.clone())?;
        let donor_id = donor.donor_id.clone();
        drop(donor);

        // Mirror propagation is fire-and-forget; a failure is queued
        // inside the outbox, never surfaced here
        self.outbox
            .submit(PropagationTask::Donation { donor_id, donation })
            .await;

        Ok(DonationReceipt {
            transaction_id,
            verification_score,
            verified,
            duplicate: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{StaticFraudScorer, UnavailableCollaborator};
    use fundtrace_registry::{Campaign, Donor, Organization};
    use fundtrace_sync::Journal;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn amount(v: Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    struct Fixture {
        registry: Arc<Registry>,
        outbox: Arc<Outbox>,
        campaign_id: TrackingId,
        donor_id: TrackingId,
    }

    async fn fixture() -> Fixture {
        let registry = Arc::new(Registry::new());
        let org_id = TrackingId::generate(IdKind::Organization);
        registry
            .register_organization(Organization::new(org_id.clone(), "Relief Org", true))
            .await
            .unwrap();

        let campaign = Campaign::create(
            org_id,
            "Flood Response",
            amount(dec!(10000)),
            vec![("Water".to_string(), amount(dec!(4000)))],
        )
        .unwrap();
        let campaign_id = registry.insert_campaign(campaign).await.unwrap();

        let donor_id = TrackingId::generate(IdKind::Donor);
        registry
            .register_donor(Donor::new(donor_id.clone(), "Alice"))
            .await
            .unwrap();

        let outbox = Arc::new(Outbox::new(
            registry.clone(),
            Journal::in_memory().into_shared(),
        ));
        Fixture {
            registry,
            outbox,
            campaign_id,
            donor_id,
        }
    }

    fn recorder(fx: &Fixture, scorer: Arc<dyn FraudScorer>) -> DonationRecorder {
        DonationRecorder::new(
            fx.registry.clone(),
            fx.outbox.clone(),
            scorer,
            EngineConfig::default(),
        )
    }

    fn request(fx: &Fixture, v: Decimal) -> DonationRequest {
        DonationRequest {
            campaign_id: fx.campaign_id.clone(),
            donor_id: fx.donor_id.clone(),
            category: "Water".to_string(),
            amount: amount(v),
            transaction_id: None,
        }
    }

    #[tokio::test]
    async fn test_record_appends_and_mirrors() {
        let fx = fixture().await;
        let recorder = recorder(
            &fx,
            Arc::new(StaticFraudScorer::with_risk(UnitScore::new(dec!(0.1)))),
        );

        let receipt = recorder.record(request(&fx, dec!(250))).await.unwrap();
        assert!(receipt.verified);
        assert!(!receipt.duplicate);
        assert_eq!(receipt.verification_score.value(), dec!(0.9));

        let donor = fx.registry.donor(&fx.donor_id).await.unwrap();
        assert_eq!(donor.lock().await.total_donated.value(), dec!(250));

        let campaign = fx.registry.campaign(&fx.campaign_id).await.unwrap();
        assert_eq!(campaign.lock().await.raised_amount.value(), dec!(250));
    }

    #[tokio::test]
    async fn test_high_risk_is_flagged() {
        let fx = fixture().await;
        let recorder = recorder(
            &fx,
            Arc::new(StaticFraudScorer::with_risk(UnitScore::new(dec!(0.85)))),
        );

        let result = recorder.record(request(&fx, dec!(250))).await;
        assert!(matches!(result, Err(LedgerError::FlaggedForReview { .. })));

        // Nothing was appended anywhere
        let donor = fx.registry.donor(&fx.donor_id).await.unwrap();
        assert_eq!(donor.lock().await.donation_count, 0);
    }

    #[tokio::test]
    async fn test_risk_exactly_at_threshold_passes() {
        let fx = fixture().await;
        let recorder = recorder(
            &fx,
            Arc::new(StaticFraudScorer::with_risk(UnitScore::new(dec!(0.7)))),
        );

        let receipt = recorder.record(request(&fx, dec!(50))).await.unwrap();
        assert!(receipt.verified);
    }

    #[tokio::test]
    async fn test_outage_fails_open_with_neutral_score() {
        let fx = fixture().await;
        let recorder = recorder(&fx, Arc::new(UnavailableCollaborator));

        let receipt = recorder.record(request(&fx, dec!(100))).await.unwrap();
        assert!(!receipt.verified);
        assert_eq!(receipt.verification_score, UnitScore::ONE);

        let donor = fx.registry.donor(&fx.donor_id).await.unwrap();
        let donor = donor.lock().await;
        assert!(!donor.donations[0].verified);
        assert_eq!(donor.donations[0].fraud_score, TrustScore::NEUTRAL);
    }

    #[tokio::test]
    async fn test_outage_fails_closed_when_configured() {
        let fx = fixture().await;
        let config = EngineConfig {
            donation_fail_policy: FailPolicy::FailClosed,
            ..EngineConfig::default()
        };
        let recorder = DonationRecorder::new(
            fx.registry.clone(),
            fx.outbox.clone(),
            Arc::new(UnavailableCollaborator),
            config,
        );

        let result = recorder.record(request(&fx, dec!(100))).await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_transaction_id_returns_original() {
        let fx = fixture().await;
        let recorder = recorder(
            &fx,
            Arc::new(StaticFraudScorer::with_risk(UnitScore::new(dec!(0.2)))),
        );

        let mut req = request(&fx, dec!(100));
        req.transaction_id = Some(TrackingId::new("NESSIE-42").unwrap());

        let first = recorder.record(req.clone()).await.unwrap();
        let second = recorder.record(req).await.unwrap();

        assert!(!first.duplicate);
        assert!(second.duplicate);
        assert_eq!(second.transaction_id, first.transaction_id);

        let donor = fx.registry.donor(&fx.donor_id).await.unwrap();
        assert_eq!(donor.lock().await.donation_count, 1);
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let fx = fixture().await;
        let recorder = recorder(
            &fx,
            Arc::new(StaticFraudScorer::with_risk(UnitScore::ZERO)),
        );

        let result = recorder.record(request(&fx, dec!(0))).await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_over_limit_amount_rejected() {
        let fx = fixture().await;
        let recorder = recorder(
            &fx,
            Arc::new(StaticFraudScorer::with_risk(UnitScore::ZERO)),
        );

        let result = recorder.record(request(&fx, dec!(2000000))).await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_campaign_is_not_found() {
        let fx = fixture().await;
        let recorder = recorder(
            &fx,
            Arc::new(StaticFraudScorer::with_risk(UnitScore::ZERO)),
        );

        let mut req = request(&fx, dec!(100));
        req.campaign_id = TrackingId::generate(IdKind::Campaign);
        let result = recorder.record(req).await;
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_completed_campaign_rejects_donations() {
        let fx = fixture().await;
        {
            let campaign = fx.registry.campaign(&fx.campaign_id).await.unwrap();
            campaign.lock().await.complete().unwrap();
        }
        let recorder = recorder(
            &fx,
            Arc::new(StaticFraudScorer::with_risk(UnitScore::ZERO)),
        );

        let result = recorder.record(request(&fx, dec!(100))).await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }
}
