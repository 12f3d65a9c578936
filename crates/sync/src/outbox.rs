//! Propagation outbox
//!
//! The primary append (donor's donation list, campaign's withdrawal
//! list) is the durable fact. The outbox carries each committed event
//! into the secondary aggregates: campaign raised totals and the
//! organization rollups. Applies are idempotent by transaction id, so
//! a retried task can never double-count. A failed apply is journaled
//! and queued; it is never surfaced as a failure of the original
//! request.

use fundtrace_core::TrackingId;
use fundtrace_registry::{Donation, Registry, Withdrawal};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::SyncResult;
use crate::journal::{LedgerEvent, SharedJournal};

/// A committed event awaiting mirror-side application
#[derive(Debug, Clone)]
pub enum PropagationTask {
    /// Mirror a donor-side donation into its campaign and organization
    Donation {
        donor_id: TrackingId,
        donation: Donation,
    },
    /// Mirror a campaign-side withdrawal into its organization
    Withdrawal {
        campaign_id: TrackingId,
        org_id: TrackingId,
        withdrawal: Withdrawal,
    },
}

impl PropagationTask {
    /// The idempotency key for this task
    pub fn transaction_id(&self) -> &TrackingId {
        match self {
            PropagationTask::Donation { donation, .. } => &donation.transaction_id,
            PropagationTask::Withdrawal { withdrawal, .. } => &withdrawal.transaction_id,
        }
    }
}

struct PendingEntry {
    task: PropagationTask,
    attempts: u32,
}

/// Best-effort, retried propagation into the secondary store
pub struct Outbox {
    registry: Arc<Registry>,
    journal: SharedJournal,
    pending: Mutex<Vec<PendingEntry>>,
}

impl Outbox {
    pub fn new(registry: Arc<Registry>, journal: SharedJournal) -> Self {
        Self {
            registry,
            journal,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Journal a committed event and attempt its mirror update once.
    ///
    /// Fire-and-forget from the caller's perspective: a failed apply is
    /// logged, journaled and queued for [`Outbox::flush`].
    pub async fn submit(&self, task: PropagationTask) {
        self.journal_committed(&task).await;

        if let Err(err) = self.apply(&task).await {
            tracing::warn!(
                transaction_id = %task.transaction_id(),
                error = %err,
                "propagation failed; queued for retry"
            );
            self.journal_failure(&task, &err.to_string(), 1).await;
            self.pending
                .lock()
                .await
                .push(PendingEntry { task, attempts: 1 });
        }
    }

    /// Retry every queued task. Returns the number still pending.
    pub async fn flush(&self) -> usize {
        let drained: Vec<PendingEntry> = {
            let mut pending = self.pending.lock().await;
            pending.drain(..).collect()
        };

        let mut still_pending = Vec::new();
        for mut entry in drained {
            match self.apply(&entry.task).await {
                Ok(()) => {
                    tracing::info!(
                        transaction_id = %entry.task.transaction_id(),
                        attempts = entry.attempts,
                        "propagation retry succeeded"
                    );
                }
                Err(err) => {
                    entry.attempts += 1;
                    self.journal_failure(&entry.task, &err.to_string(), entry.attempts)
                        .await;
                    still_pending.push(entry);
                }
            }
        }

        let remaining = still_pending.len();
        self.pending.lock().await.extend(still_pending);
        remaining
    }

    /// Number of tasks currently queued
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn apply(&self, task: &PropagationTask) -> SyncResult<()> {
        match task {
            PropagationTask::Donation { donation, .. } => {
                let campaign = self.registry.campaign(&donation.campaign_id).await?;
                let org_id = {
                    let mut campaign = campaign.lock().await;
                    campaign.apply_donation(donation)?;
                    campaign.org_id.clone()
                };
                let org = self.registry.organization(&org_id).await?;
                org.lock()
                    .await
                    .apply_raised(&donation.transaction_id, &donation.amount)?;
                Ok(())
            }
            PropagationTask::Withdrawal {
                org_id, withdrawal, ..
            } => {
                let org = self.registry.organization(org_id).await?;
                org.lock()
                    .await
                    .apply_withdrawn(&withdrawal.transaction_id, &withdrawal.amount)?;
                Ok(())
            }
        }
    }

    async fn journal_committed(&self, task: &PropagationTask) {
        let event = match task {
            PropagationTask::Donation { donor_id, donation } => LedgerEvent::DonationRecorded {
                id: Uuid::new_v4().to_string(),
                transaction_id: donation.transaction_id.clone(),
                donor_id: donor_id.clone(),
                campaign_id: donation.campaign_id.clone(),
                category: donation.category.clone(),
                amount: donation.amount,
                fraud_score: donation.fraud_score,
                verified: donation.verified,
                timestamp: donation.timestamp,
            },
            PropagationTask::Withdrawal {
                campaign_id,
                withdrawal,
                ..
            } => LedgerEvent::WithdrawalCommitted {
                id: Uuid::new_v4().to_string(),
                transaction_id: withdrawal.transaction_id.clone(),
                campaign_id: campaign_id.clone(),
                category: withdrawal.category.clone(),
                amount: withdrawal.amount,
                verification_score: withdrawal.verification_score,
                compliant: withdrawal.compliant,
                timestamp: withdrawal.timestamp,
            },
        };
        self.append_event(&event).await;
    }

    async fn journal_failure(&self, task: &PropagationTask, reason: &str, attempt: u32) {
        let event =
            LedgerEvent::propagation_failed(task.transaction_id().clone(), reason, attempt);
        self.append_event(&event).await;
    }

    async fn append_event(&self, event: &LedgerEvent) {
        if let Err(err) = self.journal.lock().await.append(event) {
            tracing::error!(error = %err, "journal append failed");
        }
    }
}
