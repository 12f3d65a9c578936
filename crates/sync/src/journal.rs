//! Append-only JSONL journal
//!
//! Every committed ledger event and every propagation outcome is
//! appended here as one JSON line. The journal is observability and
//! audit surface; the registry event lists remain the replay source
//! for reconciliation.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fundtrace_core::{Amount, TrackingId, TrustScore, UnitScore};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::SyncResult;

/// Journal shared between the outbox and the reconciler
pub type SharedJournal = Arc<Mutex<Journal>>;

/// Events appended to the journal (append-only JSONL)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A donation passed validation and was appended to its donor
    DonationRecorded {
        id: String,
        transaction_id: TrackingId,
        donor_id: TrackingId,
        campaign_id: TrackingId,
        category: String,
        amount: Amount,
        fraud_score: TrustScore,
        verified: bool,
        timestamp: DateTime<Utc>,
    },

    /// A withdrawal passed both checks and was appended to its campaign
    WithdrawalCommitted {
        id: String,
        transaction_id: TrackingId,
        campaign_id: TrackingId,
        category: String,
        amount: Amount,
        verification_score: UnitScore,
        compliant: bool,
        timestamp: DateTime<Utc>,
    },

    /// A secondary-store update failed and stays queued for retry.
    /// Internal observability only; never surfaced to the caller.
    PropagationFailed {
        id: String,
        transaction_id: TrackingId,
        reason: String,
        attempt: u32,
        timestamp: DateTime<Utc>,
    },

    /// The reconciliation sweep found and repaired a diverged campaign
    ReconciliationRepaired {
        id: String,
        campaign_id: TrackingId,
        stored_raised: Amount,
        replayed_raised: Amount,
        timestamp: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// Get the event id
    pub fn id(&self) -> &str {
        match self {
            LedgerEvent::DonationRecorded { id, .. } => id,
            LedgerEvent::WithdrawalCommitted { id, .. } => id,
            LedgerEvent::PropagationFailed { id, .. } => id,
            LedgerEvent::ReconciliationRepaired { id, .. } => id,
        }
    }

    /// Get the timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::DonationRecorded { timestamp, .. } => *timestamp,
            LedgerEvent::WithdrawalCommitted { timestamp, .. } => *timestamp,
            LedgerEvent::PropagationFailed { timestamp, .. } => *timestamp,
            LedgerEvent::ReconciliationRepaired { timestamp, .. } => *timestamp,
        }
    }

    pub fn propagation_failed(
        transaction_id: TrackingId,
        reason: impl Into<String>,
        attempt: u32,
    ) -> Self {
        LedgerEvent::PropagationFailed {
            id: uuid::Uuid::new_v4().to_string(),
            transaction_id,
            reason: reason.into(),
            attempt,
            timestamp: Utc::now(),
        }
    }

    pub fn reconciliation_repaired(
        campaign_id: TrackingId,
        stored_raised: Amount,
        replayed_raised: Amount,
    ) -> Self {
        LedgerEvent::ReconciliationRepaired {
            id: uuid::Uuid::new_v4().to_string(),
            campaign_id,
            stored_raised,
            replayed_raised,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only JSONL journal.
///
/// Each line is a JSON-serialized [`LedgerEvent`]. The file is never
/// modified in place.
pub struct Journal {
    path: PathBuf,
    file: Option<File>,
}

impl Journal {
    /// Open (or create) a journal at the given path
    pub fn new(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Create an in-memory journal (for testing); appends only
    /// validate serialization.
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            file: None,
        }
    }

    /// Wrap a journal for sharing between outbox and reconciler
    pub fn into_shared(self) -> SharedJournal {
        Arc::new(Mutex::new(self))
    }

    /// Append an event
    pub fn append(&mut self, event: &LedgerEvent) -> SyncResult<()> {
        let json = serde_json::to_string(event)?;
        if let Some(ref mut file) = self.file {
            writeln!(file, "{}", json)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Read all events back
    pub fn read_all(&self) -> SyncResult<Vec<LedgerEvent>> {
        if self.file.is_none() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }

        Ok(events)
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this journal discards events
    pub fn is_in_memory(&self) -> bool {
        self.file.is_none()
    }
}
