//! External scoring collaborators
//!
//! The fraud scorer and the reason verifier are opaque external
//! services - a generative model behind an API in production. The
//! engine treats them as async trait objects, bounds every call with a
//! timeout, and never trusts them to be live: each caller carries a
//! fail policy for the outage case.

use async_trait::async_trait;
use fundtrace_core::{Amount, UnitScore};
use fundtrace_registry::DonationSummary;
use thiserror::Error;

/// Errors from a collaborator call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("Collaborator timed out after {0}ms")]
    Timeout(u64),

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Collaborator returned a malformed response: {0}")]
    Malformed(String),
}

/// Result type for collaborator calls
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Verdict from the fraud-scoring collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FraudSignal {
    /// Risk in [0, 1]; higher is riskier
    pub risk_score: UnitScore,
    pub is_suspicious: bool,
}

/// The withdrawal under plausibility review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalReview {
    pub category: String,
    pub amount: Amount,
    pub reason: String,
}

/// Scores a donor's recent transaction window for fraud risk
#[async_trait]
pub trait FraudScorer: Send + Sync {
    /// Collaborator name for logging
    fn name(&self) -> &str;

    /// Assess the donor's recent window. The incoming donation is the
    /// last entry.
    async fn assess(&self, window: &[DonationSummary]) -> CollaboratorResult<FraudSignal>;
}

/// Scores how plausibly a withdrawal reason belongs to its category
#[async_trait]
pub trait ReasonVerifier: Send + Sync {
    /// Collaborator name for logging
    fn name(&self) -> &str;

    /// Return a plausibility score in [0, 1]
    async fn verify(&self, review: &WithdrawalReview) -> CollaboratorResult<UnitScore>;
}

/// Fixed-verdict fraud scorer (tests, CLI demos)
pub struct StaticFraudScorer {
    pub signal: FraudSignal,
}

impl StaticFraudScorer {
    pub fn with_risk(risk_score: UnitScore) -> Self {
        Self {
            signal: FraudSignal {
                risk_score,
                is_suspicious: false,
            },
        }
    }
}

#[async_trait]
impl FraudScorer for StaticFraudScorer {
    fn name(&self) -> &str {
        "StaticFraudScorer"
    }

    async fn assess(&self, _window: &[DonationSummary]) -> CollaboratorResult<FraudSignal> {
        Ok(self.signal)
    }
}

/// Fixed-score reason verifier (tests, CLI demos)
pub struct StaticReasonVerifier {
    pub score: UnitScore,
}

impl StaticReasonVerifier {
    pub fn with_score(score: UnitScore) -> Self {
        Self { score }
    }
}

#[async_trait]
impl ReasonVerifier for StaticReasonVerifier {
    fn name(&self) -> &str {
        "StaticReasonVerifier"
    }

    async fn verify(&self, _review: &WithdrawalReview) -> CollaboratorResult<UnitScore> {
        Ok(self.score)
    }
}

/// Collaborator that always fails (outage-path tests)
pub struct UnavailableCollaborator;

#[async_trait]
impl FraudScorer for UnavailableCollaborator {
    fn name(&self) -> &str {
        "UnavailableCollaborator"
    }

    async fn assess(&self, _window: &[DonationSummary]) -> CollaboratorResult<FraudSignal> {
        Err(CollaboratorError::Unavailable("connection refused".into()))
    }
}

#[async_trait]
impl ReasonVerifier for UnavailableCollaborator {
    fn name(&self) -> &str {
        "UnavailableCollaborator"
    }

    async fn verify(&self, _review: &WithdrawalReview) -> CollaboratorResult<UnitScore> {
        Err(CollaboratorError::Unavailable("connection refused".into()))
    }
}
