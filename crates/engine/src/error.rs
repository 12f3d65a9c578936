//! Engine error taxonomy
//!
//! Only the first five variants are returned to callers.
//! `Propagation` is an internal/observability concern: the primary
//! commit already succeeded, the mirror update is logged and retried.

use fundtrace_core::{Amount, UnitScore};
use fundtrace_registry::RegistryError;
use thiserror::Error;

/// Errors from the donation recorder and withdrawal processor
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Bad input shape or range; rejected before any state change
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The withdrawal would overspend its category. The one place
    /// entry is refused rather than merely flagged - an over-withdrawal
    /// is an irreversible external cash movement.
    #[error(
        "Withdrawal of {requested} exceeds remaining budget {remaining} for category '{category}'"
    )]
    BudgetExceeded {
        category: String,
        requested: Amount,
        remaining: Amount,
    },

    /// The stated justification does not plausibly belong to the
    /// category
    #[error(
        "Withdrawal reason does not align with category '{category}' (score {score}, threshold {threshold})"
    )]
    ReasonMismatch {
        category: String,
        score: UnitScore,
        threshold: UnitScore,
    },

    /// Donation risk score above the blocking threshold
    #[error("Donation flagged for review (risk score {risk})")]
    FlaggedForReview { risk: UnitScore },

    /// Unknown campaign, category, donor or organization
    #[error("Not found: {0}")]
    NotFound(String),

    /// Primary commit succeeded but the mirror update failed.
    /// Never surfaced as a user-facing failure of the original request.
    #[error("Propagation to mirror store failed: {0}")]
    Propagation(String),
}

impl From<RegistryError> for LedgerError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::CampaignNotFound(_)
            | RegistryError::CategoryNotFound { .. }
            | RegistryError::DonorNotFound(_)
            | RegistryError::OrganizationNotFound(_) => LedgerError::NotFound(err.to_string()),
            other => LedgerError::Validation(other.to_string()),
        }
    }
}

impl From<fundtrace_core::AmountError> for LedgerError {
    fn from(err: fundtrace_core::AmountError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

/// Result type for engine operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_not_found_maps_to_not_found() {
        let err: LedgerError = RegistryError::CampaignNotFound("CMP-1".to_string()).into();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn test_registry_validation_maps_to_validation() {
        let err: LedgerError = RegistryError::Validation("bad".to_string()).into();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_amount_arithmetic_maps_to_validation() {
        use fundtrace_core::AmountError;
        use rust_decimal::Decimal;

        let err: LedgerError = AmountError::Overflow(Decimal::MAX, Decimal::MAX).into();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
