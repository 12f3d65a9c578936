//! Sync errors

use thiserror::Error;

/// Errors from journaling, propagation and reconciliation
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to write journal: {0}")]
    JournalWrite(String),

    #[error("Registry error during propagation: {0}")]
    Registry(#[from] fundtrace_registry::RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<fundtrace_core::AmountError> for SyncError {
    fn from(err: fundtrace_core::AmountError) -> Self {
        SyncError::Registry(err.into())
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use fundtrace_core::AmountError;
    use rust_decimal::Decimal;

    #[test]
    fn test_amount_arithmetic_routes_through_registry() {
        let err: SyncError = AmountError::Overflow(Decimal::MAX, Decimal::MAX).into();
        assert!(matches!(err, SyncError::Registry(_)));
    }
}
