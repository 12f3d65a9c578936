//! Registry errors

use thiserror::Error;

/// Errors from registry records and the store
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    #[error("Category '{category}' not found in campaign {campaign_id}")]
    CategoryNotFound {
        campaign_id: String,
        category: String,
    },

    #[error("Donor not found: {0}")]
    DonorNotFound(String),

    #[error("Organization not found: {0}")]
    OrganizationNotFound(String),

    #[error("Invalid campaign status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Amount arithmetic failed: {0}")]
    Amount(#[from] fundtrace_core::AmountError),
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
