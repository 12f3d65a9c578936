//! Tracking identifiers
//!
//! Every organization, donor, campaign and transaction carries an
//! external identifier used for cross-system correlation and as the
//! idempotency key for retried submissions. Generated ids are a
//! human-readable prefix plus a v4 UUID, e.g. `DON-9f2c4e...`.
//! Externally supplied ids (payment-rail transaction references) are
//! accepted as-is through [`TrackingId::new`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when constructing tracking ids
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Tracking id cannot be empty")]
    Empty,

    #[error("Tracking id contains whitespace: {0:?}")]
    Whitespace(String),
}

/// The kind of entity an id identifies, with its debug prefix
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    #[strum(serialize = "ORG")]
    Organization,
    #[strum(serialize = "DNR")]
    Donor,
    #[strum(serialize = "CMP")]
    Campaign,
    #[strum(serialize = "DON")]
    Donation,
    #[strum(serialize = "WTH")]
    Withdrawal,
}

impl IdKind {
    /// Prefix used for generated ids of this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            IdKind::Organization => "ORG",
            IdKind::Donor => "DNR",
            IdKind::Campaign => "CMP",
            IdKind::Donation => "DON",
            IdKind::Withdrawal => "WTH",
        }
    }
}

/// A collision-resistant external identifier.
///
/// # Example
/// ```
/// use fundtrace_core::{IdKind, TrackingId};
///
/// let id = TrackingId::generate(IdKind::Donation);
/// assert!(id.as_str().starts_with("DON-"));
/// assert_eq!(id.kind(), Some(IdKind::Donation));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingId(String);

impl TrackingId {
    /// Generate a fresh id with the given kind's prefix.
    ///
    /// Collision probability is that of a v4 UUID - negligible at
    /// millions of ids.
    pub fn generate(kind: IdKind) -> Self {
        Self(format!("{}-{}", kind.prefix(), Uuid::new_v4().simple()))
    }

    /// Wrap an externally supplied identifier.
    ///
    /// Rejects empty ids and ids containing whitespace; everything else
    /// is accepted verbatim since the payment rail owns the format.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::Empty);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(IdError::Whitespace(id));
        }
        Ok(Self(id))
    }

    /// The id as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Best-effort kind derived from the prefix, if this is a
    /// Fundtrace-generated id.
    pub fn kind(&self) -> Option<IdKind> {
        let prefix = self.0.split('-').next()?;
        IdKind::from_str(prefix).ok()
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TrackingId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
