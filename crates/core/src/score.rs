//! Bounded confidence scores
//!
//! Two scales coexist in the system:
//! - `UnitScore` in [0, 1]: what the external scoring collaborators
//!   return (fraud risk, withdrawal plausibility).
//! - `TrustScore` in [0, 100]: what the ledger stores on events and
//!   rolls up into donor/campaign trust aggregates.
//!
//! Both clamp on construction rather than erroring: collaborator output
//! is untrusted and a slightly out-of-range score must not fail a
//! ledger write.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A score on the [0, 100] trust scale.
///
/// `NEUTRAL` (100) is the value used for empty event lists and for
/// events accepted while the scoring collaborator was unavailable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct TrustScore(Decimal);

impl TrustScore {
    /// Neutral score assigned when no evidence exists either way
    pub const NEUTRAL: Self = Self(Decimal::ONE_HUNDRED);

    /// Create a new score, clamping into [0, 100]
    pub fn new(value: Decimal) -> Self {
        Self(value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
    }

    /// Convert a unit-scale score to the trust scale
    pub fn from_unit(unit: UnitScore) -> Self {
        Self::new(unit.value() * Decimal::ONE_HUNDRED)
    }

    /// Get the inner value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Convert back to the unit scale
    pub fn to_unit(&self) -> UnitScore {
        UnitScore::new(self.0 / Decimal::ONE_HUNDRED)
    }
}

impl Default for TrustScore {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl From<Decimal> for TrustScore {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl From<TrustScore> for Decimal {
    fn from(score: TrustScore) -> Self {
        score.0
    }
}

impl fmt::Display for TrustScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A score on the [0, 1] collaborator scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct UnitScore(Decimal);

impl UnitScore {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    /// Create a new score, clamping into [0, 1]
    pub fn new(value: Decimal) -> Self {
        Self(value.clamp(Decimal::ZERO, Decimal::ONE))
    }

    /// Get the inner value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// `1 - score`. Turns a fraud *risk* into a verification score.
    pub fn complement(&self) -> Self {
        Self(Decimal::ONE - self.0)
    }
}

impl Default for UnitScore {
    fn default() -> Self {
        Self::ONE
    }
}

impl From<Decimal> for UnitScore {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl From<UnitScore> for Decimal {
    fn from(score: UnitScore) -> Self {
        score.0
    }
}

impl fmt::Display for UnitScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
