//! Amount - Non-negative decimal wrapper for monetary values
//!
//! Every pledged budget, donation and withdrawal in Fundtrace is
//! non-negative. This is enforced at the type level.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when constructing amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    Negative(Decimal),

    #[error("Amount overflow adding {0} and {1}")]
    Overflow(Decimal, Decimal),
}

/// A non-negative decimal amount of money.
///
/// # Invariant
/// The inner value is always >= 0. This is enforced by the constructor.
///
/// # Example
/// ```
/// use fundtrace_core::Amount;
/// use rust_decimal::Decimal;
///
/// let budget = Amount::new(Decimal::new(1000, 0)).unwrap();
/// let spent = Amount::new(Decimal::new(300, 0)).unwrap();
/// assert_eq!(budget.saturating_sub(&spent).value(), Decimal::new(700, 0));
///
/// // Negative amounts are rejected
/// assert!(Amount::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Amount from a Decimal.
    ///
    /// Returns an error if the value is negative.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            Err(AmountError::Negative(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Create an Amount from a whole number of currency units.
    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition - returns an error on overflow
    pub fn checked_add(&self, other: &Amount) -> Result<Amount, AmountError> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or(AmountError::Overflow(self.0, other.0))
    }

    /// Subtraction that floors at zero instead of going negative.
    ///
    /// Used for derived `remaining = budget - spent` figures, which must
    /// stay non-negative even when a category is overspent.
    pub fn saturating_sub(&self, other: &Amount) -> Amount {
        if other.0 >= self.0 {
            Amount::ZERO
        } else {
            Amount(self.0 - other.0)
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}
