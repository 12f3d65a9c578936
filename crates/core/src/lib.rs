//! Fundtrace Core - Domain primitives
//!
//! This crate contains the fundamental types used across Fundtrace:
//! - `Amount`: Non-negative decimal wrapper for monetary values
//! - `TrustScore` / `UnitScore`: Bounded confidence scores
//! - `TrackingId`: Prefixed, collision-resistant external identifiers

pub mod amount;
pub mod id;
pub mod score;

pub use amount::{Amount, AmountError};
pub use id::{IdError, IdKind, TrackingId};
pub use score::{TrustScore, UnitScore};
