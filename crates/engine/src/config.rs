//! Engine configuration with configurable thresholds
//!
//! All policy constants (score thresholds, bounds, timeouts) are
//! configurable via file, not hardcoded at the call sites.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use fundtrace_core::{TrustScore, UnitScore};

/// Configuration for the donation recorder and withdrawal processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    // === Thresholds ===
    /// Withdrawal plausibility score below which the reason is
    /// rejected as not belonging to the category
    #[serde(default = "default_plausibility_threshold")]
    pub plausibility_threshold: Decimal,

    /// Donation fraud risk above which the donation is blocked
    #[serde(default = "default_fraud_risk_threshold")]
    pub fraud_risk_threshold: Decimal,

    /// Upper bound on a single donation - a cheap anti-abuse check,
    /// not fraud detection
    #[serde(default = "default_max_single_donation")]
    pub max_single_donation: Decimal,

    /// How many recent donations to hand the fraud collaborator
    #[serde(default = "default_fraud_window_size")]
    pub fraud_window_size: usize,

    // === External collaborators ===
    /// Timeout for collaborator calls (fraud scoring, plausibility)
    #[serde(default = "default_collaborator_timeout_ms")]
    pub collaborator_timeout_ms: u64,

    /// Policy when the fraud collaborator fails during a donation
    /// (default open: accept but mark unverified - blocking money-in
    /// has a cost asymmetry against the charity)
    #[serde(default = "default_donation_fail_policy")]
    pub donation_fail_policy: FailPolicy,

    /// Policy when the plausibility collaborator fails during a
    /// withdrawal (default closed: reject - money-out is irreversible)
    #[serde(default = "default_withdrawal_fail_policy")]
    pub withdrawal_fail_policy: FailPolicy,

    // === Neutral defaults ===
    /// Trust score recorded for events accepted without a collaborator
    /// verdict, and used for empty event lists
    #[serde(default = "default_neutral_trust_score")]
    pub neutral_trust_score: Decimal,
}

/// Policy when an external collaborator fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailPolicy {
    /// Reject the request
    FailClosed,
    /// Accept the request with a neutral score and an unverified flag
    FailOpen,
}

// Default value functions for serde
fn default_plausibility_threshold() -> Decimal {
    Decimal::new(6, 1) // 0.6
}

fn default_fraud_risk_threshold() -> Decimal {
    Decimal::new(7, 1) // 0.7
}

fn default_max_single_donation() -> Decimal {
    Decimal::new(1_000_000, 0)
}

fn default_fraud_window_size() -> usize {
    16
}

fn default_collaborator_timeout_ms() -> u64 {
    500
}

fn default_donation_fail_policy() -> FailPolicy {
    FailPolicy::FailOpen
}

fn default_withdrawal_fail_policy() -> FailPolicy {
    FailPolicy::FailClosed
}

fn default_neutral_trust_score() -> Decimal {
    Decimal::ONE_HUNDRED
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            plausibility_threshold: default_plausibility_threshold(),
            fraud_risk_threshold: default_fraud_risk_threshold(),
            max_single_donation: default_max_single_donation(),
            fraud_window_size: default_fraud_window_size(),
            collaborator_timeout_ms: default_collaborator_timeout_ms(),
            donation_fail_policy: default_donation_fail_policy(),
            withdrawal_fail_policy: default_withdrawal_fail_policy(),
            neutral_trust_score: default_neutral_trust_score(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Collaborator timeout as a Duration
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    /// The plausibility threshold as a unit score
    pub fn plausibility_threshold(&self) -> UnitScore {
        UnitScore::new(self.plausibility_threshold)
    }

    /// The fraud risk threshold as a unit score
    pub fn fraud_risk_threshold(&self) -> UnitScore {
        UnitScore::new(self.fraud_risk_threshold)
    }

    /// The neutral trust score
    pub fn neutral_trust_score(&self) -> TrustScore {
        TrustScore::new(self.neutral_trust_score)
    }
}
