//! Severity tiers derived from a risk score.
//!
//! Thresholds are inclusive on the lower bound of each tier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Score at which a risk becomes critical.
pub const CRITICAL_THRESHOLD: u8 = 20;
/// Score at which a risk becomes high.
pub const HIGH_THRESHOLD: u8 = 12;
/// Score at which a risk becomes medium.
pub const MEDIUM_THRESHOLD: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityTier {
    /// Tiers from most to least severe.
    pub const ALL: [SeverityTier; 4] = [
        SeverityTier::Critical,
        SeverityTier::High,
        SeverityTier::Medium,
        SeverityTier::Low,
    ];

    /// Get tier label for display
    pub fn label(&self) -> &'static str {
        match self {
            SeverityTier::Critical => "Critical",
            SeverityTier::High => "High",
            SeverityTier::Medium => "Medium",
            SeverityTier::Low => "Low",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a score into its severity tier.
pub fn classify(score: u8) -> SeverityTier {
    if score >= CRITICAL_THRESHOLD {
        SeverityTier::Critical
    } else if score >= HIGH_THRESHOLD {
        SeverityTier::High
    } else if score >= MEDIUM_THRESHOLD {
        SeverityTier::Medium
    } else {
        SeverityTier::Low
    }
}
