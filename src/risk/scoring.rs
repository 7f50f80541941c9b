//! Probability × impact scoring.
//!
//! Each level maps to a fixed weight (very_low=1 .. very_high=5) and the score
//! is the product of the two weights. Only 14 distinct values in `1..=25` are
//! reachable; the scale is deliberately not continuous.

use super::Level;
use std::collections::BTreeSet;

/// Weight of a level on the 1..=5 scale.
pub fn weight(level: Level) -> u8 {
    match level {
        Level::VeryLow => 1,
        Level::Low => 2,
        Level::Medium => 3,
        Level::High => 4,
        Level::VeryHigh => 5,
    }
}

/// Risk score for a probability/impact pair.
pub fn score(probability: Level, impact: Level) -> u8 {
    weight(probability) * weight(impact)
}

/// Score from untyped level names; unknown or missing names count as `medium`.
pub fn score_lenient(probability: Option<&str>, impact: Option<&str>) -> u8 {
    score(level_or_medium(probability), level_or_medium(impact))
}

/// Parse a level name, defaulting to `medium` when absent or unknown.
pub fn level_or_medium(value: Option<&str>) -> Level {
    value
        .and_then(|v| v.parse::<Level>().ok())
        .unwrap_or_default()
}

/// Every score the 5×5 grid can produce.
pub fn reachable_scores() -> BTreeSet<u8> {
    Level::ALL
        .iter()
        .flat_map(|&p| Level::ALL.iter().map(move |&i| score(p, i)))
        .collect()
}
