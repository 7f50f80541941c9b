//! Allowed status transitions.
//!
//! ```text
//! identified -> assessed | mitigated | closed
//! assessed   -> mitigated | closed
//! mitigated  -> closed | assessed
//! closed     -> identified | assessed   (reopen)
//! ```
//!
//! Forward moves may skip stages. A mitigated risk can go back to assessment,
//! and a closed risk can be reopened as identified or assessed. Reopening
//! keeps the recorded `closed_date`.

use super::RiskStatus;

const EDGES: &[(RiskStatus, RiskStatus)] = &[
    (RiskStatus::Identified, RiskStatus::Assessed),
    (RiskStatus::Identified, RiskStatus::Mitigated),
    (RiskStatus::Identified, RiskStatus::Closed),
    (RiskStatus::Assessed, RiskStatus::Mitigated),
    (RiskStatus::Assessed, RiskStatus::Closed),
    (RiskStatus::Mitigated, RiskStatus::Closed),
    (RiskStatus::Mitigated, RiskStatus::Assessed),
    (RiskStatus::Closed, RiskStatus::Identified),
    (RiskStatus::Closed, RiskStatus::Assessed),
];

impl RiskStatus {
    /// Whether a risk in this status may move to `next`. Staying put is always allowed.
    pub fn can_transition_to(self, next: RiskStatus) -> bool {
        self == next || EDGES.contains(&(self, next))
    }

    /// Statuses reachable in one step, excluding the current one.
    pub fn next_statuses(self) -> Vec<RiskStatus> {
        EDGES
            .iter()
            .filter(|(from, _)| *from == self)
            .map(|&(_, to)| to)
            .collect()
    }

    /// Moving from `Closed` back into an open status.
    pub fn is_reopen(self, next: RiskStatus) -> bool {
        self == RiskStatus::Closed && next != RiskStatus::Closed
    }
}
