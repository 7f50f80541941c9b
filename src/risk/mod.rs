pub mod normalize;
pub mod scoring;
pub mod severity;
pub mod status;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use normalize::{normalize_risk, normalize_tags, stamp_creation_defaults, RawRisk, RawTags};
pub use scoring::{score, weight};
pub use severity::{classify, SeverityTier};

/// Five-level ordinal scale shared by probability and impact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    VeryLow,
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

impl Level {
    /// All levels in ascending order.
    pub const ALL: [Level; 5] = [
        Level::VeryLow,
        Level::Low,
        Level::Medium,
        Level::High,
        Level::VeryHigh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::VeryLow => "very_low",
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
            Level::VeryHigh => "very_high",
        }
    }

    /// Position on the scale, 0 for `VeryLow` through 4 for `VeryHigh`.
    pub fn index(&self) -> usize {
        match self {
            Level::VeryLow => 0,
            Level::Low => 1,
            Level::Medium => 2,
            Level::High => 3,
            Level::VeryHigh => 4,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical_token(s).as_str() {
            "very_low" | "verylow" => Ok(Level::VeryLow),
            "low" => Ok(Level::Low),
            "medium" => Ok(Level::Medium),
            "high" => Ok(Level::High),
            "very_high" | "veryhigh" => Ok(Level::VeryHigh),
            other => Err(format!("unknown level '{other}'")),
        }
    }
}

/// Closed set of risk categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Technical,
    Financial,
    #[default]
    Operational,
    Legal,
    Environmental,
    Safety,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Technical,
        Category::Financial,
        Category::Operational,
        Category::Legal,
        Category::Environmental,
        Category::Safety,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::Financial => "financial",
            Category::Operational => "operational",
            Category::Legal => "legal",
            Category::Environmental => "environmental",
            Category::Safety => "safety",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == canonical_token(s))
            .ok_or_else(|| format!("unknown category '{}'", s.trim()))
    }
}

/// Lifecycle status of a risk. See [`status`] for the allowed transitions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    #[default]
    Identified,
    Assessed,
    Mitigated,
    Closed,
}

impl RiskStatus {
    pub const ALL: [RiskStatus; 4] = [
        RiskStatus::Identified,
        RiskStatus::Assessed,
        RiskStatus::Mitigated,
        RiskStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Identified => "identified",
            RiskStatus::Assessed => "assessed",
            RiskStatus::Mitigated => "mitigated",
            RiskStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == canonical_token(s))
            .ok_or_else(|| format!("unknown status '{}'", s.trim()))
    }
}

/// Reference to the project a risk belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRef {
    pub id: String,
    pub name: Option<String>,
}

impl ProjectRef {
    /// Display name used for search and sorting; empty when unknown.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Reference to the party responsible for a risk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerRef {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl OwnerRef {
    /// Display name, falling back to the email address.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.email.as_deref())
            .unwrap_or("")
    }
}

/// A validated risk record.
///
/// Only the normalizer produces values of this type from store data, and
/// `risk_score` can only change together with `probability`/`impact`, so
/// `risk_score == score(probability, impact)` holds for every instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Risk {
    pub id: String,
    pub organization_id: String,
    pub project: Option<ProjectRef>,
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    probability: Level,
    impact: Level,
    risk_score: u8,
    pub status: RiskStatus,
    pub owner: Option<OwnerRef>,
    pub mitigation_plan: Option<String>,
    pub contingency_plan: Option<String>,
    pub identified_date: DateTime<Utc>,
    pub review_date: Option<DateTime<Utc>>,
    pub closed_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Risk {
    /// Create a freshly identified risk with the given assessment.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: Category,
        probability: Level,
        impact: Level,
        identified_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            organization_id: String::new(),
            project: None,
            title: title.into(),
            description: None,
            category,
            probability,
            impact,
            risk_score: score(probability, impact),
            status: RiskStatus::Identified,
            owner: None,
            mitigation_plan: None,
            contingency_plan: None,
            identified_date,
            review_date: None,
            closed_date: None,
            tags: Vec::new(),
            created_at: identified_date,
        }
    }

    pub fn probability(&self) -> Level {
        self.probability
    }

    pub fn impact(&self) -> Level {
        self.impact
    }

    pub fn risk_score(&self) -> u8 {
        self.risk_score
    }

    pub fn severity(&self) -> SeverityTier {
        classify(self.risk_score)
    }

    /// Reassess the risk; the score follows the new levels.
    pub fn set_assessment(&mut self, probability: Level, impact: Level) {
        self.probability = probability;
        self.impact = impact;
        self.risk_score = score(probability, impact);
    }

    /// Open risk whose review date has passed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != RiskStatus::Closed && self.review_date.is_some_and(|review| review < now)
    }

    pub fn owner_label(&self) -> &str {
        self.owner.as_ref().map(OwnerRef::label).unwrap_or("")
    }

    pub fn project_name(&self) -> &str {
        self.project
            .as_ref()
            .map(ProjectRef::display_name)
            .unwrap_or("")
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = organization_id.into();
        self
    }

    pub fn with_project(mut self, id: impl Into<String>, name: Option<&str>) -> Self {
        self.project = Some(ProjectRef {
            id: id.into(),
            name: name.map(str::to_string),
        });
        self
    }

    pub fn with_owner(mut self, owner: OwnerRef) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_status(mut self, status: RiskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_mitigation_plan(mut self, plan: impl Into<String>) -> Self {
        self.mitigation_plan = Some(plan.into());
        self
    }

    pub fn with_review_date(mut self, review_date: DateTime<Utc>) -> Self {
        self.review_date = Some(review_date);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Lowercase, trimmed, with spaces and dashes folded to underscores.
fn canonical_token(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_level_parsing_is_lenient() {
        assert_eq!("very_high".parse::<Level>(), Ok(Level::VeryHigh));
        assert_eq!("Very High".parse::<Level>(), Ok(Level::VeryHigh));
        assert_eq!(" very-low ".parse::<Level>(), Ok(Level::VeryLow));
        assert!("extreme".parse::<Level>().is_err());
    }

    #[test]
    fn test_category_and_status_round_trip_strings() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        for status in RiskStatus::ALL {
            assert_eq!(status.to_string().parse::<RiskStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_set_assessment_recomputes_score() {
        let mut risk = Risk::new(
            "r1",
            "Vendor delay",
            Category::Operational,
            Level::Low,
            Level::Low,
            at(1),
        );
        assert_eq!(risk.risk_score(), 4);
        risk.set_assessment(Level::VeryHigh, Level::High);
        assert_eq!(risk.risk_score(), 20);
        assert_eq!(risk.severity(), SeverityTier::Critical);
    }

    #[test]
    fn test_owner_label_falls_back_to_email() {
        let owner = OwnerRef {
            id: "u1".into(),
            display_name: None,
            email: Some("pm@example.com".into()),
        };
        assert_eq!(owner.label(), "pm@example.com");

        let named = OwnerRef {
            display_name: Some("Dana".into()),
            ..owner
        };
        assert_eq!(named.label(), "Dana");
    }

    #[test]
    fn test_is_overdue_requires_open_status_and_past_review() {
        let risk = Risk::new("r1", "Permit", Category::Legal, Level::High, Level::Medium, at(1))
            .with_review_date(at(5));
        assert!(risk.is_overdue(at(6)));
        assert!(!risk.is_overdue(at(5)));
        assert!(!risk.clone().with_status(RiskStatus::Closed).is_overdue(at(6)));

        let unscheduled =
            Risk::new("r2", "Budget", Category::Financial, Level::Low, Level::Low, at(1));
        assert!(!unscheduled.is_overdue(at(30)));
    }
}
