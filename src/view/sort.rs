//! Sort functionality for risk lists.

use crate::risk::Risk;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Field a risk list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortField {
    Title,
    #[default]
    RiskScore,
    IdentifiedDate,
    ReviewDate,
    ClosedDate,
    CreatedAt,
    /// Owner display name or email
    Owner,
    /// Project display name
    Project,
    Category,
    Status,
}

/// How values of a field are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Epoch milliseconds, missing = 0
    Date,
    Numeric,
    /// Lowercased code-point order, missing = "". No locale collation, so
    /// accented letters sort after `z`.
    Text,
}

impl SortField {
    /// Get all sort fields
    pub fn all() -> &'static [SortField] {
        &[
            SortField::Title,
            SortField::RiskScore,
            SortField::IdentifiedDate,
            SortField::ReviewDate,
            SortField::ClosedDate,
            SortField::CreatedAt,
            SortField::Owner,
            SortField::Project,
            SortField::Category,
            SortField::Status,
        ]
    }

    /// Field name as used by clients.
    pub fn key(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::RiskScore => "riskScore",
            SortField::IdentifiedDate => "identifiedDate",
            SortField::ReviewDate => "reviewDate",
            SortField::ClosedDate => "closedDate",
            SortField::CreatedAt => "createdAt",
            SortField::Owner => "owner",
            SortField::Project => "project",
            SortField::Category => "category",
            SortField::Status => "status",
        }
    }

    /// Comparison kind, derived from the field name.
    pub fn kind(&self) -> FieldKind {
        let key = self.key();
        if key.contains("Date") || key.ends_with("At") {
            FieldKind::Date
        } else if *self == SortField::RiskScore {
            FieldKind::Numeric
        } else {
            FieldKind::Text
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SortField {
    type Err = String;

    /// Accepts camelCase and snake_case spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        SortField::all()
            .iter()
            .copied()
            .find(|field| field.key().to_lowercase() == folded)
            .ok_or_else(|| format!("unknown sort field '{}'", s.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Orient an ascending comparison.
    pub fn apply(self, ascending: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ascending,
            SortDirection::Desc => ascending.reverse(),
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

fn epoch_millis(date: Option<DateTime<Utc>>) -> i64 {
    date.map(|d| d.timestamp_millis()).unwrap_or(0)
}

fn date_value(risk: &Risk, field: SortField) -> i64 {
    match field {
        SortField::IdentifiedDate => epoch_millis(Some(risk.identified_date)),
        SortField::ReviewDate => epoch_millis(risk.review_date),
        SortField::ClosedDate => epoch_millis(risk.closed_date),
        SortField::CreatedAt => epoch_millis(Some(risk.created_at)),
        _ => 0,
    }
}

fn text_value(risk: &Risk, field: SortField) -> String {
    let raw = match field {
        SortField::Title => risk.title.as_str(),
        SortField::Owner => risk.owner_label(),
        SortField::Project => risk.project_name(),
        SortField::Category => risk.category.as_str(),
        SortField::Status => risk.status.as_str(),
        _ => "",
    };
    raw.to_lowercase()
}

/// Ascending comparison of two risks on one field.
pub fn compare_ascending(field: SortField, a: &Risk, b: &Risk) -> Ordering {
    match field.kind() {
        FieldKind::Date => date_value(a, field).cmp(&date_value(b, field)),
        FieldKind::Numeric => a.risk_score().cmp(&b.risk_score()),
        FieldKind::Text => text_value(a, field).cmp(&text_value(b, field)),
    }
}

/// Build a comparator for the given field and direction.
///
/// Descending is the reverse of ascending, so both directions share one
/// comparison and tie on exactly the same pairs.
pub fn build_comparator(
    field: SortField,
    direction: SortDirection,
) -> impl Fn(&Risk, &Risk) -> Ordering {
    move |a, b| direction.apply(compare_ascending(field, a, b))
}

/// Stable in-place sort.
pub fn sort_risks(risks: &mut [Risk], field: SortField, direction: SortDirection) {
    risks.sort_by(build_comparator(field, direction));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{Category, Level, OwnerRef};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, 0, 0, 0).unwrap()
    }

    fn risk(id: &str, title: &str, p: Level, i: Level) -> Risk {
        Risk::new(id, title, Category::Technical, p, i, day(1))
    }

    fn ids(risks: &[Risk]) -> Vec<&str> {
        risks.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_field_kinds() {
        assert_eq!(SortField::IdentifiedDate.kind(), FieldKind::Date);
        assert_eq!(SortField::ReviewDate.kind(), FieldKind::Date);
        assert_eq!(SortField::CreatedAt.kind(), FieldKind::Date);
        assert_eq!(SortField::RiskScore.kind(), FieldKind::Numeric);
        assert_eq!(SortField::Title.kind(), FieldKind::Text);
        assert_eq!(SortField::Owner.kind(), FieldKind::Text);
    }

    #[test]
    fn test_sort_field_parsing() {
        assert_eq!("riskScore".parse::<SortField>(), Ok(SortField::RiskScore));
        assert_eq!("risk_score".parse::<SortField>(), Ok(SortField::RiskScore));
        assert_eq!("created_at".parse::<SortField>(), Ok(SortField::CreatedAt));
        assert!("priority".parse::<SortField>().is_err());
    }

    #[test]
    fn test_title_sort_ignores_case() {
        let mut risks = vec![
            risk("1", "beta", Level::Low, Level::Low),
            risk("2", "Alpha", Level::Low, Level::Low),
            risk("3", "gamma", Level::Low, Level::Low),
        ];
        sort_risks(&mut risks, SortField::Title, SortDirection::Asc);
        assert_eq!(ids(&risks), vec!["2", "1", "3"]);
    }

    #[test]
    fn test_title_sort_uses_code_point_order() {
        let mut risks = vec![
            risk("1", "Zoning", Level::Low, Level::Low),
            risk("2", "Ärger", Level::Low, Level::Low),
            risk("3", "audit", Level::Low, Level::Low),
        ];
        sort_risks(&mut risks, SortField::Title, SortDirection::Asc);
        assert_eq!(ids(&risks), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_score_desc_keeps_ties_in_input_order() {
        let mut risks = vec![
            risk("a", "a", Level::Low, Level::High),
            risk("b", "b", Level::VeryHigh, Level::VeryHigh),
            risk("c", "c", Level::High, Level::Low),
        ];
        sort_risks(&mut risks, SortField::RiskScore, SortDirection::Desc);
        assert_eq!(ids(&risks), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_missing_review_date_sorts_first_ascending() {
        let mut risks = vec![
            risk("late", "x", Level::Low, Level::Low).with_review_date(day(20)),
            risk("none", "y", Level::Low, Level::Low),
            risk("early", "z", Level::Low, Level::Low).with_review_date(day(5)),
        ];
        sort_risks(&mut risks, SortField::ReviewDate, SortDirection::Asc);
        assert_eq!(ids(&risks), vec!["none", "early", "late"]);
    }

    #[test]
    fn test_owner_sort_uses_name_or_email() {
        let owner = |name: Option<&str>, email: &str| OwnerRef {
            id: email.to_string(),
            display_name: name.map(str::to_string),
            email: Some(email.to_string()),
        };
        let mut risks = vec![
            risk("1", "t", Level::Low, Level::Low).with_owner(owner(Some("Zoe"), "a@x.io")),
            risk("2", "t", Level::Low, Level::Low),
            risk("3", "t", Level::Low, Level::Low).with_owner(owner(None, "mike@x.io")),
        ];
        sort_risks(&mut risks, SortField::Owner, SortDirection::Asc);
        assert_eq!(ids(&risks), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_comparator_is_antisymmetric() {
        let a = risk("a", "a", Level::High, Level::High);
        let b = risk("b", "b", Level::Low, Level::Low);
        for &field in SortField::all() {
            for direction in [SortDirection::Asc, SortDirection::Desc] {
                let cmp = build_comparator(field, direction);
                assert_eq!(cmp(&a, &b), cmp(&b, &a).reverse());
                assert_eq!(cmp(&a, &a), Ordering::Equal);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_flipping_direction_reverses_distinct_keys(
            order in Just((0..12).collect::<Vec<u32>>()).prop_shuffle()
        ) {
            let risks: Vec<Risk> = order
                .iter()
                .map(|n| {
                    risk(&n.to_string(), &format!("risk-{n:03}"), Level::Medium, Level::Medium)
                })
                .collect();

            let mut asc = risks.clone();
            sort_risks(&mut asc, SortField::Title, SortDirection::Asc);
            let mut desc = risks;
            sort_risks(&mut desc, SortField::Title, SortDirection::Desc);
            desc.reverse();

            prop_assert_eq!(ids(&asc), ids(&desc));
        }

        #[test]
        fn prop_sort_is_stable_for_equal_keys(len in 1usize..20) {
            let risks: Vec<Risk> = (0..len)
                .map(|n| risk(&n.to_string(), "same", Level::High, Level::Low))
                .collect();
            for direction in [SortDirection::Asc, SortDirection::Desc] {
                let mut sorted = risks.clone();
                sort_risks(&mut sorted, SortField::Title, direction);
                prop_assert_eq!(ids(&sorted), ids(&risks));
            }
        }
    }
}
