//! Filter and search predicates over risks.
//!
//! Each categorical filter is either [`FilterValue::All`] or an exact match.
//! Search text matches case-insensitively against title, description,
//! mitigation plan and project name; a hit in any of them is enough. All
//! active constraints must hold for a risk to pass.

use crate::risk::{Category, Level, Risk, RiskStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use stillwater::predicate::Predicate;

/// Sentinel accepted on the command line and in saved criteria.
pub const ALL: &str = "all";

/// A categorical filter: everything, or one exact value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterValue<T> {
    All,
    Only(T),
}

impl<T> Default for FilterValue<T> {
    fn default() -> Self {
        FilterValue::All
    }
}

impl<T: PartialEq> FilterValue<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            FilterValue::All => true,
            FilterValue::Only(expected) => expected == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, FilterValue::All)
    }
}

impl<T: FromStr> FromStr for FilterValue<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case(ALL) {
            Ok(FilterValue::All)
        } else {
            s.parse().map(FilterValue::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for FilterValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::All => f.write_str(ALL),
            FilterValue::Only(value) => value.fmt(f),
        }
    }
}

/// Case-insensitive substring search over a risk's free-text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchText {
    needle: String,
}

impl SearchText {
    pub fn new(text: &str) -> Self {
        Self {
            needle: text.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }
}

impl Predicate<Risk> for SearchText {
    fn check(&self, risk: &Risk) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        [
            Some(risk.title.as_str()),
            risk.description.as_deref(),
            risk.mitigation_plan.as_deref(),
            Some(risk.project_name()),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&self.needle))
    }
}

/// Combined filter for the risk list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskFilter {
    pub search: SearchText,
    pub category: FilterValue<Category>,
    pub status: FilterValue<RiskStatus>,
    pub probability: FilterValue<Level>,
    pub impact: FilterValue<Level>,
    /// Matched against the project id.
    pub project: FilterValue<String>,
}

impl RiskFilter {
    /// True when the filter lets every risk through.
    pub fn is_identity(&self) -> bool {
        self.search.is_empty()
            && self.category.is_all()
            && self.status.is_all()
            && self.probability.is_all()
            && self.impact.is_all()
            && self.project.is_all()
    }

    pub fn matches(&self, risk: &Risk) -> bool {
        self.check(risk)
    }

    fn matches_project(&self, risk: &Risk) -> bool {
        match &self.project {
            FilterValue::All => true,
            FilterValue::Only(id) => risk.project.as_ref().is_some_and(|p| &p.id == id),
        }
    }
}

impl Predicate<Risk> for RiskFilter {
    fn check(&self, risk: &Risk) -> bool {
        self.category.matches(&risk.category)
            && self.status.matches(&risk.status)
            && self.probability.matches(&risk.probability())
            && self.impact.matches(&risk.impact())
            && self.matches_project(risk)
            && self.search.check(risk)
    }
}

/// Build the list predicate from search text and categorical filters.
pub fn build_predicate(
    search: &str,
    category: FilterValue<Category>,
    status: FilterValue<RiskStatus>,
    probability: FilterValue<Level>,
    impact: FilterValue<Level>,
    project: FilterValue<String>,
) -> RiskFilter {
    RiskFilter {
        search: SearchText::new(search),
        category,
        status,
        probability,
        impact,
        project,
    }
}
