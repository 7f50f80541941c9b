//! Boundary between untyped store records and validated [`Risk`] values.
//!
//! `RawRisk` mirrors whatever the store hands back: every field optional,
//! enumerations as free text, tags as either a comma-separated string or a
//! list. [`normalize_risk`] is the only way to turn one into a `Risk`.
//!
//! Defaulting rules:
//! - `title` must be non-empty after trimming (the only hard failure besides a
//!   disallowed status transition).
//! - Unknown or missing category/probability/impact/status fall back to the
//!   previous record's value on update, otherwise to operational/medium/
//!   medium/identified.
//! - Unparseable optional dates are treated as absent and logged.
//! - `risk_score` is always recomputed; any supplied value is ignored.
//! - Entering `closed` without a closed date stamps `now`; leaving `closed`
//!   keeps the recorded date.

use super::{Category, Level, OwnerRef, ProjectRef, Risk, RiskStatus};
use crate::errors::{Result, RiskmapError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Tags as they arrive from a form or the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTags {
    List(Vec<String>),
    Text(String),
}

impl RawTags {
    pub fn normalized(&self) -> Vec<String> {
        match self {
            RawTags::List(entries) => normalize_tags(entries),
            RawTags::Text(text) => normalize_tags([text]),
        }
    }
}

/// Unvalidated risk payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRisk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub category: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub probability: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub impact: Option<String>,
    /// Accepted for compatibility, never trusted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<serde_json::Value>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitigation_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contingency_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identified_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<RawTags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl RawRisk {
    /// Minimal creation payload.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

impl From<&Risk> for RawRisk {
    fn from(risk: &Risk) -> Self {
        Self {
            id: Some(risk.id.clone()),
            organization_id: Some(risk.organization_id.clone()).filter(|org| !org.is_empty()),
            project_id: risk.project.as_ref().map(|p| p.id.clone()),
            project_name: risk.project.as_ref().and_then(|p| p.name.clone()),
            title: Some(risk.title.clone()),
            description: risk.description.clone(),
            category: Some(risk.category.to_string()),
            probability: Some(risk.probability().to_string()),
            impact: Some(risk.impact().to_string()),
            risk_score: Some(serde_json::Value::from(risk.risk_score())),
            status: Some(risk.status.to_string()),
            owner_id: risk.owner.as_ref().map(|o| o.id.clone()),
            owner_name: risk.owner.as_ref().and_then(|o| o.display_name.clone()),
            owner_email: risk.owner.as_ref().and_then(|o| o.email.clone()),
            mitigation_plan: risk.mitigation_plan.clone(),
            contingency_plan: risk.contingency_plan.clone(),
            identified_date: Some(risk.identified_date.to_rfc3339()),
            review_date: risk.review_date.map(|d| d.to_rfc3339()),
            closed_date: risk.closed_date.map(|d| d.to_rfc3339()),
            tags: Some(RawTags::List(risk.tags.clone())),
            created_at: Some(risk.created_at.to_rfc3339()),
        }
    }
}

/// Accept any JSON scalar where a name is expected.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Split on commas, trim, drop empties and de-duplicate in first-seen order.
pub fn normalize_tags<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .flat_map(|entry| {
            entry
                .as_ref()
                .split(',')
                .map(|tag| tag.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Parse an ISO-8601 date or datetime. Naive values are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Write the timestamps creation would default straight into `raw`.
///
/// `created_at` and a closing record's `closed_date` become `now`;
/// `identified_date` becomes the creation time. A store that persists the
/// result reports the same dates on every later read. Returns whether
/// anything was filled in.
pub fn stamp_creation_defaults(raw: &mut RawRisk, now: DateTime<Utc>) -> bool {
    let valid = |value: &Option<String>| value.as_deref().and_then(parse_timestamp);
    let mut stamped = false;

    let created_at = match valid(&raw.created_at) {
        Some(date) => date,
        None => {
            raw.created_at = Some(now.to_rfc3339());
            stamped = true;
            now
        }
    };
    if valid(&raw.identified_date).is_none() {
        raw.identified_date = Some(created_at.to_rfc3339());
        stamped = true;
    }

    let closed = raw
        .status
        .as_deref()
        .and_then(|status| status.parse::<RiskStatus>().ok())
        == Some(RiskStatus::Closed);
    if closed && valid(&raw.closed_date).is_none() {
        raw.closed_date = Some(now.to_rfc3339());
        stamped = true;
    }
    stamped
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DateInput {
    Missing,
    Cleared,
    Invalid,
    Value(DateTime<Utc>),
}

fn read_date(field: &str, value: Option<&str>) -> DateInput {
    match value.map(str::trim) {
        None => DateInput::Missing,
        Some("") => DateInput::Cleared,
        Some(text) => match parse_timestamp(text) {
            Some(date) => DateInput::Value(date),
            None => {
                log::warn!("Ignoring unparseable {} '{}'", field, text);
                DateInput::Invalid
            }
        },
    }
}

/// Optional date: a parsed value wins, empty clears, missing or invalid keeps `previous`.
fn resolve_optional_date(
    field: &str,
    value: Option<&str>,
    previous: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match read_date(field, value) {
        DateInput::Value(date) => Some(date),
        DateInput::Cleared => None,
        DateInput::Missing | DateInput::Invalid => previous,
    }
}

fn pick<T>(field: &str, value: Option<&str>, previous: Option<T>, fallback: T) -> T
where
    T: FromStr<Err = String> + Display + Copy,
{
    let default = previous.unwrap_or(fallback);
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => default,
        Some(text) => text.parse().unwrap_or_else(|_| {
            log::warn!("Unrecognized {} '{}', using '{}'", field, text, default);
            default
        }),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Present text replaces (empty clears), absent text keeps `previous`.
fn resolve_text(value: Option<&str>, previous: Option<&String>) -> Option<String> {
    match value {
        Some(text) => non_empty(Some(text)),
        None => previous.cloned(),
    }
}

fn resolve_project(raw: &RawRisk, previous: Option<&Risk>) -> Option<ProjectRef> {
    let previous_project = previous.and_then(|p| p.project.as_ref());
    match raw.project_id.as_deref().map(str::trim) {
        Some("") => None,
        Some(id) => {
            let name = non_empty(raw.project_name.as_deref()).or_else(|| {
                previous_project
                    .filter(|p| p.id == id)
                    .and_then(|p| p.name.clone())
            });
            Some(ProjectRef {
                id: id.to_string(),
                name,
            })
        }
        None => previous_project.cloned().map(|mut project| {
            if let Some(name) = non_empty(raw.project_name.as_deref()) {
                project.name = Some(name);
            }
            project
        }),
    }
}

fn resolve_owner(raw: &RawRisk, previous: Option<&Risk>) -> Option<OwnerRef> {
    if raw.owner_id.is_none() && raw.owner_name.is_none() && raw.owner_email.is_none() {
        return previous.and_then(|p| p.owner.clone());
    }
    let id = raw.owner_id.as_deref().map(str::trim).unwrap_or("");
    let display_name = non_empty(raw.owner_name.as_deref());
    let email = non_empty(raw.owner_email.as_deref());
    if id.is_empty() && display_name.is_none() && email.is_none() {
        return None;
    }
    Some(OwnerRef {
        id: id.to_string(),
        display_name,
        email,
    })
}

/// Turn a raw payload into a complete risk.
///
/// `previous` is the stored record for updates and `None` for creation (and
/// for records read back from the store). `now` is the reference time for
/// every defaulted timestamp.
pub fn normalize_risk(raw: &RawRisk, previous: Option<&Risk>, now: DateTime<Utc>) -> Result<Risk> {
    let title = match raw.title.as_deref() {
        Some(title) => title.trim().to_string(),
        None => previous.map(|p| p.title.clone()).unwrap_or_default(),
    };
    if title.is_empty() {
        return Err(RiskmapError::validation("title", "title must not be empty"));
    }

    let previous_status = previous.map(|p| p.status);
    let status = pick(
        "status",
        raw.status.as_deref(),
        previous_status,
        RiskStatus::Identified,
    );
    if let Some(from) = previous_status {
        if !from.can_transition_to(status) {
            return Err(RiskmapError::validation(
                "status",
                format!("cannot move a risk from {} to {}", from, status),
            ));
        }
    }

    let category = pick(
        "category",
        raw.category.as_deref(),
        previous.map(|p| p.category),
        Category::Operational,
    );
    let probability = pick(
        "probability",
        raw.probability.as_deref(),
        previous.map(|p| p.probability),
        Level::Medium,
    );
    let impact = pick(
        "impact",
        raw.impact.as_deref(),
        previous.map(|p| p.impact),
        Level::Medium,
    );

    let identified_date = match read_date("identified_date", raw.identified_date.as_deref()) {
        DateInput::Value(date) => date,
        _ => previous.map(|p| p.identified_date).unwrap_or(now),
    };
    let review_date = resolve_optional_date(
        "review_date",
        raw.review_date.as_deref(),
        previous.and_then(|p| p.review_date),
    );
    let mut closed_date = resolve_optional_date(
        "closed_date",
        raw.closed_date.as_deref(),
        previous.and_then(|p| p.closed_date),
    );
    let entering_closed =
        status == RiskStatus::Closed && previous_status != Some(RiskStatus::Closed);
    if entering_closed && closed_date.is_none() {
        closed_date = Some(now);
    }

    let created_at = match read_date("created_at", raw.created_at.as_deref()) {
        DateInput::Value(date) => date,
        _ => previous.map(|p| p.created_at).unwrap_or(now),
    };

    let id = non_empty(raw.id.as_deref())
        .or_else(|| previous.map(|p| p.id.clone()))
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let organization_id = non_empty(raw.organization_id.as_deref())
        .or_else(|| previous.map(|p| p.organization_id.clone()))
        .unwrap_or_default();

    let tags = match &raw.tags {
        Some(tags) => tags.normalized(),
        None => previous.map(|p| p.tags.clone()).unwrap_or_default(),
    };

    let risk_score = super::score(probability, impact);
    if let Some(supplied) = raw.risk_score.as_ref().and_then(serde_json::Value::as_u64) {
        if supplied != u64::from(risk_score) {
            log::debug!(
                "Discarding supplied risk_score {} for '{}', recomputed {}",
                supplied,
                title,
                risk_score
            );
        }
    }

    Ok(Risk {
        id,
        organization_id,
        project: resolve_project(raw, previous),
        description: resolve_text(
            raw.description.as_deref(),
            previous.and_then(|p| p.description.as_ref()),
        ),
        title,
        category,
        probability,
        impact,
        risk_score,
        status,
        owner: resolve_owner(raw, previous),
        mitigation_plan: resolve_text(
            raw.mitigation_plan.as_deref(),
            previous.and_then(|p| p.mitigation_plan.as_ref()),
        ),
        contingency_plan: resolve_text(
            raw.contingency_plan.as_deref(),
            previous.and_then(|p| p.contingency_plan.as_ref()),
        ),
        identified_date,
        review_date,
        closed_date,
        tags,
        created_at,
    })
}
