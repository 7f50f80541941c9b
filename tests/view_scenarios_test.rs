//! End-to-end scenarios from raw store records to prepared views.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use riskmap::view::{filter_and_sort, prepare_view};
use riskmap::{
    normalize_risk, Category, FilterValue, GlobalStatistics, RawRisk, Risk, RiskFilter,
    SortDirection, SortField, ViewCriteria,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap()
}

fn raw(id: &str, category: &str, probability: &str, impact: &str) -> RawRisk {
    RawRisk {
        id: Some(id.to_string()),
        category: Some(category.to_string()),
        probability: Some(probability.to_string()),
        impact: Some(impact.to_string()),
        ..RawRisk::titled(format!("Risk {id}"))
    }
}

fn normalize_all(records: &[RawRisk]) -> Vec<Risk> {
    records
        .iter()
        .map(|r| normalize_risk(r, None, now()).unwrap())
        .collect()
}

#[test]
fn test_three_risk_register() {
    let risks = normalize_all(&[
        raw("A", "technical", "high", "high"),
        raw("B", "technical", "low", "low"),
        raw("C", "safety", "very_high", "very_high"),
    ]);
    let scores: Vec<u8> = risks.iter().map(Risk::risk_score).collect();
    assert_eq!(scores, vec![16, 4, 25]);

    let view = prepare_view(&risks, &ViewCriteria::default(), now());

    let technical = view
        .categories
        .iter()
        .find(|s| s.category == Category::Technical)
        .unwrap();
    assert_eq!(technical.total, 2);
    assert_eq!(technical.high, 1);
    assert_eq!(technical.low, 1);
    assert_eq!(technical.average_score, 10);

    assert_eq!(
        view.statistics,
        GlobalStatistics {
            total: 3,
            critical: 1,
            high: 1,
            medium: 0,
            low: 1,
            overdue: 0,
        }
    );
    assert_eq!(view.matrix.cell_count(), 25);
}

#[test]
fn test_overdue_review_dates() {
    let yesterday = (now() - Duration::days(1)).to_rfc3339();
    let open = RawRisk {
        review_date: Some(yesterday.clone()),
        ..raw("open", "legal", "medium", "medium")
    };
    let closed = RawRisk {
        review_date: Some(yesterday),
        status: Some("closed".into()),
        ..raw("closed", "legal", "medium", "medium")
    };
    let risks = normalize_all(&[open, closed]);
    let view = prepare_view(&risks, &ViewCriteria::default(), now());
    assert_eq!(view.statistics.overdue, 1);
}

#[test]
fn test_filter_identity_keeps_everything() {
    let risks = normalize_all(&[
        raw("1", "financial", "low", "high"),
        raw("2", "legal", "very_low", "medium"),
        raw("3", "operational", "high", "very_high"),
    ]);
    let criteria = ViewCriteria {
        filter: RiskFilter::default(),
        sort_field: SortField::Title,
        sort_direction: SortDirection::Asc,
        ..ViewCriteria::default()
    };
    assert_eq!(filter_and_sort(&risks, &criteria), risks);
}

#[test]
fn test_search_and_category_combine() {
    let mut records = vec![
        raw("1", "financial", "low", "high"),
        raw("2", "financial", "high", "high"),
        raw("3", "legal", "high", "high"),
    ];
    records[1].mitigation_plan = Some("Hedge CURRENCY exposure".into());
    records[2].mitigation_plan = Some("currency clause review".into());
    let risks = normalize_all(&records);

    let criteria = ViewCriteria {
        filter: riskmap::build_predicate(
            "currency",
            FilterValue::Only(Category::Financial),
            FilterValue::All,
            FilterValue::All,
            FilterValue::All,
            FilterValue::All,
        ),
        ..ViewCriteria::default()
    };
    let ids: Vec<String> = filter_and_sort(&risks, &criteria)
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["2".to_string()]);
}

#[test]
fn test_direction_flip_reverses_distinct_keys() {
    let risks = normalize_all(&[
        raw("1", "financial", "very_low", "very_low"),
        raw("2", "financial", "low", "medium"),
        raw("3", "financial", "very_high", "very_high"),
        raw("4", "financial", "medium", "high"),
    ]);
    let ascending = ViewCriteria {
        sort_direction: SortDirection::Asc,
        ..ViewCriteria::default()
    };
    let mut up = filter_and_sort(&risks, &ascending);
    let down = filter_and_sort(&risks, &ViewCriteria::default());
    up.reverse();
    assert_eq!(up, down);
}
