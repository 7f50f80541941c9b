//! Pure transformation pipeline for view preparation.
//!
//! ```text
//! &[Risk] (normalized snapshot)
//!        │
//!        ▼
//! ┌──────────────────┐
//! │  prepare_view()  │ ← ViewCriteria, top-N, now
//! └──────────────────┘
//!        │
//!        ├─→ filter_risks()          ← search + categorical filters
//!        ├─→ sort_risks()            ← field + direction
//!        ├─→ RiskMatrix::build()     ← 5×5 placement
//!        ├─→ summarize_categories()  ← per-category heatmap
//!        └─→ global_statistics()     ← tier distribution + overdue
//!        │
//!        ▼
//! PreparedRiskView
//! ```
//!
//! No stage touches the store, the clock or the environment; `now` is a
//! parameter so results are reproducible.

use super::filter::RiskFilter;
use super::matrix::{
    global_statistics, summarize_categories, CategorySummary, GlobalStatistics, RiskMatrix,
    DEFAULT_TOP_RISKS,
};
use super::sort::{sort_risks, SortDirection, SortField};
use crate::risk::Risk;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What the consumer asked to see.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewCriteria {
    pub filter: RiskFilter,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    /// Risks listed per category summary
    pub top_risks: usize,
}

impl Default for ViewCriteria {
    fn default() -> Self {
        Self {
            filter: RiskFilter::default(),
            sort_field: SortField::default(),
            sort_direction: SortDirection::default(),
            top_risks: DEFAULT_TOP_RISKS,
        }
    }
}

/// Everything the list, matrix and heatmap views render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedRiskView {
    pub items: Vec<Risk>,
    pub matrix: RiskMatrix,
    pub categories: Vec<CategorySummary>,
    pub statistics: GlobalStatistics,
    pub total_before_filter: usize,
}

/// Filter then sort; the list shown by list/grid/table views.
pub fn filter_and_sort<'a>(
    risks: impl IntoIterator<Item = &'a Risk>,
    criteria: &ViewCriteria,
) -> Vec<Risk> {
    let mut selected = filter_risks(risks, &criteria.filter);
    sort_risks(&mut selected, criteria.sort_field, criteria.sort_direction);
    selected
}

fn filter_risks<'a>(risks: impl IntoIterator<Item = &'a Risk>, filter: &RiskFilter) -> Vec<Risk> {
    if filter.is_identity() {
        return risks.into_iter().cloned().collect();
    }
    risks
        .into_iter()
        .filter(|risk| filter.matches(risk))
        .cloned()
        .collect()
}

/// Prepare every derived view from one snapshot.
pub fn prepare_view<'a>(
    risks: impl IntoIterator<Item = &'a Risk>,
    criteria: &ViewCriteria,
    now: DateTime<Utc>,
) -> PreparedRiskView {
    let risks: Vec<&Risk> = risks.into_iter().collect();
    let total_before_filter = risks.len();

    // Stage 1-2: filter and sort (pure)
    let items = filter_and_sort(risks, criteria);

    // Stage 3: matrix placement (pure)
    let matrix = RiskMatrix::build(&items);

    // Stage 4: category heatmap (pure)
    let categories = summarize_categories(&items, criteria.top_risks)
        .into_values()
        .collect();

    // Stage 5: global distribution (pure)
    let statistics = global_statistics(&items, now);

    log::debug!(
        "Prepared view: {} of {} risks after filtering",
        items.len(),
        total_before_filter
    );

    PreparedRiskView {
        items,
        matrix,
        categories,
        statistics,
        total_before_filter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{Category, Level};
    use crate::view::filter::{FilterValue, SearchText};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
    }

    fn sample() -> Vec<Risk> {
        let day = now() - chrono::Duration::days(10);
        vec![
            Risk::new("A", "Database failover", Category::Technical, Level::High, Level::High, day),
            Risk::new("B", "Minor UI glitch", Category::Technical, Level::Low, Level::Low, day),
            Risk::new(
                "C",
                "Fall from height",
                Category::Safety,
                Level::VeryHigh,
                Level::VeryHigh,
                day,
            ),
        ]
    }

    #[test]
    fn test_default_view_sorts_by_score_descending() {
        let risks = sample();
        let view = prepare_view(&risks, &ViewCriteria::default(), now());
        let ids: Vec<&str> = view.items.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
        assert_eq!(view.total_before_filter, 3);
        assert_eq!(view.matrix.total_risks(), 3);
        assert_eq!(view.categories.len(), 2);
        assert_eq!(view.categories[0].category, Category::Technical);
        assert_eq!(view.categories[0].average_score, 10);
        assert_eq!(view.statistics.critical, 1);
    }

    #[test]
    fn test_aggregates_follow_the_filter() {
        let risks = sample();
        let criteria = ViewCriteria {
            filter: RiskFilter {
                category: FilterValue::Only(Category::Technical),
                ..RiskFilter::default()
            },
            ..ViewCriteria::default()
        };
        let view = prepare_view(&risks, &criteria, now());
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.statistics.total, 2);
        assert_eq!(view.statistics.critical, 0);
        assert_eq!(view.matrix.count(Level::VeryHigh, Level::VeryHigh), 0);
        assert_eq!(view.matrix.cell_count(), 25);
    }

    #[test]
    fn test_no_matches_still_produces_full_matrix() {
        let risks = sample();
        let criteria = ViewCriteria {
            filter: RiskFilter {
                search: SearchText::new("nothing matches this"),
                ..RiskFilter::default()
            },
            ..ViewCriteria::default()
        };
        let view = prepare_view(&risks, &criteria, now());
        assert!(view.items.is_empty());
        assert!(view.categories.is_empty());
        assert_eq!(view.matrix.cell_count(), 25);
        assert_eq!(view.total_before_filter, 3);
    }
}
