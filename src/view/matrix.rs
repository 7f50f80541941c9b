//! Probability × impact matrix, per-category heatmap and global statistics.

use crate::risk::{classify, Category, Level, Risk, SeverityTier};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Number of risks listed per category summary unless configured otherwise.
pub const DEFAULT_TOP_RISKS: usize = 3;

/// 5×5 grid of risks indexed by (probability, impact).
///
/// Every cell exists from construction on, so lookups never miss.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskMatrix {
    cells: [[Vec<Risk>; 5]; 5],
}

/// Borrowed view of one matrix cell.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MatrixCell<'a> {
    pub probability: Level,
    pub impact: Level,
    pub score: u8,
    pub risks: &'a [Risk],
}

impl Default for RiskMatrix {
    fn default() -> Self {
        Self::empty()
    }
}

impl RiskMatrix {
    /// All 25 cells present and empty.
    pub fn empty() -> Self {
        Self {
            cells: std::array::from_fn(|_| std::array::from_fn(|_| Vec::new())),
        }
    }

    /// Place each risk into the cell of its own probability and impact, keeping input order.
    pub fn build<'a>(risks: impl IntoIterator<Item = &'a Risk>) -> Self {
        let mut matrix = Self::empty();
        for risk in risks {
            matrix.cells[risk.probability().index()][risk.impact().index()].push(risk.clone());
        }
        matrix
    }

    pub fn cell(&self, probability: Level, impact: Level) -> &[Risk] {
        &self.cells[probability.index()][impact.index()]
    }

    pub fn count(&self, probability: Level, impact: Level) -> usize {
        self.cell(probability, impact).len()
    }

    /// Cells in probability-major order, lowest levels first.
    pub fn cells(&self) -> impl Iterator<Item = MatrixCell<'_>> + '_ {
        Level::ALL.into_iter().flat_map(move |probability| {
            Level::ALL.into_iter().map(move |impact| MatrixCell {
                probability,
                impact,
                score: crate::risk::score(probability, impact),
                risks: self.cell(probability, impact),
            })
        })
    }

    /// Number of cells; always 25.
    pub fn cell_count(&self) -> usize {
        self.cells.iter().map(|row| row.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(Vec::is_empty)
    }

    pub fn total_risks(&self) -> usize {
        self.cells.iter().flatten().map(Vec::len).sum()
    }
}

impl Serialize for RiskMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.cells())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
struct TierCounts {
    critical: usize,
    high: usize,
    medium: usize,
    low: usize,
}

impl TierCounts {
    fn add(&mut self, tier: SeverityTier) {
        match tier {
            SeverityTier::Critical => self.critical += 1,
            SeverityTier::High => self.high += 1,
            SeverityTier::Medium => self.medium += 1,
            SeverityTier::Low => self.low += 1,
        }
    }
}

/// Heatmap row for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Rounded mean risk score
    pub average_score: u8,
    /// Highest scores first; ties keep collection order
    pub top_risks: Vec<Risk>,
}

/// Summaries for every category present in `risks`.
pub fn summarize_categories(risks: &[Risk], top_n: usize) -> BTreeMap<Category, CategorySummary> {
    let mut grouped: BTreeMap<Category, Vec<&Risk>> = BTreeMap::new();
    for risk in risks {
        grouped.entry(risk.category).or_default().push(risk);
    }

    grouped
        .into_iter()
        .map(|(category, members)| (category, summarize_category(category, members, top_n)))
        .collect()
}

fn summarize_category(
    category: Category,
    mut members: Vec<&Risk>,
    top_n: usize,
) -> CategorySummary {
    let mut tiers = TierCounts::default();
    for risk in &members {
        tiers.add(classify(risk.risk_score()));
    }

    let total = members.len();
    let score_sum: u32 = members.iter().map(|r| u32::from(r.risk_score())).sum();
    let average_score = if total == 0 {
        0
    } else {
        (f64::from(score_sum) / total as f64).round() as u8
    };

    // sort_by is stable, so equal scores stay in collection order
    members.sort_by(|a, b| b.risk_score().cmp(&a.risk_score()));
    let top_risks = members.into_iter().take(top_n).cloned().collect();

    CategorySummary {
        category,
        total,
        critical: tiers.critical,
        high: tiers.high,
        medium: tiers.medium,
        low: tiers.low,
        average_score,
        top_risks,
    }
}

/// Severity distribution across the whole (filtered) collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GlobalStatistics {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Open risks whose review date is in the past
    pub overdue: usize,
}

pub fn global_statistics(risks: &[Risk], now: DateTime<Utc>) -> GlobalStatistics {
    let mut tiers = TierCounts::default();
    let mut overdue = 0;
    for risk in risks {
        tiers.add(risk.severity());
        if risk.is_overdue(now) {
            overdue += 1;
        }
    }
    GlobalStatistics {
        total: risks.len(),
        critical: tiers.critical,
        high: tiers.high,
        medium: tiers.medium,
        low: tiers.low,
        overdue,
    }
}
