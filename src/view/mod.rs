//! Derived views over a risk collection: filtering, sorting and aggregation.
//!
//! Every function here is pure and total. Errors never originate in this
//! module; missing optional fields have defined defaults instead.

pub mod filter;
pub mod matrix;
pub mod pipeline;
pub mod sort;

pub use filter::{build_predicate, FilterValue, RiskFilter, SearchText};
pub use matrix::{
    global_statistics, summarize_categories, CategorySummary, GlobalStatistics, MatrixCell,
    RiskMatrix, DEFAULT_TOP_RISKS,
};
pub use pipeline::{filter_and_sort, prepare_view, PreparedRiskView, ViewCriteria};
pub use sort::{build_comparator, sort_risks, FieldKind, SortDirection, SortField};
