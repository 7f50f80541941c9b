// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod io;
pub mod reconcile;
pub mod risk;
pub mod store;
pub mod view;

// Re-export commonly used types
pub use crate::errors::{Result, RiskmapError};

pub use crate::risk::{
    classify, normalize_risk, normalize_tags, score, Category, Level, OwnerRef, ProjectRef,
    RawRisk, RawTags, Risk, RiskStatus, SeverityTier,
};

pub use crate::view::{
    build_comparator, build_predicate, filter_and_sort, global_statistics, prepare_view,
    summarize_categories, CategorySummary, FilterValue, GlobalStatistics, PreparedRiskView,
    RiskFilter, RiskMatrix, SortDirection, SortField, ViewCriteria,
};

pub use crate::store::{
    ChangeEvent, ChangeKind, ChangeSubscription, InMemoryStore, JsonFileStore, RiskStore,
};

pub use crate::reconcile::{RefreshOutcome, RiskPipeline, RiskSnapshot, WatchHandle};

pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};

pub use crate::config::RiskmapConfig;
