use crate::reconcile::DEFAULT_DEBOUNCE;
use crate::view::{SortDirection, SortField, ViewCriteria, DEFAULT_TOP_RISKS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for riskmap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskmapConfig {
    /// Default ordering and summary size
    #[serde(default)]
    pub view: ViewConfig,

    /// Change-reconciliation settings
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Where records live
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub sort_field: String,
    pub sort_direction: String,
    pub top_risks: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            sort_field: SortField::default().key().to_string(),
            sort_direction: SortDirection::default().to_string(),
            top_risks: DEFAULT_TOP_RISKS,
        }
    }
}

impl ViewConfig {
    pub fn sort_field(&self) -> SortField {
        self.sort_field.parse().unwrap_or_default()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction.parse().unwrap_or_default()
    }

    /// Criteria with no filters and the configured ordering.
    pub fn criteria(&self) -> ViewCriteria {
        ViewCriteria {
            sort_field: self.sort_field(),
            sort_direction: self.sort_direction(),
            top_risks: self.top_risks,
            ..ViewCriteria::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Coalescing window in milliseconds; 0 refreshes on every notification
    pub debounce_ms: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl ReconcileConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

pub const DEFAULT_ORGANIZATION: &str = "default";
pub const DEFAULT_STORE_FILE: &str = "risks.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub organization_id: String,
    /// JSON file holding the records, relative to the working directory
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            organization_id: DEFAULT_ORGANIZATION.to_string(),
            path: PathBuf::from(DEFAULT_STORE_FILE),
        }
    }
}
