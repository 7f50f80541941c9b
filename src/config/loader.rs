use std::fs;
use std::path::{Path, PathBuf};

use super::core::{RiskmapConfig, StoreConfig, ViewConfig};
use crate::errors::RiskmapError;
use crate::view::{SortDirection, SortField};

pub const CONFIG_FILE_NAME: &str = ".riskmap.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse TOML and replace invalid values with defaults.
pub fn parse_and_validate_config(contents: &str) -> Result<RiskmapConfig, String> {
    let mut config = toml::from_str::<RiskmapConfig>(contents)
        .map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))?;

    let defaults = ViewConfig::default();
    if config.view.sort_field.parse::<SortField>().is_err() {
        log::warn!(
            "Unknown sort_field '{}'. Using {}.",
            config.view.sort_field,
            defaults.sort_field
        );
        config.view.sort_field = defaults.sort_field;
    }
    if config.view.sort_direction.parse::<SortDirection>().is_err() {
        log::warn!(
            "Unknown sort_direction '{}'. Using {}.",
            config.view.sort_direction,
            defaults.sort_direction
        );
        config.view.sort_direction = defaults.sort_direction;
    }
    if config.view.top_risks == 0 {
        log::warn!(
            "top_risks must be at least 1. Using {}.",
            defaults.top_risks
        );
        config.view.top_risks = defaults.top_risks;
    }
    if config.store.organization_id.trim().is_empty() {
        log::warn!("Empty organization_id. Using the default organization.");
        config.store.organization_id = StoreConfig::default().organization_id;
    }

    Ok(config)
}

fn try_load_config_from_path(config_path: &Path) -> Option<RiskmapConfig> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            // absence is the normal case while walking up
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
            }
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// `start` followed by its parents, at most `max_depth` entries.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Search the working directory and its ancestors for `.riskmap.toml`.
pub fn load_config() -> RiskmapConfig {
    let current = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            return RiskmapConfig::default();
        }
    };
    discover_from(current)
}

fn discover_from(start: PathBuf) -> RiskmapConfig {
    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            RiskmapConfig::default()
        })
}

/// Load an explicitly named config file. Unlike discovery, a missing or
/// unparseable file is an error.
pub fn load_config_from(path: &Path) -> Result<RiskmapConfig, RiskmapError> {
    let contents = fs::read_to_string(path).map_err(|e| RiskmapError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_and_validate_config(&contents).map_err(|message| RiskmapError::Config {
        path: path.to_path_buf(),
        message,
    })
}

/// Contents written by `riskmap init`.
pub fn default_config_contents() -> String {
    let config = RiskmapConfig::default();
    format!(
        r#"# Riskmap Configuration

[view]
# title | riskScore | identifiedDate | reviewDate | closedDate | createdAt | owner | project | category | status
sort_field = "{}"
sort_direction = "{}"
top_risks = {}

[reconcile]
debounce_ms = {}

[store]
organization_id = "{}"
path = "{}"
"#,
        config.view.sort_field,
        config.view.sort_direction,
        config.view.top_risks,
        config.reconcile.debounce_ms,
        config.store.organization_id,
        config.store.path.display()
    )
}
