//! `.riskmap.toml` configuration.
//!
//! The file is optional. Missing sections and keys take their defaults, and
//! values that do not parse are replaced by defaults with a warning rather
//! than failing the command.

mod core;
mod loader;

pub use self::core::{
    ReconcileConfig, RiskmapConfig, StoreConfig, ViewConfig, DEFAULT_ORGANIZATION,
    DEFAULT_STORE_FILE,
};
pub use loader::{
    default_config_contents, directory_ancestors, load_config, load_config_from,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
