use crate::config::{default_config_contents, CONFIG_FILE_NAME};
use anyhow::Result;
use std::path::Path;

/// Write a default `.riskmap.toml` into `dir`.
pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    std::fs::write(&config_path, default_config_contents())?;
    println!("Created {} configuration file", CONFIG_FILE_NAME);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from;
    use tempfile::TempDir;

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        init_config(dir.path(), false).unwrap();
        assert!(init_config(dir.path(), false).is_err());
        init_config(dir.path(), true).unwrap();

        let config = load_config_from(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.store.organization_id, "default");
    }
}
