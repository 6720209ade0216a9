use std::path::Path;

use tracing::info;

use gridgov_common::{config::GovernanceConfig, error::Result};

/// Loads the config at `path`, writing the default one first if missing.
pub fn ensure_config(path: &Path) -> Result<GovernanceConfig> {
    if !path.exists() {
        info!("⚠️ Config not found. Writing defaults to {}...", path.display());
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        GovernanceConfig::default().save_to_file(path)?;
        info!("✅ Default config written");
    }
    GovernanceConfig::load_from_file(path)
}
