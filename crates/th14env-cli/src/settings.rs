use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use th14env::{AttachConfig, EnvConfig};
use tracing::{info, warn};

/// Contents of the `--config` TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub attach: AttachConfig,
    pub env: EnvConfig,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        settings.env.validate()?;
        Ok(settings)
    }
}

/// Load `path` if given. Only a missing file falls back to defaults;
/// unreadable, malformed or invalid files are errors.
pub fn load_or_default(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    if !path.exists() {
        warn!("Config file {:?} not found, using defaults", path);
        return Ok(Settings::default());
    }
    let settings = Settings::load(path)?;
    info!("Loaded config from {:?}", path);
    Ok(settings)
}
