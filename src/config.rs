use anyhow::Result;
use std::{fs, path::Path};
use tracing::warn;
use voxbot_agent::AgentSettings;

pub const DEFAULT_SETTINGS_PATH: &str = "config/agent.toml";
pub const DEFAULT_ITEMS_PATH: &str = "config/items.json";

/// Load agent settings from an explicit path, falling back to defaults on errors.
pub fn load_settings(path: &Path) -> AgentSettings {
    match fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<AgentSettings>(&contents) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("Failed to parse {}: {err}. Using defaults", path.display());
                AgentSettings::default()
            }
        },
        Err(err) => {
            if path != Path::new(DEFAULT_SETTINGS_PATH)
                || err.kind() != std::io::ErrorKind::NotFound
            {
                warn!("Failed to read {}: {err}. Using defaults", path.display());
            } else {
                warn!(
                    "Agent config not found at {}. Using defaults",
                    path.display()
                );
            }
            AgentSettings::default()
        }
    }
}

/// Save agent settings to an explicit path.
pub fn save_settings_to_path(settings: &AgentSettings, path: &Path) -> Result<()> {
    let toml = toml::to_string_pretty(settings)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml)?;
    Ok(())
}
