/// Config file loading and creation for the valuerank CLI.
///
/// Config lives at ~/.config/valuerank/config.toml.
/// All fields are optional. CLI args override config values.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use valuerank_core::EngineConfig;

use crate::bail;

#[derive(Deserialize, Default, Debug)]
pub struct ValuerankConfig {
    pub state_path: Option<String>,
    pub catalogue: Option<String>,
    /// Partial overrides; anything missing keeps the engine default.
    pub engine: Option<EngineConfig>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# valuerank configuration
# All values here can be overridden by CLI flags.

# Where the session is saved after every decision
# state_path = \"/home/me/.local/share/valuerank/session.json\"

# Items to rank: a JSON array of names or one name per line.
# If not set, the built-in list of 53 personal values is used.
# catalogue = \"/path/to/values.txt\"

# Engine tuning. Every key is optional.
# [engine]
# discovery_cutoff = 20
# confident_threshold_ms = 3000
# hard_choice_threshold_ms = 10000
#
# [engine.rating]
# k_base = 40.0
# confident_multiplier = 1.5
# inferred_multiplier = 0.5
# rd_decay = 0.95
# min_rd = 50.0
";

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home)
}

/// Returns the default config path: ~/.config/valuerank/config.toml
pub fn config_path() -> PathBuf {
    home_dir().join(".config").join("valuerank").join("config.toml")
}

/// Returns the default session path: ~/.local/share/valuerank/session.json
pub fn default_state_path() -> PathBuf {
    home_dir().join(".local").join("share").join("valuerank").join("session.json")
}

pub fn parse_config(content: &str) -> Result<ValuerankConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> ValuerankConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ValuerankConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

/// Create the default config file. Errors if it already exists.
pub fn create_default_config(path: &Path) {
    if path.exists() {
        bail(format!("Config file already exists at {}", path.display()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| bail(format!("Failed to create directory {}: {e}", parent.display())));
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .unwrap_or_else(|e| bail(format!("Failed to write config to {}: {e}", path.display())));
}
