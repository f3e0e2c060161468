//! Interpreter configuration, loaded from an optional TOML file and
//! overridden by CLI flags in `src/bin/zmachine.rs`.

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which Screen/InputProcessor backend to construct.
    pub display: DisplayBackend,
    /// RNG mode: "random" seeds from OS entropy, "predictable" takes `seed`.
    pub rng: RngConfig,
    /// Default story file to load if none is given on the command line.
    pub story_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: DisplayBackend::default(),
            rng: RngConfig::default(),
            story_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayBackend {
    #[default]
    Terminal,
    Headless,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RngConfig {
    pub predictable: bool,
    pub seed: u64,
}

impl Default for RngConfig {
    fn default() -> Self {
        Self {
            predictable: false,
            seed: 0,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults for
    /// any field the file omits. A missing file is not an error: the
    /// caller typically only passes `--config` when it wants non-default
    /// behavior.
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&text).map_err(|e| format!("failed to parse config {}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_terminal_and_random_rng() {
        let config = Config::default();
        assert_eq!(config.display, DisplayBackend::Terminal);
        assert!(!config.rng.predictable);
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str("display = \"headless\"\n").unwrap();
        assert_eq!(config.display, DisplayBackend::Headless);
        assert!(!config.rng.predictable);
    }
}
