//! Engine configuration persistence
//!
//! Stores overlay settings in `~/.config/adorn/config.yaml`

use serde::{Deserialize, Serialize};

use crate::schema::HostSchema;

fn default_debounce_ms() -> u64 {
    500
}

/// Engine configuration that persists across sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Quiet period after the last qualifying mutation before a re-scan
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Class/attribute names identifying the host's diff structure
    #[serde(default)]
    pub schema: HostSchema,

    /// Extra filename-glob rules, consulted ahead of the built-ins.
    /// Each entry is `(glob, language id)`.
    #[serde(default)]
    pub extra_rules: Vec<(String, String)>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            schema: HostSchema::default(),
            extra_rules: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to disk
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(&path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.debounce_ms, 500);
        assert_eq!(config.schema.panel_class, "file-diff");
        assert!(config.extra_rules.is_empty());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: EngineConfig = serde_yaml::from_str("debounce_ms: 250").unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.schema, HostSchema::default());
    }

    #[test]
    fn test_round_trip() {
        let mut config = EngineConfig::default();
        config.extra_rules.push(("*.vue".to_string(), "markup".to_string()));
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: EngineConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.extra_rules, config.extra_rules);
        assert_eq!(back.debounce_ms, config.debounce_ms);
    }
}
