//! Centralized configuration paths
//!
//! All config files live under:
//! - Unix/macOS: `~/.config/adorn/`
//! - Windows: `%APPDATA%\adorn\`

use std::{env, fs, path::PathBuf};

const APP_DIR: &str = "adorn";

/// Base config directory.
///
/// Unix/macOS:
///   - If XDG_CONFIG_HOME is set: `$XDG_CONFIG_HOME/adorn`
///   - Else: `~/.config/adorn`
///
/// Windows:
///   - `%APPDATA%\adorn`
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_DIR))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|config| config.join(APP_DIR))
    }
}

/// `~/.config/adorn/config.yaml`
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

/// `~/.config/adorn/logs/`, created if missing.
pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    let dir = config_dir()
        .ok_or_else(|| "No config directory available".to_string())?
        .join("logs");
    fs::create_dir_all(&dir).map_err(|e| format!("Failed to create logs directory: {}", e))?;
    Ok(dir)
}
