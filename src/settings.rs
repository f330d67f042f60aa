use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{OborotError, Result};

pub const DB_FILE: &str = "oborot.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("oborot")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("oborot")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| OborotError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn db_path() -> PathBuf {
    get_data_dir().join(DB_FILE)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only this test changes HOME.
    #[test]
    fn test_save_load_and_corrupt_fallback() {
        let home = tempfile::tempdir().unwrap();
        let previous = std::env::var_os("HOME");
        std::env::set_var("HOME", home.path());

        assert_eq!(load_settings().data_dir, Settings::default().data_dir);

        let settings = Settings {
            data_dir: "/srv/ledgers".to_string(),
        };
        save_settings(&settings).unwrap();
        let path = home.path().join(".config/oborot/settings.json");
        assert!(path.exists());
        assert_eq!(load_settings().data_dir, "/srv/ledgers");
        assert_eq!(db_path(), PathBuf::from("/srv/ledgers").join(DB_FILE));

        std::fs::write(&path, "{ not json").unwrap();
        let fallback = load_settings();
        assert!(fallback.data_dir.starts_with(&*home.path().to_string_lossy()));
        assert!(fallback.data_dir.ends_with("oborot"));

        match previous {
            Some(v) => std::env::set_var("HOME", v),
            None => std::env::remove_var("HOME"),
        }
    }

    #[test]
    fn test_default_data_dir() {
        let s = Settings::default();
        assert!(s.data_dir.ends_with("oborot"));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let json = r#"{"data_dir": "/tmp/test", "user_name": "Bob"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.data_dir, "/tmp/test");
    }

    #[test]
    fn test_shellexpand_tilde() {
        let expanded = shellexpand_path("~/ledgers");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("ledgers"));
    }
}
