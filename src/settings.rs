use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TallyError};

/// Runtime configuration. Values come from `~/.config/tally/settings.json`
/// with environment variables taking precedence, so a cron invocation can
/// be configured entirely from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub receipt_folder: String,
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_items_range")]
    pub items_range: String,
    #[serde(default)]
    pub service_account_file: String,
    #[serde(default)]
    pub openai_api_key: String,
}

fn default_items_range() -> String {
    "Items!A:H".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            receipt_folder: String::new(),
            spreadsheet_id: String::new(),
            items_range: default_items_range(),
            service_account_file: String::new(),
            openai_api_key: String::new(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tally")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    let mut settings = if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    };

    env_override(&mut settings.receipt_folder, "RECEIPT_FOLDER");
    env_override(&mut settings.spreadsheet_id, "SPREADSHEET_ID");
    env_override(&mut settings.items_range, "ITEMS_RANGE");
    env_override(&mut settings.service_account_file, "SERVICE_ACCOUNT_FILE");
    env_override(&mut settings.openai_api_key, "OPENAI_API_KEY");
    settings
}

fn env_override(value: &mut String, key: &str) {
    if let Ok(v) = std::env::var(key) {
        if !v.is_empty() {
            *value = v;
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| TallyError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

impl Settings {
    pub fn watched_folder(&self) -> Result<PathBuf> {
        if self.receipt_folder.is_empty() {
            return Err(TallyError::Settings(
                "receipt folder not configured (set RECEIPT_FOLDER or run 'tally init')".into(),
            ));
        }
        Ok(PathBuf::from(&self.receipt_folder))
    }

    pub fn spreadsheet_id(&self) -> Result<&str> {
        if self.spreadsheet_id.is_empty() {
            return Err(TallyError::Settings("SPREADSHEET_ID not set".into()));
        }
        Ok(&self.spreadsheet_id)
    }

    /// Bearer token for the Google APIs, read from the file named by
    /// `SERVICE_ACCOUNT_FILE`. Minting that token from service-account
    /// credentials is the operator's problem, not ours.
    pub fn google_token(&self) -> Result<String> {
        if self.service_account_file.is_empty() {
            return Err(TallyError::Settings("SERVICE_ACCOUNT_FILE not set".into()));
        }
        let token = std::fs::read_to_string(&self.service_account_file)
            .map_err(|e| {
                TallyError::Settings(format!(
                    "cannot read {}: {e}",
                    self.service_account_file
                ))
            })?
            .trim()
            .to_string();
        if token.is_empty() {
            return Err(TallyError::Settings(format!(
                "{} is empty",
                self.service_account_file
            )));
        }
        Ok(token)
    }

    pub fn openai_api_key(&self) -> Result<&str> {
        if self.openai_api_key.is_empty() {
            return Err(TallyError::Settings("OPENAI_API_KEY not set".into()));
        }
        Ok(&self.openai_api_key)
    }
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
