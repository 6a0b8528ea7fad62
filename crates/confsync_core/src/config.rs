use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

pub const DEFAULT_USER_AGENT: &str = "confsync/0.1";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_REFRESH_SETTLE_SECS: u64 = 5;
pub const DEFAULT_REOPEN_DELAY_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SyncConfig {
    #[serde(default)]
    pub confluence: ConfluenceSection,
    #[serde(default)]
    pub inventory: InventorySection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ConfluenceSection {
    pub base_url: Option<String>,
    pub page_id: Option<u64>,
    pub space_key: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_ms: Option<u64>,
    pub credentials_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct InventorySection {
    pub spreadsheet_path: Option<PathBuf>,
    pub master_folder_marker: Option<String>,
    #[serde(default)]
    pub refresh_command: Vec<String>,
    pub refresh_settle_secs: Option<u64>,
    pub reopen_delay_secs: Option<u64>,
}

/// Fully resolved settings for one run. Every value the pipeline needs is
/// present here, so nothing downstream reaches back into the environment.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub base_url: String,
    pub page_id: u64,
    pub space_key: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
    pub credentials_path: PathBuf,
    pub spreadsheet_path: PathBuf,
    pub master_folder_marker: String,
    /// Command plus arguments; the spreadsheet path is appended as the
    /// final argument. Empty means skip the external refresh.
    pub refresh_command: Vec<String>,
    pub refresh_settle: Duration,
    pub reopen_delay: Duration,
}

/// CLI-supplied values that take precedence over both environment and
/// config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub page_id: Option<u64>,
    pub space_key: Option<String>,
    pub credentials_path: Option<PathBuf>,
    pub spreadsheet_path: Option<PathBuf>,
    pub master_folder_marker: Option<String>,
}

impl SyncConfig {
    /// Resolve base URL: env CONFLUENCE_BASE_URL > config.
    pub fn base_url(&self) -> Option<String> {
        env_string("CONFLUENCE_BASE_URL").or_else(|| self.confluence.base_url.clone())
    }

    /// Resolve page id: env CONFLUENCE_PAGE_ID > config.
    pub fn page_id(&self) -> Option<u64> {
        if let Some(value) = env_string("CONFLUENCE_PAGE_ID") {
            return value.parse().ok();
        }
        self.confluence.page_id
    }

    /// Resolve credentials path: env CONFLUENCE_CREDENTIALS > config.
    pub fn credentials_path(&self) -> Option<PathBuf> {
        env_string("CONFLUENCE_CREDENTIALS")
            .map(PathBuf::from)
            .or_else(|| self.confluence.credentials_path.clone())
    }

    /// Resolve spreadsheet path: env INVENTORY_SPREADSHEET > config.
    pub fn spreadsheet_path(&self) -> Option<PathBuf> {
        env_string("INVENTORY_SPREADSHEET")
            .map(PathBuf::from)
            .or_else(|| self.inventory.spreadsheet_path.clone())
    }

    /// Resolve the master-folder marker: env INVENTORY_MARKER > config.
    pub fn master_folder_marker(&self) -> Option<String> {
        env_string("INVENTORY_MARKER").or_else(|| self.inventory.master_folder_marker.clone())
    }

    pub fn user_agent(&self) -> String {
        env_string("CONFSYNC_USER_AGENT")
            .or_else(|| self.confluence.user_agent.clone())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    /// Validate that every required value is present and build the run
    /// settings. Precedence per value: CLI override > env > config file.
    /// Missing keys are reported together in one error.
    pub fn resolve(&self) -> Result<RunSettings> {
        self.resolve_with(&Overrides::default())
    }

    pub fn resolve_with(&self, overrides: &Overrides) -> Result<RunSettings> {
        let mut missing = Vec::new();

        let base_url = overrides.base_url.clone().or_else(|| self.base_url());
        if base_url.is_none() {
            missing.push("confluence.base_url");
        }
        let page_id = overrides.page_id.or_else(|| self.page_id());
        if page_id.is_none() {
            missing.push("confluence.page_id");
        }
        let credentials_path = overrides
            .credentials_path
            .clone()
            .or_else(|| self.credentials_path());
        if credentials_path.is_none() {
            missing.push("confluence.credentials_path");
        }
        let spreadsheet_path = overrides
            .spreadsheet_path
            .clone()
            .or_else(|| self.spreadsheet_path());
        if spreadsheet_path.is_none() {
            missing.push("inventory.spreadsheet_path");
        }
        let master_folder_marker = overrides
            .master_folder_marker
            .clone()
            .or_else(|| self.master_folder_marker());
        if master_folder_marker.is_none() {
            missing.push("inventory.master_folder_marker");
        }
        if !missing.is_empty() {
            return Err(SyncError::validation(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )));
        }

        let marker = master_folder_marker.unwrap_or_default();
        if marker.trim().is_empty() {
            return Err(SyncError::validation(
                "inventory.master_folder_marker must not be blank",
            ));
        }

        Ok(RunSettings {
            base_url: base_url
                .unwrap_or_default()
                .trim_end_matches('/')
                .to_string(),
            page_id: page_id.unwrap_or_default(),
            space_key: overrides
                .space_key
                .clone()
                .or_else(|| self.confluence.space_key.clone()),
            user_agent: self.user_agent(),
            timeout: Duration::from_millis(
                self.confluence.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            ),
            credentials_path: credentials_path.unwrap_or_default(),
            spreadsheet_path: spreadsheet_path.unwrap_or_default(),
            master_folder_marker: marker,
            refresh_command: self.inventory.refresh_command.clone(),
            refresh_settle: Duration::from_secs(
                self.inventory
                    .refresh_settle_secs
                    .unwrap_or(DEFAULT_REFRESH_SETTLE_SECS),
            ),
            reopen_delay: Duration::from_secs(
                self.inventory
                    .reopen_delay_secs
                    .unwrap_or(DEFAULT_REOPEN_DELAY_SECS),
            ),
        })
    }
}

/// Load a SyncConfig from a TOML file. Returns default if the file doesn't
/// exist, so overrides alone can drive a run.
pub fn load_config(config_path: &Path) -> Result<SyncConfig> {
    if !config_path.exists() {
        return Ok(SyncConfig::default());
    }
    let content =
        fs::read_to_string(config_path).map_err(|error| SyncError::io(config_path, error))?;
    let parsed: SyncConfig = toml::from_str(&content).map_err(|error| {
        SyncError::validation(format!("failed to parse {}: {error}", config_path.display()))
    })?;
    Ok(parsed)
}

fn env_string(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() { None } else { Some(trimmed) }
        }
        Err(_) => None,
    }
}
