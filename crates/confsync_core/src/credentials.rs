use std::fs;
use std::path::Path;

use crate::error::{Result, SyncError};

/// API token plus username read from the local credentials file. Either
/// value may be absent; `into_required` enforces presence at the point the
/// pipeline actually needs to authenticate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_token: Option<String>,
    pub username: Option<String>,
}

impl Credentials {
    pub fn into_required(self) -> Result<(String, String)> {
        let token = self
            .api_token
            .ok_or_else(|| SyncError::credential("API_TOKEN not found in credentials file"))?;
        let username = self
            .username
            .ok_or_else(|| SyncError::credential("USERNAME not found in credentials file"))?;
        Ok((token, username))
    }
}

/// Read `API_TOKEN=` / `USERNAME=` lines from a plaintext file.
///
/// Prefix matching is case-sensitive and exact; unrecognized lines are
/// ignored, order does not matter, and a repeated key keeps the last value.
/// No validation is performed on the token itself.
pub fn load_credentials(path: &Path) -> Result<Credentials> {
    let contents = fs::read_to_string(path).map_err(|error| SyncError::io(path, error))?;

    let mut credentials = Credentials::default();
    for line in contents.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("API_TOKEN=") {
            credentials.api_token = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("USERNAME=") {
            credentials.username = Some(value.to_string());
        }
    }
    Ok(credentials)
}
