use regex::Regex;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::RunSettings;
use crate::error::{Result, SyncError};

/// Title, storage-format body, and service-side version counter of one
/// page, as fetched in a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePage {
    pub title: String,
    pub body: String,
    pub version_number: i64,
}

/// The narrow wiki surface the pipeline consumes. Implemented over the
/// Confluence REST API in production and by an in-memory store in tests.
pub trait PageStore {
    fn fetch_page(&mut self, page_id: u64) -> Result<RemotePage>;
    fn fetch_last_version_comment(&mut self, page_id: u64) -> Result<String>;
    fn update_page(
        &mut self,
        page_id: u64,
        title: &str,
        body: &str,
        version_comment: &str,
        minor_edit: bool,
    ) -> Result<()>;
}

/// Next version label: first run of digits in the previous edit comment
/// plus one, or 1 when the comment carries no digits. This is a label only;
/// it is never checked against the service's own version counter.
pub fn next_version_number(version_comment: &str) -> i64 {
    let digits = Regex::new(r"\d+").expect("digit pattern is valid");
    digits
        .find(version_comment)
        .and_then(|found| found.as_str().parse::<i64>().ok())
        .map(|value| value + 1)
        .unwrap_or(1)
}

pub struct ConfluenceClient {
    client: Client,
    base_url: String,
    space_key: Option<String>,
    user_agent: String,
    username: String,
    api_token: String,
}

impl ConfluenceClient {
    pub fn new(settings: &RunSettings, username: String, api_token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|error| {
                SyncError::remote(format!("failed to build Confluence HTTP client: {error}"))
            })?;
        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            space_key: settings.space_key.clone(),
            user_agent: settings.user_agent.clone(),
            username,
            api_token,
        })
    }

    fn content_url(&self, page_id: u64) -> String {
        format!("{}/rest/api/content/{page_id}", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    title: String,
    body: Option<BodyField>,
    version: Option<VersionField>,
}

#[derive(Debug, Deserialize)]
struct BodyField {
    storage: Option<StorageField>,
}

#[derive(Debug, Deserialize)]
struct StorageField {
    value: String,
}

#[derive(Debug, Deserialize)]
struct VersionField {
    number: i64,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(rename = "lastUpdated")]
    last_updated: Option<LastUpdatedField>,
}

#[derive(Debug, Deserialize)]
struct LastUpdatedField {
    message: Option<String>,
}

impl PageStore for ConfluenceClient {
    fn fetch_page(&mut self, page_id: u64) -> Result<RemotePage> {
        let response = self
            .client
            .get(self.content_url(page_id))
            .query(&[("expand", "body.storage,version")])
            .basic_auth(&self.username, Some(&self.api_token))
            .header("User-Agent", self.user_agent.clone())
            .send()
            .map_err(|error| SyncError::remote(format!("failed to fetch page: {error}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::remote(format!(
                "fetch of page {page_id} failed with HTTP {status}"
            )));
        }
        let parsed: ContentResponse = response.json().map_err(|error| {
            SyncError::remote(format!("failed to decode page response: {error}"))
        })?;
        let body = parsed
            .body
            .and_then(|body| body.storage)
            .map(|storage| storage.value)
            .ok_or_else(|| {
                SyncError::remote(format!("page {page_id} response carried no storage body"))
            })?;
        let version_number = parsed
            .version
            .map(|version| version.number)
            .ok_or_else(|| {
                SyncError::remote(format!("page {page_id} response carried no version"))
            })?;
        Ok(RemotePage {
            title: parsed.title,
            body,
            version_number,
        })
    }

    fn fetch_last_version_comment(&mut self, page_id: u64) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/history", self.content_url(page_id)))
            .basic_auth(&self.username, Some(&self.api_token))
            .header("User-Agent", self.user_agent.clone())
            .send()
            .map_err(|error| SyncError::remote(format!("failed to fetch history: {error}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::remote(format!(
                "history fetch for page {page_id} failed with HTTP {status}"
            )));
        }
        let parsed: HistoryResponse = response.json().map_err(|error| {
            SyncError::remote(format!("failed to decode history response: {error}"))
        })?;
        Ok(parsed
            .last_updated
            .and_then(|entry| entry.message)
            .unwrap_or_default())
    }

    fn update_page(
        &mut self,
        page_id: u64,
        title: &str,
        body: &str,
        version_comment: &str,
        minor_edit: bool,
    ) -> Result<()> {
        // The service requires its own counter plus one on every PUT; the
        // caller's version label rides along as the edit message. Whatever
        // a concurrent editor did in between is overwritten.
        let current = self.fetch_page(page_id)?.version_number;

        let mut payload = json!({
            "id": page_id.to_string(),
            "type": "page",
            "title": title,
            "body": {
                "storage": {
                    "value": body,
                    "representation": "storage",
                }
            },
            "version": {
                "number": current + 1,
                "message": version_comment,
                "minorEdit": minor_edit,
            },
        });
        if let Some(space_key) = &self.space_key {
            payload["space"] = json!({ "key": space_key });
        }

        let response = self
            .client
            .put(self.content_url(page_id))
            .basic_auth(&self.username, Some(&self.api_token))
            .header("User-Agent", self.user_agent.clone())
            .json(&payload)
            .send()
            .map_err(|error| SyncError::remote(format!("failed to update page: {error}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::remote(format!(
                "update of page {page_id} failed with HTTP {status}"
            )));
        }
        Ok(())
    }
}
