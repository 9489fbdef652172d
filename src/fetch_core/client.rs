//! HTTP transport for the hacktivity list endpoint
//!
//! Every request carries HTTP Basic credentials and a fixed per-request
//! timeout. A non-success status is returned as `RemoteFetchFailed`; the
//! caller decides whether that is fatal (committed request) or a soft
//! "try the next spelling" signal (filter parameter probe).

use super::error::FetchError;
use crate::config::Credentials;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;

pub const USER_AGENT: &str = "payoutflow/0.1";

/// Longest slice of an error body kept in `RemoteFetchFailed` messages
const ERROR_BODY_PREVIEW: usize = 200;

/// A source of raw page payloads
///
/// `params` is the full query string for one page request.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, params: &[(String, String)]) -> Result<Value, FetchError>;
}

/// `PageSource` backed by the remote API
pub struct HacktivityClient {
    http: reqwest::Client,
    api_url: String,
    credentials: Credentials,
}

impl HacktivityClient {
    pub fn new(
        api_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.into(),
            credentials,
        })
    }
}

#[async_trait]
impl PageSource for HacktivityClient {
    async fn fetch_page(&self, params: &[(String, String)]) -> Result<Value, FetchError> {
        let response = self
            .http
            .get(&self.api_url)
            .query(params)
            .basic_auth(&self.credentials.username, Some(&self.credentials.token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(FetchError::RemoteFetchFailed {
                status: Some(status.as_u16()),
                message: format!("hacktivity API error: {} {}", status, preview),
            });
        }

        let body = response.text().await?;
        let payload: Value = serde_json::from_str(&body)?;
        if !payload.is_object() {
            return Err(FetchError::MalformedPayload(
                "expected a JSON object at the top level".to_string(),
            ));
        }

        Ok(payload)
    }
}
