//! HTTP client for a running docent server.

use anyhow::{Result, bail};
use serde_json::Value;

use docent_types::{McpRequestBody, McpResponse};

/// Client for the docent HTTP API.
pub struct Client {
    base_url: String,
    http: reqwest::Client,
}

impl Client {
    /// Create a new client for the given server URL.
    pub fn new(base_url: &str) -> Result<Self> {
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!("Server URL must start with http:// or https://: {}", base_url);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a question and return the raw JSON response.
    pub async fn query_raw(&self, body: &McpRequestBody) -> Result<Value> {
        let response = self.http.post(self.url("/mcp/query")).json(body).send().await?;

        let status = response.status();
        let value: Value = response.json().await?;
        if !status.is_success() {
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            bail!("Server rejected the request ({}): {}", status, message);
        }

        Ok(value)
    }

    /// Send a question.
    pub async fn query(&self, body: &McpRequestBody) -> Result<McpResponse> {
        Ok(serde_json::from_value(self.query_raw(body).await?)?)
    }
}
