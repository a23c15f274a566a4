//! Client for the chat service debug server.

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("debug server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Debug, Serialize)]
struct LevelRequest<'a> {
    level: &'a str,
}

#[derive(Debug, Deserialize)]
struct LevelResponse {
    level: String,
}

pub struct DebugClient {
    client: Client,
    base_url: String,
}

impl DebugClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build information of the running binary.
    pub async fn version(&self) -> Result<serde_json::Value, ClientError> {
        let resp = check(self.get("/version").await?).await?;
        Ok(resp.json().await?)
    }

    /// Current log level, in canonical upper-case form.
    pub async fn log_level(&self) -> Result<String, ClientError> {
        let resp = self
            .client
            .get(self.url("/log/level"))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let level: LevelResponse = check(resp).await?.json().await?;
        Ok(level.level)
    }

    /// Change the log level. Returns the level now in effect.
    pub async fn set_log_level(&self, level: &str) -> Result<String, ClientError> {
        let resp = self
            .client
            .put(self.url("/log/level"))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&LevelRequest { level })
            .send()
            .await?;
        let level: LevelResponse = check(resp).await?.json().await?;
        Ok(level.level)
    }

    /// Raw GET against any debug route.
    pub async fn get(&self, path: &str) -> Result<Response, reqwest::Error> {
        self.client.get(self.url(path)).send().await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let client = DebugClient::new("http://localhost:8079/");
        assert_eq!(client.url("/version"), "http://localhost:8079/version");
    }
}
