use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, Result};

/// Token-addressed push delivery. `Ok` means the gateway accepted the message.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, token: &str, title: &str, body: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    token: &'a str,
    notification: PushContent<'a>,
}

#[derive(Debug, Serialize)]
struct PushContent<'a> {
    title: &'a str,
    body: &'a str,
}

/// Push gateway reached over HTTPS with a bearer credential.
#[derive(Clone)]
pub struct HttpPushGateway {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpPushGateway {
    pub fn new(url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("push gateway client: {}", e)))?;

        Ok(Self { client, url, api_key })
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn send(&self, token: &str, title: &str, body: &str) -> Result<()> {
        let request = PushRequest {
            token,
            notification: PushContent { title, body },
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::PushGateway(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        Err(AppError::PushGateway(format!("gateway answered {}: {}", status, detail.trim())))
    }
}
