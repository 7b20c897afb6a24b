use crate::error::RemoteError;
use anyhow::{Context, Result};
use reqwest::{multipart::Form, RequestBuilder};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Connection timeout for every backend request
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Thin JSON/multipart client over the backend base URL.
///
/// Each call takes its own timeout; non-2xx responses become
/// `RemoteError`s with the backend's error message.
#[derive(Debug, Clone)]
pub(crate) struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub(crate) fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client for engagement backend")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn get(&self, path: &str, timeout: Duration) -> Result<Vec<u8>, RemoteError> {
        self.send(self.client.get(self.url(path)), path, timeout).await
    }

    pub(crate) async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        timeout: Duration,
    ) -> Result<Vec<u8>, RemoteError> {
        self.send(self.client.post(self.url(path)).json(body), path, timeout)
            .await
    }

    pub(crate) async fn post_form(
        &self,
        path: &str,
        form: Form,
        timeout: Duration,
    ) -> Result<Vec<u8>, RemoteError> {
        self.send(self.client.post(self.url(path)).multipart(form), path, timeout)
            .await
    }

    async fn send(
        &self,
        request: RequestBuilder,
        path: &str,
        timeout: Duration,
    ) -> Result<Vec<u8>, RemoteError> {
        let response = request
            .header("Accept", "application/json")
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        debug!(path = path, status = status.as_u16(), bytes = body.len(), "Backend response");

        if !status.is_success() {
            return Err(RemoteError::from_response(status.as_u16(), &body));
        }

        Ok(body.to_vec())
    }
}
