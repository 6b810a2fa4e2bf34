//! HTTP client with built-in retry logic and error handling.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use log::{debug, warn};
use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::io::Write;
use std::time::Duration;

use super::retry::{
    MAX_RETRIES, NonRetryableError, RETRY_DELAY_MS, check_retryable, classify_status,
    is_retryable_error,
};

const USER_AGENT: &str = concat!("protonfetcher/", env!("PROTONFETCHER_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Result of a HEAD request after redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadResponse {
    /// Where the redirect chain ended.
    pub url: String,
    pub content_length: Option<u64>,
}

/// HTTP client with built-in retry logic for network operations.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client with our user agent, a request timeout and, when `token` is
    /// given, a bearer `Authorization` header on every request.
    pub fn with_token(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("GITHUB_TOKEN contains characters not allowed in a header")?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::new(client))
    }

    /// GET and deserialize a JSON body.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET JSON from {}...", url);

        self.with_retry("GET JSON", || async {
            let response = self
                .client
                .get(url)
                .header(header::ACCEPT, "application/vnd.github+json")
                .send()
                .await
                .context("Failed to send request")?;

            let response = response.error_for_status().map_err(check_retryable)?;

            response
                .json::<T>()
                .await
                .context("Failed to parse JSON response")
        })
        .await
    }

    /// GET a body as text.
    #[tracing::instrument(skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}...", url);

        self.with_retry("GET", || async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .context("Failed to send request")?;

            let response = response.error_for_status().map_err(check_retryable)?;

            response.text().await.context("Failed to read response body")
        })
        .await
    }

    /// HEAD `url`, following redirects.
    #[tracing::instrument(skip(self))]
    pub async fn head(&self, url: &str) -> Result<HeadResponse> {
        debug!("HEAD {}...", url);

        self.with_retry("HEAD", || async {
            let response = self
                .client
                .head(url)
                .send()
                .await
                .context("Failed to send request")?;

            // HEAD errors carry no body, so classify the status ourselves
            if let Some(non_retryable) = classify_status(response.status(), url) {
                return Err(non_retryable.into());
            }
            let response = response.error_for_status()?;

            // `Response::content_length` reports the (empty) body for HEAD
            let content_length = response
                .headers()
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());

            Ok(HeadResponse {
                url: response.url().to_string(),
                content_length,
            })
        })
        .await
    }

    /// Stream `url` into the writer from `create_writer`, advancing `progress`.
    /// Returns the number of bytes written.
    #[tracing::instrument(skip(self, create_writer, progress))]
    pub async fn download_file<W, F>(
        &self,
        url: &str,
        create_writer: F,
        progress: &ProgressBar,
    ) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
    {
        debug!("Downloading file from {}...", url);

        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.download_file_once(url, &create_writer, progress).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    if e.downcast_ref::<NonRetryableError>().is_some() {
                        return Err(e);
                    }
                    if attempt == MAX_RETRIES {
                        return Err(e);
                    }
                    warn!(
                        "Download attempt {}/{} failed ({:#}), retrying...",
                        attempt, MAX_RETRIES, e
                    );
                    last_error = Some(e);
                    tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("Download failed after {} attempts", MAX_RETRIES)))
    }

    async fn download_file_once<W, F>(
        &self,
        url: &str,
        create_writer: &F,
        progress: &ProgressBar,
    ) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to start download request")?;

        let mut response = response.error_for_status().map_err(check_retryable)?;

        if let Some(total) = response.content_length() {
            progress.set_length(total);
        }
        progress.set_position(0);

        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
            progress.inc(chunk.len() as u64);
        }
        writer.flush().context("Failed to flush download")?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }

    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !is_retryable_error(&e) {
                        debug!("{}: non-retryable error: {}", operation_name, e);
                        return Err(e);
                    }

                    if attempt < MAX_RETRIES {
                        warn!(
                            "{}: attempt {}/{} failed ({:#}), retrying in {}ms...",
                            operation_name, attempt, MAX_RETRIES, e, RETRY_DELAY_MS
                        );
                        tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("{}: failed after {} attempts", operation_name, MAX_RETRIES)
        }))
    }
}
