//! HTTP client used to fetch release archives.
//!
//! This module wraps `reqwest` with the behaviour release publishing needs:
//! - Automatic retry with exponential backoff (see [`FetchConfig::backoff_delay`])
//! - Retries on network errors, `5xx`, `429` **and `404`**, because a release
//!   event can fire before its archive has finished uploading
//! - Streaming downloads straight to disk with an optional progress callback
//! - Redirecting every request to a stand-in server for integration testing
//!
//! # Examples
//!
//! ```no_run
//! use bcrpub_archive::http::HttpClient;
//! use bcrpub_archive::FetchConfig;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FetchConfig::new().with_backoff_factor(Duration::from_millis(500));
//! let client = HttpClient::with_config(config)?;
//!
//! client.download(
//!     "https://github.com/owner/repo/releases/download/v1.0.0/repo-v1.0.0.tar.gz",
//!     "/tmp/repo-v1.0.0.tar.gz".as_ref(),
//!     Some(|downloaded, total| println!("{}/{} bytes", downloaded, total)),
//! ).await?;
//! # Ok(())
//! # }
//! ```

use std::error::Error as StdError;
use std::path::Path;

use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::{ArchiveError, FetchConfig, Result};

pub struct HttpClient {
    client: Client,
    config: FetchConfig,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ArchiveError::Config(format!("Failed to build HTTP client: {}", describe(&e))))?;

        Ok(Self { client, config })
    }

    /// Perform a GET request, retrying transient failures.
    ///
    /// Errors always name `url` as given, even when the request itself was
    /// redirected to an integration endpoint.
    pub async fn get(&self, url: &str) -> Result<Response> {
        let target = self.resolve_url(url)?;
        let mut retry = 0;

        loop {
            log::debug!("HTTP GET {} (attempt {})", target, retry + 1);

            let (failure, summary) = match self.execute_get(&target).await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        log::debug!("HTTP {} {}", status.as_u16(), target);
                        return Ok(response);
                    }
                    let failure = ArchiveError::download_failed(url, status.as_u16());
                    if !is_retryable_status(status) {
                        return Err(failure);
                    }
                    (failure, format!("HTTP {}", status.as_u16()))
                }
                Err(e) if e.is_builder() => {
                    return Err(ArchiveError::Request {
                        url: url.to_string(),
                        reason: describe(&e),
                    });
                }
                Err(e) => {
                    let reason = describe(&e);
                    (
                        ArchiveError::NoResponse {
                            url: url.to_string(),
                            reason: reason.clone(),
                        },
                        reason,
                    )
                }
            };

            if retry >= self.config.max_retries {
                return Err(failure);
            }
            retry += 1;

            let delay = self.config.backoff_delay(retry);
            log::warn!(
                "Download of {} failed ({}), retrying in {:?} ({}/{})",
                url,
                summary,
                delay,
                retry,
                self.config.max_retries
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Execute a GET request without retries
    async fn execute_get(&self, url: &Url) -> std::result::Result<Response, reqwest::Error> {
        self.client.get(url.clone()).send().await
    }

    /// Stream the body of `url` into `dest`, creating or truncating it.
    ///
    /// Returns the number of bytes written. The file is flushed before this
    /// returns, so a successful result means the write has completed.
    pub async fn download<F>(&self, url: &str, dest: &Path, progress: Option<F>) -> Result<u64>
    where
        F: Fn(u64, u64),
    {
        let response = self.get(url).await?;
        let total_size = response.content_length().unwrap_or(0);

        let mut file = File::create(dest).await?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ArchiveError::Request {
                url: url.to_string(),
                reason: describe(&e),
            })?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(ref callback) = progress {
                callback(downloaded, total_size);
            }
        }

        file.flush().await?;
        file.sync_all().await?;

        log::debug!("Downloaded {} bytes from {} to {}", downloaded, url, dest.display());
        Ok(downloaded)
    }

    /// Parse `url` and apply the integration-test redirect, if configured.
    pub fn resolve_url(&self, url: &str) -> Result<Url> {
        let mut parsed = Url::parse(url).map_err(|e| ArchiveError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if let Some(endpoint) = &self.config.redirect {
            let invalid = |what: &str| ArchiveError::InvalidUrl {
                url: url.to_string(),
                reason: format!("cannot redirect {} to {}", what, endpoint),
            };
            parsed
                .set_scheme(endpoint.scheme())
                .map_err(|_| invalid("scheme"))?;
            parsed
                .set_host(endpoint.host_str())
                .map_err(|_| invalid("host"))?;
            parsed
                .set_port(endpoint.port())
                .map_err(|_| invalid("port"))?;
        }

        Ok(parsed)
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

/// Statuses worth another attempt: server errors, rate limiting, and 404
/// for archives that have not finished uploading yet.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::NOT_FOUND
}

/// Render an error together with its sources, `reqwest` hides the useful part there.
fn describe(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
