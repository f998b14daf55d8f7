//! Content-addressed storage uploads.
//!
//! Two pinning providers sit behind one interface: a bearer-token upload
//! endpoint and a basic-auth pinning node. Transient failures are retried
//! with bounded exponential backoff before surfacing as `UploadError`.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::Rng;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ConfigError, UploadError};

/// Supported pinning providers
#[derive(Debug, Clone)]
pub enum StorageProvider {
    /// Bearer-token upload endpoint; identifier at `value.cid` in the response
    Bearer { endpoint: String, api_key: String },
    /// Basic-auth pinning node; identifier at `Hash` in the response
    Basic {
        endpoint: String,
        project_id: String,
        project_secret: String,
    },
}

impl StorageProvider {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Bearer { endpoint, api_key } => {
                if endpoint.trim().is_empty() {
                    return Err(ConfigError::MissingStorageEndpoint);
                }
                if api_key.trim().is_empty() {
                    return Err(ConfigError::MissingStorageCredentials);
                }
            }
            Self::Basic {
                endpoint,
                project_id,
                project_secret,
            } => {
                if endpoint.trim().is_empty() {
                    return Err(ConfigError::MissingStorageEndpoint);
                }
                if project_id.trim().is_empty() || project_secret.trim().is_empty() {
                    return Err(ConfigError::MissingStorageCredentials);
                }
            }
        }
        Ok(())
    }

    fn auth_header(&self) -> String {
        match self {
            Self::Bearer { api_key, .. } => format!("Bearer {api_key}"),
            Self::Basic {
                project_id,
                project_secret,
                ..
            } => format!(
                "Basic {}",
                BASE64.encode(format!("{project_id}:{project_secret}"))
            ),
        }
    }

    fn upload_url(&self) -> String {
        match self {
            Self::Bearer { endpoint, .. } => endpoint.trim_end_matches('/').to_string(),
            Self::Basic { endpoint, .. } => {
                format!("{}/api/v0/add", endpoint.trim_end_matches('/'))
            }
        }
    }

    fn extract_identifier(&self, body: &Value) -> Option<String> {
        match self {
            Self::Bearer { .. } => body
                .get("value")?
                .get("cid")?
                .as_str()
                .map(str::to_string),
            Self::Basic { .. } => body.get("Hash")?.as_str().map(str::to_string),
        }
    }
}

/// Bounded exponential backoff for transient upload failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following failure number `attempt` (1-based),
    /// doubling per failure with ±50% jitter
    fn delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(1u32 << (attempt - 1).min(8));
        exp.mul_f64(rand::thread_rng().gen_range(0.5..1.5))
    }
}

/// Whether an upload failure is worth retrying
fn transient(err: &UploadError) -> bool {
    match err {
        UploadError::Network(_) => true,
        UploadError::Service { status } => *status >= 500,
        _ => false,
    }
}

/// Seam for the pipeline so it can run against any content store
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Upload the bytes and return the service-assigned content identifier
    async fn upload(&self, bytes: Vec<u8>) -> Result<String, UploadError>;
}

/// HTTP uploader for a configured [`StorageProvider`]
pub struct StorageUploader {
    provider: StorageProvider,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl StorageUploader {
    /// Fails closed when credentials or the endpoint are missing, before
    /// any request is made.
    pub fn new(provider: StorageProvider) -> Result<Self, ConfigError> {
        provider.validate()?;
        Ok(Self {
            provider,
            http: reqwest::Client::new(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn upload(&self, bytes: Vec<u8>) -> Result<String, UploadError> {
        let mut attempt = 1u32;
        loop {
            match self.upload_once(bytes.clone()).await {
                Ok(cid) => {
                    debug!(%cid, "content pinned");
                    return Ok(cid);
                }
                Err(err) if attempt < self.retry.max_attempts && transient(&err) => {
                    let delay = self.retry.delay(attempt);
                    warn!(%err, attempt, ?delay, "upload failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn upload_once(&self, bytes: Vec<u8>) -> Result<String, UploadError> {
        let url = self.provider.upload_url();
        let request = match &self.provider {
            StorageProvider::Bearer { .. } => self
                .http
                .post(&url)
                .header(AUTHORIZATION, self.provider.auth_header())
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(bytes),
            StorageProvider::Basic { .. } => {
                let part =
                    reqwest::multipart::Part::bytes(bytes).file_name("credential.json");
                self.http
                    .post(&url)
                    .header(AUTHORIZATION, self.provider.auth_header())
                    .multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Service {
                status: status.as_u16(),
            });
        }
        let body: Value = response.json().await?;
        self.provider
            .extract_identifier(&body)
            .ok_or(UploadError::MissingIdentifier)
    }
}

#[async_trait]
impl ContentStore for StorageUploader {
    async fn upload(&self, bytes: Vec<u8>) -> Result<String, UploadError> {
        StorageUploader::upload(self, bytes).await
    }
}
