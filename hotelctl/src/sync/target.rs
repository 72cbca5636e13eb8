//! Destinations for outbound sync pushes.
//!
//! [`create_target`] is the single place configuration turns into a target. The external system
//! upserts by idempotency key, so pushing the same envelope twice leaves one record behind.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use url::Url;

use super::SyncEnvelope;
use super::signing;
use crate::config::SyncTargetConfig;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("request to sync target failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sync target responded with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to serialize sync payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sync signing secret is not valid base64")]
    InvalidSecret,
}

#[async_trait]
pub trait SyncTarget: Send + Sync {
    /// Short name for logs and errors
    fn name(&self) -> &'static str;

    async fn push(&self, envelope: &SyncEnvelope) -> Result<()>;
}

pub fn create_target(config: &SyncTargetConfig) -> Result<Arc<dyn SyncTarget>> {
    match config {
        SyncTargetConfig::Log => Ok(Arc::new(LogSyncTarget::default())),
        SyncTargetConfig::Http { url, secret, timeout } => Ok(Arc::new(HttpSyncTarget::new(url.clone(), secret.clone(), *timeout)?)),
    }
}

/// Keeps the latest envelope per idempotency key and logs every push
#[derive(Default)]
pub struct LogSyncTarget {
    records: DashMap<String, SyncEnvelope>,
    pushes: AtomicU64,
}

impl LogSyncTarget {
    /// Distinct records on the "external" side
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn push_count(&self) -> u64 {
        self.pushes.load(Ordering::Relaxed)
    }

    pub fn get(&self, idempotency_key: &str) -> Option<SyncEnvelope> {
        self.records.get(idempotency_key).map(|entry| entry.clone())
    }
}

#[async_trait]
impl SyncTarget for LogSyncTarget {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn push(&self, envelope: &SyncEnvelope) -> Result<()> {
        tracing::info!(
            idempotency_key = %envelope.idempotency_key,
            hotel_id = %envelope.hotel_id,
            kind = envelope.kind.as_str(),
            snapshot_hash = %envelope.snapshot_hash,
            "Sync push"
        );
        self.records.insert(envelope.idempotency_key.clone(), envelope.clone());
        self.pushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// POSTs signed envelopes as JSON
pub struct HttpSyncTarget {
    client: reqwest::Client,
    url: Url,
    secret: Option<String>,
}

impl HttpSyncTarget {
    pub fn new(url: Url, secret: Option<String>, timeout: Duration) -> Result<Self> {
        if let Some(secret) = &secret
            && signing::secret_bytes(secret).is_none()
        {
            return Err(SyncError::InvalidSecret);
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url, secret })
    }
}

#[async_trait]
impl SyncTarget for HttpSyncTarget {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn push(&self, envelope: &SyncEnvelope) -> Result<()> {
        let body = serde_json::to_string(envelope)?;
        let timestamp = Utc::now().timestamp();

        let mut request = self
            .client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(signing::ID_HEADER, &envelope.idempotency_key)
            .header(signing::TIMESTAMP_HEADER, timestamp.to_string());
        if let Some(secret) = &self.secret {
            let signature =
                signing::sign_payload(&envelope.idempotency_key, timestamp, &body, secret).ok_or(SyncError::InvalidSecret)?;
            request = request.header(signing::SIGNATURE_HEADER, signature);
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(512).collect(),
            });
        }
        Ok(())
    }
}
