//! Client for the optional face-recognition collaborator.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use url::Url;

use super::AttendanceImage;
use crate::types::UserId;

#[derive(Debug, thiserror::Error)]
pub enum FaceRecognitionError {
    #[error("face recognition request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("face recognition responded with status {0}")]
    Status(u16),
}

/// Verdict for one image
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FaceMatch {
    pub matched: bool,
    pub confidence: Option<f64>,
}

#[async_trait]
pub trait FaceRecognizer: Send + Sync {
    async fn verify(&self, user_id: UserId, image: &AttendanceImage) -> Result<FaceMatch, FaceRecognitionError>;
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    user_id: UserId,
    content_type: &'a str,
    image: String,
}

pub struct HttpFaceRecognizer {
    client: reqwest::Client,
    url: Url,
}

impl HttpFaceRecognizer {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, FaceRecognitionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl FaceRecognizer for HttpFaceRecognizer {
    async fn verify(&self, user_id: UserId, image: &AttendanceImage) -> Result<FaceMatch, FaceRecognitionError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&VerifyRequest {
                user_id,
                content_type: &image.content_type,
                image: STANDARD.encode(&image.bytes),
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FaceRecognitionError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}
