//! Optimizer Client: the single point of contact with the optimization backend.
//!
//! No other module talks to the backend directly. The session controller only
//! sees the [`OptimizationBackend`] trait, so the read loop runs against
//! scripted streams in tests.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::optimization::{OptimizationRequest, SaveOptimizationRequest};
use crate::models::resume::ResumeData;

const OPTIMIZE_PATH: &str = "/optimize";
const SAVE_PATH: &str = "/optimize/save";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw body chunks of an optimization stream, in arrival order.
pub type EventByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {status_text}")]
    Status { status: u16, status_text: String },

    #[error("No response body")]
    NoBody,

    #[error("Stream read failed: {0}")]
    Stream(String),
}

impl ClientError {
    fn from_status(status: StatusCode) -> Self {
        ClientError::Status {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }
}

/// The backend as seen by a session: open a progress stream, save a result.
#[async_trait]
pub trait OptimizationBackend: Send + Sync {
    async fn open_stream(
        &self,
        request: &OptimizationRequest,
    ) -> Result<EventByteStream, ClientError>;

    async fn save_optimization(
        &self,
        resume_id: &str,
        optimized_data: &ResumeData,
    ) -> Result<(), ClientError>;
}

/// reqwest-backed implementation of [`OptimizationBackend`].
#[derive(Clone)]
pub struct OptimizerClient {
    client: Client,
    base_url: String,
    save_timeout: Duration,
}

impl OptimizerClient {
    /// The stream request carries no overall timeout: runs take as long as
    /// the backend needs. Saves are bounded by `save_timeout`.
    pub fn new(base_url: &str, save_timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            save_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl OptimizationBackend for OptimizerClient {
    async fn open_stream(
        &self,
        request: &OptimizationRequest,
    ) -> Result<EventByteStream, ClientError> {
        let response = self
            .client
            .post(self.url(OPTIMIZE_PATH))
            .header("accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::from_status(status));
        }
        if response.content_length() == Some(0) {
            return Err(ClientError::NoBody);
        }

        debug!(
            "Optimization stream opened for resume {} / job {}",
            request.resume_id, request.job_id
        );

        Ok(response
            .bytes_stream()
            .map_err(|e| ClientError::Stream(e.to_string()))
            .boxed())
    }

    async fn save_optimization(
        &self,
        resume_id: &str,
        optimized_data: &ResumeData,
    ) -> Result<(), ClientError> {
        let body = SaveOptimizationRequest {
            resume_id,
            optimized_data,
        };
        let response = self
            .client
            .post(self.url(SAVE_PATH))
            .timeout(self.save_timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::from_status(status));
        }

        info!("Saved optimized résumé {resume_id}");
        Ok(())
    }
}
