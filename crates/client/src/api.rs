//! REST API client for the audio-generation service endpoints.
//!
//! Wraps the service HTTP API (job submission, status queries,
//! cancellation, health probe) using [`reqwest`].

use async_trait::async_trait;
use narrate_core::request::AudioGenerationRequest;
use narrate_core::types::TaskStatus;
use serde::Deserialize;

use crate::TaskClient;

/// HTTP client for a single audio-generation service.
pub struct TtsApi {
    client: reqwest::Client,
    api_url: String,
}

/// Response returned by `POST /generate/audio` after the job has been
/// queued.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    /// Server-assigned identifier for the queued task.
    pub task_id: String,
    /// URL to poll for status updates.
    pub status_url: String,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Service error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl TtsApi {
    /// Create a new API client for an audio-generation service.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://localhost:4100`.
    pub fn new(api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// Base HTTP API URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Probe the service's `/health` endpoint.
    pub async fn health(&self) -> Result<(), ClientError> {
        let response = self
            .client
            .get(format!("{}/health", self.api_url))
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Ask the remote to terminate a running task with a signal rather
    /// than just revoking it from the queue. Forceful variant of
    /// [`TaskClient::cancel`]; works only on process-pool workers.
    pub async fn terminate(&self, task_id: &str) -> Result<TaskStatus, ClientError> {
        let response = self
            .client
            .delete(format!("{}/tasks/{}", self.api_url, task_id))
            .query(&[("terminate", "true")])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ClientError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ClientError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskClient for TtsApi {
    async fn submit(&self, request: &AudioGenerationRequest) -> Result<Submission, ClientError> {
        let response = self
            .client
            .post(format!("{}/generate/audio", self.api_url))
            .json(request)
            .send()
            .await?;

        let submission: Submission = Self::parse_response(response).await?;

        tracing::info!(
            task_id = %submission.task_id,
            engine = %request.engine,
            "Generation job submitted",
        );

        Ok(submission)
    }

    async fn status(&self, task_id: &str) -> Result<TaskStatus, ClientError> {
        let response = self
            .client
            .get(format!("{}/tasks/{}", self.api_url, task_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn cancel(&self, task_id: &str) -> Result<TaskStatus, ClientError> {
        let response = self
            .client
            .delete(format!("{}/tasks/{}", self.api_url, task_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    fn download_url(&self, task_id: &str) -> String {
        format!("{}/audio/{}", self.api_url, task_id)
    }
}
