//! HTTP client for the remote audio-generation service.
//!
//! [`TtsApi`](api::TtsApi) wraps the service's REST surface (submission,
//! status, cancellation, download-location derivation) using
//! [`reqwest`]. The tracking layer depends on the narrower
//! [`TaskClient`] trait so tests can substitute a scripted fake.

pub mod api;
pub mod config;

use async_trait::async_trait;
use narrate_core::request::AudioGenerationRequest;
use narrate_core::types::TaskStatus;

pub use api::{ClientError, Submission, TtsApi};
pub use config::ClientConfig;

/// The remote-task surface the tracking core depends on.
///
/// Implemented by [`TtsApi`] for the real service; tests implement it
/// with scripted status sequences.
#[async_trait]
pub trait TaskClient: Send + Sync {
    /// Submit a generation job. Fails if the remote rejects the request
    /// or is unreachable; a failed submission never enters tracking.
    async fn submit(&self, request: &AudioGenerationRequest) -> Result<Submission, ClientError>;

    /// Fetch the current status of a task.
    async fn status(&self, task_id: &str) -> Result<TaskStatus, ClientError>;

    /// Ask the remote to stop a task. Best-effort; in-progress work is
    /// not guaranteed to halt.
    async fn cancel(&self, task_id: &str) -> Result<TaskStatus, ClientError>;

    /// Derive the download location for a task's output. Pure string
    /// derivation, no network call.
    fn download_url(&self, task_id: &str) -> String;
}
