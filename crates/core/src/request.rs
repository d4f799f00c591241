//! Audio generation submission payload.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

/// Request body for `POST /generate/audio`.
///
/// The engine identifier and its options are opaque to the tracking
/// core; which engines and option shapes are valid is decided by the
/// remote service. The core only enforces the text bounds.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AudioGenerationRequest {
    /// Engine identifier, e.g. `kokoro` or `chatterbox`.
    pub engine: String,
    /// Narration text to synthesize.
    #[validate(length(min = 1, max = 20000))]
    pub text: String,
    /// Engine-specific options, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_options: Option<serde_json::Value>,
    /// Desired output format (the remote currently accepts `wav`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

impl AudioGenerationRequest {
    /// Build a request with just an engine and text.
    pub fn new(engine: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            text: text.into(),
            engine_options: None,
            output_format: None,
        }
    }

    /// Validate field bounds before submission.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()?;
        Ok(())
    }
}
