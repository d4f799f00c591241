//! Shared types for the narrate audio-generation tracker.
//!
//! Defines the persisted [`GenerationRecord`](types::GenerationRecord),
//! the transient remote [`TaskStatus`](types::TaskStatus) view, and the
//! validated [`AudioGenerationRequest`](request::AudioGenerationRequest)
//! submission payload.

pub mod error;
pub mod request;
pub mod types;

pub use error::CoreError;
