//! Generation records and remote task status types.
//!
//! [`GenerationRecord`] is the persisted ledger entry for one submitted
//! job. [`TaskStatus`] is the transient view of remote task state
//! returned by the status endpoint; it exists only while a polling
//! controller is running and is never persisted.

use serde::{Deserialize, Serialize};

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Server-assigned task identifiers are opaque strings.
pub type TaskId = String;

/// Maximum number of characters of request text kept as a record name.
pub const NAME_MAX_CHARS: usize = 20;

// ---------------------------------------------------------------------------
// Task state
// ---------------------------------------------------------------------------

/// Remote task state as reported by the status endpoint.
///
/// The remote engine reports states as free-form strings. The four
/// known values map onto dedicated variants; anything else is carried
/// verbatim in [`TaskState::Unknown`] and treated as non-terminal, so
/// novel states keep the poller alive instead of silently ending it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskState {
    Pending,
    Processing,
    Success,
    Failed,
    /// Unrecognized status string, preserved verbatim.
    Unknown(String),
}

impl From<String> for TaskState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PENDING" => TaskState::Pending,
            "PROCESSING" => TaskState::Processing,
            "SUCCESS" => TaskState::Success,
            // Celery-backed engines report FAILURE; older clients used
            // FAILED. Both mean the same terminal state.
            "FAILED" | "FAILURE" => TaskState::Failed,
            _ => TaskState::Unknown(s),
        }
    }
}

impl From<TaskState> for String {
    fn from(state: TaskState) -> Self {
        match state {
            TaskState::Pending => "PENDING".to_string(),
            TaskState::Processing => "PROCESSING".to_string(),
            TaskState::Success => "SUCCESS".to_string(),
            TaskState::Failed => "FAILED".to_string(),
            TaskState::Unknown(s) => s,
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Pending => write!(f, "PENDING"),
            TaskState::Processing => write!(f, "PROCESSING"),
            TaskState::Success => write!(f, "SUCCESS"),
            TaskState::Failed => write!(f, "FAILED"),
            TaskState::Unknown(s) => write!(f, "{s}"),
        }
    }
}

impl TaskState {
    /// True only for [`Success`](Self::Success) and
    /// [`Failed`](Self::Failed). Unknown states are non-terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failed)
    }
}

// ---------------------------------------------------------------------------
// Task status
// ---------------------------------------------------------------------------

/// One status response from the remote task engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: TaskId,
    pub status: TaskState,
    /// Engine-specific result payload, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error message, present when the remote reports a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStatus {
    /// Output location from the success payload, if the engine supplied
    /// one (`result.output_url`).
    pub fn output_url(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(|r| r.get("output_url"))
            .and_then(|v| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// Generation record
// ---------------------------------------------------------------------------

/// Persisted ledger entry for one submitted generation job.
///
/// Created at submission time with `url: None`; the polling controller
/// fills `url` exactly once when the job succeeds. Serialized with
/// camelCase field names to stay compatible with previously persisted
/// ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    /// Server-assigned task id; unique within the ledger.
    pub id: TaskId,
    /// Short user-facing label derived from the request text.
    pub name: String,
    /// Resolved output location; set only after a successful run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Submission time; immutable after creation.
    pub created_at: Timestamp,
}

impl GenerationRecord {
    /// Build a fresh record for a newly submitted job.
    ///
    /// The label is the request text truncated to [`NAME_MAX_CHARS`]
    /// characters (char boundaries, not bytes), with an ellipsis
    /// appended when truncation occurred.
    pub fn new(id: impl Into<TaskId>, text: &str, created_at: Timestamp) -> Self {
        Self {
            id: id.into(),
            name: truncate_name(text),
            url: None,
            created_at,
        }
    }
}

/// Truncate request text into a record label.
fn truncate_name(text: &str) -> String {
    let mut chars = text.char_indices();
    match chars.nth(NAME_MAX_CHARS) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
