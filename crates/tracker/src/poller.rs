//! Per-job polling loop against the remote task engine.
//!
//! [`poll_task`] issues status requests at a fixed interval until the
//! task reaches a terminal state, the transport fails, or the
//! [`CancellationToken`] fires. A cancelled poller discards any
//! response still in flight and never touches the ledger, so a late
//! response cannot resurrect a job the caller already gave up on.

use std::sync::Arc;
use std::time::Duration;

use narrate_client::{ClientError, TaskClient};
use narrate_core::types::TaskState;
use narrate_ledger::{Ledger, LedgerError};
use tokio_util::sync::CancellationToken;

/// Delay between consecutive status requests. The first request fires
/// immediately, not after the first interval elapses.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The remote reported SUCCESS; `url` is the resolved output
    /// location already merged into the ledger record.
    Success { url: String },
    /// The remote reported a terminal failure. No retry is attempted:
    /// the engine does not expose partial-failure semantics, so a
    /// single FAILED response is final. The ledger is left untouched.
    Failed { error: Option<String> },
    /// Cancellation fired before a terminal state was observed.
    Cancelled,
}

/// Errors that end a polling run without a remote verdict.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// A status request failed at the transport level. Terminal --
    /// there is no distinction between "remote says failed" and
    /// "could not reach remote".
    #[error("Transport error while polling: {0}")]
    Transport(#[from] ClientError),

    /// The terminal outcome could not be written to the ledger.
    #[error("Ledger write failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// Poll one task to completion, reconciling the outcome into the ledger.
///
/// On SUCCESS the output location is taken from the result payload
/// (`output_url`), falling back to the client's derived download URL,
/// and merged into the ledger record matching `task_id`. FAILED and
/// transport errors stop the loop without mutating the ledger.
/// PENDING, PROCESSING, and unrecognized states keep polling.
///
/// The cancellation token is re-checked after every response; a
/// response that arrives after cancellation is discarded.
pub async fn poll_task(
    client: Arc<dyn TaskClient>,
    ledger: Arc<Ledger>,
    task_id: String,
    cancel: CancellationToken,
) -> Result<PollOutcome, PollError> {
    let mut ticks = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(task_id = %task_id, "Polling cancelled");
                return Ok(PollOutcome::Cancelled);
            }
            _ = ticks.tick() => {}
        }

        let status = tokio::select! {
            _ = cancel.cancelled() => {
                // The in-flight request is dropped here; its response,
                // if any, is never observed.
                tracing::debug!(task_id = %task_id, "Polling cancelled mid-request");
                return Ok(PollOutcome::Cancelled);
            }
            result = client.status(&task_id) => result?,
        };

        // Liveness guard: a response raced with cancellation must not
        // mutate the ledger or reach the caller as a real outcome.
        if cancel.is_cancelled() {
            return Ok(PollOutcome::Cancelled);
        }

        match status.status {
            TaskState::Success => {
                let url = status
                    .output_url()
                    .map(str::to_string)
                    .unwrap_or_else(|| client.download_url(&task_id));

                // Look up by task id, not by the display name.
                match ledger.find(&task_id) {
                    Some(mut record) => {
                        record.url = Some(url.clone());
                        ledger.update(record)?;
                    }
                    None => {
                        tracing::warn!(
                            task_id = %task_id,
                            "Task succeeded but no ledger record matches its id",
                        );
                    }
                }

                tracing::info!(task_id = %task_id, url = %url, "Generation succeeded");
                return Ok(PollOutcome::Success { url });
            }
            TaskState::Failed => {
                tracing::warn!(
                    task_id = %task_id,
                    error = status.error.as_deref().unwrap_or("<no detail>"),
                    "Generation failed",
                );
                return Ok(PollOutcome::Failed {
                    error: status.error,
                });
            }
            state => {
                tracing::debug!(task_id = %task_id, state = %state, "Task still running");
            }
        }
    }
}
