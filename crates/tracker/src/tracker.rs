//! Submission orchestration and per-job handles.

use std::sync::Arc;

use narrate_client::{ClientError, TaskClient};
use narrate_core::request::AudioGenerationRequest;
use narrate_core::types::{GenerationRecord, TaskStatus};
use narrate_ledger::{Ledger, LedgerError};
use tokio_util::sync::CancellationToken;

use crate::poller::{poll_task, PollError, PollOutcome};
use crate::TrackError;

/// Owns the shared task client and ledger, and spawns one polling
/// controller per submitted job.
///
/// Cloning is cheap via `Arc`; a master [`CancellationToken`] lets
/// [`shutdown`](Tracker::shutdown) stop every in-flight poller at once.
pub struct Tracker {
    client: Arc<dyn TaskClient>,
    ledger: Arc<Ledger>,
    /// Master cancellation token -- parent of every job's token.
    cancel: CancellationToken,
}

/// Handle to one tracked job.
///
/// Dropping the handle does not stop the poller; call
/// [`cancel`](TrackedJob::cancel) to stop it or
/// [`wait`](TrackedJob::wait) to await its outcome.
#[derive(Debug)]
pub struct TrackedJob {
    task_id: String,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<Result<PollOutcome, PollError>>,
}

impl Tracker {
    pub fn new(client: Arc<dyn TaskClient>, ledger: Arc<Ledger>) -> Self {
        Self {
            client,
            ledger,
            cancel: CancellationToken::new(),
        }
    }

    /// The shared ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Submit a generation job and start tracking it.
    ///
    /// Validates the request, submits it to the remote, records a
    /// pending ledger entry (newest-first), and spawns the polling
    /// controller. Failures here surface synchronously and leave the
    /// ledger untouched.
    pub async fn submit(
        &self,
        request: AudioGenerationRequest,
    ) -> Result<TrackedJob, TrackError> {
        request.check()?;

        let submission = self.client.submit(&request).await?;

        let record = GenerationRecord::new(
            submission.task_id.clone(),
            &request.text,
            chrono::Utc::now(),
        );
        self.ledger.add(record)?;

        tracing::info!(
            task_id = %submission.task_id,
            engine = %request.engine,
            "Tracking generation job",
        );

        Ok(self.track(submission.task_id))
    }

    /// Start a polling controller for an already-submitted task.
    ///
    /// Used by [`submit`](Self::submit) and by callers resuming
    /// tracking of a job whose id they already hold.
    pub fn track(&self, task_id: String) -> TrackedJob {
        let cancel = self.cancel.child_token();
        let handle = tokio::spawn(poll_task(
            self.client.clone(),
            self.ledger.clone(),
            task_id.clone(),
            cancel.clone(),
        ));

        TrackedJob {
            task_id,
            cancel,
            handle,
        }
    }

    /// Forward a best-effort cancellation to the remote engine.
    ///
    /// This only asks the remote to stop the job; stopping the local
    /// poller is [`TrackedJob::cancel`]'s business.
    pub async fn cancel_remote(&self, task_id: &str) -> Result<TaskStatus, ClientError> {
        self.client.cancel(task_id).await
    }

    /// All ledger records, newest-first.
    pub fn list(&self) -> Vec<GenerationRecord> {
        self.ledger.list()
    }

    /// Delete one record from the ledger. Subsequent `list` calls see
    /// the removal immediately.
    pub fn delete(&self, id: &str) -> Result<(), LedgerError> {
        self.ledger.remove(id)
    }

    /// Empty the ledger.
    pub fn clear(&self) -> Result<(), LedgerError> {
        self.ledger.clear()
    }

    /// Cancel every in-flight poller spawned by this tracker.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl TrackedJob {
    /// Server-assigned id of the tracked task.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Request the poller to stop. Idempotent, and a no-op once the
    /// poller has already reached a terminal state.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Await the poller's outcome.
    pub async fn wait(self) -> Result<PollOutcome, PollError> {
        match self.handle.await {
            Ok(outcome) => outcome,
            // The poller is only ever stopped via its token, so a join
            // error means the task was aborted wholesale (e.g. runtime
            // shutdown). Report it as a cancellation.
            Err(e) if e.is_cancelled() => Ok(PollOutcome::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}
