//! Integration tests for the polling controller and tracker.
//!
//! Drives [`narrate_tracker::Tracker`] against a scripted in-process
//! task client and an in-memory ledger. Tokio's paused clock makes the
//! 2-second poll interval free, so multi-cycle lifecycles run
//! instantly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use narrate_client::{ClientError, Submission, TaskClient};
use narrate_core::request::AudioGenerationRequest;
use narrate_core::types::{TaskState, TaskStatus};
use narrate_ledger::{Ledger, MemoryBackend};
use narrate_tracker::{PollError, PollOutcome, TrackError, Tracker, POLL_INTERVAL};
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Scripted client
// ---------------------------------------------------------------------------

/// One scripted reply to a status request.
enum Script {
    /// Respond with this state and optional result/error payload.
    Respond {
        state: &'static str,
        result: Option<serde_json::Value>,
        error: Option<String>,
    },
    /// Fail at the transport level.
    TransportError,
    /// Never respond (request stays in flight until dropped).
    Hang,
}

struct ScriptedClient {
    task_id: String,
    fail_submit: bool,
    responses: Mutex<VecDeque<Script>>,
    status_calls: AtomicUsize,
    /// Notified when a `Hang` request has actually started.
    request_started: Notify,
}

impl ScriptedClient {
    fn new(script: Vec<Script>) -> Self {
        Self {
            task_id: uuid::Uuid::new_v4().to_string(),
            fail_submit: false,
            responses: Mutex::new(script.into()),
            status_calls: AtomicUsize::new(0),
            request_started: Notify::new(),
        }
    }

    fn with_task_id(mut self, task_id: &str) -> Self {
        self.task_id = task_id.to_string();
        self
    }

    fn failing_submit() -> Self {
        let mut client = Self::new(vec![]);
        client.fail_submit = true;
        client
    }

    fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskClient for ScriptedClient {
    async fn submit(&self, _request: &AudioGenerationRequest) -> Result<Submission, ClientError> {
        if self.fail_submit {
            return Err(ClientError::Api {
                status: 500,
                body: "Failed to submit task to queue".to_string(),
            });
        }
        Ok(Submission {
            task_id: self.task_id.clone(),
            status_url: format!("http://fake/tasks/{}", self.task_id),
        })
    }

    async fn status(&self, task_id: &str) -> Result<TaskStatus, ClientError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("status polled more times than scripted");

        match script {
            Script::Respond {
                state,
                result,
                error,
            } => Ok(TaskStatus {
                task_id: task_id.to_string(),
                status: TaskState::from(state.to_string()),
                result,
                error,
            }),
            Script::TransportError => Err(ClientError::Api {
                status: 502,
                body: "upstream unreachable".to_string(),
            }),
            Script::Hang => {
                self.request_started.notify_one();
                std::future::pending().await
            }
        }
    }

    async fn cancel(&self, task_id: &str) -> Result<TaskStatus, ClientError> {
        Ok(TaskStatus {
            task_id: task_id.to_string(),
            status: TaskState::Pending,
            result: None,
            error: None,
        })
    }

    fn download_url(&self, task_id: &str) -> String {
        format!("http://fake/audio/{task_id}")
    }
}

fn respond(state: &'static str) -> Script {
    Script::Respond {
        state,
        result: None,
        error: None,
    }
}

fn succeed_with(url: &str) -> Script {
    Script::Respond {
        state: "SUCCESS",
        result: Some(serde_json::json!({ "output_url": url })),
        error: None,
    }
}

fn tracker_with(client: Arc<ScriptedClient>) -> Tracker {
    let ledger = Arc::new(Ledger::new(Box::new(MemoryBackend::new())));
    Tracker::new(client, ledger)
}

// ---------------------------------------------------------------------------
// Terminal-state lifecycles
// ---------------------------------------------------------------------------

/// PENDING, PENDING, SUCCESS: exactly three requests, then the ledger
/// record gains the resolved url.
#[tokio::test(start_paused = true)]
async fn stops_after_success_on_third_response() {
    let client = Arc::new(
        ScriptedClient::new(vec![
            respond("PENDING"),
            respond("PENDING"),
            succeed_with("https://x/audio.wav"),
        ])
        .with_task_id("abc123"),
    );
    let tracker = tracker_with(client.clone());

    let job = tracker
        .submit(AudioGenerationRequest::new("kokoro", "Once upon a time"))
        .await
        .unwrap();

    let outcome = job.wait().await.unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Success {
            url: "https://x/audio.wav".to_string()
        }
    );
    assert_eq!(client.status_calls(), 3);

    let record = tracker.ledger().find("abc123").unwrap();
    assert_eq!(record.url.as_deref(), Some("https://x/audio.wav"));
}

/// FAILED on the first response: one request, no ledger mutation.
#[tokio::test(start_paused = true)]
async fn failed_first_response_leaves_ledger_untouched() {
    let client = Arc::new(
        ScriptedClient::new(vec![Script::Respond {
            state: "FAILED",
            result: None,
            error: Some("ValueError: Unsupported engine".to_string()),
        }])
        .with_task_id("abc123"),
    );
    let tracker = tracker_with(client.clone());

    let job = tracker
        .submit(AudioGenerationRequest::new("bogus", "hello"))
        .await
        .unwrap();

    let outcome = job.wait().await.unwrap();
    assert_matches!(
        outcome,
        PollOutcome::Failed { error: Some(e) } if e.contains("Unsupported engine")
    );
    assert_eq!(client.status_calls(), 1);
    assert_eq!(tracker.ledger().find("abc123").unwrap().url, None);
}

/// A transport failure is terminal immediately: no retry, no mutation.
#[tokio::test(start_paused = true)]
async fn transport_error_is_terminal() {
    let client = Arc::new(ScriptedClient::new(vec![Script::TransportError]).with_task_id("abc123"));
    let tracker = tracker_with(client.clone());

    let job = tracker
        .submit(AudioGenerationRequest::new("kokoro", "hello"))
        .await
        .unwrap();

    let result = job.wait().await;
    assert_matches!(result, Err(PollError::Transport(_)));
    assert_eq!(client.status_calls(), 1);
    assert_eq!(tracker.ledger().find("abc123").unwrap().url, None);
}

/// Unrecognized status strings (e.g. Celery's STARTED/RETRY) are
/// non-terminal: polling continues.
#[tokio::test(start_paused = true)]
async fn unknown_status_keeps_polling() {
    let client = Arc::new(ScriptedClient::new(vec![
        respond("STARTED"),
        respond("RETRY"),
        succeed_with("https://x/audio.wav"),
    ]));
    let tracker = tracker_with(client.clone());

    let job = tracker
        .submit(AudioGenerationRequest::new("kokoro", "hello"))
        .await
        .unwrap();

    assert_matches!(job.wait().await.unwrap(), PollOutcome::Success { .. });
    assert_eq!(client.status_calls(), 3);
}

/// SUCCESS without an `output_url` in the payload falls back to the
/// client's derived download location.
#[tokio::test(start_paused = true)]
async fn success_without_payload_url_uses_download_fallback() {
    let client = Arc::new(
        ScriptedClient::new(vec![Script::Respond {
            state: "SUCCESS",
            result: Some(serde_json::json!({ "output_path": "/data/abc123.wav" })),
            error: None,
        }])
        .with_task_id("abc123"),
    );
    let tracker = tracker_with(client.clone());

    let job = tracker
        .submit(AudioGenerationRequest::new("kokoro", "hello"))
        .await
        .unwrap();

    let outcome = job.wait().await.unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Success {
            url: "http://fake/audio/abc123".to_string()
        }
    );
    assert_eq!(
        tracker.ledger().find("abc123").unwrap().url.as_deref(),
        Some("http://fake/audio/abc123")
    );
}

/// The first status request fires immediately, not after one interval.
#[tokio::test(start_paused = true)]
async fn first_request_fires_immediately() {
    let client = Arc::new(ScriptedClient::new(vec![succeed_with("https://x/a.wav")]));
    let tracker = tracker_with(client.clone());

    let start = tokio::time::Instant::now();
    let job = tracker
        .submit(AudioGenerationRequest::new("kokoro", "hello"))
        .await
        .unwrap();
    job.wait().await.unwrap();

    assert!(start.elapsed() < POLL_INTERVAL);
    assert_eq!(client.status_calls(), 1);
}

// ---------------------------------------------------------------------------
// Submission failures
// ---------------------------------------------------------------------------

/// A rejected submission surfaces synchronously and never creates a
/// ledger record.
#[tokio::test]
async fn failed_submission_never_enters_tracking() {
    let client = Arc::new(ScriptedClient::failing_submit());
    let tracker = tracker_with(client);

    let result = tracker
        .submit(AudioGenerationRequest::new("kokoro", "hello"))
        .await;

    assert_matches!(result, Err(TrackError::Submit(_)));
    assert!(tracker.list().is_empty());
}

/// Local validation failures never reach the remote.
#[tokio::test]
async fn invalid_request_rejected_before_submission() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let tracker = tracker_with(client);

    let result = tracker
        .submit(AudioGenerationRequest::new("kokoro", ""))
        .await;

    assert_matches!(result, Err(TrackError::Invalid(_)));
    assert!(tracker.list().is_empty());
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cancelling while a request is in flight discards its eventual
/// response: no ledger mutation, outcome is Cancelled.
#[tokio::test(start_paused = true)]
async fn cancel_during_inflight_request_discards_response() {
    let client = Arc::new(ScriptedClient::new(vec![Script::Hang]).with_task_id("abc123"));
    let tracker = tracker_with(client.clone());

    let job = tracker
        .submit(AudioGenerationRequest::new("kokoro", "hello"))
        .await
        .unwrap();

    // Wait until the poller's first request is actually in flight.
    client.request_started.notified().await;
    job.cancel();

    assert_eq!(job.wait().await.unwrap(), PollOutcome::Cancelled);
    assert_eq!(client.status_calls(), 1);
    assert_eq!(tracker.ledger().find("abc123").unwrap().url, None);
}

/// Cancellation is idempotent.
#[tokio::test(start_paused = true)]
async fn cancel_is_idempotent() {
    let client = Arc::new(ScriptedClient::new(vec![Script::Hang]));
    let tracker = tracker_with(client.clone());

    let job = tracker
        .submit(AudioGenerationRequest::new("kokoro", "hello"))
        .await
        .unwrap();

    job.cancel();
    job.cancel();

    assert_eq!(job.wait().await.unwrap(), PollOutcome::Cancelled);
}

/// Tracker shutdown stops every in-flight poller.
#[tokio::test(start_paused = true)]
async fn shutdown_cancels_all_pollers() {
    let client = Arc::new(ScriptedClient::new(vec![Script::Hang]));
    let tracker = tracker_with(client.clone());

    let job = tracker
        .submit(AudioGenerationRequest::new("kokoro", "hello"))
        .await
        .unwrap();

    client.request_started.notified().await;
    tracker.shutdown();

    assert_eq!(job.wait().await.unwrap(), PollOutcome::Cancelled);
}

// ---------------------------------------------------------------------------
// End-to-end scenario from the ledger's point of view
// ---------------------------------------------------------------------------

/// Submit → pending record; PROCESSING leaves it untouched; SUCCESS
/// merges the url.
#[tokio::test(start_paused = true)]
async fn submit_then_success_scenario() {
    let client = Arc::new(
        ScriptedClient::new(vec![
            respond("PROCESSING"),
            succeed_with("https://x/audio.wav"),
        ])
        .with_task_id("abc123"),
    );
    let tracker = tracker_with(client.clone());

    let job = tracker
        .submit(AudioGenerationRequest::new(
            "kokoro",
            "Welcome to the narrate project",
        ))
        .await
        .unwrap();

    // Record exists immediately after submission, url unset.
    let records = tracker.list();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "abc123");
    assert_eq!(records[0].name, "Welcome to the narra...");
    assert_eq!(records[0].url, None);

    job.wait().await.unwrap();

    let records = tracker.list();
    assert_eq!(records[0].url.as_deref(), Some("https://x/audio.wav"));
    assert_eq!(client.status_calls(), 2);
}
