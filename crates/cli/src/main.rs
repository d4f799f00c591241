//! `narrate` - submit and track audio-generation jobs from the
//! terminal.
//!
//! Thin caller over the tracking core: every subcommand maps onto one
//! public operation (submit, list, status, cancel, delete, clear).

use std::env;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use narrate_client::{ClientConfig, TaskClient, TtsApi};
use narrate_core::request::AudioGenerationRequest;
use narrate_ledger::{FileBackend, Ledger};
use narrate_tracker::{PollOutcome, Tracker};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default ledger location when `NARRATE_LEDGER_PATH` is unset.
const DEFAULT_LEDGER_PATH: &str = "generations.json";

#[derive(Parser, Debug)]
#[command(name = "narrate")]
#[command(about = "Submit and track audio-generation jobs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a generation job and track it to completion.
    Generate {
        /// Narration text to synthesize.
        #[arg(short, long)]
        text: String,

        /// Engine identifier (e.g. kokoro, chatterbox).
        #[arg(short, long, default_value = "kokoro")]
        engine: String,

        /// Engine-specific options as a JSON object.
        #[arg(long)]
        options: Option<String>,

        /// Desired output format.
        #[arg(long)]
        format: Option<String>,
    },

    /// List all recorded generations, newest first.
    List,

    /// Query the remote status of one task.
    Status {
        /// Server-assigned task id.
        task_id: String,
    },

    /// Ask the remote to stop a task (best-effort).
    Cancel {
        /// Server-assigned task id.
        task_id: String,

        /// Send a termination signal to a running task instead of just
        /// revoking it from the queue.
        #[arg(long)]
        terminate: bool,
    },

    /// Delete one generation record from the local ledger.
    Delete {
        /// Record id (same as the task id).
        id: String,
    },

    /// Delete every generation record.
    Clear,

    /// Probe the remote service's health endpoint.
    Health,
}

fn ledger_path() -> String {
    env::var("NARRATE_LEDGER_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LEDGER_PATH.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "narrate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();
    let ledger_path = ledger_path();
    tracing::debug!(api_url = %config.api_url, ledger = %ledger_path, "narrate configured");

    let api = Arc::new(TtsApi::new(config.api_url.clone()));
    let ledger = Arc::new(Ledger::new(Box::new(FileBackend::new(ledger_path))));

    match cli.command {
        Command::Generate {
            text,
            engine,
            options,
            format,
        } => {
            let mut request = AudioGenerationRequest::new(engine, text);
            if let Some(options) = options {
                request.engine_options = Some(
                    serde_json::from_str(&options).context("--options must be a JSON object")?,
                );
            }
            request.output_format = format;

            let tracker = Tracker::new(api, ledger);
            let job = tracker.submit(request).await?;
            println!("Submitted task {}", job.task_id());

            match job.wait().await? {
                PollOutcome::Success { url } => println!("Done: {url}"),
                PollOutcome::Failed { error } => anyhow::bail!(
                    "Generation failed: {}",
                    error.unwrap_or_else(|| "<no detail>".to_string())
                ),
                PollOutcome::Cancelled => println!("Tracking cancelled"),
            }
        }

        Command::List => {
            let records = ledger.list();
            if records.is_empty() {
                println!("No generations recorded.");
            }
            for record in records {
                println!(
                    "{}  {}  {}  {}",
                    record.id,
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    record.name,
                    record.url.as_deref().unwrap_or("-"),
                );
            }
        }

        Command::Status { task_id } => {
            let status = api.status(&task_id).await?;
            println!("{}: {}", status.task_id, status.status);
            if let Some(url) = status.output_url() {
                println!("Output: {url}");
            }
            if let Some(error) = status.error {
                println!("Error: {error}");
            }
        }

        Command::Cancel { task_id, terminate } => {
            let status = if terminate {
                api.terminate(&task_id).await?
            } else {
                api.cancel(&task_id).await?
            };
            println!("{}: {}", status.task_id, status.status);
        }

        Command::Delete { id } => {
            ledger.remove(&id)?;
            println!("Deleted {id}");
        }

        Command::Clear => {
            ledger.clear()?;
            println!("Ledger cleared.");
        }

        Command::Health => {
            api.health().await?;
            println!("Service at {} is healthy.", config.api_url);
        }
    }

    Ok(())
}
