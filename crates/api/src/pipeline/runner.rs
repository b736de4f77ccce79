//! The analysis job pipeline.
//!
//! One job runs the two engines in sequence against a private scratch
//! context, forwarding progress over the event channel, and always tears
//! the scratch state down before reporting a terminal event.

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use varia_core::analysis::{AnalysisConfig, FileMetadata, JobConfig};
use varia_core::events::{DonePayload, JobEvent};
use varia_engine::job::UploadedFile;
use varia_engine::{poller, run, EngineCommand, EngineError, JobContext};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::pipeline::resolve::resolve_artifacts;
use crate::state::AppState;

/// Everything one analysis job needs from the request.
#[derive(Debug)]
pub struct JobInput {
    pub files: Vec<UploadedFile>,
    pub metadata: Vec<FileMetadata>,
    pub settings: AnalysisConfig,
}

/// Drive a job to completion and deliver its terminal event.
///
/// Spawned per streaming request. An abort (client disconnect) produces no
/// terminal event; every other failure is reported as an `error` event.
pub async fn run_job(state: AppState, input: JobInput, events: mpsc::Sender<JobEvent>) {
    match execute(&state, input, &events).await {
        Ok(payload) => {
            if events.send(JobEvent::Done { data: payload }).await.is_err() {
                debug!("client went away before the done event");
            }
        }
        Err(AppError::Engine(EngineError::Aborted { engine })) => {
            warn!(engine, "job aborted: client disconnected");
        }
        Err(err) => {
            error!(error = %err, "analysis job failed");
            let event = JobEvent::Error {
                error: err.to_string(),
            };
            if events.send(event).await.is_err() {
                debug!("client went away before the error event");
            }
        }
    }
}

/// Run the pipeline stages with scratch cleanup on every exit path.
///
/// The synchronous endpoint calls this directly and turns the returned
/// error into an HTTP response instead of an event.
pub async fn execute(
    state: &AppState,
    input: JobInput,
    events: &mpsc::Sender<JobEvent>,
) -> Result<DonePayload, AppError> {
    let mut job = JobContext::new(&state.config.scratch_dir);
    info!(job_id = %job.id(), files = input.files.len(), "starting analysis job");

    let outcome = run_stages(state, &mut job, input, events).await;
    // Cleanup runs whether the stages finished, failed, or aborted.
    job.cleanup().await;
    if outcome.is_ok() {
        info!(job_id = %job.id(), "analysis job finished");
    }
    outcome
}

async fn run_stages(
    state: &AppState,
    job: &mut JobContext,
    input: JobInput,
    events: &mpsc::Sender<JobEvent>,
) -> Result<DonePayload, AppError> {
    let config = &state.config;

    send(events, JobEvent::progress(2, "Preparing input files")).await?;
    let entries = job.stage_files(&input.files, &input.metadata).await?;
    let input_path = job
        .staged_paths()
        .first()
        .cloned()
        .ok_or_else(|| AppError::InternalError("staging produced no input path".to_string()))?;

    let use_ai = input.settings.use_ai;
    let config_path = job
        .write_config(&JobConfig {
            settings: input.settings,
            files: entries,
            debug: true,
        })
        .await?;

    send(events, JobEvent::progress(5, "Running statistical analysis")).await?;
    let mut metrics = engine_command(config, "metrics", &config.metrics_script)
        .arg(input_path.to_string_lossy())
        .arg(config_path.to_string_lossy());
    if use_ai {
        if let Some(key) = &config.genai_api_key {
            metrics = metrics.env("GEMINI_API_KEY", key);
        } else {
            warn!("AI insights requested but no generative API key is configured");
        }
    }
    run::run_streaming(&metrics, events).await?;

    let mut results = poller::poll_results(&job.results_path(), &config.poll_config()).await?;
    results.warn_if_empty();
    results.use_ai = Some(use_ai);

    send(events, JobEvent::progress(80, "Rendering report")).await?;
    let report = engine_command(config, "report", &config.report_script)
        .arg(job.results_path().to_string_lossy());
    run::run_streaming(&report, events).await?;

    send(events, JobEvent::progress(90, "Packaging artifacts")).await?;
    let payload = resolve_artifacts(job, results).await;

    send(events, JobEvent::progress(100, "Analysis complete")).await?;
    Ok(payload)
}

/// Interpreter plus script plus wall-clock budget, ready for job-specific
/// arguments.
fn engine_command(config: &ServerConfig, engine: &'static str, script: &Path) -> EngineCommand {
    EngineCommand::new(engine, varia_engine::resolve_interpreter(config.python_bin.as_deref()))
        .arg(script.to_string_lossy())
        .timeout(config.engine_timeout())
}

/// Forward an orchestrator-side progress event. A closed channel means the
/// client is gone, which ends the job the same way an engine abort does.
async fn send(events: &mpsc::Sender<JobEvent>, event: JobEvent) -> Result<(), AppError> {
    events
        .send(event)
        .await
        .map_err(|_| EngineError::Aborted { engine: "pipeline" }.into())
}
