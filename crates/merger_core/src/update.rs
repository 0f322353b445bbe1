use engine_logging::{engine_debug, engine_info, engine_trace, engine_warn};

use crate::interpret::{interpret, REMOTE_ERROR_FALLBACK};
use crate::{
    ArchiveFile, CompletionSummary, Effect, JobHandle, JobId, JobState, LifecycleState, Msg,
    Notification, Phase, PollOutcome, ProgressSnapshot, RemoteStatus, UiStep, Warning,
};

pub const UPLOAD_STARTED_PERCENT: u8 = 5;
pub const UPLOAD_COMPLETE_PERCENT: u8 = 30;

pub const UPLOAD_FALLBACK: &str = "Upload failed";
pub const PROCESSING_FALLBACK: &str = "Processing request failed";
pub const STATUS_FALLBACK: &str = "Status check failed";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: JobState, msg: Msg) -> (JobState, Vec<Effect>) {
    let effects = match msg {
        Msg::SubmitRequested(file) => submit(&mut state, file),
        Msg::CancelRequested => {
            if state.lifecycle().is_active() {
                engine_info!("Cancelling job {:?}", state.current_job());
                release(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::ResetRequested => match state.lifecycle() {
            // Nothing to clear; the ready notice is still repeated.
            LifecycleState::Idle => vec![Effect::Notify(Notification::Reset)],
            LifecycleState::Uploading | LifecycleState::Processing => {
                engine_debug!("Ignoring reset: job {:?} is running", state.current_job());
                Vec::new()
            }
            LifecycleState::Complete | LifecycleState::Error => release(&mut state),
        },
        Msg::UploadFinished { job_id, result } => {
            if !expects(&state, job_id, LifecycleState::Uploading) {
                engine_debug!("Dropping stale upload result for job {}", job_id);
                return (state, Vec::new());
            }
            match result {
                Ok(handle) => upload_succeeded(&mut state, job_id, handle),
                Err(message) => fail(&mut state, message, UPLOAD_FALLBACK),
            }
        }
        Msg::ProcessingRequested { job_id, result } => {
            if !expects(&state, job_id, LifecycleState::Processing) || state.is_polling() {
                engine_debug!("Dropping stale processing result for job {}", job_id);
                return (state, Vec::new());
            }
            match result {
                Ok(()) => {
                    state.start_polling();
                    vec![Effect::StartPolling { job_id }]
                }
                Err(message) => fail(&mut state, message, PROCESSING_FALLBACK),
            }
        }
        Msg::PollTick { job_id } => {
            if !expects(&state, job_id, LifecycleState::Processing) || !state.is_polling() {
                return (state, Vec::new());
            }
            if state.is_poll_in_flight() {
                engine_trace!("Skipping tick for job {}: query still outstanding", job_id);
                return (state, Vec::new());
            }
            state.set_poll_in_flight(true);
            vec![Effect::QueryStatus { job_id }]
        }
        Msg::PollFinished { job_id, outcome } => {
            if !expects(&state, job_id, LifecycleState::Processing) || !state.is_polling() {
                engine_debug!("Dropping stale status for job {}", job_id);
                return (state, Vec::new());
            }
            state.set_poll_in_flight(false);
            poll_finished(&mut state, outcome)
        }
    };

    (state, effects)
}

fn expects(state: &JobState, job_id: JobId, lifecycle: LifecycleState) -> bool {
    state.is_current(job_id) && state.lifecycle() == lifecycle
}

fn submit(state: &mut JobState, file: ArchiveFile) -> Vec<Effect> {
    if !file.is_zip_archive() {
        engine_info!("Rejected non-archive file {:?}", file.name);
        return vec![Effect::Notify(Notification::Warning(
            Warning::InvalidInput {
                file_name: file.name,
            },
        ))];
    }
    if state.lifecycle().is_active() {
        engine_info!("Rejected {:?}: job {:?} still running", file.name, state.current_job());
        return vec![Effect::Notify(Notification::Warning(Warning::Busy))];
    }

    let job_id = state.begin_upload(&file);
    engine_info!("Job {} uploading {:?} ({} bytes)", job_id, file.name, file.size_bytes);
    let snapshot = ProgressSnapshot::new(UPLOAD_STARTED_PERCENT, "Uploading file...", UiStep::Upload);
    state.set_progress(snapshot.clone());
    vec![
        Effect::Notify(Notification::Progress(snapshot)),
        Effect::Upload { job_id, file },
    ]
}

fn upload_succeeded(state: &mut JobState, job_id: JobId, handle: JobHandle) -> Vec<Effect> {
    engine_info!(
        "Job {} uploaded to {} ({} files declared)",
        job_id,
        handle.zip_path,
        handle.file_count
    );
    let zip_path = handle.zip_path.clone();
    state.begin_processing(handle);
    let snapshot = ProgressSnapshot::new(
        UPLOAD_COMPLETE_PERCENT,
        "Upload complete. Starting processing...",
        UiStep::Process,
    );
    state.set_progress(snapshot.clone());
    vec![
        Effect::Notify(Notification::Progress(snapshot)),
        Effect::StartProcessing { job_id, zip_path },
    ]
}

fn poll_finished(state: &mut JobState, outcome: PollOutcome) -> Vec<Effect> {
    match outcome {
        PollOutcome::NotYetAvailable => Vec::new(),
        PollOutcome::Fault(message) => {
            engine_warn!("Status check failed, will retry: {}", message);
            Vec::new()
        }
        PollOutcome::Rejected(message) => fail(state, message, STATUS_FALLBACK),
        PollOutcome::Status(status) => match status.phase {
            Phase::Complete => complete(state, status),
            Phase::Error => fail(
                state,
                status.error.unwrap_or_default(),
                REMOTE_ERROR_FALLBACK,
            ),
            _ => match interpret(&status, state.expected_file_count()) {
                Some(snapshot) => {
                    state.set_progress(snapshot.clone());
                    vec![Effect::Notify(Notification::Progress(snapshot))]
                }
                None => {
                    engine_info!("Unknown status phase: {}", status.phase.as_str());
                    Vec::new()
                }
            },
        },
    }
}

fn complete(state: &mut JobState, status: RemoteStatus) -> Vec<Effect> {
    let snapshot = interpret(&status, state.expected_file_count())
        .unwrap_or_else(|| ProgressSnapshot::new(100, "Processing complete!", UiStep::Complete));
    let summary = CompletionSummary {
        processed_files: status.processed_files.unwrap_or(0),
        failed_files: status.failed_files.unwrap_or(0),
        failed_file_names: status.failed_file_names.unwrap_or_default(),
        docx_available: true,
        pdf_available: status.pdf_conversion_success.unwrap_or(false),
    };
    engine_info!(
        "Job {:?} complete: {} processed, {} failed",
        state.current_job(),
        summary.processed_files,
        summary.failed_files
    );
    state.set_progress(snapshot.clone());
    state.complete(summary.clone());
    vec![
        Effect::StopPolling,
        Effect::Notify(Notification::Progress(snapshot)),
        Effect::Notify(Notification::Completed(summary)),
    ]
}

fn fail(state: &mut JobState, message: String, fallback: &str) -> Vec<Effect> {
    let message = if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    };
    engine_warn!("Job {:?} failed: {}", state.current_job(), message);
    state.fail(message.clone());
    vec![Effect::StopPolling, Effect::Notify(Notification::Error { message })]
}

fn release(state: &mut JobState) -> Vec<Effect> {
    state.clear();
    vec![Effect::StopPolling, Effect::Notify(Notification::Reset)]
}
