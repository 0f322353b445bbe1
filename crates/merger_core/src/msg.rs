use crate::{ArchiveFile, JobHandle, JobId, RemoteStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User picked a file to process.
    SubmitRequested(ArchiveFile),
    /// User confirmed cancellation of the running job.
    CancelRequested,
    /// User asked to start over.
    ResetRequested,
    /// Upload collaborator finished.
    UploadFinished {
        job_id: JobId,
        result: Result<JobHandle, String>,
    },
    /// Processing-request collaborator finished.
    ProcessingRequested {
        job_id: JobId,
        result: Result<(), String>,
    },
    /// Poll timer fired.
    PollTick { job_id: JobId },
    /// Status query finished.
    PollFinished { job_id: JobId, outcome: PollOutcome },
}

/// What a single status query produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The service has no status yet; keep waiting.
    NotYetAvailable,
    Status(RemoteStatus),
    /// The service answered with a definite failure.
    Rejected(String),
    /// Network or decoding trouble; the next tick tries again.
    Fault(String),
}
