use crate::{ArchiveFile, JobId, Notification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the archive to the service.
    Upload { job_id: JobId, file: ArchiveFile },
    /// Ask the service to process an uploaded archive.
    StartProcessing { job_id: JobId, zip_path: String },
    /// Create the poll loop for `job_id`, replacing any previous one.
    StartPolling { job_id: JobId },
    /// Query the status collaborator once.
    QueryStatus { job_id: JobId },
    /// Release the poll loop, if any.
    StopPolling,
    Notify(Notification),
}
