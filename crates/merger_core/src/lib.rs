//! Merger core: pure job lifecycle state machine and status interpretation.
mod effect;
pub mod interpret;
mod msg;
mod notification;
mod state;
mod status;
mod update;
mod view_model;

pub use effect::Effect;
pub use interpret::interpret;
pub use msg::{Msg, PollOutcome};
pub use notification::{CompletionSummary, Notification, ProgressSnapshot, UiStep, Warning};
pub use state::{
    ArchiveFile, JobHandle, JobId, JobState, LifecycleState, ARCHIVE_CONTENT_TYPE,
    ARCHIVE_EXTENSION,
};
pub use status::{Phase, RemoteStatus};
pub use update::{
    update, PROCESSING_FALLBACK, STATUS_FALLBACK, UPLOAD_COMPLETE_PERCENT, UPLOAD_FALLBACK,
    UPLOAD_STARTED_PERCENT,
};
pub use view_model::{format_file_size, FileInfo, JobViewModel};
