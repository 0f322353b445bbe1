use std::path::PathBuf;

use crate::view_model::{FileInfo, JobViewModel};
use crate::{CompletionSummary, ProgressSnapshot, UiStep};

pub type JobId = u64;

pub const ARCHIVE_EXTENSION: &str = ".zip";
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Phase of the single job slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Uploading,
    Processing,
    Complete,
    Error,
}

impl LifecycleState {
    /// A job occupies the slot.
    pub fn is_active(self) -> bool {
        matches!(self, LifecycleState::Uploading | LifecycleState::Processing)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Complete | LifecycleState::Error)
    }
}

/// Remote handle returned by the upload: where the archive landed and how
/// many files it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub zip_path: String,
    pub file_count: u32,
}

/// Candidate file for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub name: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl ArchiveFile {
    pub fn new(
        name: impl Into<String>,
        content_type: Option<String>,
        size_bytes: u64,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type,
            size_bytes,
            path: path.into(),
        }
    }

    /// Accepts either a `.zip` name (any case) or a ZIP content type.
    pub fn is_zip_archive(&self) -> bool {
        let by_type = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.trim().eq_ignore_ascii_case(ARCHIVE_CONTENT_TYPE));
        by_type || self.name.to_ascii_lowercase().ends_with(ARCHIVE_EXTENSION)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobState {
    lifecycle: LifecycleState,
    last_job_id: JobId,
    current_job: Option<JobId>,
    active_file: Option<FileInfo>,
    active_handle: Option<JobHandle>,
    poll_active: bool,
    poll_in_flight: bool,
    progress: Option<ProgressSnapshot>,
    result: Option<CompletionSummary>,
    last_error: Option<String>,
    dirty: bool,
}

impl JobState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    pub fn current_job(&self) -> Option<JobId> {
        self.current_job
    }

    pub fn active_handle(&self) -> Option<&JobHandle> {
        self.active_handle.as_ref()
    }

    pub fn is_polling(&self) -> bool {
        self.poll_active
    }

    pub fn is_poll_in_flight(&self) -> bool {
        self.poll_in_flight
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn view(&self) -> JobViewModel {
        let progress = self.progress.clone().unwrap_or_else(|| ProgressSnapshot {
            percent: 0,
            message: String::new(),
            ui_step: UiStep::Upload,
        });
        let (docx_available, pdf_available) = match &self.result {
            Some(summary) => (summary.docx_available, summary.pdf_available),
            None => (false, false),
        };
        JobViewModel {
            lifecycle: self.lifecycle,
            percent: progress.percent,
            message: progress.message,
            ui_step: progress.ui_step,
            file: self.active_file.clone(),
            result: self.result.clone(),
            last_error: self.last_error.clone(),
            can_cancel: self.lifecycle.is_active(),
            can_reset: self.lifecycle.is_terminal(),
            docx_available,
            pdf_available,
            dirty: self.dirty,
        }
    }

    /// Whether a result for `job_id` still belongs to the job in the slot.
    pub(crate) fn is_current(&self, job_id: JobId) -> bool {
        self.current_job == Some(job_id)
    }

    pub(crate) fn begin_upload(&mut self, file: &ArchiveFile) -> JobId {
        self.last_job_id += 1;
        let job_id = self.last_job_id;
        self.lifecycle = LifecycleState::Uploading;
        self.current_job = Some(job_id);
        self.active_file = Some(FileInfo {
            name: file.name.clone(),
            size_bytes: file.size_bytes,
        });
        self.active_handle = None;
        self.poll_active = false;
        self.poll_in_flight = false;
        self.progress = None;
        self.result = None;
        self.last_error = None;
        self.dirty = true;
        job_id
    }

    pub(crate) fn begin_processing(&mut self, handle: JobHandle) {
        self.lifecycle = LifecycleState::Processing;
        self.active_handle = Some(handle);
        self.dirty = true;
    }

    pub(crate) fn expected_file_count(&self) -> u32 {
        self.active_handle.as_ref().map_or(0, |handle| handle.file_count)
    }

    pub(crate) fn start_polling(&mut self) {
        self.poll_active = true;
        self.poll_in_flight = false;
    }

    pub(crate) fn set_poll_in_flight(&mut self, in_flight: bool) {
        self.poll_in_flight = in_flight;
    }

    pub(crate) fn set_progress(&mut self, snapshot: ProgressSnapshot) {
        self.progress = Some(snapshot);
        self.dirty = true;
    }

    pub(crate) fn complete(&mut self, summary: CompletionSummary) {
        self.lifecycle = LifecycleState::Complete;
        self.stop_polling();
        self.result = Some(summary);
        self.dirty = true;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.lifecycle = LifecycleState::Error;
        self.stop_polling();
        self.progress = Some(ProgressSnapshot::new(0, String::new(), UiStep::Error));
        self.last_error = Some(message);
        self.dirty = true;
    }

    /// Back to `Idle`; the job id is retired so late results are dropped.
    pub(crate) fn clear(&mut self) {
        self.lifecycle = LifecycleState::Idle;
        self.current_job = None;
        self.active_file = None;
        self.active_handle = None;
        self.stop_polling();
        self.progress = None;
        self.result = None;
        self.last_error = None;
        self.dirty = true;
    }

    fn stop_polling(&mut self) {
        self.poll_active = false;
        self.poll_in_flight = false;
    }
}
