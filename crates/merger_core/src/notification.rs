/// Which step indicator the presentation layer should highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiStep {
    #[default]
    Upload,
    Process,
    Complete,
    Error,
}

/// Output of the status interpreter: where the job stands right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Always within `0..=100`.
    pub percent: u8,
    pub message: String,
    pub ui_step: UiStep,
}

impl ProgressSnapshot {
    pub fn new(percent: u8, message: impl Into<String>, ui_step: UiStep) -> Self {
        Self {
            percent: percent.min(100),
            message: message.into(),
            ui_step,
        }
    }
}

/// Result summary reported once the service finishes a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSummary {
    pub processed_files: u32,
    pub failed_files: u32,
    pub failed_file_names: Vec<String>,
    /// The merged document is always produced by a completed job.
    pub docx_available: bool,
    pub pdf_available: bool,
}

/// Locally recovered rejections of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The file is not a ZIP archive.
    InvalidInput { file_name: String },
    /// Another job already occupies the controller.
    Busy,
}

impl Warning {
    pub fn message(&self) -> String {
        match self {
            Warning::InvalidInput { file_name } => {
                format!("Please upload a ZIP file ({file_name} is not one).")
            }
            Warning::Busy => "A file is already being processed. Please wait.".to_string(),
        }
    }
}

/// Events the controller emits for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Progress(ProgressSnapshot),
    Completed(CompletionSummary),
    Error { message: String },
    Warning(Warning),
    /// Also announces the idle/ready state.
    Reset,
}
