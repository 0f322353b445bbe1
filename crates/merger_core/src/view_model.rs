use crate::{CompletionSummary, LifecycleState, UiStep};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobViewModel {
    pub lifecycle: LifecycleState,
    pub percent: u8,
    pub message: String,
    pub ui_step: UiStep,
    pub file: Option<FileInfo>,
    pub result: Option<CompletionSummary>,
    pub last_error: Option<String>,
    pub can_cancel: bool,
    pub can_reset: bool,
    pub docx_available: bool,
    pub pdf_available: bool,
    pub dirty: bool,
}

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Human readable size, base 1024, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{rendered} {}", SIZE_UNITS[unit])
}
