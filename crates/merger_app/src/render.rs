//! Terminal rendering of controller notifications.

use chrono::Local;
use merger_core::{format_file_size, CompletionSummary, FileInfo, Notification, UiStep};

const BAR_WIDTH: usize = 30;

pub fn render(notification: &Notification) -> String {
    let body = match notification {
        Notification::Progress(snapshot) => format!(
            "{} {} {}",
            step_label(snapshot.ui_step),
            progress_bar(snapshot.percent),
            snapshot.message
        ),
        Notification::Completed(summary) => render_completion(summary),
        Notification::Error { message } => format!("Error: {message}"),
        Notification::Warning(warning) => format!("Warning: {}", warning.message()),
        Notification::Reset => "Ready for a new job.".to_string(),
    };
    format!("[{}] {}", Local::now().format("%H:%M:%S"), body)
}

pub fn render_file(file: &FileInfo) -> String {
    format!("{} ({})", file.name, format_file_size(file.size_bytes))
}

fn step_label(step: UiStep) -> &'static str {
    match step {
        UiStep::Upload => "upload  ",
        UiStep::Process => "process ",
        UiStep::Complete => "complete",
        UiStep::Error => "error   ",
    }
}

pub fn progress_bar(percent: u8) -> String {
    let percent = percent.min(100) as usize;
    let filled = percent * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        percent
    )
}

fn render_completion(summary: &CompletionSummary) -> String {
    let mut lines = vec![
        "Files processed successfully!".to_string(),
        format!("  processed: {}", summary.processed_files),
        format!("  failed:    {}", summary.failed_files),
    ];
    if summary.failed_files > 0 {
        lines.push("  Some files could not be processed and were left out of the merge:".to_string());
        lines.extend(
            summary
                .failed_file_names
                .iter()
                .map(|name| format!("    - {name}")),
        );
    }
    if summary.docx_available {
        lines.push("  'docx' downloads the merged document".to_string());
    }
    if summary.pdf_available {
        lines.push("  'pdf' downloads the PDF version".to_string());
    } else {
        lines.push("  PDF conversion was not available".to_string());
    }
    lines.push("  'reset' starts over".to_string());
    lines.join("\n")
}
