//! Status interpreter: maps a polled [`RemoteStatus`] onto a [`ProgressSnapshot`].

use crate::{Phase, ProgressSnapshot, RemoteStatus, UiStep};

pub const EXTRACTING_PERCENT: u8 = 30;
pub const CONVERTING_DEFAULT_PERCENT: u8 = 35;
pub const PROCESSING_DEFAULT_PERCENT: u8 = 50;
pub const MERGING_COMPLETE_PERCENT: u8 = 80;
pub const CONVERTING_TO_PDF_PERCENT: u8 = 85;
pub const PDF_CONVERSION_COMPLETE_PERCENT: u8 = 95;

/// Share of the bar covered by the merge step, and where it starts.
const MERGE_SPAN: f64 = 40.0;
const MERGE_OFFSET: f64 = 40.0;

pub const REMOTE_ERROR_FALLBACK: &str = "An unknown error occurred";

/// Interprets one status payload.
///
/// `expected_file_count` is the count declared at upload time; it stands in
/// for the payload's own totals when those are missing. Returns `None` for
/// phases this client does not recognize.
pub fn interpret(status: &RemoteStatus, expected_file_count: u32) -> Option<ProgressSnapshot> {
    let snapshot = match &status.phase {
        Phase::Starting | Phase::Extracting => ProgressSnapshot::new(
            EXTRACTING_PERCENT,
            "Extracting files from the ZIP archive...",
            UiStep::Process,
        ),
        Phase::Converting => {
            let percent = status
                .progress_percent
                .map(clamp_percent)
                .unwrap_or(CONVERTING_DEFAULT_PERCENT);
            let counter = counter_clause(status.converted, status.total_files, expected_file_count);
            ProgressSnapshot::new(
                percent,
                format!("Converting files{counter}..."),
                UiStep::Process,
            )
        }
        Phase::Processing => {
            let percent = match (status.progress_percent, status.processed, status.total) {
                (Some(reported), _, _) => clamp_percent(reported),
                (None, Some(processed), Some(total)) if total > 0 => clamp_percent(
                    (f64::from(processed) / f64::from(total) * MERGE_SPAN).round() + MERGE_OFFSET,
                ),
                _ => PROCESSING_DEFAULT_PERCENT,
            };
            let counter = counter_clause(status.processed, status.total, expected_file_count);
            ProgressSnapshot::new(
                percent,
                format!("Merging documents{counter}..."),
                UiStep::Process,
            )
        }
        Phase::MergingComplete => ProgressSnapshot::new(
            MERGING_COMPLETE_PERCENT,
            "Merge finished. Converting to PDF...",
            UiStep::Process,
        ),
        Phase::ConvertingToPdf => ProgressSnapshot::new(
            CONVERTING_TO_PDF_PERCENT,
            "Converting the merged document to PDF...",
            UiStep::Process,
        ),
        Phase::PdfConversionComplete => ProgressSnapshot::new(
            PDF_CONVERSION_COMPLETE_PERCENT,
            "PDF conversion finished. Finalizing...",
            UiStep::Process,
        ),
        Phase::Complete => ProgressSnapshot::new(100, "Processing complete!", UiStep::Complete),
        Phase::Error => ProgressSnapshot::new(
            0,
            status.error.as_deref().unwrap_or(REMOTE_ERROR_FALLBACK),
            UiStep::Error,
        ),
        Phase::Unrecognized(_) => return None,
    };
    Some(snapshot)
}

fn clamp_percent(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

/// Renders ` (done/total)`, or nothing when no total is known. A zero total
/// counts as unknown.
fn counter_clause(done: Option<u32>, total: Option<u32>, expected: u32) -> String {
    let total = total
        .filter(|total| *total > 0)
        .or((expected > 0).then_some(expected));
    match total {
        Some(total) => format!(" ({}/{})", done.unwrap_or(0), total),
        None => String::new(),
    }
}
