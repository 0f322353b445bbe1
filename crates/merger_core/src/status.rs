use serde::Deserialize;

/// Sub-stage reported by the processing service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Phase {
    Starting,
    Extracting,
    Converting,
    Processing,
    MergingComplete,
    ConvertingToPdf,
    PdfConversionComplete,
    Complete,
    Error,
    /// Any phase name this client does not know about.
    Unrecognized(String),
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Starting => "starting",
            Phase::Extracting => "extracting",
            Phase::Converting => "converting",
            Phase::Processing => "processing",
            Phase::MergingComplete => "merging_complete",
            Phase::ConvertingToPdf => "converting_to_pdf",
            Phase::PdfConversionComplete => "pdf_conversion_complete",
            Phase::Complete => "complete",
            Phase::Error => "error",
            Phase::Unrecognized(name) => name,
        }
    }
}

impl From<String> for Phase {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "starting" => Phase::Starting,
            "extracting" => Phase::Extracting,
            "converting" => Phase::Converting,
            "processing" => Phase::Processing,
            "merging_complete" => Phase::MergingComplete,
            "converting_to_pdf" => Phase::ConvertingToPdf,
            "pdf_conversion_complete" => Phase::PdfConversionComplete,
            "complete" => Phase::Complete,
            "error" => Phase::Error,
            _ => Phase::Unrecognized(raw),
        }
    }
}

impl From<&str> for Phase {
    fn from(raw: &str) -> Self {
        Phase::from(raw.to_string())
    }
}

/// Status payload polled from the service.
///
/// Every field besides the phase is optional; the service only fills in the
/// counters that make sense for the phase it is in. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteStatus {
    #[serde(rename = "status")]
    pub phase: Phase,
    #[serde(default)]
    pub progress_percent: Option<f64>,
    #[serde(default)]
    pub converted: Option<u32>,
    #[serde(default)]
    pub total_files: Option<u32>,
    #[serde(default)]
    pub processed: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub processed_files: Option<u32>,
    #[serde(default)]
    pub failed_files: Option<u32>,
    #[serde(default)]
    pub failed_file_names: Option<Vec<String>>,
    #[serde(default)]
    pub pdf_conversion_success: Option<bool>,
}

impl RemoteStatus {
    /// A payload carrying only a phase.
    pub fn new(phase: impl Into<Phase>) -> Self {
        Self {
            phase: phase.into(),
            progress_percent: None,
            converted: None,
            total_files: None,
            processed: None,
            total: None,
            error: None,
            processed_files: None,
            failed_files: None,
            failed_file_names: None,
            pdf_conversion_success: None,
        }
    }
}
