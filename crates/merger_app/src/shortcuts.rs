//! Line commands standing in for the keyboard shortcuts of the upload page.

use std::path::PathBuf;

use merger_core::JobViewModel;
use merger_engine::Artifact;

pub const HELP: &str = "\
commands:
  open <path> | o <path>   submit a ZIP archive
  cancel | esc             cancel the running job (asks for confirmation)
  reset | r                start over after a finished or failed job
  docx | d                 download the merged document
  pdf | p                  download the merged PDF
  status | s               show the current job
  help | h                 show this list
  quit | q                 exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(PathBuf),
    Cancel,
    Reset,
    Download(Artifact),
    Status,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word.to_ascii_lowercase().as_str() {
        "open" | "o" if !rest.is_empty() => Ok(Command::Open(PathBuf::from(rest))),
        "open" | "o" => Err("usage: open <path-to-zip>".to_string()),
        "cancel" | "esc" => Ok(Command::Cancel),
        "reset" | "r" => Ok(Command::Reset),
        "docx" | "d" => Ok(Command::Download(Artifact::Docx)),
        "pdf" | "p" => Ok(Command::Download(Artifact::Pdf)),
        "status" | "s" => Ok(Command::Status),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        "" => Err(String::new()),
        other => Err(format!("unknown command {other:?}; type 'help'")),
    }
}

/// Whether `command` may run in the state shown by `view`. `None` means it
/// may; otherwise the reason it is ignored.
pub fn blocked_reason(command: &Command, view: &JobViewModel) -> Option<&'static str> {
    match command {
        Command::Cancel if !view.can_cancel => Some("no job is running"),
        Command::Reset if view.lifecycle.is_active() => {
            Some("a job is running; use 'cancel' instead")
        }
        Command::Reset if !view.can_reset => Some("there is no finished job to clear"),
        Command::Download(Artifact::Docx) if !view.docx_available => {
            Some("no merged document is available")
        }
        Command::Download(Artifact::Pdf) if !view.pdf_available => Some("no PDF is available"),
        _ => None,
    }
}

pub fn is_confirmation(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
