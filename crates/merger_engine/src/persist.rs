use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine_logging::engine_info;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::{Artifact, ProcessingService, ServiceError};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{artifact} is not available for this job")]
    Unavailable { artifact: Artifact },
    #[error("download failed: {0}")]
    Service(#[from] ServiceError),
    #[error("could not save download: {0}")]
    Persist(#[from] PersistError),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write bytes to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // A previous download of the same artifact is replaced.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Downloads `artifact` and stores it in `output_dir` under its standard name.
///
/// `available` is the flag reported with the job's completion; nothing is
/// requested from the service when it is false.
pub async fn save_artifact(
    service: &dyn ProcessingService,
    artifact: Artifact,
    available: bool,
    output_dir: &Path,
) -> Result<PathBuf, ArtifactError> {
    if !available {
        return Err(ArtifactError::Unavailable { artifact });
    }
    let bytes = service.download(artifact).await?;
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let path = tokio::task::spawn_blocking(move || writer.write(artifact.file_name(), &bytes))
        .await
        .map_err(|err| PersistError::Io(io::Error::other(err.to_string())))??;
    engine_info!("Saved {} to {:?}", artifact, path);
    Ok(path)
}
