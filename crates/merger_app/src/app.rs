use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use engine_logging::{engine_info, engine_warn};
use merger_core::{ArchiveFile, FileInfo, LifecycleState, Notification, ARCHIVE_CONTENT_TYPE};
use merger_engine::{
    save_artifact, Artifact, ChannelNotificationSink, ControllerHandle, HttpService,
    ProcessingService,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::render;
use crate::shortcuts::{self, Command};

pub struct RunOptions {
    pub config: AppConfig,
    pub archive: Option<PathBuf>,
    /// Exit once the submitted job finishes, downloading what is available.
    pub batch: bool,
}

pub async fn run(options: RunOptions) -> anyhow::Result<()> {
    let RunOptions {
        config,
        archive,
        batch,
    } = options;
    let service = Arc::new(HttpService::new(config.client.clone()).context("building http client")?);
    let (tx, mut notifications) = mpsc::unbounded_channel();
    let controller = ControllerHandle::spawn(
        service.clone(),
        Arc::new(ChannelNotificationSink::new(tx)),
        config.client.poll_interval,
    );
    engine_info!("Using service at {}", config.client.base_url);

    if batch {
        let path = archive.context("batch mode needs an archive")?;
        return run_batch(&controller, service.as_ref(), &mut notifications, &path, &config).await;
    }

    println!("Merger client, service at {}", config.client.base_url);
    println!("{}", shortcuts::HELP);
    if let Some(path) = archive {
        submit_path(&controller, &path).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut awaiting_confirmation = false;
    loop {
        tokio::select! {
            Some(notification) = notifications.recv() => {
                println!("{}", render::render(&notification));
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if awaiting_confirmation {
                    awaiting_confirmation = false;
                    if shortcuts::is_confirmation(&line) {
                        controller.cancel_if_active();
                    } else {
                        println!("Cancellation aborted.");
                    }
                    continue;
                }
                let command = match shortcuts::parse_command(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        if !message.is_empty() {
                            println!("{message}");
                        }
                        continue;
                    }
                };
                let view = controller.view();
                if let Some(reason) = shortcuts::blocked_reason(&command, &view) {
                    println!("Ignored: {reason}.");
                    continue;
                }
                match command {
                    Command::Open(path) => submit_path(&controller, &path).await,
                    Command::Cancel => {
                        println!("Really cancel the running operation? [y/N]");
                        awaiting_confirmation = true;
                    }
                    Command::Reset => controller.reset(),
                    Command::Download(artifact) => {
                        let available = match artifact {
                            Artifact::Docx => view.docx_available,
                            Artifact::Pdf => view.pdf_available,
                        };
                        let service = service.clone();
                        let output_dir = config.output_dir.clone();
                        tokio::spawn(async move {
                            download(service.as_ref(), artifact, available, &output_dir).await;
                        });
                    }
                    Command::Status => print_status(&controller),
                    Command::Help => println!("{}", shortcuts::HELP),
                    Command::Quit => break,
                }
            }
        }
    }

    controller.cancel_if_active();
    Ok(())
}

async fn run_batch(
    controller: &ControllerHandle,
    service: &dyn ProcessingService,
    notifications: &mut mpsc::UnboundedReceiver<Notification>,
    path: &Path,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let file = archive_from_path(path).await?;
    controller.submit(file);

    while let Some(notification) = notifications.recv().await {
        println!("{}", render::render(&notification));
        match notification {
            Notification::Completed(summary) => {
                download(service, Artifact::Docx, summary.docx_available, &config.output_dir).await;
                if summary.pdf_available {
                    download(service, Artifact::Pdf, true, &config.output_dir).await;
                }
                return Ok(());
            }
            Notification::Error { message } => anyhow::bail!("job failed: {message}"),
            Notification::Warning(warning) => anyhow::bail!("{}", warning.message()),
            Notification::Progress(_) | Notification::Reset => {}
        }
    }
    anyhow::bail!("controller stopped before the job finished")
}

async fn submit_path(controller: &ControllerHandle, path: &Path) {
    match archive_from_path(path).await {
        Ok(file) => {
            let info = FileInfo {
                name: file.name.clone(),
                size_bytes: file.size_bytes,
            };
            println!("Submitting {}", render::render_file(&info));
            controller.submit(file);
        }
        Err(err) => println!("Cannot open {:?}: {err:#}", path),
    }
}

async fn archive_from_path(path: &Path) -> anyhow::Result<ArchiveFile> {
    let meta = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("reading {:?}", path))?;
    anyhow::ensure!(meta.is_file(), "{:?} is not a file", path);
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ArchiveFile::new(
        name.clone(),
        guess_content_type(&name),
        meta.len(),
        path,
    ))
}

fn guess_content_type(name: &str) -> Option<String> {
    name.to_ascii_lowercase()
        .ends_with(".zip")
        .then(|| ARCHIVE_CONTENT_TYPE.to_string())
}

async fn download(
    service: &dyn ProcessingService,
    artifact: Artifact,
    available: bool,
    output_dir: &Path,
) {
    match save_artifact(service, artifact, available, output_dir).await {
        Ok(path) => println!("{artifact} saved to {}", path.display()),
        Err(err) => {
            engine_warn!("Download of {} failed: {}", artifact, err);
            println!("{artifact} download failed: {err}");
        }
    }
}

fn print_status(controller: &ControllerHandle) {
    let view = controller.view();
    let file = view
        .file
        .as_ref()
        .map(render::render_file)
        .unwrap_or_else(|| "no file".to_string());
    let state = match view.lifecycle {
        LifecycleState::Idle => "idle",
        LifecycleState::Uploading => "uploading",
        LifecycleState::Processing => "processing",
        LifecycleState::Complete => "complete",
        LifecycleState::Error => "error",
    };
    println!("{state}: {file} {} {}", render::progress_bar(view.percent), view.message);
    if let Some(error) = &view.last_error {
        println!("last error: {error}");
    }
}
