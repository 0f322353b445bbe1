use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use merger_core::{
    ArchiveFile, CompletionSummary, JobHandle, LifecycleState, Notification, RemoteStatus, UiStep,
    Warning,
};
use merger_engine::{
    Artifact, ChannelNotificationSink, ControllerHandle, FailureKind, ProcessingService,
    ServiceError, StatusReply, DEFAULT_POLL_INTERVAL,
};
use pretty_assertions::assert_eq;
use tokio::sync::{mpsc, Notify};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Scripted stand-in for the processing service.
#[derive(Default)]
struct FakeService {
    upload_result: Mutex<Option<Result<JobHandle, ServiceError>>>,
    process_result: Mutex<Option<Result<(), ServiceError>>>,
    statuses: Mutex<VecDeque<Result<StatusReply, ServiceError>>>,
    uploads: AtomicUsize,
    queries: AtomicUsize,
    /// When set, every status query waits for a permit.
    gate: Option<Arc<Notify>>,
    started: Option<mpsc::UnboundedSender<usize>>,
}

impl FakeService {
    fn with_statuses(statuses: Vec<Result<StatusReply, ServiceError>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ProcessingService for FakeService {
    async fn upload(&self, _file: &ArchiveFile) -> Result<JobHandle, ServiceError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.upload_result.lock().unwrap().take().unwrap_or_else(|| {
            Ok(JobHandle {
                zip_path: "/tmp/x.zip".to_string(),
                file_count: 3,
            })
        })
    }

    async fn start_processing(&self, zip_path: &str) -> Result<(), ServiceError> {
        assert_eq!(zip_path, "/tmp/x.zip");
        self.process_result.lock().unwrap().take().unwrap_or(Ok(()))
    }

    async fn query_status(&self) -> Result<StatusReply, ServiceError> {
        let count = self.queries.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(started) = &self.started {
            let _ = started.send(count);
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(StatusReply::NotYetAvailable))
    }

    async fn download(&self, _artifact: Artifact) -> Result<Vec<u8>, ServiceError> {
        Ok(Vec::new())
    }
}

fn ready(json: &str) -> Result<StatusReply, ServiceError> {
    Ok(StatusReply::Ready(
        serde_json::from_str::<RemoteStatus>(json).expect("valid status"),
    ))
}

fn failure(kind: FailureKind, message: &str) -> ServiceError {
    ServiceError {
        kind,
        message: message.to_string(),
    }
}

fn archive(name: &str) -> ArchiveFile {
    ArchiveFile::new(name, None, 1024, format!("/data/{name}"))
}

fn spawn(service: Arc<FakeService>) -> (ControllerHandle, mpsc::UnboundedReceiver<Notification>) {
    init_logging();
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = ControllerHandle::spawn(
        service,
        Arc::new(ChannelNotificationSink::new(tx)),
        DEFAULT_POLL_INTERVAL,
    );
    (handle, rx)
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Notification {
    tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("notification before timeout")
        .expect("controller alive")
}

async fn next_percent(rx: &mut mpsc::UnboundedReceiver<Notification>) -> u8 {
    match next(rx).await {
        Notification::Progress(snapshot) => snapshot.percent,
        other => panic!("expected progress, got {other:?}"),
    }
}

/// Consumes the 5% and 30% notifications of a successful upload.
async fn expect_upload(rx: &mut mpsc::UnboundedReceiver<Notification>) {
    assert_eq!(next_percent(rx).await, 5);
    match next(rx).await {
        Notification::Progress(snapshot) => {
            assert_eq!(snapshot.percent, 30);
            assert_eq!(snapshot.ui_step, UiStep::Process);
        }
        other => panic!("expected upload complete, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn archive_runs_to_completion() {
    let service = Arc::new(FakeService::with_statuses(vec![
        ready(r#"{"status":"converting","converted":1,"total_files":3}"#),
        ready(r#"{"status":"complete","processed_files":3,"failed_files":0,"pdf_conversion_success":true}"#),
    ]));
    let (handle, mut rx) = spawn(service.clone());

    handle.submit(archive("docs.zip"));
    expect_upload(&mut rx).await;

    match next(&mut rx).await {
        Notification::Progress(snapshot) => {
            assert_eq!(snapshot.percent, 35);
            assert!(snapshot.message.contains("1/3"), "{}", snapshot.message);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(next_percent(&mut rx).await, 100);
    assert_eq!(
        next(&mut rx).await,
        Notification::Completed(CompletionSummary {
            processed_files: 3,
            failed_files: 0,
            failed_file_names: Vec::new(),
            docx_available: true,
            pdf_available: true,
        })
    );

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(service.queries(), 2);
    assert!(rx.try_recv().is_err());

    let view = handle.view();
    assert_eq!(view.lifecycle, LifecycleState::Complete);
    assert!(view.can_reset);
}

#[tokio::test(start_paused = true)]
async fn non_archive_never_reaches_the_service() {
    let service = Arc::new(FakeService::default());
    let (handle, mut rx) = spawn(service.clone());

    handle.submit(archive("notes.txt"));
    assert_eq!(
        next(&mut rx).await,
        Notification::Warning(Warning::InvalidInput {
            file_name: "notes.txt".to_string()
        })
    );

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(service.uploads(), 0);
    assert_eq!(service.queries(), 0);
    assert_eq!(handle.view().lifecycle, LifecycleState::Idle);
}

#[tokio::test(start_paused = true)]
async fn rapid_second_submit_is_busy() {
    let service = Arc::new(FakeService::default());
    let (handle, mut rx) = spawn(service.clone());

    handle.submit(archive("docs.zip"));
    handle.submit(archive("other.zip"));

    assert_eq!(next_percent(&mut rx).await, 5);
    assert_eq!(next(&mut rx).await, Notification::Warning(Warning::Busy));
    assert_eq!(next_percent(&mut rx).await, 30);
    assert_eq!(service.uploads(), 1);
}

#[tokio::test(start_paused = true)]
async fn silent_until_status_is_available() {
    let service = Arc::new(FakeService::with_statuses(vec![
        Ok(StatusReply::NotYetAvailable),
        Ok(StatusReply::NotYetAvailable),
        Ok(StatusReply::NotYetAvailable),
        ready(r#"{"status":"processing","processed":2,"total":4}"#),
    ]));
    let (handle, mut rx) = spawn(service.clone());

    handle.submit(archive("docs.zip"));
    expect_upload(&mut rx).await;

    assert_eq!(next_percent(&mut rx).await, 60);
    assert_eq!(service.queries(), 4);
    assert_eq!(handle.view().lifecycle, LifecycleState::Processing);
}

#[tokio::test(start_paused = true)]
async fn transient_fault_does_not_stop_polling() {
    let service = Arc::new(FakeService::with_statuses(vec![
        Err(failure(FailureKind::Network, "connection reset")),
        Err(failure(FailureKind::Decode, "expected value")),
        ready(r#"{"status":"complete","processed_files":1}"#),
    ]));
    let (handle, mut rx) = spawn(service.clone());

    handle.submit(archive("docs.zip"));
    expect_upload(&mut rx).await;

    assert_eq!(next_percent(&mut rx).await, 100);
    assert!(matches!(next(&mut rx).await, Notification::Completed(_)));
    assert_eq!(service.queries(), 3);
    assert_eq!(handle.view().lifecycle, LifecycleState::Complete);
}

#[tokio::test(start_paused = true)]
async fn definite_status_failure_ends_the_job() {
    let service = Arc::new(FakeService::with_statuses(vec![Err(failure(
        FailureKind::HttpStatus(500),
        "disk full",
    ))]));
    let (handle, mut rx) = spawn(service.clone());

    handle.submit(archive("docs.zip"));
    expect_upload(&mut rx).await;

    assert_eq!(
        next(&mut rx).await,
        Notification::Error {
            message: "disk full".to_string()
        }
    );
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(service.queries(), 1);
    assert_eq!(handle.view().lifecycle, LifecycleState::Error);
}

#[tokio::test(start_paused = true)]
async fn remote_error_phase_ends_the_job() {
    let service = Arc::new(FakeService::with_statuses(vec![ready(
        r#"{"status":"error","error":"corrupt archive"}"#,
    )]));
    let (handle, mut rx) = spawn(service.clone());

    handle.submit(archive("docs.zip"));
    expect_upload(&mut rx).await;

    assert_eq!(
        next(&mut rx).await,
        Notification::Error {
            message: "corrupt archive".to_string()
        }
    );
    assert_eq!(handle.view().last_error.as_deref(), Some("corrupt archive"));
}

#[tokio::test(start_paused = true)]
async fn upload_failure_uses_fallback_and_never_polls() {
    let service = Arc::new(FakeService::default());
    *service.upload_result.lock().unwrap() =
        Some(Err(failure(FailureKind::HttpStatus(400), "")));
    let (handle, mut rx) = spawn(service.clone());

    handle.submit(archive("docs.zip"));
    assert_eq!(next_percent(&mut rx).await, 5);
    assert_eq!(
        next(&mut rx).await,
        Notification::Error {
            message: "Upload failed".to_string()
        }
    );

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(service.queries(), 0);
    assert_eq!(handle.view().lifecycle, LifecycleState::Error);
}

#[tokio::test(start_paused = true)]
async fn processing_request_failure_never_polls() {
    let service = Arc::new(FakeService::default());
    *service.process_result.lock().unwrap() = Some(Err(failure(
        FailureKind::HttpStatus(404),
        "The ZIP file does not exist.",
    )));
    let (handle, mut rx) = spawn(service.clone());

    handle.submit(archive("docs.zip"));
    expect_upload(&mut rx).await;
    assert_eq!(
        next(&mut rx).await,
        Notification::Error {
            message: "The ZIP file does not exist.".to_string()
        }
    );

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(service.queries(), 0);
    assert_eq!(handle.view().lifecycle, LifecycleState::Error);
}

#[tokio::test(start_paused = true)]
async fn result_in_flight_at_cancel_is_dropped() {
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let gate = Arc::new(Notify::new());
    let service = Arc::new(FakeService {
        statuses: Mutex::new(vec![ready(r#"{"status":"complete"}"#)].into()),
        gate: Some(gate.clone()),
        started: Some(started_tx),
        ..FakeService::default()
    });
    let (handle, mut rx) = spawn(service.clone());

    handle.submit(archive("docs.zip"));
    expect_upload(&mut rx).await;
    assert_eq!(started_rx.recv().await, Some(1));

    handle.cancel_if_active();
    assert_eq!(next(&mut rx).await, Notification::Reset);
    gate.notify_one();

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(service.queries(), 1);
    assert_eq!(handle.view().lifecycle, LifecycleState::Idle);
}

#[tokio::test(start_paused = true)]
async fn ticks_during_an_outstanding_query_are_skipped() {
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let gate = Arc::new(Notify::new());
    let service = Arc::new(FakeService {
        gate: Some(gate.clone()),
        started: Some(started_tx),
        ..FakeService::default()
    });
    let (handle, mut rx) = spawn(service.clone());

    handle.submit(archive("docs.zip"));
    expect_upload(&mut rx).await;
    assert_eq!(started_rx.recv().await, Some(1));

    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(service.queries(), 1);

    gate.notify_one();
    assert_eq!(started_rx.recv().await, Some(2));
    handle.cancel_if_active();
    assert_eq!(next(&mut rx).await, Notification::Reset);
}

#[tokio::test(start_paused = true)]
async fn reset_does_not_end_a_running_job() {
    let service = Arc::new(FakeService::with_statuses(vec![
        Ok(StatusReply::NotYetAvailable),
        ready(r#"{"status":"complete","processed_files":1}"#),
    ]));
    let (handle, mut rx) = spawn(service.clone());

    handle.submit(archive("docs.zip"));
    expect_upload(&mut rx).await;
    handle.reset();

    assert_eq!(next_percent(&mut rx).await, 100);
    assert!(matches!(next(&mut rx).await, Notification::Completed(_)));
    assert_eq!(service.queries(), 2);
}

#[tokio::test(start_paused = true)]
async fn reset_from_idle_repeats_ready_notice() {
    let (handle, mut rx) = spawn(Arc::new(FakeService::default()));

    for _ in 0..3 {
        handle.reset();
        assert_eq!(next(&mut rx).await, Notification::Reset);
        assert_eq!(handle.view().lifecycle, LifecycleState::Idle);
    }
}

#[tokio::test(start_paused = true)]
async fn reset_after_completion_allows_another_job() {
    let service = Arc::new(FakeService::with_statuses(vec![
        ready(r#"{"status":"complete"}"#),
        ready(r#"{"status":"complete"}"#),
    ]));
    let (handle, mut rx) = spawn(service.clone());

    handle.submit(archive("first.zip"));
    expect_upload(&mut rx).await;
    assert_eq!(next_percent(&mut rx).await, 100);
    assert!(matches!(next(&mut rx).await, Notification::Completed(_)));

    handle.reset();
    assert_eq!(next(&mut rx).await, Notification::Reset);

    handle.submit(archive("second.zip"));
    expect_upload(&mut rx).await;
    assert_eq!(next_percent(&mut rx).await, 100);
    assert!(matches!(next(&mut rx).await, Notification::Completed(_)));
    assert_eq!(service.uploads(), 2);
}
