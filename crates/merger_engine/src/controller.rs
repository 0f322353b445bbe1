//! The job controller actor.
//!
//! One task owns the [`JobState`] and the optional [`PollLoop`]. Every input,
//! whether a user intent or a collaborator result, arrives as a [`Msg`] in
//! its inbox and is applied with [`merger_core::update`]. Collaborator calls
//! run as separate tasks and post their results back, so the actor never
//! waits on the network and mutations are strictly serialized.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use merger_core::{
    update, ArchiveFile, Effect, JobState, JobViewModel, Msg, Notification, PollOutcome,
};
use tokio::sync::{mpsc, watch};

use crate::poll_loop::PollLoop;
use crate::{ProcessingService, StatusReply};

/// Receives the controller's notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub struct ChannelNotificationSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotificationSink {
    pub fn new(tx: mpsc::UnboundedSender<Notification>) -> Self {
        Self { tx }
    }
}

impl NotificationSink for ChannelNotificationSink {
    fn notify(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}

/// Entry points into a running controller. Cheap to clone.
///
/// The actor shuts down once every handle is dropped and no collaborator
/// call is outstanding.
#[derive(Clone)]
pub struct ControllerHandle {
    inbox: mpsc::UnboundedSender<Msg>,
    view_rx: watch::Receiver<JobViewModel>,
}

impl ControllerHandle {
    /// Spawns the actor on the current tokio runtime.
    pub fn spawn(
        service: Arc<dyn ProcessingService>,
        sink: Arc<dyn NotificationSink>,
        poll_interval: Duration,
    ) -> Self {
        let (inbox, inbox_rx) = mpsc::unbounded_channel();
        let state = JobState::new();
        let (view_tx, view_rx) = watch::channel(state.view());

        let controller = JobController {
            state,
            service,
            sink,
            poll_interval,
            poll_loop: None,
            inbox: inbox.downgrade(),
            view_tx,
        };
        tokio::spawn(controller.run(inbox_rx));

        Self { inbox, view_rx }
    }

    pub fn submit(&self, file: ArchiveFile) {
        self.send(Msg::SubmitRequested(file));
    }

    /// Cancels the running job; does nothing when no job is active.
    pub fn cancel_if_active(&self) {
        self.send(Msg::CancelRequested);
    }

    pub fn reset(&self) {
        self.send(Msg::ResetRequested);
    }

    /// Latest published view.
    pub fn view(&self) -> JobViewModel {
        self.view_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobViewModel> {
        self.view_rx.clone()
    }

    fn send(&self, msg: Msg) {
        if self.inbox.send(msg).is_err() {
            engine_warn!("Job controller is gone; dropping request");
        }
    }
}

struct JobController {
    state: JobState,
    service: Arc<dyn ProcessingService>,
    sink: Arc<dyn NotificationSink>,
    poll_interval: Duration,
    poll_loop: Option<PollLoop>,
    inbox: mpsc::WeakUnboundedSender<Msg>,
    view_tx: watch::Sender<JobViewModel>,
}

impl JobController {
    async fn run(mut self, mut inbox_rx: mpsc::UnboundedReceiver<Msg>) {
        while let Some(msg) = inbox_rx.recv().await {
            self.dispatch(msg);
        }
        engine_debug!("Job controller stopped");
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let view = state.view();
        let was_dirty = state.consume_dirty();
        self.state = state;

        for effect in effects {
            self.execute(effect);
        }
        if was_dirty {
            self.view_tx.send_replace(view);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Upload { job_id, file } => {
                let service = self.service.clone();
                self.spawn_call(async move {
                    let result = service.upload(&file).await.map_err(|err| {
                        engine_warn!("Upload of {:?} failed: {}", file.name, err);
                        err.message
                    });
                    Msg::UploadFinished { job_id, result }
                });
            }
            Effect::StartProcessing { job_id, zip_path } => {
                let service = self.service.clone();
                self.spawn_call(async move {
                    let result = service.start_processing(&zip_path).await.map_err(|err| {
                        engine_warn!("Processing request for {} failed: {}", zip_path, err);
                        err.message
                    });
                    Msg::ProcessingRequested { job_id, result }
                });
            }
            Effect::StartPolling { job_id } => {
                self.poll_loop = Some(PollLoop::start(
                    job_id,
                    self.poll_interval,
                    self.inbox.clone(),
                ));
            }
            Effect::QueryStatus { job_id } => {
                let service = self.service.clone();
                self.spawn_call(async move {
                    let outcome = match service.query_status().await {
                        Ok(StatusReply::NotYetAvailable) => PollOutcome::NotYetAvailable,
                        Ok(StatusReply::Ready(status)) => PollOutcome::Status(status),
                        Err(err) if err.is_definite() => PollOutcome::Rejected(err.message),
                        Err(err) => PollOutcome::Fault(err.to_string()),
                    };
                    Msg::PollFinished { job_id, outcome }
                });
            }
            Effect::StopPolling => {
                if let Some(poll_loop) = self.poll_loop.take() {
                    engine_debug!("Releasing poll loop of job {}", poll_loop.job_id());
                }
            }
            Effect::Notify(notification) => self.sink.notify(notification),
        }
    }

    fn spawn_call<F>(&self, call: F)
    where
        F: Future<Output = Msg> + Send + 'static,
    {
        let Some(inbox) = self.inbox.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            let msg = call.await;
            let _ = inbox.send(msg);
        });
    }
}
