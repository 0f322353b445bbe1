//! Merger engine: service IO, the poll loop, and the job controller actor.
mod controller;
mod persist;
mod poll_loop;
mod service;
mod settings;
mod types;

pub use controller::{ChannelNotificationSink, ControllerHandle, NotificationSink};
pub use persist::{ensure_output_dir, save_artifact, ArtifactError, AtomicFileWriter, PersistError};
pub use poll_loop::{PollLoop, MIN_POLL_INTERVAL};
pub use service::{HttpService, ProcessingService};
pub use settings::{ClientSettings, DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL};
pub use types::{Artifact, FailureKind, ServiceError, StatusReply};
