use std::time::Duration;

use engine_logging::engine_debug;
use merger_core::{JobId, Msg};
use tokio::sync::mpsc::WeakUnboundedSender;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Shortest cadence accepted; a zero period would spin.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The repeating status timer of one job.
///
/// Ticks are posted as [`Msg::PollTick`] into the controller's inbox. The
/// timer runs until this value is dropped or the inbox goes away.
pub struct PollLoop {
    job_id: JobId,
    _guard: DropGuard,
}

impl PollLoop {
    /// First tick fires one `period` after the call.
    pub fn start(job_id: JobId, period: Duration, inbox: WeakUnboundedSender<Msg>) -> Self {
        let period = period.max(MIN_POLL_INTERVAL);
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(tx) = inbox.upgrade() else { break };
                        if tx.send(Msg::PollTick { job_id }).is_err() {
                            break;
                        }
                    }
                }
            }
            engine_debug!("Poll loop for job {} stopped", job_id);
        });

        engine_debug!("Poll loop for job {} started ({:?})", job_id, period);
        Self {
            job_id,
            _guard: token.drop_guard(),
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }
}
