use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::events::ControlMessage;

/// Periodic elapsed-time sampler
///
/// Posts `Tick` messages tagged with its epoch. Dropping the sampler aborts
/// the task; ticks already queued are discarded by the epoch check.
#[derive(Debug)]
pub(crate) struct Sampler {
    epoch: u64,
    handle: JoinHandle<()>,
}

impl Sampler {
    pub fn spawn(epoch: u64, period: Duration, tx: mpsc::UnboundedSender<ControlMessage>) -> Self {
        let handle = tokio::spawn(async move {
            let first = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if tx.send(ControlMessage::Tick { epoch }).is_err() {
                    break;
                }
            }
        });

        debug!("Sampler {} started ({:?})", epoch, period);
        Self { epoch, handle }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("Sampler {} cancelled", self.epoch);
    }
}
