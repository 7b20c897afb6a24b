use super::sample::EngagementSample;
use super::synth::synthesize;
use crate::remote::RemoteEngagementService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Single-slot register holding the most recent sample.
///
/// Writers never wait on each other; the last write wins.
#[derive(Clone)]
pub struct LatestSample {
    tx: Arc<watch::Sender<Option<EngagementSample>>>,
}

impl LatestSample {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn publish(&self, sample: EngagementSample) {
        self.tx.send_replace(Some(sample));
    }

    pub fn get(&self) -> Option<EngagementSample> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<EngagementSample>> {
        self.tx.subscribe()
    }
}

impl Default for LatestSample {
    fn default() -> Self {
        Self::new()
    }
}

struct SamplerShared {
    remote: Arc<dyn RemoteEngagementService>,
    latest: LatestSample,
    session_id: watch::Receiver<Option<String>>,
    stopped: AtomicBool,
}

impl SamplerShared {
    fn tick(self: &Arc<Self>) -> EngagementSample {
        let sample = synthesize();
        self.latest.publish(sample.clone());

        let session_id = self.session_id.borrow().clone();
        if let Some(session_id) = session_id {
            let shared = Arc::clone(self);
            tokio::spawn(async move {
                match shared.remote.current_sample(&session_id).await {
                    Ok(remote) => {
                        if !shared.stopped.load(Ordering::SeqCst) {
                            shared.latest.publish(remote);
                        }
                    }
                    Err(e) => debug!("Remote sample unavailable, keeping local sample: {}", e),
                }
            });
        }

        sample
    }
}

/// Periodic engagement sampling.
///
/// Each tick publishes a locally synthesized sample immediately and races a
/// remote fetch that overwrites it if it succeeds. Remote failures are
/// swallowed.
pub struct EngagementSampler {
    shared: Arc<SamplerShared>,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl EngagementSampler {
    pub fn new(
        remote: Arc<dyn RemoteEngagementService>,
        latest: LatestSample,
        session_id: watch::Receiver<Option<String>>,
        interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(SamplerShared {
                remote,
                latest,
                session_id,
                stopped: AtomicBool::new(false),
            }),
            interval,
            task: None,
        }
    }

    /// Produce one sample now
    pub fn tick(&self) -> EngagementSample {
        self.shared.tick()
    }

    /// Tick immediately, then every interval until stopped
    pub fn start(&mut self) {
        if self.task.is_some() || self.shared.stopped.load(Ordering::SeqCst) {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let period = self.interval;

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if shared.stopped.load(Ordering::SeqCst) {
                    break;
                }
                shared.tick();
            }
        }));

        info!("Engagement sampler started ({:?} interval)", period);
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Stop ticking. Remote results still in flight are dropped.
    pub fn stop(&mut self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Engagement sampler stopped");
        }
    }
}

impl Drop for EngagementSampler {
    fn drop(&mut self) {
        self.stop();
    }
}
