//! Poller that keeps every widget refreshed from the metrics backend.

use crate::api::MetricsClient;
use crate::widgets::Widget;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

/// Runs one refresh loop per widget.
pub struct Poller {
    client: MetricsClient,
    duration: String,
    interval: Duration,
    stop_chans: Arc<RwLock<HashMap<&'static str, broadcast::Sender<()>>>>,
}

impl Poller {
    /// Create a poller querying `duration` worth of metrics every `interval`.
    pub fn new(client: MetricsClient, duration: String, interval: Duration) -> Self {
        Self {
            client,
            duration,
            interval,
            stop_chans: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start refreshing a widget. The first refresh happens immediately.
    pub async fn add_widget<W: Widget>(&self, widget: Arc<RwLock<W>>) {
        let mut stop_chans = self.stop_chans.write().await;

        if stop_chans.contains_key(W::ELEMENT_ID) {
            return; // Already running
        }

        let (stop_tx, _) = broadcast::channel(1);
        stop_chans.insert(W::ELEMENT_ID, stop_tx.clone());
        drop(stop_chans);

        tracing::info!("Poller: Adding widget {} ({})", W::ELEMENT_ID, W::ENDPOINT);

        let cycle = PollCycle {
            client: self.client.clone(),
            duration: self.duration.clone(),
            widget,
            latest: Arc::new(AtomicU64::new(0)),
        };
        let interval = self.interval;
        let stop_chans = self.stop_chans.clone();

        tokio::spawn(async move {
            run_poll_loop(cycle, interval, stop_tx.subscribe()).await;

            // Clean up when done
            let mut chans = stop_chans.write().await;
            chans.remove(W::ELEMENT_ID);
        });
    }

    /// Stop every refresh loop.
    pub async fn stop_all(&self) {
        let mut stop_chans = self.stop_chans.write().await;
        for (element_id, stop_tx) in stop_chans.drain() {
            let _ = stop_tx.send(());
            tracing::info!("Poller: Stopped widget {}", element_id);
        }
    }
}

/// Everything one refresh needs.
struct PollCycle<W> {
    client: MetricsClient,
    duration: String,
    widget: Arc<RwLock<W>>,
    /// Generation of the most recently started refresh.
    latest: Arc<AtomicU64>,
}

impl<W> Clone for PollCycle<W> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            duration: self.duration.clone(),
            widget: self.widget.clone(),
            latest: self.latest.clone(),
        }
    }
}

impl<W: Widget> PollCycle<W> {
    /// Fetch and apply, unless a newer refresh started in the meantime.
    async fn refresh(self, generation: u64) {
        let payload = match self
            .client
            .get_metrics::<W::Payload>(W::ENDPOINT, &self.duration)
            .await
        {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Refresh of {} failed: {}", W::ELEMENT_ID, e);
                return;
            }
        };

        let mut widget = self.widget.write().await;
        if self.latest.load(Ordering::SeqCst) != generation {
            tracing::debug!("Dropping stale response for {}", W::ELEMENT_ID);
            return;
        }
        widget.apply(payload);
    }
}

/// Run the refresh loop for a single widget.
async fn run_poll_loop<W: Widget>(
    cycle: PollCycle<W>,
    interval_duration: Duration,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(interval_duration);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut in_flight: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            _ = interval.tick() => {
                if let Some(previous) = in_flight.take() {
                    if !previous.is_finished() {
                        tracing::debug!("Cancelling pending refresh of {}", W::ELEMENT_ID);
                        previous.abort();
                    }
                }

                let generation = cycle.latest.fetch_add(1, Ordering::SeqCst) + 1;
                in_flight = Some(tokio::spawn(cycle.clone().refresh(generation)));
            }
        }
    }

    if let Some(pending) = in_flight {
        pending.abort();
    }
}
