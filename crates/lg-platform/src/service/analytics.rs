//! Analytics Buffer
//!
//! In-memory, bounded-capacity buffer for telemetry events, persisted in
//! batches. Backpressure is by dropping, never by blocking: a full buffer
//! rejects new events. A failed flush re-buffers the in-flight batch at the
//! front (order preserved, capacity respected); a persistently failing
//! store is an accepted data-loss boundary, not a bug.
//!
//! One long-lived instance with an explicit start/shutdown lifecycle; the
//! periodic flush task stops at shutdown after one final best-effort flush.

use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use lg_common::AnalyticsEvent;

use crate::repository::AnalyticsStore;

#[derive(Debug, Clone)]
pub struct AnalyticsBufferConfig {
    /// Reaching this many buffered events triggers an inline flush
    pub batch_size: usize,
    /// Hard ceiling; events beyond it are dropped
    pub capacity: usize,
    /// Interval of the traffic-independent flush timer
    pub flush_interval: Duration,
}

impl Default for AnalyticsBufferConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            capacity: 10_000,
            flush_interval: Duration::from_secs(5),
        }
    }
}

/// Outcome of a batch submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub accepted: usize,
    pub dropped: usize,
}

pub struct AnalyticsBuffer {
    store: Arc<dyn AnalyticsStore>,
    config: AnalyticsBufferConfig,
    buffer: Mutex<Vec<AnalyticsEvent>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl AnalyticsBuffer {
    pub fn new(store: Arc<dyn AnalyticsStore>, config: AnalyticsBufferConfig) -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);
        Arc::new(Self {
            store,
            config,
            buffer: Mutex::new(Vec::new()),
            shutdown_tx,
        })
    }

    /// Start the periodic flush task
    pub fn start(self: &Arc<Self>) {
        let buffer = self.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = self.config.flush_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        buffer.flush().await;
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Analytics flush timer shutting down");
                        break;
                    }
                }
            }
        });
    }

    /// Accept one event. Returns false (event discarded) when the buffer is
    /// already at capacity.
    pub async fn track(&self, event: AnalyticsEvent) -> bool {
        let should_flush = {
            let mut buffer = self.buffer.lock();
            if buffer.len() >= self.config.capacity {
                warn!("Analytics buffer full, dropping event");
                return false;
            }
            buffer.push(event);
            buffer.len() >= self.config.batch_size
        };

        if should_flush {
            self.flush().await;
        }
        true
    }

    /// Accept as many events as remaining capacity allows, in input order
    pub async fn track_batch(&self, events: Vec<AnalyticsEvent>) -> BatchOutcome {
        let total = events.len();
        let (accepted, should_flush) = {
            let mut buffer = self.buffer.lock();
            let available = self.config.capacity.saturating_sub(buffer.len());
            let accepted = total.min(available);
            buffer.extend(events.into_iter().take(accepted));
            (accepted, buffer.len() >= self.config.batch_size)
        };

        if accepted < total {
            warn!(dropped = total - accepted, "Analytics buffer full, dropping batch overflow");
        }
        if should_flush {
            self.flush().await;
        }

        BatchOutcome {
            accepted,
            dropped: total - accepted,
        }
    }

    /// Move the entire current buffer to the store in one batch write. The
    /// buffer is swapped out atomically so concurrent `track` calls during
    /// the write are neither lost nor double-flushed.
    pub async fn flush(&self) {
        let batch = {
            let mut buffer = self.buffer.lock();
            if buffer.is_empty() {
                return;
            }
            std::mem::take(&mut *buffer)
        };

        let count = batch.len();
        match self.store.persist_batch(&batch).await {
            Ok(()) => debug!(count, "Flushed analytics batch"),
            Err(e) => {
                // Reinsert the failed batch at the front, order preserved,
                // truncated to the capacity ceiling
                let mut buffer = self.buffer.lock();
                let mut restored = batch;
                restored.extend(buffer.drain(..));
                restored.truncate(self.config.capacity);
                let requeued = restored.len();
                *buffer = restored;
                error!(error = %e, requeued, "Analytics flush failed, events re-buffered");
            }
        }
    }

    /// Stop the flush timer and attempt one final flush. Failures are
    /// logged and not retried further.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        self.flush().await;
    }

    /// Number of events currently buffered
    pub fn buffered(&self) -> usize {
        self.buffer.lock().len()
    }
}
