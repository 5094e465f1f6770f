//! Channel-driven invalidation.
//!
//! An opt-in alternative to calling [`StorefrontCache::invalidate`] at each
//! write site: writers publish [`ChangeEvent`]s and one background task
//! applies them in arrival order.
//!
//! [`StorefrontCache::invalidate`]: crate::StorefrontCache::invalidate

use crate::{ChangeEvent, InvalidationEngine};
use storefront_core::{StorefrontError, StorefrontResult};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Sending half, cloned into every writer.
#[derive(Debug, Clone)]
pub struct InvalidationPublisher {
    sender: mpsc::Sender<ChangeEvent>,
}

impl InvalidationPublisher {
    /// Queues `event`, waiting while the channel is full.
    pub async fn publish(&self, event: ChangeEvent) -> StorefrontResult<()> {
        self.sender
            .send(event)
            .await
            .map_err(|e| StorefrontError::internal(format!("Invalidation listener stopped, dropped {:?}", e.0)))
    }
}

/// Receiving half that drives the [`InvalidationEngine`].
#[derive(Debug)]
pub struct InvalidationListener {
    engine: InvalidationEngine,
    receiver: mpsc::Receiver<ChangeEvent>,
}

impl InvalidationListener {
    /// Creates a connected publisher / listener pair with room for
    /// `capacity` queued events.
    #[must_use]
    pub fn channel(engine: InvalidationEngine, capacity: usize) -> (InvalidationPublisher, Self) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (InvalidationPublisher { sender }, Self { engine, receiver })
    }

    /// Applies events until every publisher is dropped. Returns the number
    /// of events processed.
    pub async fn run(mut self) -> usize {
        let mut processed = 0;
        while let Some(event) = self.receiver.recv().await {
            debug!("Applying {} from listener", event.kind());
            self.engine.invalidate(&event).await;
            processed += 1;
        }
        info!("Invalidation listener stopped after {} events", processed);
        processed
    }

    /// Runs the listener on the tokio runtime.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<usize> {
        tokio::spawn(self.run())
    }
}
