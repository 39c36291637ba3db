//! Status-change broadcast for the notification layer

use signing_types::StatusChangeEvent;
use tokio::sync::broadcast;

/// Fan-out of [`StatusChangeEvent`]s to any number of subscribers.
///
/// Publishing never blocks and never fails: with no subscribers the event
/// is dropped, and slow subscribers observe `RecvError::Lagged`.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<StatusChangeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: StatusChangeEvent) {
        tracing::debug!(
            process_id = %event.process_id,
            old = %event.old_status,
            new = %event.new_status,
            "Status change published"
        );
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusChangeEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
