//! Broadcast hub with one group per page id.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::message::PageEvent;

/// Events buffered per group before slow subscribers start losing the oldest.
const CHANNEL_CAPACITY: usize = 64;

/// Fan-out hub keyed by page id.
///
/// Groups are created on first subscribe and removed when the last
/// subscription drops. Cloning shares the underlying channel table.
#[derive(Clone, Default)]
pub struct EventHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<PageEvent>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the group for a page. The subscription receives every event
    /// broadcast for that page from this point on; dropping it leaves the
    /// group.
    pub fn subscribe(&self, page_id: &str) -> PageSubscription {
        let mut channels = self.channels.lock();
        let sender = channels
            .entry(page_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        let receiver = sender.subscribe();
        debug!(
            "Subscriber joined page {} ({} in group)",
            page_id,
            sender.receiver_count()
        );

        PageSubscription {
            page_id: page_id.to_string(),
            receiver,
            hub: self.clone(),
        }
    }

    /// Deliver an event to everyone subscribed to its page. Returns the
    /// number of subscribers reached; a page with no group is a no-op.
    pub fn broadcast(&self, event: PageEvent) -> usize {
        let mut channels = self.channels.lock();
        let page_id = event.page_id().to_string();
        let sender = match channels.get(&page_id) {
            Some(sender) => sender,
            None => return 0,
        };

        let kind = event.kind();
        match sender.send(event) {
            Ok(delivered) => {
                debug!("Broadcast {} to {} subscribers of page {}", kind, delivered, page_id);
                delivered
            }
            Err(_) => {
                // All receivers vanished since the last prune.
                channels.remove(&page_id);
                0
            }
        }
    }

    pub fn generation_start(&self, page_id: &str) -> usize {
        self.broadcast(PageEvent::generation_start(page_id))
    }

    pub fn generation_complete(&self, page_id: &str) -> usize {
        self.broadcast(PageEvent::generation_complete(page_id))
    }

    pub fn page_update(&self, page_id: &str, content: impl Into<String>) -> usize {
        self.broadcast(PageEvent::page_update(page_id, content))
    }

    pub fn error(&self, page_id: &str, message: impl Into<String>) -> usize {
        self.broadcast(PageEvent::error(page_id, message))
    }

    /// Number of pages with at least one subscriber.
    pub fn group_count(&self) -> usize {
        self.channels.lock().len()
    }

    /// Number of subscribers in one page's group.
    pub fn subscriber_count(&self, page_id: &str) -> usize {
        self.channels
            .lock()
            .get(page_id)
            .map_or(0, |sender| sender.receiver_count())
    }
}

/// Membership in one page's broadcast group. Dropping it leaves the group.
pub struct PageSubscription {
    page_id: String,
    receiver: broadcast::Receiver<PageEvent>,
    hub: EventHub,
}

impl PageSubscription {
    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    /// Wait for the next event. Returns `None` once the hub is gone. A
    /// subscriber that falls more than the buffer capacity behind skips the
    /// lost events and keeps receiving from the oldest retained one.
    pub async fn recv(&mut self) -> Option<PageEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "Subscriber for page {} lagged, {} events skipped",
                        self.page_id, skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for PageSubscription {
    fn drop(&mut self) {
        let mut channels = self.hub.channels.lock();
        if let Some(sender) = channels.get(&self.page_id) {
            // This receiver is still counted until after drop completes.
            if sender.receiver_count() <= 1 {
                channels.remove(&self.page_id);
                debug!("Removed empty broadcast group for page {}", self.page_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_all_subscribers_receive_broadcast() {
        let hub = EventHub::new();
        let mut first = hub.subscribe("page-1");
        let mut second = hub.subscribe("page-1");

        let delivered = hub.page_update("page-1", "<p>hi</p>");
        assert_eq!(delivered, 2);

        let event = PageEvent::page_update("page-1", "<p>hi</p>");
        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_broadcast_without_group_is_noop() {
        let hub = EventHub::new();
        assert_eq!(hub.generation_start("nobody-listening"), 0);
        assert_eq!(hub.group_count(), 0);
    }

    #[tokio::test]
    async fn test_no_replay_for_late_subscribers() {
        let hub = EventHub::new();
        let mut early = hub.subscribe("page-1");
        hub.generation_start("page-1");

        let mut late = hub.subscribe("page-1");
        hub.generation_complete("page-1");

        assert_eq!(
            early.recv().await.unwrap(),
            PageEvent::generation_start("page-1")
        );
        assert_eq!(
            early.recv().await.unwrap(),
            PageEvent::generation_complete("page-1")
        );

        // The late subscriber sees only what was broadcast after it joined.
        assert_eq!(
            late.recv().await.unwrap(),
            PageEvent::generation_complete("page-1")
        );
        assert!(timeout(Duration::from_millis(50), late.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_events_scoped_to_their_page() {
        let hub = EventHub::new();
        let mut one = hub.subscribe("page-1");
        let _two = hub.subscribe("page-2");

        hub.error("page-2", "boom");
        hub.error("page-1", "own error");

        let event = one.recv().await.unwrap();
        assert_eq!(event.page_id(), "page-1");
        assert!(timeout(Duration::from_millis(50), one.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_dropping_last_subscription_removes_group() {
        let hub = EventHub::new();
        let first = hub.subscribe("page-1");
        let second = hub.subscribe("page-1");
        assert_eq!(hub.subscriber_count("page-1"), 2);

        drop(first);
        assert_eq!(hub.subscriber_count("page-1"), 1);
        assert_eq!(hub.group_count(), 1);

        drop(second);
        assert_eq!(hub.group_count(), 0);
        assert_eq!(hub.broadcast(PageEvent::generation_start("page-1")), 0);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_receiving() {
        let hub = EventHub::new();
        let mut slow = hub.subscribe("page-1");

        for i in 0..CHANNEL_CAPACITY + 2 {
            hub.page_update("page-1", format!("update-{i}"));
        }

        // The two oldest events were overwritten; reception resumes at the
        // oldest retained one.
        let event = slow.recv().await.unwrap();
        assert_eq!(event, PageEvent::page_update("page-1", "update-2"));
    }
}
