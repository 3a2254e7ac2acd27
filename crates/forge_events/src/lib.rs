//! Per-page event broadcasting for PageForge.
//!
//! Generation jobs run detached from the requests that start them; every
//! observable outcome travels through the [`EventHub`] as a [`PageEvent`].
//! Subscribers join the group for one page id and receive every event
//! broadcast to that page while they stay subscribed. There is no backlog:
//! an event broadcast before a subscriber joins is gone.
//!
//! # Example
//!
//! ```
//! use forge_events::{EventHub, PageEvent};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let hub = EventHub::new();
//! let mut subscription = hub.subscribe("page-1");
//!
//! hub.broadcast(PageEvent::generation_start("page-1"));
//!
//! let event = subscription.recv().await.unwrap();
//! assert_eq!(event.page_id(), "page-1");
//! # }
//! ```

pub mod hub;
pub mod message;

pub use hub::{EventHub, PageSubscription};
pub use message::{PageEvent, PageUpdateData};
