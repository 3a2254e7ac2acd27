//! WebSocket bridge between clients and the event hub.
//!
//! A client joins the groups it cares about with `join_page` messages and
//! receives every event broadcast for those pages as JSON frames. Joining
//! is confirmed with a `joined_page` frame; leaving is silent. One
//! connection can follow any number of pages.

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use forge_events::EventHub;

use crate::state::AppState;

/// Frames buffered towards one client before forwarders start to block.
const OUTBOUND_BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    JoinPage { page_id: String },
    #[serde(rename_all = "camelCase")]
    LeavePage { page_id: String },
}

pub async fn upgrade(State(state): State<AppState>, upgrade: WebSocketUpgrade) -> Response {
    upgrade.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

async fn handle_socket(socket: WebSocket, hub: EventHub) {
    let (mut sink, mut stream) = socket.split();

    // Forwarder tasks and the confirmation path share one outbound queue so
    // frames never interleave mid-write.
    let (outbound, mut outbound_rx) = mpsc::channel::<Message>(OUTBOUND_BUFFER);
    let writer: JoinHandle<()> = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if sink.send(frame).await.is_err() {
                break;
            }
        }
    });

    // One forwarder per joined page; aborting it drops the subscription,
    // which leaves the group.
    let mut joined: HashMap<String, JoinHandle<()>> = HashMap::new();

    while let Some(Ok(frame)) = stream.next().await {
        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::JoinPage { page_id }) => {
                let mut subscription = hub.subscribe(&page_id);
                let events_out = outbound.clone();
                let forwarder = tokio::spawn(async move {
                    while let Some(event) = subscription.recv().await {
                        let frame = match serde_json::to_string(&event) {
                            Ok(frame) => frame,
                            Err(_) => continue,
                        };
                        if events_out.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                });
                if let Some(previous) = joined.insert(page_id.clone(), forwarder) {
                    previous.abort();
                }

                let confirmation = json!({
                    "type": "joined_page",
                    "pageId": page_id,
                    "status": "success",
                });
                if outbound
                    .send(Message::Text(confirmation.to_string()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(ClientMessage::LeavePage { page_id }) => {
                if let Some(forwarder) = joined.remove(&page_id) {
                    forwarder.abort();
                }
            }
            Err(e) => {
                debug!("Ignoring unparseable socket message: {e}");
            }
        }
    }

    for forwarder in joined.into_values() {
        forwarder.abort();
    }
    writer.abort();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_message_parses() {
        let parsed: ClientMessage =
            serde_json::from_str(r#"{"type":"join_page","pageId":"page-1"}"#).unwrap();
        match parsed {
            ClientMessage::JoinPage { page_id } => assert_eq!(page_id, "page-1"),
            other => panic!("parsed as {other:?}"),
        }
    }

    #[test]
    fn test_leave_message_parses() {
        let parsed: ClientMessage =
            serde_json::from_str(r#"{"type":"leave_page","pageId":"page-1"}"#).unwrap();
        match parsed {
            ClientMessage::LeavePage { page_id } => assert_eq!(page_id, "page-1"),
            other => panic!("parsed as {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe","pageId":"p"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"pageId":"p"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }
}
