//! Wire-format event messages.

use serde::{Deserialize, Serialize};

/// Fixed progress text sent when a generation job begins.
const GENERATION_START_MESSAGE: &str = "AI page generation started...";
/// Fixed progress text sent when a generation job finishes.
const GENERATION_COMPLETE_MESSAGE: &str = "Page generation complete";

/// Event delivered to everyone subscribed to a page.
///
/// Serializes to the socket message shape the frontend consumes:
/// `{"type": "...", "pageId": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    /// A generation job has started for the page.
    #[serde(rename_all = "camelCase")]
    GenerationStart { page_id: String, message: String },
    /// New page content is available.
    #[serde(rename_all = "camelCase")]
    PageUpdate { page_id: String, data: PageUpdateData },
    /// The generation job finished.
    #[serde(rename_all = "camelCase")]
    GenerationComplete { page_id: String, message: String },
    /// Something went wrong; `message` is user-presentable text.
    #[serde(rename_all = "camelCase")]
    Error { page_id: String, message: String },
}

/// Payload of a [`PageEvent::PageUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageUpdateData {
    pub content: String,
}

impl PageEvent {
    pub fn generation_start(page_id: impl Into<String>) -> Self {
        Self::GenerationStart {
            page_id: page_id.into(),
            message: GENERATION_START_MESSAGE.to_string(),
        }
    }

    pub fn generation_complete(page_id: impl Into<String>) -> Self {
        Self::GenerationComplete {
            page_id: page_id.into(),
            message: GENERATION_COMPLETE_MESSAGE.to_string(),
        }
    }

    pub fn page_update(page_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::PageUpdate {
            page_id: page_id.into(),
            data: PageUpdateData {
                content: content.into(),
            },
        }
    }

    pub fn error(page_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            page_id: page_id.into(),
            message: message.into(),
        }
    }

    /// Page this event belongs to.
    pub fn page_id(&self) -> &str {
        match self {
            Self::GenerationStart { page_id, .. }
            | Self::PageUpdate { page_id, .. }
            | Self::GenerationComplete { page_id, .. }
            | Self::Error { page_id, .. } => page_id,
        }
    }

    /// Wire tag of the event, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GenerationStart { .. } => "generation_start",
            Self::PageUpdate { .. } => "page_update",
            Self::GenerationComplete { .. } => "generation_complete",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_update_wire_format() {
        let event = PageEvent::page_update("page-1", "<html></html>");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "page_update");
        assert_eq!(json["pageId"], "page-1");
        assert_eq!(json["data"]["content"], "<html></html>");
    }

    #[test]
    fn test_progress_events_carry_fixed_messages() {
        let start = serde_json::to_value(PageEvent::generation_start("p")).unwrap();
        assert_eq!(start["type"], "generation_start");
        assert_eq!(start["message"], "AI page generation started...");

        let complete = serde_json::to_value(PageEvent::generation_complete("p")).unwrap();
        assert_eq!(complete["type"], "generation_complete");
        assert_eq!(complete["message"], "Page generation complete");
    }

    #[test]
    fn test_error_round_trip() {
        let event = PageEvent::error("page-9", "Component build failed: syntax error");
        let json = serde_json::to_string(&event).unwrap();
        let parsed: PageEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, event);
        assert_eq!(parsed.page_id(), "page-9");
        assert_eq!(parsed.kind(), "error");
    }
}
