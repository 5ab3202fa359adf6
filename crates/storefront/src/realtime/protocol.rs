//! Hub wire frames.
//!
//! The hub pushes one JSON object per text frame:
//! `{"target": "<event name>", "arguments": [<payload>, ...]}`. Event names
//! are configuration values (see [`crate::config::RealtimeConfig`]), not a
//! structural contract; the envelope itself is the only shape this module
//! assumes.

use serde::Deserialize;

/// Raw inbound frame as sent by the hub.
#[derive(Debug, Deserialize)]
pub(crate) struct HubFrame {
    pub target: String,
    #[serde(default)]
    pub arguments: Vec<serde_json::Value>,
}

/// A named event delivered by the hub.
///
/// `payload` is the first envelope argument (`Null` when the server sent
/// none); consumers decode it into their own types and drop it if malformed.
#[derive(Debug, Clone)]
pub struct HubEvent {
    pub name: String,
    pub payload: serde_json::Value,
}

impl From<HubFrame> for HubEvent {
    fn from(frame: HubFrame) -> Self {
        let payload = frame
            .arguments
            .into_iter()
            .next()
            .unwrap_or(serde_json::Value::Null);
        Self {
            name: frame.target,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_with_payload() {
        let frame: HubFrame = serde_json::from_value(json!({
            "target": "ReceiveNotification",
            "arguments": [{"id": "n-1", "title": "Hello"}],
        }))
        .expect("valid frame");

        let event = HubEvent::from(frame);
        assert_eq!(event.name, "ReceiveNotification");
        assert_eq!(event.payload["id"], "n-1");
    }

    #[test]
    fn test_frame_without_arguments() {
        let frame: HubFrame =
            serde_json::from_value(json!({"target": "Ping"})).expect("valid frame");

        let event = HubEvent::from(frame);
        assert_eq!(event.name, "Ping");
        assert!(event.payload.is_null());
    }

    #[test]
    fn test_frame_missing_target_is_rejected() {
        let result = serde_json::from_value::<HubFrame>(json!({"arguments": []}));
        assert!(result.is_err());
    }

    #[test]
    fn test_extra_arguments_beyond_first_are_ignored() {
        let frame: HubFrame = serde_json::from_value(json!({
            "target": "NotificationCountUpdated",
            "arguments": [4, "ignored"],
        }))
        .expect("valid frame");

        let event = HubEvent::from(frame);
        assert_eq!(event.payload, json!(4));
    }
}
