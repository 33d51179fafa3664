//! Bus message envelope.
//!
//! Every interaction with the outside world travels as a [`Message`]:
//! - `msg_type` - Routing key (e.g., "skill.converse.request")
//! - `data` - Message-specific JSON payload
//! - `context` - Routing and session context that flows across replies
//!
//! `forward` keeps the context untouched, `reply` swaps `source` and
//! `destination` so the answer travels back to whoever asked.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use uuid::Uuid;

use super::Timestamp;

/// Unique identifier for a message instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Creates a new random MessageId using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport envelope for bus messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique ID for this message instance.
    pub id: MessageId,

    /// Message type used for routing.
    #[serde(rename = "type")]
    pub msg_type: String,

    /// Payload; always a JSON object.
    pub data: JsonValue,

    /// Routing/session context carried across forwards and replies.
    pub context: Map<String, JsonValue>,

    /// When the message was created.
    pub occurred_at: Timestamp,
}

impl Message {
    /// Creates a message with empty context.
    ///
    /// Non-object payloads are replaced by an empty object.
    pub fn new(msg_type: impl Into<String>, data: JsonValue) -> Self {
        Self {
            id: MessageId::new(),
            msg_type: msg_type.into(),
            data: normalize_data(data),
            context: Map::new(),
            occurred_at: Timestamp::now(),
        }
    }

    /// Adds (or replaces) a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// New message of another type that keeps this message's context.
    pub fn forward(&self, msg_type: impl Into<String>, data: JsonValue) -> Self {
        Self {
            id: MessageId::new(),
            msg_type: msg_type.into(),
            data: normalize_data(data),
            context: self.context.clone(),
            occurred_at: Timestamp::now(),
        }
    }

    /// New message answering this one: context is copied with `source` and
    /// `destination` swapped.
    pub fn reply(&self, msg_type: impl Into<String>, data: JsonValue) -> Self {
        let mut reply = self.forward(msg_type, data);
        let source = self.context.get("source").cloned();
        let destination = self.context.get("destination").cloned();
        match destination {
            Some(dest) => reply.context.insert("source".to_string(), dest),
            None => reply.context.remove("source"),
        };
        match source {
            Some(src) => reply.context.insert("destination".to_string(), src),
            None => reply.context.remove("destination"),
        };
        reply
    }

    /// String field from `data`.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(JsonValue::as_str)
    }

    /// String list field from `data`; non-string entries are skipped.
    pub fn data_strings(&self, key: &str) -> Vec<String> {
        self.data
            .get(key)
            .and_then(JsonValue::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// String field from `context`.
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(JsonValue::as_str)
    }

    /// Deserialize the payload to a specific type.
    pub fn data_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}

fn normalize_data(data: JsonValue) -> JsonValue {
    match data {
        JsonValue::Object(_) => data,
        _ => JsonValue::Object(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_ids_are_unique() {
        assert_ne!(MessageId::new(), MessageId::new());
    }

    #[test]
    fn non_object_payload_becomes_empty_object() {
        let msg = Message::new("a", json!(["x"]));
        assert_eq!(msg.data, json!({}));
    }

    #[test]
    fn forward_keeps_context_and_replaces_payload() {
        let msg = Message::new("a", json!({"x": 1}))
            .with_context("source", json!("audio"))
            .with_context("skill_id", json!("s"));

        let fwd = msg.forward("b", json!({"y": 2}));

        assert_eq!(fwd.msg_type, "b");
        assert_eq!(fwd.data, json!({"y": 2}));
        assert_eq!(fwd.context_str("source"), Some("audio"));
        assert_eq!(fwd.context_str("skill_id"), Some("s"));
        assert_ne!(fwd.id, msg.id);
    }

    #[test]
    fn reply_swaps_source_and_destination() {
        let msg = Message::new("a", json!({}))
            .with_context("source", json!("audio"))
            .with_context("destination", json!("skills"));

        let reply = msg.reply("b", json!({}));

        assert_eq!(reply.context_str("source"), Some("skills"));
        assert_eq!(reply.context_str("destination"), Some("audio"));
    }

    #[test]
    fn reply_without_destination_drops_source() {
        let msg = Message::new("a", json!({})).with_context("source", json!("audio"));
        let reply = msg.reply("b", json!({}));

        assert_eq!(reply.context_str("source"), None);
        assert_eq!(reply.context_str("destination"), Some("audio"));
    }

    #[test]
    fn data_strings_skips_non_strings() {
        let msg = Message::new("a", json!({"utterances": ["yes", 3, "no"]}));
        assert_eq!(msg.data_strings("utterances"), vec!["yes", "no"]);
        assert!(msg.data_strings("missing").is_empty());
    }

    #[test]
    fn message_serializes_type_field() {
        let msg = Message::new("speak", json!({"utterance": "hi"}));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "speak");
        assert_eq!(value["data"]["utterance"], "hi");
    }
}
