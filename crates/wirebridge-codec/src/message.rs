use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A typed, decoded application-level unit exchanged between peer and process.
///
/// A message is a type identifier plus an opaque payload of named fields.
/// Only the codec and the handlers registered for the type interpret the
/// payload; the gateway routes on the type identifier alone. Messages are
/// immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    payload: Map<String, Value>,
}

impl Message {
    /// Create a message with an empty payload.
    pub fn new(msg_type: impl Into<String>) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload: Map::new(),
        }
    }

    /// Create a message with an explicit payload.
    pub fn with_payload(msg_type: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload,
        }
    }

    /// Add a named field. Consumes and returns the message so construction
    /// chains.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(name.into(), value.into());
        self
    }

    /// The type identifier handlers are keyed by.
    pub fn msg_type(&self) -> &str {
        &self.msg_type
    }

    /// The payload fields.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Look up a single payload field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }
}
