//! A2A message and part types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message exchanged between a user and an agent
///
/// Messages are the primary unit of communication. Each message has a role
/// (user or agent) and one or more parts (text, file, or data). Messages are
/// immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,

    /// Message content parts (at least one required)
    pub parts: Vec<Part>,

    /// Optional metadata for the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl Message {
    /// Create a new message with a single text part
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::text(text)],
            metadata: None,
        }
    }

    /// Create a user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an agent message with text content
    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Role::Agent, text)
    }

    /// Add a message part
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Add a metadata field to the message
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Concatenate the text of all text parts, separated by spaces
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from a user
    User,

    /// Message from an agent
    Agent,
}

/// File payload carried by a file part
///
/// Exactly one of `bytes` (base64) or `uri` is expected to be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Base64-encoded file content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,

    /// URI reference to the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// A part of a message or artifact
///
/// A part carries exactly one payload kind: text, file, or data. The wire
/// format tags each part with a `type` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    /// Text content
    Text {
        text: String,

        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<HashMap<String, Value>>,
    },

    /// File reference or inline file content
    File {
        file: FileContent,

        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<HashMap<String, Value>>,
    },

    /// Structured data
    Data {
        data: serde_json::Map<String, Value>,

        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<HashMap<String, Value>>,
    },
}

impl Part {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            metadata: None,
        }
    }

    /// Create a file part with a URI reference
    pub fn file_uri(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self::File {
            file: FileContent {
                name: Some(name.into()),
                uri: Some(uri.into()),
                ..FileContent::default()
            },
            metadata: None,
        }
    }

    /// Create a file part with base64-encoded bytes
    pub fn file_bytes(
        name: impl Into<String>,
        bytes: impl Into<String>,
        mime_type: Option<String>,
    ) -> Self {
        Self::File {
            file: FileContent {
                name: Some(name.into()),
                mime_type,
                bytes: Some(bytes.into()),
                uri: None,
            },
            metadata: None,
        }
    }

    /// Create a data part
    pub fn data(data: serde_json::Map<String, Value>) -> Self {
        Self::Data {
            data,
            metadata: None,
        }
    }

    /// Return the text of this part, if it is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.parts.len(), 1);
        assert_eq!(msg.parts[0].as_text(), Some("Hello, agent!"));
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::user("Test message");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["parts"][0]["type"], "text");
        assert_eq!(json["parts"][0]["text"], "Test message");

        let deserialized: Message = serde_json::from_value(json).unwrap();
        assert_eq!(msg, deserialized);
    }

    #[test]
    fn test_part_tagging() {
        let text = Part::text("Hello");
        let file = Part::file_uri("doc.pdf", "https://example.com/doc.pdf");
        let mut map = serde_json::Map::new();
        map.insert("key".into(), json!("value"));
        let data = Part::data(map);

        assert_eq!(serde_json::to_value(&text).unwrap()["type"], "text");
        assert_eq!(serde_json::to_value(&file).unwrap()["type"], "file");
        assert_eq!(serde_json::to_value(&data).unwrap()["type"], "data");
    }

    #[test]
    fn test_part_deserialization() {
        let part: Part = serde_json::from_value(json!({
            "type": "file",
            "file": {"name": "image.png", "mimeType": "image/png", "uri": "file:///image.png"}
        }))
        .unwrap();

        match part {
            Part::File { file, .. } => {
                assert_eq!(file.name.as_deref(), Some("image.png"));
                assert_eq!(file.mime_type.as_deref(), Some("image/png"));
            }
            _ => panic!("Expected file part"),
        }
    }

    #[test]
    fn test_text_content_joins_text_parts() {
        let msg = Message::user("first")
            .with_part(Part::file_uri("f", "file:///f"))
            .with_part(Part::text("second"));

        assert_eq!(msg.text_content(), "first second");
    }

    #[test]
    fn test_optional_fields_omitted() {
        let msg = Message::agent("Test");
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("metadata").is_none());
        assert!(json["parts"][0].get("metadata").is_none());
    }
}
