//! Wire messages exchanged with the storage coordinator.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::CodecError;

/// Operation requested from the coordinator. Variant order is the wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Reserve space for new content.
    Create,
    /// Resize existing content.
    Update,
    /// Locate existing content.
    Open,
    /// Release content.
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Open => write!(f, "open"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Outbound request published on the coordinator topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Key the response must echo.
    pub correlation_id: Uuid,
    /// Host the coordinator calls back.
    pub host: String,
    /// Requested operation.
    pub operation: Operation,
    /// Content id packed as a uuid.
    pub derived_content_id: Uuid,
    /// Content size in bytes.
    pub size: u64,
}

/// Inbound response delivered through the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Echo of the request's correlation id.
    pub correlation_id: Uuid,
    /// Storage node serving the content.
    pub host: String,
    /// Connection handle on that node.
    pub connection_id: Uuid,
    /// Empty on success.
    #[serde(default)]
    pub error: String,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serialize(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    Ok(bincode::deserialize(bytes)?)
}

impl Request {
    /// Serialize for publishing.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode(self)
    }

    /// Parse a published request.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode(bytes)
    }
}

impl Response {
    /// Serialize a webhook body.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode(self)
    }

    /// Parse a webhook body.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_tags_are_stable() {
        let tags: Vec<Vec<u8>> = [
            Operation::Create,
            Operation::Update,
            Operation::Open,
            Operation::Delete,
        ]
        .iter()
        .map(|op| bincode::serialize(op).unwrap())
        .collect();
        assert_eq!(tags[0], 0u32.to_le_bytes());
        assert_eq!(tags[1], 1u32.to_le_bytes());
        assert_eq!(tags[2], 2u32.to_le_bytes());
        assert_eq!(tags[3], 3u32.to_le_bytes());
    }

    #[test]
    fn truncated_response_is_malformed() {
        let body = Response {
            correlation_id: Uuid::new_v4(),
            host: "node-1:9000".into(),
            connection_id: Uuid::new_v4(),
            error: String::new(),
        }
        .encode()
        .unwrap();
        assert!(matches!(
            Response::decode(&body[..body.len() - 3]),
            Err(CodecError::Malformed(_))
        ));
    }
}
