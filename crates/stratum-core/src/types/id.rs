//! Content identifiers.
//!
//! Every directory and file is addressed by a 12-byte [`ObjectId`]: a 4-byte
//! big-endian Unix timestamp followed by 8 random bytes. On the wire and in
//! storage it is rendered as 24 lowercase hex characters. Typed wrappers keep
//! a `FileId` from being passed where a `DirectoryId` is expected.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of a content identifier in bytes.
pub const OBJECT_ID_LEN: usize = 12;

/// Error returned when parsing an [`ObjectId`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectIdError {
    /// The input was not 24 characters long.
    #[error("object id must be {expected} hex characters, got {actual}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Observed length.
        actual: usize,
    },
    /// The input contained non-hex characters.
    #[error("object id is not valid hex")]
    InvalidHex,
}

/// A 12-byte content identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Generate a fresh identifier stamped with the current time.
    pub fn new() -> Self {
        let secs = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let random: u64 = rand::random();

        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..].copy_from_slice(&random.to_be_bytes());
        Self(bytes)
    }

    /// Wrap raw bytes.
    pub const fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw bytes.
    pub const fn bytes(&self) -> [u8; OBJECT_ID_LEN] {
        self.0
    }

    /// Parse from 24 hex characters.
    pub fn parse_hex(s: &str) -> Result<Self, ObjectIdError> {
        if s.len() != OBJECT_ID_LEN * 2 {
            return Err(ObjectIdError::InvalidLength {
                expected: OBJECT_ID_LEN * 2,
                actual: s.len(),
            });
        }
        let mut bytes = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| ObjectIdError::InvalidHex)?;
        Ok(Self(bytes))
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Creation time encoded in the first four bytes.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        DateTime::from_timestamp(secs as i64, 0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Macro to define a newtype ID wrapper around `ObjectId`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub ObjectId);

        impl $name {
            /// Create a new identifier.
            pub fn new() -> Self {
                Self(ObjectId::new())
            }

            /// Return the inner content identifier.
            pub fn object_id(&self) -> ObjectId {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ObjectIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                ObjectId::parse_hex(s).map(Self)
            }
        }

        impl From<ObjectId> for $name {
            fn from(id: ObjectId) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ObjectId {
            fn from(id: $name) -> ObjectId {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of a directory document.
    DirectoryId
);

define_id!(
    /// Identifier of a file document.
    FileId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let id = ObjectId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 24);
        assert_eq!(text.parse::<ObjectId>().unwrap(), id);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            ObjectId::parse_hex("abc"),
            Err(ObjectIdError::InvalidLength {
                expected: 24,
                actual: 3
            })
        );
        assert_eq!(
            ObjectId::parse_hex("zzzzzzzzzzzzzzzzzzzzzzzz"),
            Err(ObjectIdError::InvalidHex)
        );
    }

    #[test]
    fn timestamp_prefix_is_recent() {
        let id = ObjectId::new();
        let ts = id.timestamp().unwrap();
        assert!((Utc::now() - ts).num_seconds().abs() < 5);
    }

    #[test]
    fn typed_ids_serialize_as_plain_hex() {
        let id = DirectoryId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0.to_hex()));
        let back: DirectoryId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
