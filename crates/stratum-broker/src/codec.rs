//! Content id ⇄ uuid mapping used on the coordinator wire.
//!
//! The coordinator addresses content by uuid. A 12-byte content id is packed
//! into a 16-byte uuid as follows:
//!
//! ```text
//! uuid byte   0..6    6   7   8   9   10..16
//!             id 0..6 V   0   R   0   id 6..12
//! ```
//!
//! `V` carries the version nibble (4) and `R` the RFC 4122 variant bits,
//! both stamped over zero bytes. Bytes 6..10 are a marker region that never
//! carries content, so extraction ignores them.

use stratum_core::error::AppError;
use stratum_core::types::{OBJECT_ID_LEN, ObjectId};
use uuid::Uuid;

/// Failures decoding identifiers and wire messages.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Neither 24 hex characters nor a uuid.
    #[error("identifier is neither a content id nor a derived uuid: {0}")]
    Unrecognized(String),
    /// The bincode payload did not decode.
    #[error("malformed message: {0}")]
    Malformed(#[from] bincode::Error),
}

impl From<CodecError> for AppError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Unrecognized(_) => AppError::validation(err.to_string()),
            CodecError::Malformed(_) => AppError::internal(err.to_string()),
        }
    }
}

/// Pack a content id into the uuid the coordinator knows it by.
pub fn derive_content_id(id: ObjectId) -> Uuid {
    let src = id.bytes();
    let mut b = [0u8; 16];
    b[..6].copy_from_slice(&src[..6]);
    b[10..].copy_from_slice(&src[6..]);
    b[6] = (b[6] & 0x0f) | 0x40;
    b[8] = (b[8] & 0x3f) | 0x80;
    Uuid::from_bytes(b)
}

/// Recover the content id packed by [`derive_content_id`].
pub fn extract_content_id(uuid: &Uuid) -> ObjectId {
    let src = uuid.as_bytes();
    let mut b = [0u8; OBJECT_ID_LEN];
    b[..6].copy_from_slice(&src[..6]);
    b[6..].copy_from_slice(&src[10..]);
    ObjectId::from_bytes(b)
}

/// Parse a node id given either as 24 hex characters or as a derived uuid.
pub fn parse_node_id(raw: &str) -> Result<ObjectId, CodecError> {
    if let Ok(id) = ObjectId::parse_hex(raw) {
        return Ok(id);
    }
    Uuid::parse_str(raw)
        .map(|u| extract_content_id(&u))
        .map_err(|_| CodecError::Unrecognized(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_the_twelve_content_bytes() {
        for _ in 0..64 {
            let id = ObjectId::new();
            assert_eq!(extract_content_id(&derive_content_id(id)), id);
        }
    }

    #[test]
    fn marker_region_is_fixed() {
        let id = ObjectId::from_bytes([0xff; OBJECT_ID_LEN]);
        let b = *derive_content_id(id).as_bytes();
        assert_eq!(b[6], 0x40);
        assert_eq!(b[7], 0);
        assert_eq!(b[8], 0x80);
        assert_eq!(b[9], 0);
        assert_eq!(derive_content_id(id).get_version_num(), 4);
    }

    #[test]
    fn node_id_accepts_both_forms() {
        let id = ObjectId::new();
        assert_eq!(parse_node_id(&id.to_hex()).unwrap(), id);
        assert_eq!(
            parse_node_id(&derive_content_id(id).to_string()).unwrap(),
            id
        );
        assert!(matches!(
            parse_node_id("not-an-id"),
            Err(CodecError::Unrecognized(_))
        ));
    }
}
