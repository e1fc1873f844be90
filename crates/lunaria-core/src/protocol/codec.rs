//! JSON codec for the discovery channel and the seed HTTP API payloads.
//!
//! Every decoder is a strict schema check: the input must be a JSON object
//! (or array, for the listing) carrying every required field with the right
//! type, and the seed id must be non-empty.  Unknown extra fields are ignored
//! so older clients keep working against newer seeds.
//!
//! Wire field names are camelCase (`seedId`), Rust field names snake_case.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::seed::{Announcement, SeedIdentity, SeedStatus};

/// Errors that can occur while encoding or decoding a payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The bytes are not valid JSON of the expected shape (includes missing
    /// fields and wrong field types).
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The payload parsed but a field value is unusable.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    /// The value could not be serialized.
    #[error("failed to encode payload: {0}")]
    Encode(String),
}

// ── Wire schemas ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnouncementOut<'a> {
    seed_id: &'a str,
    name: &'a str,
    location: &'a str,
    owner: &'a str,
    port: u16,
    timestamp: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnouncementIn {
    seed_id: String,
    name: String,
    location: String,
    owner: String,
    port: u16,
    timestamp: u64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProbeWire {
    seed_id: String,
    name: String,
    location: String,
    owner: String,
    port: u16,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusWire {
    seed_id: String,
    name: String,
    location: String,
    owner: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an [`Announcement`] into a single UDP datagram payload.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use lunaria_core::{decode_announcement, encode_announcement, Announcement, SeedIdentity};
///
/// let announcement = Announcement {
///     identity: SeedIdentity {
///         seed_id: "seed-1a2b3c4d".into(),
///         name: "Kitchen Basil".into(),
///         location: "Kitchen".into(),
///         owner: "ada".into(),
///         port: 4269,
///     },
///     timestamp: 1_700_000_000_000,
/// };
/// let bytes = encode_announcement(&announcement).unwrap();
/// assert_eq!(decode_announcement(&bytes).unwrap(), announcement);
/// ```
pub fn encode_announcement(announcement: &Announcement) -> Result<Vec<u8>, ProtocolError> {
    let id = &announcement.identity;
    let wire = AnnouncementOut {
        seed_id: &id.seed_id,
        name: &id.name,
        location: &id.location,
        owner: &id.owner,
        port: id.port,
        timestamp: announcement.timestamp,
    };
    serde_json::to_vec(&wire).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Decodes an announcement datagram.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the datagram is not a well-formed
/// announcement.  Callers on the discovery channel drop such datagrams.
pub fn decode_announcement(bytes: &[u8]) -> Result<Announcement, ProtocolError> {
    let wire: AnnouncementIn = parse(bytes)?;
    let identity = validated_identity(wire.seed_id, wire.name, wire.location, wire.owner, wire.port)?;
    Ok(Announcement {
        identity,
        timestamp: wire.timestamp,
    })
}

/// Encodes the body a seed returns from `GET /discovery`.
pub fn encode_probe(identity: &SeedIdentity) -> Result<Vec<u8>, ProtocolError> {
    let wire = ProbeWire {
        seed_id: identity.seed_id.clone(),
        name: identity.name.clone(),
        location: identity.location.clone(),
        owner: identity.owner.clone(),
        port: identity.port,
    };
    serde_json::to_vec(&wire).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Decodes the body of a `GET /discovery` probe response.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the body is not a well-formed identity.
pub fn decode_probe(bytes: &[u8]) -> Result<SeedIdentity, ProtocolError> {
    let wire: ProbeWire = parse(bytes)?;
    validated_identity(wire.seed_id, wire.name, wire.location, wire.owner, wire.port)
}

/// Encodes the body a seed returns from `GET /status`.
pub fn encode_status(status: &SeedStatus) -> Result<Vec<u8>, ProtocolError> {
    let wire = StatusWire {
        seed_id: status.seed_id.clone(),
        name: status.name.clone(),
        location: status.location.clone(),
        owner: status.owner.clone(),
    };
    serde_json::to_vec(&wire).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Decodes the body of a `GET /status` response.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the body is not a well-formed status object.
pub fn decode_status(bytes: &[u8]) -> Result<SeedStatus, ProtocolError> {
    let wire: StatusWire = parse(bytes)?;
    require_seed_id(&wire.seed_id)?;
    Ok(SeedStatus {
        seed_id: wire.seed_id,
        name: wire.name,
        location: wire.location,
        owner: wire.owner,
    })
}

/// Decodes the body of a `GET /photos` response: a JSON array of file names.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if the body is not an array of strings.
pub fn decode_photo_list(bytes: &[u8]) -> Result<Vec<String>, ProtocolError> {
    parse(bytes)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(bytes).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

fn require_seed_id(seed_id: &str) -> Result<(), ProtocolError> {
    if seed_id.trim().is_empty() {
        return Err(ProtocolError::InvalidField {
            field: "seedId",
            reason: "must not be empty",
        });
    }
    Ok(())
}

fn validated_identity(
    seed_id: String,
    name: String,
    location: String,
    owner: String,
    port: u16,
) -> Result<SeedIdentity, ProtocolError> {
    require_seed_id(&seed_id)?;
    if port == 0 {
        return Err(ProtocolError::InvalidField {
            field: "port",
            reason: "must be a non-zero TCP port",
        });
    }
    Ok(SeedIdentity {
        seed_id,
        name,
        location,
        owner,
        port,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Announcement {
        Announcement {
            identity: SeedIdentity {
                seed_id: "seed-1a2b3c4d".to_string(),
                name: "Kitchen Basil".to_string(),
                location: "Kitchen".to_string(),
                owner: "ada".to_string(),
                port: 4269,
            },
            timestamp: 1_700_000_000_123,
        }
    }

    #[test]
    fn test_encode_announcement_uses_camel_case_field_names() {
        // Act
        let bytes = encode_announcement(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        // Assert
        assert_eq!(value["seedId"], "seed-1a2b3c4d");
        assert_eq!(value["port"], 4269);
        assert_eq!(value["timestamp"], 1_700_000_000_123u64);
    }

    #[test]
    fn test_decode_announcement_accepts_reference_payload() {
        // Arrange: a payload as produced by existing seeds, including the
        // optional `ip` field some of them attach.
        let raw = br#"{"seedId":"seed-9f","name":"Mint","location":"Balcony","owner":"bo","ip":"10.0.0.4","port":4269,"timestamp":1700000000000}"#;

        // Act
        let decoded = decode_announcement(raw).unwrap();

        // Assert
        assert_eq!(decoded.identity.seed_id, "seed-9f");
        assert_eq!(decoded.identity.location, "Balcony");
        assert_eq!(decoded.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_decode_announcement_rejects_missing_field() {
        let raw = br#"{"seedId":"seed-9f","name":"Mint","location":"Balcony","owner":"bo","port":4269}"#;
        assert!(matches!(
            decode_announcement(raw),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_announcement_rejects_wrong_field_type() {
        let raw = br#"{"seedId":"seed-9f","name":"Mint","location":"Balcony","owner":"bo","port":"4269","timestamp":1}"#;
        assert!(decode_announcement(raw).is_err());
    }

    #[test]
    fn test_decode_announcement_rejects_out_of_range_port() {
        let raw = br#"{"seedId":"seed-9f","name":"Mint","location":"Balcony","owner":"bo","port":70000,"timestamp":1}"#;
        assert!(decode_announcement(raw).is_err());
    }

    #[test]
    fn test_decode_announcement_rejects_empty_seed_id() {
        let raw = br#"{"seedId":"  ","name":"Mint","location":"Balcony","owner":"bo","port":4269,"timestamp":1}"#;
        assert_eq!(
            decode_announcement(raw),
            Err(ProtocolError::InvalidField {
                field: "seedId",
                reason: "must not be empty",
            })
        );
    }

    #[test]
    fn test_decode_announcement_rejects_garbage_without_panicking() {
        let inputs: [&[u8]; 6] = [
            b"",
            b"\xff\xfe\x00",
            b"null",
            b"[1,2,3]",
            b"{\"seedId\":",
            b"FLARE_DISCOVER",
        ];
        for input in inputs {
            assert!(decode_announcement(input).is_err(), "input {input:?}");
        }
    }

    #[test]
    fn test_decode_probe_rejects_port_zero() {
        let raw = br#"{"seedId":"seed-9f","name":"Mint","location":"Balcony","owner":"bo","port":0}"#;
        assert!(matches!(
            decode_probe(raw),
            Err(ProtocolError::InvalidField { field: "port", .. })
        ));
    }

    #[test]
    fn test_decode_probe_round_trips_identity() {
        let identity = sample().identity;
        let bytes = encode_probe(&identity).unwrap();
        assert_eq!(decode_probe(&bytes).unwrap(), identity);
    }

    #[test]
    fn test_decode_status_requires_all_four_fields() {
        let raw = br#"{"seedId":"seed-9f","name":"Mint","owner":"bo"}"#;
        assert!(decode_status(raw).is_err());
    }

    #[test]
    fn test_decode_status_accepts_status_body() {
        let raw = br#"{"seedId":"seed-9f","name":"Mint","location":"Balcony","owner":"bo"}"#;
        let status = decode_status(raw).unwrap();
        assert_eq!(status.name, "Mint");
    }

    #[test]
    fn test_decode_photo_list_accepts_array_of_names() {
        let raw = br#"["photo-A.jpg","photo-B.jpg"]"#;
        assert_eq!(
            decode_photo_list(raw).unwrap(),
            vec!["photo-A.jpg".to_string(), "photo-B.jpg".to_string()]
        );
    }

    #[test]
    fn test_decode_photo_list_accepts_empty_array() {
        assert!(decode_photo_list(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_photo_list_rejects_non_string_entries() {
        assert!(decode_photo_list(br#"["a.jpg", 3]"#).is_err());
        assert!(decode_photo_list(br#"{"photos":[]}"#).is_err());
    }
}
