//! Protocol module containing the well-known ports and the JSON codecs.
//!
//! # Wire surfaces
//!
//! | Surface                  | Transport                  | Payload                              |
//! |--------------------------|----------------------------|--------------------------------------|
//! | Announcement             | UDP broadcast, port 4270   | `{seedId,name,location,owner,port,timestamp}` |
//! | Active-scan probe        | `GET :4269/discovery`      | `{seedId,name,location,owner,port}`  |
//! | Status                   | `GET /status`              | `{seedId,name,location,owner}`       |
//! | Photo listing            | `GET /photos`              | `["a.jpg", ...]`                     |
//! | Photo body               | `GET /photo/{filename}`    | raw bytes                            |

pub mod codec;

pub use codec::{
    decode_announcement, decode_photo_list, decode_probe, decode_status, encode_announcement,
    encode_probe, encode_status, ProtocolError,
};

/// UDP port seeds broadcast announcements on and clients listen on.
pub const DISCOVERY_PORT: u16 = 4270;

/// Default TCP port of a seed's HTTP API (also the active-scan probe port).
pub const API_PORT: u16 = 4269;

/// Path probed on every candidate host during an active scan.
pub const DISCOVERY_PATH: &str = "/discovery";

/// Upper bound for a single discovery datagram.
pub const MAX_DATAGRAM_SIZE: usize = 8192;
