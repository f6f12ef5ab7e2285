//! ReQL protocol handshake implementation.
//!
//! The handshake is a single synchronous exchange:
//! 1. Client sends the 4-byte protocol version magic (little-endian)
//! 2. Client sends the auth key length (4 bytes LE) followed by the key bytes
//! 3. Client sends the 4-byte wire format magic (JSON)
//! 4. Server responds with an ASCII status string terminated by NUL

use bytes::{BufMut, Bytes, BytesMut};

use super::codec::pack_u32;
use super::error::{WireError, WireResult};

/// Protocol version magic for V0_3.
pub const VERSION_V0_3: u32 = 0x5f75_e83e;

/// Wire format magic selecting JSON payloads.
pub const WIRE_PROTOCOL_JSON: u32 = 0x7e69_70c7;

/// Status string the server sends on a successful handshake.
pub const STATUS_SUCCESS: &str = "SUCCESS";

/// Build the client half of the handshake.
///
/// Fields are concatenated with no separators:
/// `version || auth_key_len || auth_key || wire_format`.
pub fn build_handshake(auth_key: &str) -> Bytes {
    let key = auth_key.as_bytes();
    let mut buf = BytesMut::with_capacity(12 + key.len());
    buf.put_slice(&pack_u32(VERSION_V0_3));
    buf.put_slice(&pack_u32(key.len() as u32));
    buf.put_slice(key);
    buf.put_slice(&pack_u32(WIRE_PROTOCOL_JSON));
    buf.freeze()
}

/// Extract the NUL-terminated status string from the receive buffer.
///
/// Returns `None` until a NUL byte has been accumulated. On success the
/// status bytes and the terminator are consumed from the buffer.
pub fn parse_status(buf: &mut BytesMut) -> WireResult<Option<String>> {
    let Some(pos) = buf.iter().position(|&b| b == 0x00) else {
        return Ok(None);
    };
    let line = buf.split_to(pos + 1);
    let status = std::str::from_utf8(&line[..pos])
        .map_err(|_| WireError::Handshake("<non-ascii status>".to_string()))?
        .to_string();
    Ok(Some(status))
}

/// Check a parsed status string, turning anything but `SUCCESS` into an error.
pub fn check_status(status: &str) -> WireResult<()> {
    if status == STATUS_SUCCESS {
        Ok(())
    } else {
        Err(WireError::Handshake(status.to_string()))
    }
}
