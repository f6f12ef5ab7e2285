//! ReQL frame codec for tokio_util.
//!
//! Every message in either direction is framed as
//! `token(8B LE) || length(4B LE) || payload`, where `length` is the exact
//! byte count of the JSON payload.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::error::WireError;
use super::message::{Query, Response};

/// Frame header size: 8-byte token + 4-byte length.
pub const HEADER_SIZE: usize = 12;

/// Default maximum frame body size (64MB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Pack a `u32` as 4 little-endian bytes.
pub fn pack_u32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Pack a `u64` as 8 little-endian bytes.
pub fn pack_u64(value: u64) -> [u8; 8] {
    value.to_le_bytes()
}

/// Unpack 4 little-endian bytes into a `u32`.
pub fn unpack_u32(bytes: [u8; 4]) -> u32 {
    u32::from_le_bytes(bytes)
}

/// Unpack 8 little-endian bytes into a `u64`.
pub fn unpack_u64(bytes: [u8; 8]) -> u64 {
    u64::from_le_bytes(bytes)
}

/// A raw frame: query token plus undecoded payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Query token multiplexing this frame onto the connection
    pub token: u64,
    /// JSON payload bytes
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame from a token and payload bytes.
    pub fn new(token: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            token,
            payload: payload.into(),
        }
    }
}

/// Frame codec handling header/body framing.
#[derive(Debug)]
pub struct FrameCodec {
    /// Maximum accepted frame body size
    max_frame_size: usize,
    /// Parsed header awaiting its body: (token, body length)
    pending: Option<(u64, usize)>,
}

impl FrameCodec {
    /// Create a codec with default settings.
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            pending: None,
        }
    }

    /// Create a codec with a custom max frame size.
    pub fn with_max_size(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            pending: None,
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Need header
        if self.pending.is_none() {
            if src.len() < HEADER_SIZE {
                return Ok(None);
            }

            let mut token_bytes = [0u8; 8];
            token_bytes.copy_from_slice(&src[0..8]);
            let mut len_bytes = [0u8; 4];
            len_bytes.copy_from_slice(&src[8..12]);

            let token = unpack_u64(token_bytes);
            let len = unpack_u32(len_bytes) as usize;

            if len > self.max_frame_size {
                return Err(WireError::FrameTooLarge {
                    size: len,
                    max: self.max_frame_size,
                });
            }

            src.advance(HEADER_SIZE);
            src.reserve(len);
            self.pending = Some((token, len));
        }

        // Need body
        let Some((token, len)) = self.pending else {
            return Ok(None);
        };
        if src.len() < len {
            return Ok(None);
        }

        let payload = src.split_to(len).freeze();
        self.pending = None;

        Ok(Some(Frame { token, payload }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = WireError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(HEADER_SIZE + item.payload.len());
        dst.put_slice(&pack_u64(item.token));
        dst.put_slice(&pack_u32(item.payload.len() as u32));
        dst.put_slice(&item.payload);
        Ok(())
    }
}

/// Codec layering JSON decode/encode on top of the frame codec.
///
/// Decodes inbound frames into `(token, Response)` pairs and encodes
/// outbound `(token, Query)` pairs.
#[derive(Debug, Default)]
pub struct ResponseCodec {
    inner: FrameCodec,
}

impl ResponseCodec {
    /// Create a new response codec.
    pub fn new() -> Self {
        Self {
            inner: FrameCodec::new(),
        }
    }
}

impl Decoder for ResponseCodec {
    type Item = (u64, Response);
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.inner.decode(src)? {
            Some(frame) => {
                let response: Response = serde_json::from_slice(&frame.payload)?;
                Ok(Some((frame.token, response)))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<(u64, Query)> for ResponseCodec {
    type Error = WireError;

    fn encode(&mut self, item: (u64, Query), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (token, query) = item;
        let payload = query.to_payload()?;
        self.inner.encode(Frame::new(token, payload), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pack_unpack_round_trip() {
        assert_eq!(unpack_u32(pack_u32(0xdead_beef)), 0xdead_beef);
        assert_eq!(unpack_u64(pack_u64(u64::MAX - 7)), u64::MAX - 7);
        assert_eq!(pack_u32(1), [1, 0, 0, 0]);
    }

    #[test]
    fn test_frame_round_trip() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();

        let frame = Frame::new(42, &b"{\"t\":1,\"r\":[true]}"[..]);
        codec.encode(frame.clone(), &mut buf).unwrap();

        // token LE, length LE, then payload
        assert_eq!(&buf[0..8], &42u64.to_le_bytes());
        assert_eq!(&buf[8..12], &(frame.payload.len() as u32).to_le_bytes());

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_header() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&[0u8; HEADER_SIZE - 1][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), HEADER_SIZE - 1);
    }

    #[test]
    fn test_partial_body() {
        let mut codec = FrameCodec::new();
        let mut full = BytesMut::new();
        codec
            .encode(Frame::new(7, &b"[2]"[..]), &mut full)
            .unwrap();

        // feed header plus one body byte, then the rest
        let mut buf = BytesMut::from(&full[..HEADER_SIZE + 1]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&full[HEADER_SIZE + 1..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.token, 7);
        assert_eq!(&frame.payload[..], b"[2]");
    }

    #[test]
    fn test_multiple_frames() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();

        for token in 1..=3u64 {
            codec
                .encode(Frame::new(token, &b"{}"[..]), &mut buf)
                .unwrap();
        }

        for token in 1..=3u64 {
            let frame = codec.decode(&mut buf).unwrap().unwrap();
            assert_eq!(frame.token, token);
        }
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_frame_too_large() {
        let mut codec = FrameCodec::with_max_size(16);
        let mut buf = BytesMut::new();
        buf.put_slice(&pack_u64(1));
        buf.put_slice(&pack_u32(17));
        buf.put_slice(&[0u8; 17]);

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(WireError::FrameTooLarge { .. })));
    }

    #[test]
    fn test_response_codec_decode() {
        let mut codec = ResponseCodec::new();
        let mut buf = BytesMut::new();

        let payload = br#"{"t":3,"r":[1,2,3]}"#;
        let mut frames = FrameCodec::new();
        frames
            .encode(Frame::new(9, &payload[..]), &mut buf)
            .unwrap();

        let (token, response) = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(token, 9);
        assert_eq!(response.t, 3);
        assert_eq!(response.r, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_response_codec_rejects_bad_json() {
        let mut codec = ResponseCodec::new();
        let mut buf = BytesMut::new();

        let mut frames = FrameCodec::new();
        frames
            .encode(Frame::new(9, &b"{not json"[..]), &mut buf)
            .unwrap();

        assert!(matches!(codec.decode(&mut buf), Err(WireError::Json(_))));
    }

    #[test]
    fn test_response_codec_encode_query() {
        let mut codec = ResponseCodec::new();
        let mut buf = BytesMut::new();

        codec.encode((3, Query::Continue), &mut buf).unwrap();

        assert_eq!(&buf[0..8], &3u64.to_le_bytes());
        assert_eq!(&buf[8..12], &3u32.to_le_bytes());
        assert_eq!(&buf[12..], b"[2]");
    }
}
