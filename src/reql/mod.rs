//! # ReQL Wire Protocol Implementation
//!
//! Low-level implementation of the ReQL JSON wire protocol used to talk to
//! RethinkDB servers.
//!
//! ## Overview
//!
//! The wire protocol multiplexes many concurrent queries over a single TCP
//! connection by tagging every frame with a 64-bit token. This module
//! provides:
//!
//! - **Handshake** - Protocol version and wire format negotiation
//! - **Message Types** - Query/response message handling
//! - **Codec** - Async frame framing for Tokio
//!
//! ## Framing
//!
//! Every message in either direction is a frame:
//!
//! ```text
//! token (8 bytes LE) || length (4 bytes LE) || JSON payload
//! ```
//!
//! Queries are JSON arrays `[type_tag, term?, global_optargs?]`; responses
//! are JSON objects `{t, r, b?, p?, n?}`.
//!
//! ## Submodules
//!
//! - [`handshake`] - Version/format magic numbers and status exchange
//! - [`message`] - Query and response message types
//! - [`codec`] - Tokio codec for async I/O
//! - [`error`] - Protocol error types
//!
//! ## Note
//!
//! Most users should use the high-level [`crate::driver`] module instead of
//! interacting with the wire protocol directly.

pub mod codec;
pub mod error;
pub mod handshake;
pub mod message;

pub use codec::{Frame, FrameCodec, ResponseCodec};
pub use error::{WireError, WireResult};
pub use handshake::{STATUS_SUCCESS, VERSION_V0_3, WIRE_PROTOCOL_JSON};
pub use message::{Query, QueryType, Response, ResponseType};
