//! # Driver Module
//!
//! Core driver implementation for RethinkDB.
//!
//! This module provides the primary API for connecting to and interacting
//! with RethinkDB servers over the ReQL wire protocol.
//!
//! ## Core Types
//!
//! - [`Connection`] - A single multiplexed connection to a server
//! - [`Cursor`] - Streaming iterator over a query's batched results
//! - [`Datum`] - Native representation of server values
//! - [`ConnectOptions`] / [`RunOptions`] - Connection and query options
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rethink_driver::{connect, ConnectOptions, RunOptions};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Connect with defaults (localhost:28015)
//! let conn = connect(()).await?;
//!
//! // Run a pre-built term tree
//! let term = json!([15, ["users"]]);
//! let mut cursor = conn.run(&term, RunOptions::default()).await?;
//!
//! while let Some(row) = cursor.try_next().await? {
//!     println!("{}", row);
//! }
//!
//! conn.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Submodules
//!
//! - [`connection`] - Connection engine and entry surface
//! - [`cursor`] - Streaming cursor and `Stream` adapter
//! - [`convert`] - Pseudo-type conversion
//! - [`datum`] - Native value type
//! - [`term`] - Term-builder seam

pub mod config;
pub mod connection;
pub mod convert;
pub mod cursor;
pub mod datum;
pub mod error;
pub mod term;

// Re-exports
pub use config::{ConnectOptions, RunOptions, FORMAT_NATIVE, FORMAT_RAW};
pub use connection::{connect, is_connection, Connection, ConnectionState};
pub use convert::convert_datum;
pub use cursor::{Cursor, CursorStream};
pub use datum::Datum;
pub use error::{DriverError, DriverResult, ServerMessage};
pub use term::{RawTerm, Term};
