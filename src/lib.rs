//! # RethinkDB Driver
//!
//! A Rust driver for [RethinkDB](https://rethinkdb.com) speaking the ReQL
//! JSON wire protocol.
//!
//! ## Features
//!
//! - **Token Multiplexing** - Many concurrent queries over one TCP connection
//! - **Async/Await** - Built on Tokio for high-performance async operations
//! - **Streaming Cursors** - Batched results with transparent CONTINUE
//!   round trips, including unbounded change feeds
//! - **Pseudo-type Conversion** - Server TIME, GROUPED_DATA, and BINARY
//!   encodings become native timestamps, group records, and byte buffers
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! rethink-driver = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use rethink_driver::{connect, ConnectOptions, RunOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect
//!     let conn = connect(
//!         ConnectOptions::new()
//!             .with_host("localhost")
//!             .with_port(28015)
//!             .with_db("test"),
//!     )
//!     .await?;
//!
//!     // Run a query (term trees come from an external builder)
//!     let term = json!([15, ["users"]]);
//!     let mut cursor = conn.run(&term, RunOptions::default()).await?;
//!
//!     // Iterate results
//!     while let Some(row) = cursor.try_next().await? {
//!         println!("{:?}", row);
//!     }
//!
//!     // Clean up
//!     conn.close().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Cursors
//!
//! A [`Cursor`] pulls rows across response batches, issuing at most one
//! CONTINUE per token at a time. Cursors convert into a
//! [`futures::Stream`](futures::Stream):
//!
//! ```rust,no_run
//! # use rethink_driver::{connect, RunOptions};
//! # use serde_json::json;
//! use tokio_stream::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let conn = connect(()).await?;
//! let term = json!([152, [[15, ["events"]]]]);
//! let cursor = conn.run(&term, RunOptions::default()).await?;
//!
//! let mut stream = cursor.into_stream();
//! while let Some(row) = stream.next().await {
//!     println!("{:?}", row?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Run Options
//!
//! Pseudo-type handling is controlled per query with [`RunOptions`]:
//!
//! ```rust
//! use rethink_driver::{RunOptions, FORMAT_RAW};
//!
//! // Keep TIME objects exactly as the server sent them
//! let opts = RunOptions::new().with_time_format(FORMAT_RAW);
//!
//! // Fire-and-forget write
//! let opts = RunOptions::new().with_noreply(true);
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`DriverResult`]. Server-reported errors keep the
//! connection usable; socket failures close it:
//!
//! ```rust,no_run
//! # use rethink_driver::{connect, DriverError};
//! # async fn example() {
//! match connect("db.internal").await {
//!     Ok(conn) => println!("Connected: {:?}", conn),
//!     Err(DriverError::Driver(msg)) => eprintln!("Connect failed: {}", msg),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`driver`] - Connection, cursor, and value types
//! - [`reql`] - Low-level wire protocol implementation

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod driver;
pub mod reql;

// Re-exports for convenience
pub use driver::{
    connect, convert_datum, is_connection, ConnectOptions, Connection, ConnectionState, Cursor,
    CursorStream, Datum, DriverError, DriverResult, RawTerm, RunOptions, ServerMessage, Term,
    FORMAT_NATIVE, FORMAT_RAW,
};

pub use reql::{Frame, FrameCodec, Query, QueryType, Response, ResponseType, WireError};
