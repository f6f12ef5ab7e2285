//! Connection engine for the ReQL wire protocol.
//!
//! Owns the TCP socket, performs the handshake, allocates query tokens,
//! frames outbound queries, and demultiplexes inbound responses to the
//! per-token cursors held in its registry.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;
use serde_json::{json, Map};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::reql::message::tag;
use crate::reql::{handshake, Query, Response, ResponseCodec};

use super::config::{ConnectOptions, RunOptions};
use super::cursor::{Cursor, CursorShared};
use super::error::{DriverError, DriverResult};
use super::term::Term;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Just created, no socket yet
    Init,
    /// Handshake exchange in progress
    Handshaking,
    /// Handshake succeeded; queries may be submitted
    Open,
    /// Close requested, socket being released
    Closing,
    /// Socket released; no further I/O
    Closed,
}

/// Socket-side state, guarded by one async mutex so that exactly one
/// receive operation is active at a time.
struct IoState {
    /// TCP stream; `None` once the socket has been released
    stream: Option<TcpStream>,
    /// Frame codec
    codec: ResponseCodec,
    /// Receive byte accumulator
    read_buf: BytesMut,
    /// Send scratch buffer
    write_buf: BytesMut,
}

impl IoState {
    fn empty() -> Self {
        Self {
            stream: None,
            codec: ResponseCodec::new(),
            read_buf: BytesMut::with_capacity(8192),
            write_buf: BytesMut::with_capacity(8192),
        }
    }

    /// Encode and send one query frame.
    async fn write_frame(&mut self, token: u64, query: Query) -> Result<(), crate::reql::WireError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or(crate::reql::WireError::ConnectionClosed)?;

        self.write_buf.clear();
        self.codec.encode((token, query), &mut self.write_buf)?;

        stream.write_all(&self.write_buf).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Receive one response frame, accumulating reads as needed.
    async fn read_frame(
        &mut self,
        read_timeout: std::time::Duration,
    ) -> Result<(u64, Response), crate::reql::WireError> {
        loop {
            if let Some(frame) = self.codec.decode(&mut self.read_buf)? {
                return Ok(frame);
            }

            let stream = self
                .stream
                .as_mut()
                .ok_or(crate::reql::WireError::ConnectionClosed)?;

            let n = timeout(read_timeout, stream.read_buf(&mut self.read_buf))
                .await
                .map_err(|_| crate::reql::WireError::Timeout)??;

            if n == 0 {
                self.stream = None;
                return Err(crate::reql::WireError::ConnectionClosed);
            }
        }
    }
}

/// Registry-side state, guarded by a sync lock that is never held across
/// an await point.
struct Shared {
    /// Lifecycle state
    state: ConnectionState,
    /// Next query token; strictly increasing, starts at 1
    next_token: u64,
    /// Default database injected into START optargs
    default_db: Option<String>,
    /// Live queries by token
    pending: HashMap<u64, Arc<CursorShared>>,
    /// Tokens with a STOP in flight; their final response is discarded
    stopped: HashSet<u64>,
    /// Fatal failure description, surfaced on subsequent pulls
    failure: Option<String>,
}

/// Connection internals shared with cursors.
///
/// Cursors hold an `Arc` to this; the registry inside owns the cursor
/// state, which breaks the cursor/connection reference cycle.
pub(crate) struct ConnectionInner {
    config: ConnectOptions,
    io: AsyncMutex<IoState>,
    shared: Mutex<Shared>,
}

impl ConnectionInner {
    fn new(config: ConnectOptions) -> Self {
        let default_db = config.db.clone();
        Self {
            config,
            io: AsyncMutex::new(IoState::empty()),
            shared: Mutex::new(Shared {
                state: ConnectionState::Init,
                next_token: 1,
                default_db,
                pending: HashMap::new(),
                stopped: HashSet::new(),
                failure: None,
            }),
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.shared.lock().state = state;
    }

    fn state(&self) -> ConnectionState {
        self.shared.lock().state
    }

    fn ensure_open(&self) -> DriverResult<()> {
        let sh = self.shared.lock();
        if sh.state == ConnectionState::Open {
            Ok(())
        } else {
            Err(closed_error(&sh))
        }
    }

    fn alloc_token(&self) -> u64 {
        let mut sh = self.shared.lock();
        let token = sh.next_token;
        sh.next_token += 1;
        token
    }

    /// Mark the connection fatally failed; pulls observe the cause.
    fn mark_failed(&self, cause: String) {
        let mut sh = self.shared.lock();
        if sh.state != ConnectionState::Closed {
            sh.state = ConnectionState::Closed;
            sh.failure = Some(cause);
        }
    }

    /// Perform the handshake exchange, transitioning
    /// `Init -> Handshaking -> Open` (or `Closed` on failure).
    async fn handshake(&self) -> DriverResult<()> {
        self.set_state(ConnectionState::Handshaking);
        match self.exchange_handshake().await {
            Ok(()) => {
                self.set_state(ConnectionState::Open);
                debug!(addr = %self.config.addr(), "connection open");
                Ok(())
            }
            Err(err) => {
                self.set_state(ConnectionState::Closed);
                Err(err)
            }
        }
    }

    async fn exchange_handshake(&self) -> DriverResult<()> {
        let addr = self.config.addr();

        let mut stream = timeout(self.config.timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| connect_error(&addr, "connection timed out"))?
            .map_err(|e| connect_error(&addr, e))?;
        stream.set_nodelay(true).ok();

        stream
            .write_all(&handshake::build_handshake(&self.config.auth_key))
            .await
            .map_err(|e| connect_error(&addr, e))?;

        let mut buf = BytesMut::with_capacity(64);
        let status = loop {
            if let Some(status) = handshake::parse_status(&mut buf)? {
                break status;
            }
            let n = timeout(self.config.timeout, stream.read_buf(&mut buf))
                .await
                .map_err(|_| connect_error(&addr, "handshake timed out"))?
                .map_err(|e| connect_error(&addr, e))?;
            if n == 0 {
                return Err(connect_error(&addr, "connection closed during handshake"));
            }
        };
        handshake::check_status(&status)?;

        // bytes past the status terminator already belong to the frame stream
        let mut io = self.io.lock().await;
        io.stream = Some(stream);
        io.read_buf = buf;
        Ok(())
    }

    /// Send one query frame. Write failures are fatal to the connection.
    pub(crate) async fn send(&self, token: u64, query: Query) -> DriverResult<()> {
        let mut io = self.io.lock().await;
        if self.state() == ConnectionState::Closed {
            return Err(self.closed());
        }
        match io.write_frame(token, query).await {
            Ok(()) => Ok(()),
            Err(err) => {
                io.stream = None;
                drop(io);
                let cause = format!("connection returned: {}", err);
                self.mark_failed(cause.clone());
                Err(DriverError::driver(cause))
            }
        }
    }

    /// Receive one frame and route it to its cursor.
    ///
    /// Read failures (including timeout) are fatal to the connection.
    pub(crate) async fn recv_dispatch(&self) -> DriverResult<()> {
        let mut io = self.io.lock().await;
        if self.state() == ConnectionState::Closed {
            io.stream = None;
            return Err(self.closed());
        }
        match io.read_frame(self.config.timeout).await {
            Ok((token, response)) => {
                drop(io);
                if self.state() == ConnectionState::Closed {
                    // cancelled while this receive was in flight
                    return Err(self.closed());
                }
                self.dispatch(token, response)
            }
            Err(err) => {
                io.stream = None;
                drop(io);
                let cause = format!("connection returned: {}", err);
                self.mark_failed(cause.clone());
                Err(DriverError::driver(cause))
            }
        }
    }

    /// Route one response to the registry.
    fn dispatch(&self, token: u64, response: Response) -> DriverResult<()> {
        let mut sh = self.shared.lock();

        if sh.stopped.remove(&token) {
            debug!(token, "discarding response for stopped query");
            return Ok(());
        }

        let Some(cursor) = sh.pending.get(&token).cloned() else {
            warn!(token, "response for unknown token");
            return Err(DriverError::driver(format!("Unexpected token {}.", token)));
        };

        cursor.add_response(response);
        if cursor.is_finished() {
            sh.pending.remove(&token);
        }
        Ok(())
    }

    /// Send a CONTINUE frame for a token.
    pub(crate) async fn continue_query(&self, token: u64) -> DriverResult<()> {
        self.send(token, Query::Continue).await
    }

    /// Forget a token and send STOP for it.
    ///
    /// The server may still deliver one final response; the stopped set
    /// makes the registry discard it instead of failing dispatch.
    pub(crate) async fn stop_query(&self, token: u64) -> DriverResult<()> {
        {
            let mut sh = self.shared.lock();
            if sh.pending.remove(&token).is_some() {
                sh.stopped.insert(token);
            }
            if sh.state != ConnectionState::Open {
                return Ok(());
            }
        }
        self.send(token, Query::Stop).await
    }

    /// Release the socket and clear the registry. The single release
    /// point for the stream; safe to call repeatedly.
    async fn shutdown(&self) {
        {
            let mut sh = self.shared.lock();
            if sh.state != ConnectionState::Closed {
                sh.state = ConnectionState::Closing;
            }
        }

        let mut io = self.io.lock().await;
        if let Some(mut stream) = io.stream.take() {
            let _ = stream.shutdown().await;
        }
        io.read_buf.clear();
        drop(io);

        let mut sh = self.shared.lock();
        sh.state = ConnectionState::Closed;
        sh.pending.clear();
        sh.stopped.clear();
    }

    fn closed(&self) -> DriverError {
        closed_error(&self.shared.lock())
    }
}

fn closed_error(sh: &Shared) -> DriverError {
    match &sh.failure {
        Some(cause) => DriverError::driver(cause.clone()),
        None => DriverError::driver("Connection is closed."),
    }
}

fn connect_error(addr: &str, cause: impl std::fmt::Display) -> DriverError {
    DriverError::driver(format!("Could not connect to {}. {}", addr, cause))
}

// ============================================================================
// Connection
// ============================================================================

/// A single multiplexed connection to a RethinkDB server.
///
/// All methods take `&self`; clones share the same underlying socket and
/// token space.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    /// Open a TCP connection and perform the handshake.
    pub async fn connect(config: ConnectOptions) -> DriverResult<Self> {
        let connection = Self {
            inner: Arc::new(ConnectionInner::new(config)),
        };
        connection.inner.handshake().await?;
        Ok(connection)
    }

    /// Check if the connection accepts queries.
    pub fn is_open(&self) -> bool {
        self.inner.state() == ConnectionState::Open
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    /// Start a query.
    ///
    /// Allocates the next token, registers a fresh cursor, and writes a
    /// START frame. With `noreply` set no response is awaited and the
    /// returned cursor is already exhausted.
    pub async fn run<T: Term + ?Sized>(
        &self,
        term: &T,
        opts: RunOptions,
    ) -> DriverResult<Cursor> {
        self.inner.ensure_open()?;

        let token = self.inner.alloc_token();
        let built = term.build();

        let mut optargs = Map::new();
        if let Some(db) = self.inner.shared.lock().default_db.clone() {
            optargs.insert("db".to_string(), json!([tag::TERM_DB, [db]]));
        }
        if opts.noreply {
            optargs.insert("noreply".to_string(), json!(true));
        }

        let noreply = opts.noreply;
        let cursor_state = Arc::new(CursorShared::new(token, opts, Some(built.clone())));
        if noreply {
            cursor_state.finish();
        } else {
            self.inner
                .shared
                .lock()
                .pending
                .insert(token, cursor_state.clone());
        }

        if let Err(err) = self
            .inner
            .send(token, Query::start(built, optargs))
            .await
        {
            self.inner.shared.lock().pending.remove(&token);
            return Err(err);
        }

        Ok(Cursor::new(self.inner.clone(), cursor_state))
    }

    /// Wait for all outstanding noreply writes to complete.
    ///
    /// Registers a fresh cursor, writes a NOREPLY_WAIT frame, and resolves
    /// once that cursor yields WAIT_COMPLETE.
    pub async fn noreply_wait(&self) -> DriverResult<()> {
        self.inner.ensure_open()?;

        let token = self.inner.alloc_token();
        let cursor_state = Arc::new(CursorShared::new(token, RunOptions::default(), None));
        self.inner
            .shared
            .lock()
            .pending
            .insert(token, cursor_state.clone());

        if let Err(err) = self.inner.send(token, Query::NoreplyWait).await {
            self.inner.shared.lock().pending.remove(&token);
            return Err(err);
        }

        let mut cursor = Cursor::new(self.inner.clone(), cursor_state);
        cursor.next().await.map(|_| ())
    }

    /// Change the default database for subsequent [`Connection::run`] calls.
    pub fn use_db(&self, db: impl Into<String>) {
        self.inner.shared.lock().default_db = Some(db.into());
    }

    /// Close the connection, first waiting for outstanding noreply writes.
    pub async fn close(&self) -> DriverResult<()> {
        self.close_with(true).await
    }

    /// Close the connection.
    ///
    /// With `noreply_wait` set and the connection open, a NOREPLY_WAIT
    /// round trip runs first. The socket is released on every exit path,
    /// and closing an already-closed connection is a no-op.
    pub async fn close_with(&self, noreply_wait: bool) -> DriverResult<()> {
        let wait_result = if noreply_wait && self.is_open() {
            self.noreply_wait().await
        } else {
            Ok(())
        };
        self.inner.shutdown().await;
        wait_result
    }

    /// Close the current socket and open a fresh connection with the same
    /// options (including a database set through [`Connection::use_db`]).
    pub async fn reconnect(&self, noreply_wait: bool) -> DriverResult<Connection> {
        let mut config = self.inner.config.clone();
        config.db = self.inner.shared.lock().default_db.clone();
        self.close_with(noreply_wait).await?;
        Connection::connect(config).await
    }

    /// Hard-abort the connection.
    ///
    /// Destroys the socket and clears the registry synchronously; queries
    /// in flight are abandoned.
    pub fn cancel(&self) {
        {
            let mut sh = self.inner.shared.lock();
            sh.state = ConnectionState::Closed;
            sh.pending.clear();
            sh.stopped.clear();
        }
        // a receive in progress keeps the lock; it observes Closed and
        // releases the stream itself
        if let Ok(mut io) = self.inner.io.try_lock() {
            io.stream = None;
            io.read_buf.clear();
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("addr", &self.inner.config.addr())
            .field("state", &self.inner.state())
            .finish()
    }
}

// ============================================================================
// Entry surface
// ============================================================================

/// Connect to a server.
///
/// Accepts `()` for all defaults, a host string, a `(host, port)` pair, or
/// full [`ConnectOptions`].
pub async fn connect(options: impl Into<ConnectOptions>) -> DriverResult<Connection> {
    Connection::connect(options.into()).await
}

/// Check whether a value is a [`Connection`].
pub fn is_connection(value: &dyn Any) -> bool {
    value.is::<Connection>()
}
