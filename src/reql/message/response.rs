//! ReQL response messages.
//!
//! Responses are sent from the server to the client as JSON objects with
//! an integer kind `t`, a payload array `r`, and optional backtrace `b`,
//! profile `p`, and notes `n` fields.

use serde::Deserialize;
use serde_json::Value;

use super::tag;

/// Response kind tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ResponseType {
    /// A single datum
    SuccessAtom = tag::SUCCESS_ATOM,
    /// A complete sequence
    SuccessSequence = tag::SUCCESS_SEQUENCE,
    /// A batch of a longer sequence; more will follow after CONTINUE
    SuccessPartial = tag::SUCCESS_PARTIAL,
    /// All outstanding noreply writes have completed
    WaitComplete = tag::WAIT_COMPLETE,
    /// A batch of an unbounded feed
    SuccessFeed = tag::SUCCESS_FEED,
    /// The client sent a malformed query
    ClientError = tag::CLIENT_ERROR,
    /// The query failed to compile on the server
    CompileError = tag::COMPILE_ERROR,
    /// The query failed at runtime
    RuntimeError = tag::RUNTIME_ERROR,
}

impl ResponseType {
    /// Map a wire tag to a response kind.
    pub fn from_i32(t: i32) -> Option<Self> {
        match t {
            tag::SUCCESS_ATOM => Some(ResponseType::SuccessAtom),
            tag::SUCCESS_SEQUENCE => Some(ResponseType::SuccessSequence),
            tag::SUCCESS_PARTIAL => Some(ResponseType::SuccessPartial),
            tag::WAIT_COMPLETE => Some(ResponseType::WaitComplete),
            tag::SUCCESS_FEED => Some(ResponseType::SuccessFeed),
            tag::CLIENT_ERROR => Some(ResponseType::ClientError),
            tag::COMPILE_ERROR => Some(ResponseType::CompileError),
            tag::RUNTIME_ERROR => Some(ResponseType::RuntimeError),
            _ => None,
        }
    }

    /// Check if this kind reports a server-side error.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            ResponseType::ClientError | ResponseType::CompileError | ResponseType::RuntimeError
        )
    }

    /// Message name for logging.
    pub fn name(self) -> &'static str {
        match self {
            ResponseType::SuccessAtom => "SUCCESS_ATOM",
            ResponseType::SuccessSequence => "SUCCESS_SEQUENCE",
            ResponseType::SuccessPartial => "SUCCESS_PARTIAL",
            ResponseType::WaitComplete => "WAIT_COMPLETE",
            ResponseType::SuccessFeed => "SUCCESS_FEED",
            ResponseType::ClientError => "CLIENT_ERROR",
            ResponseType::CompileError => "COMPILE_ERROR",
            ResponseType::RuntimeError => "RUNTIME_ERROR",
        }
    }
}

/// A decoded server response.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Response kind tag
    pub t: i32,
    /// Result payload
    #[serde(default)]
    pub r: Vec<Value>,
    /// Backtrace into the query term, present on error responses
    #[serde(default)]
    pub b: Option<Value>,
    /// Query profile, present when profiling was requested
    #[serde(default)]
    pub p: Option<Value>,
    /// Response notes
    #[serde(default)]
    pub n: Option<Vec<i32>>,
}

impl Response {
    /// The response kind, if the tag is known.
    pub fn kind(&self) -> Option<ResponseType> {
        ResponseType::from_i32(self.t)
    }

    /// A terminal response ends the query; only SUCCESS_PARTIAL and
    /// SUCCESS_FEED promise further batches.
    pub fn is_terminal(&self) -> bool {
        self.t != tag::SUCCESS_PARTIAL && self.t != tag::SUCCESS_FEED
    }

    /// First payload entry rendered as an error message string.
    pub fn first_message(&self) -> String {
        match self.r.first() {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}
