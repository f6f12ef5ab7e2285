//! ReQL query messages.
//!
//! Queries are sent from the client to the server as JSON arrays of the
//! form `[type_tag, term?, global_optargs?]`. Only START carries a term;
//! the trailing optargs object is omitted when empty.

use serde_json::{json, Map, Value};

use super::tag;

/// Query type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum QueryType {
    /// Start a new query
    Start = tag::START,
    /// Request the next batch for a running query
    Continue = tag::CONTINUE,
    /// Stop a running query
    Stop = tag::STOP,
    /// Wait for all outstanding noreply writes to complete
    NoreplyWait = tag::NOREPLY_WAIT,
}

impl QueryType {
    /// The integer wire tag.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// A client-to-server query message.
#[derive(Debug, Clone)]
pub enum Query {
    /// START - begin executing a term tree
    Start {
        /// The built term tree
        term: Value,
        /// Global optargs (`db`, `noreply`, ...); omitted on the wire when empty
        optargs: Map<String, Value>,
    },
    /// CONTINUE - request the next batch
    Continue,
    /// STOP - abandon the query
    Stop,
    /// NOREPLY_WAIT - barrier for noreply writes
    NoreplyWait,
}

impl Query {
    /// Create a START query.
    pub fn start(term: Value, optargs: Map<String, Value>) -> Self {
        Query::Start { term, optargs }
    }

    /// The query type tag.
    pub fn query_type(&self) -> QueryType {
        match self {
            Query::Start { .. } => QueryType::Start,
            Query::Continue => QueryType::Continue,
            Query::Stop => QueryType::Stop,
            Query::NoreplyWait => QueryType::NoreplyWait,
        }
    }

    /// Render the wire JSON array.
    pub fn to_wire(&self) -> Value {
        match self {
            Query::Start { term, optargs } => {
                if optargs.is_empty() {
                    json!([tag::START, term])
                } else {
                    json!([tag::START, term, optargs])
                }
            }
            Query::Continue => json!([tag::CONTINUE]),
            Query::Stop => json!([tag::STOP]),
            Query::NoreplyWait => json!([tag::NOREPLY_WAIT]),
        }
    }

    /// Serialize the wire JSON to bytes.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.to_wire())
    }
}
