//! ReQL protocol message types.
//!
//! Query payloads travel client to server as JSON arrays, responses come
//! back as JSON objects. Both directions are tagged with small integers
//! whose values are fixed by the wire protocol.

pub mod query;
pub mod response;

pub use query::{Query, QueryType};
pub use response::{Response, ResponseType};

/// Wire tags for query and response messages.
pub mod tag {
    /// START query tag
    pub const START: i32 = 1;
    /// CONTINUE query tag
    pub const CONTINUE: i32 = 2;
    /// STOP query tag
    pub const STOP: i32 = 3;
    /// NOREPLY_WAIT query tag
    pub const NOREPLY_WAIT: i32 = 4;

    /// SUCCESS_ATOM response tag
    pub const SUCCESS_ATOM: i32 = 1;
    /// SUCCESS_SEQUENCE response tag
    pub const SUCCESS_SEQUENCE: i32 = 2;
    /// SUCCESS_PARTIAL response tag
    pub const SUCCESS_PARTIAL: i32 = 3;
    /// WAIT_COMPLETE response tag
    pub const WAIT_COMPLETE: i32 = 4;
    /// SUCCESS_FEED response tag
    pub const SUCCESS_FEED: i32 = 5;
    /// CLIENT_ERROR response tag
    pub const CLIENT_ERROR: i32 = 16;
    /// COMPILE_ERROR response tag
    pub const COMPILE_ERROR: i32 = 17;
    /// RUNTIME_ERROR response tag
    pub const RUNTIME_ERROR: i32 = 18;

    /// DB term tag, used when injecting the default database optarg
    pub const TERM_DB: i32 = 14;
}

#[cfg(test)]
mod tests {
    use super::tag::*;

    #[test]
    fn test_query_tags() {
        assert_eq!(START, 1);
        assert_eq!(CONTINUE, 2);
        assert_eq!(STOP, 3);
        assert_eq!(NOREPLY_WAIT, 4);
    }

    #[test]
    fn test_response_tags() {
        assert_eq!(SUCCESS_ATOM, 1);
        assert_eq!(SUCCESS_SEQUENCE, 2);
        assert_eq!(SUCCESS_PARTIAL, 3);
        assert_eq!(WAIT_COMPLETE, 4);
        assert_eq!(SUCCESS_FEED, 5);
        assert_eq!(CLIENT_ERROR, 16);
        assert_eq!(COMPILE_ERROR, 17);
        assert_eq!(RUNTIME_ERROR, 18);
    }
}
