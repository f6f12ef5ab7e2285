//! Driver Error Types
//!
//! 드라이버 에러 정의

use std::fmt;
use std::io;

use serde_json::Value;
use thiserror::Error;

use crate::reql::{ResponseType, WireError};

/// Message the cursor sentinel error carries when rows are exhausted.
const NO_MORE_ROWS: &str = "No more rows in the cursor.";

// ============================================================================
// ServerMessage - 서버 에러 페이로드
// ============================================================================

/// 서버 에러 페이로드
///
/// 에러 응답의 `r[0]` 메시지와 역추적, 그리고 원인 쿼리의 텀 트리입니다.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerMessage {
    /// 에러 메시지
    pub message: String,
    /// 원인 쿼리의 텀 트리
    pub term: Option<Value>,
    /// 텀 트리 역추적
    pub backtrace: Option<Value>,
}

impl ServerMessage {
    /// 새 서버 메시지 생성
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            term: None,
            backtrace: None,
        }
    }

    /// 텀 트리 설정
    pub fn with_term(mut self, term: Option<Value>) -> Self {
        self.term = term;
        self
    }

    /// 역추적 설정
    pub fn with_backtrace(mut self, backtrace: Option<Value>) -> Self {
        self.backtrace = backtrace;
        self
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(b) = &self.backtrace {
            write!(f, " (backtrace: {})", b)?;
        }
        Ok(())
    }
}

// ============================================================================
// DriverError - 드라이버 에러
// ============================================================================

/// 드라이버 에러
#[derive(Error, Debug)]
pub enum DriverError {
    /// 로컬 불변식 또는 프로토콜 위반
    #[error("Driver error: {0}")]
    Driver(String),

    /// 서버 컴파일 에러
    #[error("Compile error: {0}")]
    Compile(ServerMessage),

    /// 서버가 보고한 클라이언트 프로토콜 에러
    #[error("Client error: {0}")]
    Client(ServerMessage),

    /// 서버 런타임 에러
    #[error("Runtime error: {0}")]
    Runtime(ServerMessage),

    /// I/O 에러
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 직렬화 에러
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DriverError {
    /// 드라이버 에러 생성
    pub fn driver(msg: impl Into<String>) -> Self {
        Self::Driver(msg.into())
    }

    /// 커서 소진 센티널 생성
    pub fn no_more_rows() -> Self {
        Self::Driver(NO_MORE_ROWS.to_string())
    }

    /// 커서 소진 센티널 여부
    pub fn is_no_more_rows(&self) -> bool {
        matches!(self, Self::Driver(msg) if msg == NO_MORE_ROWS)
    }

    /// 에러 응답에서 타입별 에러 생성
    pub fn from_response(
        kind: ResponseType,
        message: String,
        term: Option<Value>,
        backtrace: Option<Value>,
    ) -> Self {
        let payload = ServerMessage::new(message)
            .with_term(term)
            .with_backtrace(backtrace);
        match kind {
            ResponseType::CompileError => Self::Compile(payload),
            ResponseType::ClientError => Self::Client(payload),
            _ => Self::Runtime(payload),
        }
    }

    /// 서버 에러 여부 (쿼리 단위, 연결은 유지)
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Compile(_) | Self::Client(_) | Self::Runtime(_)
        )
    }
}

impl From<WireError> for DriverError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::Io(e) => Self::Io(e),
            WireError::Json(e) => Self::Json(e),
            other => Self::Driver(other.to_string()),
        }
    }
}

// ============================================================================
// Result Type
// ============================================================================

/// 드라이버 결과 타입
pub type DriverResult<T> = Result<T, DriverError>;
