//! Driver Configuration
//!
//! 연결 및 실행 옵션 정의

use std::fmt;
use std::time::Duration;

// ============================================================================
// ConnectOptions - 연결 옵션
// ============================================================================

/// 기본 호스트
pub const DEFAULT_HOST: &str = "localhost";

/// 기본 포트
pub const DEFAULT_PORT: u16 = 28015;

/// 기본 소켓 타임아웃
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// 연결 옵션
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// TCP 호스트
    pub host: String,
    /// TCP 포트
    pub port: u16,
    /// 기본 데이터베이스
    pub db: Option<String>,
    /// 핸드셰이크 인증 키
    pub auth_key: String,
    /// 소켓 타임아웃
    pub timeout: Duration,
}

impl ConnectOptions {
    /// 새 옵션 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 호스트 설정
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// 포트 설정
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// 기본 데이터베이스 설정
    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    /// 인증 키 설정
    pub fn with_auth_key(mut self, auth_key: impl Into<String>) -> Self {
        self.auth_key = auth_key.into();
        self
    }

    /// 타임아웃 설정
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 소켓 주소 문자열
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db: None,
            auth_key: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Display for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl From<&str> for ConnectOptions {
    fn from(host: &str) -> Self {
        Self::default().with_host(host)
    }
}

impl From<String> for ConnectOptions {
    fn from(host: String) -> Self {
        Self::default().with_host(host)
    }
}

impl From<(&str, u16)> for ConnectOptions {
    fn from((host, port): (&str, u16)) -> Self {
        Self::default().with_host(host).with_port(port)
    }
}

impl From<()> for ConnectOptions {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

// ============================================================================
// RunOptions - 실행 옵션
// ============================================================================

/// 의사 타입 "native" 포맷
pub const FORMAT_NATIVE: &str = "native";

/// 의사 타입 "raw" 포맷
pub const FORMAT_RAW: &str = "raw";

/// 쿼리 실행 옵션
///
/// 포맷 값은 와이어 문자열 그대로 보관합니다 (`"native"` 또는 `"raw"`).
/// 알 수 없는 값은 의사 타입 변환 시 드라이버 에러가 됩니다.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// TIME 의사 타입 처리 방식
    pub time_format: String,
    /// GROUPED_DATA 의사 타입 처리 방식
    pub group_format: String,
    /// BINARY 의사 타입 처리 방식
    pub binary_format: String,
    /// 응답을 기다리지 않음
    pub noreply: bool,
}

impl RunOptions {
    /// 새 옵션 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// time_format 설정
    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = format.into();
        self
    }

    /// group_format 설정
    pub fn with_group_format(mut self, format: impl Into<String>) -> Self {
        self.group_format = format.into();
        self
    }

    /// binary_format 설정
    pub fn with_binary_format(mut self, format: impl Into<String>) -> Self {
        self.binary_format = format.into();
        self
    }

    /// noreply 설정
    pub fn with_noreply(mut self, noreply: bool) -> Self {
        self.noreply = noreply;
        self
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            time_format: FORMAT_NATIVE.to_string(),
            group_format: FORMAT_NATIVE.to_string(),
            binary_format: FORMAT_NATIVE.to_string(),
            noreply: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_defaults() {
        let opts = ConnectOptions::default();
        assert_eq!(opts.host, "localhost");
        assert_eq!(opts.port, 28015);
        assert!(opts.db.is_none());
        assert_eq!(opts.auth_key, "");
        assert_eq!(opts.timeout, Duration::from_secs(20));
        assert_eq!(opts.addr(), "localhost:28015");
    }

    #[test]
    fn test_connect_builder() {
        let opts = ConnectOptions::new()
            .with_host("db.internal")
            .with_port(28016)
            .with_db("app")
            .with_auth_key("hunter2")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(opts.addr(), "db.internal:28016");
        assert_eq!(opts.db.as_deref(), Some("app"));
        assert_eq!(opts.auth_key, "hunter2");
        assert_eq!(opts.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_connect_from_host() {
        let opts: ConnectOptions = "db.internal".into();
        assert_eq!(opts.host, "db.internal");
        assert_eq!(opts.port, 28015);

        let opts: ConnectOptions = ("db.internal", 28016).into();
        assert_eq!(opts.port, 28016);

        let opts: ConnectOptions = ().into();
        assert_eq!(opts.host, "localhost");
    }

    #[test]
    fn test_run_defaults() {
        let opts = RunOptions::default();
        assert_eq!(opts.time_format, "native");
        assert_eq!(opts.group_format, "native");
        assert_eq!(opts.binary_format, "native");
        assert!(!opts.noreply);
    }

    #[test]
    fn test_run_builder() {
        let opts = RunOptions::new()
            .with_time_format(FORMAT_RAW)
            .with_noreply(true);
        assert_eq!(opts.time_format, "raw");
        assert!(opts.noreply);
    }
}
