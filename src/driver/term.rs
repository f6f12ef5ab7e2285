//! Term Seam
//!
//! 외부 텀 빌더와의 계약

use serde_json::Value;

// ============================================================================
// Term - 텀 빌더 계약
// ============================================================================

/// 쿼리 텀 트리 계약
///
/// 텀 트리 구성은 외부 빌더의 몫입니다. 연결 엔진은 START 쿼리를 인코딩할
/// 때 [`Term::build`]가 내놓는 JSON 트리만 사용합니다.
pub trait Term: Send + Sync {
    /// 직렬화 가능한 텀 트리 생성
    fn build(&self) -> Value;
}

impl Term for Value {
    fn build(&self) -> Value {
        self.clone()
    }
}

// ============================================================================
// RawTerm - 사전 구성된 텀
// ============================================================================

/// 사전 구성된 텀 트리 래퍼
#[derive(Debug, Clone)]
pub struct RawTerm(Value);

impl RawTerm {
    /// 새 래퍼 생성
    pub fn new(term: Value) -> Self {
        Self(term)
    }

    /// 내부 트리 참조
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl Term for RawTerm {
    fn build(&self) -> Value {
        self.0.clone()
    }
}

impl From<Value> for RawTerm {
    fn from(term: Value) -> Self {
        Self::new(term)
    }
}
