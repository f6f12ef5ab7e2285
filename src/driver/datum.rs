//! Datum - 네이티브 값 타입
//!
//! 서버 응답을 표현하는 네이티브 값 정의

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{DriverError, DriverResult};

// ============================================================================
// Datum - 네이티브 값
// ============================================================================

/// 네이티브 값 타입
///
/// 서버가 보내는 JSON 문서의 네이티브 표현입니다. 의사 타입 변환 후
/// TIME은 [`Datum::DateTime`], BINARY는 [`Datum::Bytes`]가 됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    /// Null
    Null,
    /// Boolean
    Boolean(bool),
    /// Integer (i64)
    Integer(i64),
    /// Float (f64)
    Float(f64),
    /// String
    String(String),
    /// Bytes (BINARY 의사 타입)
    Bytes(Vec<u8>),
    /// List
    List(Vec<Datum>),
    /// Map
    Map(HashMap<String, Datum>),
    /// DateTime (TIME 의사 타입, UTC)
    DateTime(DateTime<Utc>),
}

impl Datum {
    /// Null 여부
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Boolean으로 변환
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer로 변환
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Datum::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Float로 변환
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Datum::Float(f) => Some(*f),
            Datum::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// String으로 변환
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::String(s) => Some(s),
            _ => None,
        }
    }

    /// Bytes로 변환
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Datum::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// List로 변환
    pub fn as_list(&self) -> Option<&[Datum]> {
        match self {
            Datum::List(l) => Some(l),
            _ => None,
        }
    }

    /// Map으로 변환
    pub fn as_map(&self) -> Option<&HashMap<String, Datum>> {
        match self {
            Datum::Map(m) => Some(m),
            _ => None,
        }
    }

    /// DateTime으로 변환
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Datum::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Map 키로 값 가져오기
    pub fn get(&self, key: &str) -> Option<&Datum> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// 타입 이름
    pub fn type_name(&self) -> &'static str {
        match self {
            Datum::Null => "Null",
            Datum::Boolean(_) => "Boolean",
            Datum::Integer(_) => "Integer",
            Datum::Float(_) => "Float",
            Datum::String(_) => "String",
            Datum::Bytes(_) => "Bytes",
            Datum::List(_) => "List",
            Datum::Map(_) => "Map",
            Datum::DateTime(_) => "DateTime",
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => write!(f, "null"),
            Datum::Boolean(b) => write!(f, "{}", b),
            Datum::Integer(i) => write!(f, "{}", i),
            Datum::Float(fl) => write!(f, "{}", fl),
            Datum::String(s) => write!(f, "\"{}\"", s),
            Datum::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Datum::List(l) => write!(f, "[{} items]", l.len()),
            Datum::Map(m) => write!(f, "{{{} entries}}", m.len()),
            Datum::DateTime(dt) => write!(f, "{}", dt),
        }
    }
}

// From implementations
impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Datum::Boolean(v)
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Integer(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Datum::Integer(v as i64)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Float(v)
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::String(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Datum {
    fn from(v: DateTime<Utc>) -> Self {
        Datum::DateTime(v)
    }
}

impl<T: Into<Datum>> From<Vec<T>> for Datum {
    fn from(v: Vec<T>) -> Self {
        Datum::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Datum>> From<Option<T>> for Datum {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Datum::Null,
        }
    }
}

// TryFrom implementations
impl TryFrom<Datum> for bool {
    type Error = DriverError;

    fn try_from(value: Datum) -> DriverResult<Self> {
        value
            .as_bool()
            .ok_or_else(|| type_error("Boolean", &value))
    }
}

impl TryFrom<Datum> for i64 {
    type Error = DriverError;

    fn try_from(value: Datum) -> DriverResult<Self> {
        value.as_int().ok_or_else(|| type_error("Integer", &value))
    }
}

impl TryFrom<Datum> for f64 {
    type Error = DriverError;

    fn try_from(value: Datum) -> DriverResult<Self> {
        value
            .as_float()
            .ok_or_else(|| type_error("Float", &value))
    }
}

impl TryFrom<Datum> for String {
    type Error = DriverError;

    fn try_from(value: Datum) -> DriverResult<Self> {
        match value {
            Datum::String(s) => Ok(s),
            other => Err(type_error("String", &other)),
        }
    }
}

impl TryFrom<Datum> for DateTime<Utc> {
    type Error = DriverError;

    fn try_from(value: Datum) -> DriverResult<Self> {
        value
            .as_datetime()
            .ok_or_else(|| type_error("DateTime", &value))
    }
}

fn type_error(expected: &str, got: &Datum) -> DriverError {
    DriverError::driver(format!(
        "Expected {}, got {}",
        expected,
        got.type_name()
    ))
}
