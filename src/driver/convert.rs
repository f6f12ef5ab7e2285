//! Pseudo-type Conversion
//!
//! 서버 의사 타입을 네이티브 값으로 변환

use std::collections::HashMap;

use base64::Engine;
use chrono::DateTime;
use serde_json::{Map, Value};

use super::config::{RunOptions, FORMAT_NATIVE, FORMAT_RAW};
use super::datum::Datum;
use super::error::{DriverError, DriverResult};

/// Key tagging a JSON object as a server pseudo-type.
pub const REQL_TYPE_KEY: &str = "$reql_type$";

// ============================================================================
// convert_datum - 재귀 변환
// ============================================================================

/// 디코딩된 JSON 값을 네이티브 값으로 변환
///
/// 후위 순회로 재귀하며 `$reql_type$` 태그가 붙은 객체를 실행 옵션에
/// 따라 네이티브 값으로 바꿉니다. 알 수 없는 태그는 그대로 둡니다.
pub fn convert_datum(value: Value, opts: &RunOptions) -> DriverResult<Datum> {
    match value {
        Value::Null => Ok(Datum::Null),
        Value::Bool(b) => Ok(Datum::Boolean(b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Datum::Integer(i))
            } else {
                Ok(Datum::Float(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        Value::String(s) => Ok(Datum::String(s)),
        Value::Array(items) => {
            let converted = items
                .into_iter()
                .map(|item| convert_datum(item, opts))
                .collect::<DriverResult<Vec<_>>>()?;
            Ok(Datum::List(converted))
        }
        Value::Object(map) => match map.get(REQL_TYPE_KEY).and_then(Value::as_str) {
            Some("TIME") => convert_time(map, opts),
            Some("GROUPED_DATA") => convert_grouped_data(map, opts),
            Some("BINARY") => convert_binary(map, opts),
            _ => convert_object(map, opts),
        },
    }
}

/// 객체를 구조 그대로 변환
fn convert_object(map: Map<String, Value>, opts: &RunOptions) -> DriverResult<Datum> {
    let mut out = HashMap::with_capacity(map.len());
    for (key, value) in map {
        out.insert(key, convert_datum(value, opts)?);
    }
    Ok(Datum::Map(out))
}

/// TIME 의사 타입 변환
///
/// native 모드는 `epoch_time`(초)을 밀리초 타임스탬프로 바꾸고 timezone
/// 필드는 버립니다.
fn convert_time(map: Map<String, Value>, opts: &RunOptions) -> DriverResult<Datum> {
    match opts.time_format.as_str() {
        FORMAT_NATIVE => {
            let epoch = map
                .get("epoch_time")
                .and_then(Value::as_f64)
                .ok_or_else(|| {
                    DriverError::driver(
                        "pseudo-type TIME object missing expected field epoch_time",
                    )
                })?;
            let millis = (epoch * 1000.0).round() as i64;
            let datetime = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                DriverError::driver(format!("epoch_time {} out of range", epoch))
            })?;
            Ok(Datum::DateTime(datetime))
        }
        FORMAT_RAW => convert_object(map, opts),
        other => Err(DriverError::driver(format!(
            "Unknown time_format: {}",
            other
        ))),
    }
}

/// GROUPED_DATA 의사 타입 변환
///
/// native 모드는 `data`의 `[group, reduction]` 쌍 배열을 서버 순서 그대로
/// `{group, reduction}` 레코드 목록으로 바꿉니다.
fn convert_grouped_data(map: Map<String, Value>, opts: &RunOptions) -> DriverResult<Datum> {
    match opts.group_format.as_str() {
        FORMAT_NATIVE => {
            let data = map.get("data").and_then(Value::as_array).ok_or_else(|| {
                DriverError::driver(
                    "pseudo-type GROUPED_DATA object missing expected field data",
                )
            })?;
            let mut groups = Vec::with_capacity(data.len());
            for pair in data {
                let mut items = pair.as_array().cloned().unwrap_or_default().into_iter();
                let group = convert_datum(items.next().unwrap_or(Value::Null), opts)?;
                let reduction = convert_datum(items.next().unwrap_or(Value::Null), opts)?;
                let mut record = HashMap::with_capacity(2);
                record.insert("group".to_string(), group);
                record.insert("reduction".to_string(), reduction);
                groups.push(Datum::Map(record));
            }
            Ok(Datum::List(groups))
        }
        FORMAT_RAW => convert_object(map, opts),
        other => Err(DriverError::driver(format!(
            "Unknown group_format: {}",
            other
        ))),
    }
}

/// BINARY 의사 타입 변환
///
/// native 모드는 `data`를 Base64 디코딩한 바이트로 바꿉니다.
fn convert_binary(map: Map<String, Value>, opts: &RunOptions) -> DriverResult<Datum> {
    match opts.binary_format.as_str() {
        FORMAT_NATIVE => {
            let data = map.get("data").and_then(Value::as_str).ok_or_else(|| {
                DriverError::driver(
                    "pseudo-type BINARY object missing expected field data",
                )
            })?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| DriverError::driver(format!("Invalid base64 data: {}", e)))?;
            Ok(Datum::Bytes(bytes))
        }
        FORMAT_RAW => convert_object(map, opts),
        other => Err(DriverError::driver(format!(
            "Unknown binary_format: {}",
            other
        ))),
    }
}
