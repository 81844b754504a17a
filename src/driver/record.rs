//! Record - 쿼리 결과 레코드
//!
//! PULL 단계에서 수신되는 단일 레코드

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::{DriverError, DriverResult};
use super::types::Value;

// ============================================================================
// Record - 단일 레코드
// ============================================================================

/// 쿼리 결과 레코드
///
/// 한 실행의 모든 레코드는 RUN 응답의 필드 키를 공유합니다.
#[derive(Debug, Clone)]
pub struct Record {
    /// 컬럼 키 (실행 내 공유)
    keys: Arc<[String]>,
    /// 값들
    values: Vec<Value>,
}

impl Record {
    /// 새 레코드 생성
    pub fn new(keys: Vec<String>, values: Vec<Value>) -> Self {
        Self::with_shared_keys(keys.into(), values)
    }

    /// 공유 키로 레코드 생성
    pub fn with_shared_keys(keys: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { keys, values }
    }

    /// 키 목록
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// 값 목록
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// 레코드 길이
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 빈 레코드 여부
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 키로 값 가져오기
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.keys
            .iter()
            .position(|k| k == key)
            .and_then(|i| self.values.get(i))
    }

    /// 인덱스로 값 가져오기
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// 키로 타입 변환된 값 가져오기
    pub fn get_as<T>(&self, key: &str) -> DriverResult<T>
    where
        T: TryFrom<Value, Error = DriverError>,
    {
        self.get(key)
            .cloned()
            .ok_or_else(|| DriverError::type_conversion(format!("Key '{}' not found", key)))
            .and_then(|v| T::try_from(v))
    }

    /// Integer 값 가져오기
    pub fn get_int(&self, key: &str) -> DriverResult<i64> {
        self.get_as::<i64>(key)
    }

    /// String 값 가져오기
    pub fn get_string(&self, key: &str) -> DriverResult<String> {
        self.get_as::<String>(key)
    }

    /// Map으로 변환
    pub fn to_map(&self) -> HashMap<String, Value> {
        self.keys
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .keys
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}
