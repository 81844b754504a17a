//! SUCCESS 응답 메타데이터
//!
//! RUN / PULL / DISCARD 의 SUCCESS 응답에 실린 메타데이터 접근자

use std::collections::HashMap;

use crate::driver::types::Value;

/// SUCCESS 응답 메타데이터
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuccessMetadata {
    entries: HashMap<String, Value>,
}

impl SuccessMetadata {
    /// 빈 메타데이터
    pub fn new() -> Self {
        Self::default()
    }

    /// 맵에서 생성
    pub fn from_map(entries: HashMap<String, Value>) -> Self {
        Self { entries }
    }

    /// 항목 추가 (빌더 형식)
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    /// 항목 조회
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// RUN 응답의 필드 이름
    pub fn fields(&self) -> Option<Vec<String>> {
        self.get("fields").and_then(|v| v.as_list()).map(|list| {
            list.iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
    }

    /// 쿼리 ID
    pub fn qid(&self) -> Option<i64> {
        self.get("qid").and_then(|v| v.as_int())
    }

    /// 남은 레코드 존재 여부
    pub fn has_more(&self) -> bool {
        self.get("has_more")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// 첫 레코드까지 걸린 시간 (ms)
    pub fn result_available_after(&self) -> Option<i64> {
        self.get("t_first").and_then(|v| v.as_int())
    }

    /// 마지막 레코드까지 걸린 시간 (ms)
    pub fn result_consumed_after(&self) -> Option<i64> {
        self.get("t_last").and_then(|v| v.as_int())
    }

    /// 쿼리 통계
    pub fn stats(&self) -> Option<&HashMap<String, Value>> {
        self.get("stats").and_then(|v| v.as_map())
    }

    /// 쿼리 타입 ("r", "rw", "w", "s")
    pub fn query_type(&self) -> Option<&str> {
        self.get("type").and_then(|v| v.as_str())
    }

    /// 북마크
    pub fn bookmark(&self) -> Option<&str> {
        self.get("bookmark").and_then(|v| v.as_str())
    }

    /// 데이터베이스 이름
    pub fn db(&self) -> Option<&str> {
        self.get("db").and_then(|v| v.as_str())
    }
}

impl From<HashMap<String, Value>> for SuccessMetadata {
    fn from(entries: HashMap<String, Value>) -> Self {
        Self::from_map(entries)
    }
}
