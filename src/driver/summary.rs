//! ResultSummary - 결과 요약
//!
//! 실행이 정상 종료되었을 때 요약 소비자에게 전달되는 메타데이터

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use super::driver::ServerAddress;
use super::handlers::SuccessMetadata;
use super::types::Value;

// ============================================================================
// ResultSummary - 결과 요약
// ============================================================================

/// 결과 요약
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSummary {
    /// 쿼리 타입
    pub query_type: QueryType,
    /// 카운터
    pub counters: Counters,
    /// 결과 대기 시간
    pub result_available_after: Option<Duration>,
    /// 결과 소비 시간
    pub result_consumed_after: Option<Duration>,
    /// 데이터베이스 이름
    pub database: Option<String>,
    /// 응답한 서버
    pub server: Option<ServerAddress>,
    /// 북마크
    pub bookmark: Option<String>,
    /// 소비자가 취소하여 남은 레코드를 버렸는지
    pub discarded: bool,
}

impl ResultSummary {
    /// 마지막 SUCCESS 메타데이터에서 요약 추출
    ///
    /// `t_first`는 RUN 응답에만 실리므로 따로 받습니다.
    pub fn from_metadata(
        metadata: &SuccessMetadata,
        result_available_after: Option<i64>,
        server: Option<ServerAddress>,
    ) -> Self {
        Self {
            query_type: metadata
                .query_type()
                .and_then(QueryType::from_code)
                .unwrap_or_default(),
            counters: metadata.stats().map(Counters::from_stats).unwrap_or_default(),
            result_available_after: result_available_after.and_then(millis),
            result_consumed_after: metadata.result_consumed_after().and_then(millis),
            database: metadata.db().map(str::to_string),
            server,
            bookmark: metadata.bookmark().map(str::to_string),
            discarded: false,
        }
    }
}

fn millis(ms: i64) -> Option<Duration> {
    u64::try_from(ms).ok().map(Duration::from_millis)
}

/// 쿼리 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum QueryType {
    /// 읽기 전용
    #[default]
    ReadOnly,
    /// 읽기/쓰기
    ReadWrite,
    /// 쓰기 전용
    WriteOnly,
    /// 스키마 변경
    SchemaWrite,
}

impl QueryType {
    /// 서버 코드에서 파싱
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "r" => Some(Self::ReadOnly),
            "rw" => Some(Self::ReadWrite),
            "w" => Some(Self::WriteOnly),
            "s" => Some(Self::SchemaWrite),
            _ => None,
        }
    }
}

/// 카운터
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// 생성된 노드 수
    pub nodes_created: i64,
    /// 삭제된 노드 수
    pub nodes_deleted: i64,
    /// 생성된 관계 수
    pub relationships_created: i64,
    /// 삭제된 관계 수
    pub relationships_deleted: i64,
    /// 설정된 속성 수
    pub properties_set: i64,
    /// 추가된 레이블 수
    pub labels_added: i64,
    /// 제거된 레이블 수
    pub labels_removed: i64,
    /// 생성된 인덱스 수
    pub indexes_added: i64,
    /// 제거된 인덱스 수
    pub indexes_removed: i64,
    /// 추가된 제약조건 수
    pub constraints_added: i64,
    /// 제거된 제약조건 수
    pub constraints_removed: i64,
}

impl Counters {
    /// `stats` 메타데이터 맵에서 생성
    pub fn from_stats(stats: &HashMap<String, Value>) -> Self {
        let get = |key: &str| stats.get(key).and_then(|v| v.as_int()).unwrap_or(0);
        Self {
            nodes_created: get("nodes-created"),
            nodes_deleted: get("nodes-deleted"),
            relationships_created: get("relationships-created"),
            relationships_deleted: get("relationships-deleted"),
            properties_set: get("properties-set"),
            labels_added: get("labels-added"),
            labels_removed: get("labels-removed"),
            indexes_added: get("indexes-added"),
            indexes_removed: get("indexes-removed"),
            constraints_added: get("constraints-added"),
            constraints_removed: get("constraints-removed"),
        }
    }

    /// 변경 사항 존재 여부
    pub fn contains_updates(&self) -> bool {
        self.nodes_created > 0
            || self.nodes_deleted > 0
            || self.relationships_created > 0
            || self.relationships_deleted > 0
            || self.properties_set > 0
            || self.labels_added > 0
            || self.labels_removed > 0
    }

    /// 스키마 변경 존재 여부
    pub fn contains_system_updates(&self) -> bool {
        self.indexes_added > 0
            || self.indexes_removed > 0
            || self.constraints_added > 0
            || self.constraints_removed > 0
    }
}
