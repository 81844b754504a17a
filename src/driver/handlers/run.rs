//! RUN 응답 처리
//!
//! RUN 요청의 SUCCESS / FAILURE 응답을 한 번만 받아 보관합니다.

use parking_lot::Mutex;
use tokio::sync::watch;

use super::metadata::SuccessMetadata;
use crate::driver::error::DriverError;

/// RUN 단계의 결과를 읽는 인터페이스
///
/// 결과 커서는 생성 시점에 이 인터페이스로 스냅샷을 한 번 뜹니다.
pub trait RunOutcome: Send + Sync {
    /// 응답 수신 여부
    fn is_resolved(&self) -> bool;

    /// 성공 시 필드 이름 (실패/대기 중이면 빈 목록)
    fn keys(&self) -> Vec<String>;

    /// 실패 시 에러
    fn error(&self) -> Option<DriverError>;
}

#[derive(Debug)]
enum RunState {
    Pending,
    Succeeded {
        keys: Vec<String>,
        qid: Option<i64>,
        available_after: Option<i64>,
    },
    Failed(DriverError),
}

/// RUN 응답 핸들러
///
/// 연결의 I/O 쪽에서 `on_success` 또는 `on_failure`가 한 번 호출됩니다.
/// 두 번째 응답부터는 무시합니다.
#[derive(Debug)]
pub struct RunResponseHandler {
    state: Mutex<RunState>,
    resolved_tx: watch::Sender<bool>,
}

impl RunResponseHandler {
    /// 새 핸들러 생성
    pub fn new() -> Self {
        let (resolved_tx, _) = watch::channel(false);
        Self {
            state: Mutex::new(RunState::Pending),
            resolved_tx,
        }
    }

    /// SUCCESS 응답 수신
    pub fn on_success(&self, metadata: &SuccessMetadata) {
        self.resolve(RunState::Succeeded {
            keys: metadata.fields().unwrap_or_default(),
            qid: metadata.qid(),
            available_after: metadata.result_available_after(),
        });
    }

    /// FAILURE 응답 수신 (또는 연결 에러)
    pub fn on_failure(&self, error: DriverError) {
        self.resolve(RunState::Failed(error));
    }

    fn resolve(&self, outcome: RunState) {
        {
            let mut state = self.state.lock();
            if !matches!(*state, RunState::Pending) {
                tracing::warn!(?outcome, "RUN response already resolved, ignoring");
                return;
            }
            *state = outcome;
        }
        self.resolved_tx.send_replace(true);
    }

    /// 응답이 올 때까지 대기
    pub async fn resolved(&self) {
        let mut rx = self.resolved_tx.subscribe();
        // 송신자는 self 가 소유하므로 닫히지 않음
        let _ = rx.wait_for(|resolved| *resolved).await;
    }

    /// 쿼리 ID (명시적 트랜잭션에서 PULL 대상 지정용)
    pub fn query_id(&self) -> Option<i64> {
        match &*self.state.lock() {
            RunState::Succeeded { qid, .. } => *qid,
            _ => None,
        }
    }

    /// 첫 레코드까지 걸린 시간 (ms)
    pub fn result_available_after(&self) -> Option<i64> {
        match &*self.state.lock() {
            RunState::Succeeded { available_after, .. } => *available_after,
            _ => None,
        }
    }
}

impl Default for RunResponseHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl RunOutcome for RunResponseHandler {
    fn is_resolved(&self) -> bool {
        !matches!(*self.state.lock(), RunState::Pending)
    }

    fn keys(&self) -> Vec<String> {
        match &*self.state.lock() {
            RunState::Succeeded { keys, .. } => keys.clone(),
            _ => Vec::new(),
        }
    }

    fn error(&self) -> Option<DriverError> {
        match &*self.state.lock() {
            RunState::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }
}
