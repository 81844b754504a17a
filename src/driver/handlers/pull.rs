//! PULL 응답 처리
//!
//! 소비자의 요청량(demand)만큼 PULL 을 보내고, 수신한 레코드와 최종 요약을
//! 설치된 소비자에게 전달합니다.
//!
//! # 상태
//!
//! ```text
//! Ready ──request──▶ Streaming ──SUCCESS(has_more, 요청량 없음)──▶ Ready
//!   │                   │  └──SUCCESS(완료)──▶ Succeeded
//!   │                   └──cancel──▶ Canceled ──SUCCESS──▶ Succeeded
//!   └──cancel (DISCARD)──▶ Canceled
//! 종료 전 어느 상태든 ──FAILURE──▶ Failed
//! ```
//!
//! 요약 소비자는 실행마다 정확히 한 번 호출됩니다. 콜백과 송신은 내부 락을
//! 놓은 뒤 수행하므로 콜백 안에서 `request`/`cancel`을 다시 호출할 수 있습니다.

use std::sync::Arc;

use parking_lot::Mutex;

use super::metadata::SuccessMetadata;
use super::run::{RunOutcome, RunResponseHandler};
use crate::driver::driver::ServerAddress;
use crate::driver::error::DriverError;
use crate::driver::record::Record;
use crate::driver::summary::ResultSummary;
use crate::driver::types::Value;

/// 레코드 소비자
pub type RecordConsumer = Arc<dyn Fn(Option<Record>, Option<DriverError>) + Send + Sync>;

/// 요약 소비자 (종료 신호, 한 번만 호출됨)
pub type SummaryConsumer = Box<dyn FnOnce(Option<ResultSummary>, Option<DriverError>) + Send>;

/// PULL 단계 제어 인터페이스
pub trait PullController: Send + Sync {
    /// 레코드 소비자 설치
    fn install_record_consumer(&self, consumer: RecordConsumer);

    /// 요약 소비자 설치
    fn install_summary_consumer(&self, consumer: SummaryConsumer);

    /// 레코드 `n`개 추가 요청
    fn request(&self, n: u64);

    /// 스트리밍 취소
    fn cancel(&self);

    /// 실패로 종료 (이미 종료되었으면 무시)
    fn on_failure(&self, error: DriverError);
}

// ============================================================================
// StreamRequest / MessageSink - 송신 경계
// ============================================================================

/// 연결로 보내는 스트리밍 요청
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRequest {
    /// PULL (`n == -1` 이면 전부)
    Pull { n: i64, qid: Option<i64> },
    /// DISCARD (`n == -1` 이면 전부)
    Discard { n: i64, qid: Option<i64> },
}

/// 요청을 연결로 내보내는 송신자
///
/// 인코딩과 전송은 연결 계층이 담당합니다.
pub trait MessageSink: Send + Sync {
    /// 요청 송신
    fn send(&self, request: StreamRequest);
}

// ============================================================================
// BasicPullHandler
// ============================================================================

/// PULL 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullState {
    /// 요청 대기
    Ready,
    /// PULL 응답 수신 중
    Streaming,
    /// 취소됨 (남은 레코드 폐기 중)
    Canceled,
    /// 정상 종료
    Succeeded,
    /// 실패 종료
    Failed,
}

impl PullState {
    /// 종료 상태 여부
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

type Outcome = (Option<ResultSummary>, Option<DriverError>);

struct Inner {
    state: PullState,
    to_request: u64,
    record_consumer: Option<RecordConsumer>,
    summary_consumer: Option<SummaryConsumer>,
    // 요약 소비자 설치 전에 종료된 경우 보관
    parked: Option<Outcome>,
}

/// 기본 PULL 핸들러
pub struct BasicPullHandler {
    inner: Mutex<Inner>,
    sink: Arc<dyn MessageSink>,
    keys: Arc<[String]>,
    qid: Option<i64>,
    result_available_after: Option<i64>,
    server: Option<ServerAddress>,
}

impl BasicPullHandler {
    /// 새 핸들러 생성
    pub fn new(keys: Vec<String>, qid: Option<i64>, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: PullState::Ready,
                to_request: 0,
                record_consumer: None,
                summary_consumer: None,
                parked: None,
            }),
            sink,
            keys: keys.into(),
            qid,
            result_available_after: None,
            server: None,
        }
    }

    /// RUN 응답에서 필드/쿼리 ID/시간 정보를 가져와 생성
    pub fn for_run(run: &RunResponseHandler, sink: Arc<dyn MessageSink>) -> Self {
        let mut handler = Self::new(run.keys(), run.query_id(), sink);
        handler.result_available_after = run.result_available_after();
        handler
    }

    /// 요약에 기록할 서버 주소 설정
    pub fn with_server(mut self, server: ServerAddress) -> Self {
        self.server = Some(server);
        self
    }

    /// 현재 상태
    pub fn state(&self) -> PullState {
        self.inner.lock().state
    }

    /// RECORD 응답 수신
    pub fn on_record(&self, values: Vec<Value>) {
        let consumer = {
            let inner = self.inner.lock();
            if inner.state != PullState::Streaming {
                // 취소 후 도착한 레코드는 버림
                return;
            }
            inner.record_consumer.clone()
        };

        match consumer {
            Some(consumer) => {
                let record = Record::with_shared_keys(Arc::clone(&self.keys), values);
                consumer(Some(record), None);
            }
            None => tracing::warn!("record received before a record consumer was installed, dropping"),
        }
    }

    /// SUCCESS 응답 수신 (PULL/DISCARD 배치 종료)
    pub fn on_success(&self, metadata: &SuccessMetadata) {
        let mut send = None;
        let mut complete = None;
        {
            let mut inner = self.inner.lock();
            if inner.state.is_terminal() {
                tracing::warn!(state = ?inner.state, "SUCCESS after terminal state, ignoring");
                return;
            }

            if metadata.has_more() {
                let state = inner.state;
                match state {
                    PullState::Canceled => send = Some(self.discard_all()),
                    PullState::Streaming if inner.to_request > 0 => {
                        send = Some(self.pull(&mut inner));
                    }
                    PullState::Streaming => inner.state = PullState::Ready,
                    state => tracing::warn!(?state, "unexpected has_more response"),
                }
            } else {
                let discarded = inner.state == PullState::Canceled;
                let mut summary =
                    ResultSummary::from_metadata(metadata, self.result_available_after, self.server.clone());
                summary.discarded = discarded;

                inner.state = PullState::Succeeded;
                complete = self.complete(&mut inner, (Some(summary), None));
            }
            tracing::debug!(state = ?inner.state, has_more = metadata.has_more(), "pull batch finished");
        }

        if let Some(request) = send {
            self.send(request);
        }
        if let Some((consumer, (summary, error))) = complete {
            consumer(summary, error);
        }
    }

    fn pull(&self, inner: &mut Inner) -> StreamRequest {
        let demand = std::mem::take(&mut inner.to_request);
        StreamRequest::Pull {
            n: i64::try_from(demand).unwrap_or(-1),
            qid: self.qid,
        }
    }

    fn discard_all(&self) -> StreamRequest {
        StreamRequest::Discard { n: -1, qid: self.qid }
    }

    fn send(&self, request: StreamRequest) {
        tracing::debug!(?request, "sending stream request");
        self.sink.send(request);
    }

    fn complete(&self, inner: &mut Inner, outcome: Outcome) -> Option<(SummaryConsumer, Outcome)> {
        inner.record_consumer = None;
        match inner.summary_consumer.take() {
            Some(consumer) => Some((consumer, outcome)),
            None => {
                inner.parked = Some(outcome);
                None
            }
        }
    }
}

impl PullController for BasicPullHandler {
    fn install_record_consumer(&self, consumer: RecordConsumer) {
        let mut inner = self.inner.lock();
        if inner.state.is_terminal() {
            return;
        }
        inner.record_consumer = Some(consumer);
    }

    fn install_summary_consumer(&self, consumer: SummaryConsumer) {
        let parked = {
            let mut inner = self.inner.lock();
            match inner.parked.take() {
                Some(outcome) => Some(outcome),
                None if inner.state.is_terminal() => {
                    tracing::warn!("summary already delivered, dropping summary consumer");
                    return;
                }
                None => {
                    if inner.summary_consumer.replace(consumer).is_some() {
                        tracing::warn!("replacing previously installed summary consumer");
                    }
                    return;
                }
            }
        };

        if let Some((summary, error)) = parked {
            consumer(summary, error);
        }
    }

    fn request(&self, n: u64) {
        if n == 0 {
            tracing::warn!("ignoring request for zero records");
            return;
        }

        let send = {
            let mut inner = self.inner.lock();
            match inner.state {
                PullState::Ready => {
                    inner.to_request = inner.to_request.saturating_add(n);
                    inner.state = PullState::Streaming;
                    Some(self.pull(&mut inner))
                }
                PullState::Streaming => {
                    inner.to_request = inner.to_request.saturating_add(n);
                    None
                }
                _ => None,
            }
        };

        if let Some(request) = send {
            self.send(request);
        }
    }

    fn cancel(&self) {
        let send = {
            let mut inner = self.inner.lock();
            match inner.state {
                PullState::Ready => {
                    inner.state = PullState::Canceled;
                    Some(self.discard_all())
                }
                PullState::Streaming => {
                    // 진행 중인 배치가 끝나면 DISCARD 를 보냄
                    inner.state = PullState::Canceled;
                    None
                }
                _ => None,
            }
        };

        if let Some(request) = send {
            self.send(request);
        }
    }

    fn on_failure(&self, error: DriverError) {
        let complete = {
            let mut inner = self.inner.lock();
            if inner.state.is_terminal() {
                tracing::debug!(%error, "already terminated, ignoring failure");
                return;
            }
            tracing::debug!(%error, from = ?inner.state, "pull failed");
            inner.state = PullState::Failed;
            self.complete(&mut inner, (None, Some(error)))
        };

        if let Some((consumer, (summary, error))) = complete {
            consumer(summary, error);
        }
    }
}
