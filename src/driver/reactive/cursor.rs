//! 리액티브 결과 커서
//!
//! RUN 응답 스냅샷과 PULL 핸들러를 묶어 소비자에게 `request(n)` / `cancel()`
//! 기반 구독 인터페이스를 제공합니다.
//!
//! RUN 이 실패한 실행에서는 PULL 을 보내지 않습니다. 소비자가 처음 요청하거나
//! 취소하는 순간 보관한 RUN 에러가 요약 소비자로 한 번 전달됩니다.

use std::sync::Arc;

use futures::future::{self, Ready};
use parking_lot::ReentrantMutex;

use super::super::error::{DriverError, DriverResult};
use super::super::handlers::{PullController, RunOutcome};
use super::super::record::Record;
use super::super::summary::ResultSummary;

// ============================================================================
// RunPhaseResult - RUN 결과 스냅샷
// ============================================================================

/// RUN 단계 결과 스냅샷
#[derive(Debug, Clone, PartialEq)]
pub enum RunPhaseResult {
    /// 성공 (필드 이름)
    Success { keys: Vec<String> },
    /// 실패
    Failure(DriverError),
}

impl RunPhaseResult {
    /// RUN 결과를 한 번 읽어 스냅샷 생성
    ///
    /// RUN 응답이 아직 오지 않았으면 `IllegalState` 에러입니다.
    pub fn capture(run: &dyn RunOutcome) -> DriverResult<Self> {
        if !run.is_resolved() {
            return Err(DriverError::illegal_state(
                "Should wait for response of RUN before allowing PULL",
            ));
        }

        Ok(match run.error() {
            Some(error) => Self::Failure(error),
            None => Self::Success { keys: run.keys() },
        })
    }

    /// 필드 이름 (실패 시 빈 목록)
    pub fn keys(&self) -> &[String] {
        match self {
            Self::Success { keys } => keys,
            Self::Failure(_) => &[],
        }
    }

    /// RUN 에러
    pub fn error(&self) -> Option<&DriverError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(error) => Some(error),
        }
    }
}

// ============================================================================
// ResultCursor - 결과 커서
// ============================================================================

/// 리액티브 결과 커서
///
/// 한 번의 쿼리 실행에만 쓰입니다. 모든 공개 연산은 인스턴스 락으로
/// 직렬화됩니다. 락은 재진입 가능하므로 같은 스레드의 소비자 콜백에서
/// `request`/`cancel`을 다시 호출해도 됩니다.
pub struct ResultCursor {
    lock: ReentrantMutex<()>,
    run: RunPhaseResult,
    pull: Arc<dyn PullController>,
}

impl std::fmt::Debug for ResultCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCursor")
            .field("run", &self.run)
            .finish_non_exhaustive()
    }
}

impl ResultCursor {
    /// 새 커서 생성
    pub fn new(run: &dyn RunOutcome, pull: Arc<dyn PullController>) -> DriverResult<Self> {
        let run = RunPhaseResult::capture(run)?;
        match run.error() {
            Some(error) => tracing::debug!(%error, "result cursor created over failed RUN"),
            None => tracing::debug!(keys = ?run.keys(), "result cursor created"),
        }

        Ok(Self {
            lock: ReentrantMutex::new(()),
            run,
            pull,
        })
    }

    /// 빌더 시작
    pub fn builder<'a>() -> ResultCursorBuilder<'a> {
        ResultCursorBuilder::default()
    }

    /// 필드 이름
    ///
    /// RUN 이 실패했으면 빈 목록입니다.
    pub fn keys(&self) -> Vec<String> {
        let _guard = self.lock.lock();
        self.run.keys().to_vec()
    }

    /// RUN 에러
    pub fn run_error(&self) -> Option<&DriverError> {
        self.run.error()
    }

    /// 요약 소비자 설치
    ///
    /// `(Some(summary), None)` 또는 `(None, Some(error))`로 정확히 한 번 호출됩니다.
    pub fn install_summary_consumer<F>(&self, consumer: F)
    where
        F: FnOnce(Option<ResultSummary>, Option<DriverError>) + Send + 'static,
    {
        let _guard = self.lock.lock();
        self.pull.install_summary_consumer(Box::new(consumer));
    }

    /// 레코드 소비자 설치
    pub fn install_record_consumer<F>(&self, consumer: F)
    where
        F: Fn(Option<Record>, Option<DriverError>) + Send + Sync + 'static,
    {
        let _guard = self.lock.lock();
        self.pull.install_record_consumer(Arc::new(consumer));
    }

    /// 레코드 `n`개 추가 요청
    pub fn request(&self, n: u64) {
        let _guard = self.lock.lock();
        match &self.run {
            RunPhaseResult::Failure(error) => self.pull.on_failure(error.clone()),
            RunPhaseResult::Success { .. } => self.pull.request(n),
        }
    }

    /// 더 이상 레코드를 받지 않음
    pub fn cancel(&self) {
        let _guard = self.lock.lock();
        match &self.run {
            RunPhaseResult::Failure(error) => self.pull.on_failure(error.clone()),
            RunPhaseResult::Success { .. } => self.pull.cancel(),
        }
    }

    /// 실행 실패 조회
    ///
    /// 아직 RUN 스냅샷과 연결되지 않아 항상 `None`으로 즉시 완료됩니다.
    pub fn failure_async(&self) -> Ready<Option<DriverError>> {
        let _guard = self.lock.lock();
        future::ready(None)
    }
}

// ============================================================================
// ResultCursorBuilder - 커서 빌더
// ============================================================================

/// 결과 커서 빌더
#[derive(Default)]
pub struct ResultCursorBuilder<'a> {
    run: Option<&'a dyn RunOutcome>,
    pull: Option<Arc<dyn PullController>>,
}

impl<'a> ResultCursorBuilder<'a> {
    /// RUN 결과 설정
    pub fn with_run(mut self, run: &'a dyn RunOutcome) -> Self {
        self.run = Some(run);
        self
    }

    /// PULL 핸들러 설정
    pub fn with_pull(mut self, pull: Arc<dyn PullController>) -> Self {
        self.pull = Some(pull);
        self
    }

    /// 빌드
    pub fn build(self) -> DriverResult<ResultCursor> {
        let run = self.run.ok_or_else(|| DriverError::missing_argument("run handler"))?;
        let pull = self.pull.ok_or_else(|| DriverError::missing_argument("pull handler"))?;
        ResultCursor::new(run, pull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use parking_lot::Mutex;

    use crate::driver::handlers::testing::{RecordingSink, ScriptedServer, Terminal};
    use crate::driver::handlers::{
        BasicPullHandler, MessageSink, RunResponseHandler, StreamRequest, SuccessMetadata,
    };
    use crate::driver::types::Value;

    fn succeeded_run(keys: &[&str]) -> RunResponseHandler {
        let run = RunResponseHandler::new();
        run.on_success(&SuccessMetadata::new().with("fields", keys.to_vec()));
        run
    }

    fn failed_run(error: &DriverError) -> RunResponseHandler {
        let run = RunResponseHandler::new();
        run.on_failure(error.clone());
        run
    }

    fn syntax_error() -> DriverError {
        DriverError::query("Neo.ClientError.Statement.SyntaxError", "Invalid input 'RETRN'")
    }

    /// 받은 레코드를 모으는 소비자 설치
    fn count_records(cursor: &ResultCursor) -> Arc<Mutex<Vec<Record>>> {
        let records = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&records);
        cursor.install_record_consumer(move |record, _| {
            if let Some(record) = record {
                sink.lock().push(record);
            }
        });
        records
    }

    fn install_terminal(cursor: &ResultCursor) -> Terminal {
        let terminal = Terminal::default();
        let consumer = terminal.consumer();
        cursor.install_summary_consumer(move |summary, error| consumer(summary, error));
        terminal
    }

    /// RUN 응답을 흉내내는 스텁
    struct StubRun {
        resolved: bool,
        keys: Vec<String>,
        error: Option<DriverError>,
    }

    impl RunOutcome for StubRun {
        fn is_resolved(&self) -> bool {
            self.resolved
        }

        fn keys(&self) -> Vec<String> {
            self.keys.clone()
        }

        fn error(&self) -> Option<DriverError> {
            self.error.clone()
        }
    }

    #[test]
    fn test_pending_run_rejected() {
        let run = RunResponseHandler::new();
        let sink = Arc::new(RecordingSink::default());

        for _ in 0..3 {
            let pull = Arc::new(BasicPullHandler::new(vec![], None, Arc::clone(&sink) as Arc<dyn MessageSink>));
            let err = ResultCursor::new(&run, pull).unwrap_err();
            assert!(matches!(err, DriverError::IllegalState(_)));
            assert!(!err.is_retryable());
        }
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn test_keys_on_success() {
        let run = succeeded_run(&["n", "m"]);
        let server = ScriptedServer::new(vec![]);
        let cursor = ResultCursor::new(&run, server.handler(run.keys())).unwrap();

        assert_eq!(cursor.keys(), vec!["n", "m"]);
        assert!(cursor.run_error().is_none());
    }

    #[test]
    fn test_keys_unaffected_by_pull_failure() {
        let run = succeeded_run(&["n", "m"]);
        let server = ScriptedServer::failing(vec![], DriverError::connection("reset"));
        let cursor = ResultCursor::new(&run, server.handler(run.keys())).unwrap();
        let terminal = install_terminal(&cursor);

        cursor.request(1);

        assert_eq!(terminal.first().unwrap().1, Some(DriverError::connection("reset")));
        assert_eq!(cursor.keys(), vec!["n", "m"]);
    }

    #[test]
    fn test_keys_empty_on_run_failure() {
        let run = failed_run(&syntax_error());
        let server = ScriptedServer::new(vec![]);
        let cursor = ResultCursor::new(&run, server.handler(vec![])).unwrap();

        assert!(cursor.keys().is_empty());
        assert_eq!(cursor.run_error(), Some(&syntax_error()));
    }

    #[test]
    fn test_run_failure_delivered_on_request() {
        let run = failed_run(&syntax_error());
        let server = ScriptedServer::with_ints(3);
        let cursor = ResultCursor::new(&run, server.handler(vec![])).unwrap();
        let records = count_records(&cursor);
        let terminal = install_terminal(&cursor);

        // 요청 전에는 아무것도 전달되지 않음
        assert_eq!(terminal.count(), 0);

        cursor.request(10);

        assert_eq!(terminal.count(), 1);
        let (summary, error) = terminal.first().unwrap();
        assert!(summary.is_none());
        assert_eq!(error, Some(syntax_error()));
        assert!(records.lock().is_empty());
        // PULL 은 보내지 않음
        assert!(server.sent().is_empty());
    }

    #[test]
    fn test_run_failure_delivered_on_cancel() {
        let run = failed_run(&syntax_error());
        let server = ScriptedServer::with_ints(3);
        let cursor = ResultCursor::new(&run, server.handler(vec![])).unwrap();
        let records = count_records(&cursor);
        let terminal = install_terminal(&cursor);

        cursor.cancel();

        assert_eq!(terminal.count(), 1);
        assert_eq!(terminal.first().unwrap(), (None, Some(syntax_error())));
        assert!(records.lock().is_empty());
        assert!(server.sent().is_empty());
    }

    #[test]
    fn test_run_failure_single_terminal_for_mixed_calls() {
        for cancel_first in [true, false] {
            let run = failed_run(&syntax_error());
            let server = ScriptedServer::with_ints(3);
            let cursor = ResultCursor::new(&run, server.handler(vec![])).unwrap();
            let terminal = install_terminal(&cursor);

            if cancel_first {
                cursor.cancel();
                cursor.request(5);
            } else {
                cursor.request(5);
                cursor.cancel();
            }
            cursor.request(1);
            cursor.cancel();

            assert_eq!(terminal.count(), 1);
            assert_eq!(terminal.first().unwrap(), (None, Some(syntax_error())));
        }
    }

    #[test]
    fn test_stream_three_records_then_summary() {
        let run = succeeded_run(&["n"]);
        let server = ScriptedServer::with_ints(3);
        let cursor = ResultCursor::new(&run, server.handler(run.keys())).unwrap();
        let records = count_records(&cursor);
        let terminal = install_terminal(&cursor);

        cursor.request(5);

        let values: Vec<i64> = records.lock().iter().map(|r| r.get_int("n").unwrap()).collect();
        assert_eq!(values, vec![0, 1, 2]);
        assert_eq!(terminal.count(), 1);
        let (summary, error) = terminal.first().unwrap();
        assert!(summary.is_some());
        assert!(error.is_none());
        assert_eq!(server.sent(), vec![StreamRequest::Pull { n: 5, qid: None }]);

        // 종료 후 호출은 아무 효과 없음
        cursor.request(5);
        cursor.cancel();
        assert_eq!(terminal.count(), 1);
        assert_eq!(server.sent().len(), 1);
    }

    #[test]
    fn test_demand_is_respected() {
        let run = succeeded_run(&["n"]);
        let server = ScriptedServer::with_ints(10);
        let cursor = ResultCursor::new(&run, server.handler(run.keys())).unwrap();
        let records = count_records(&cursor);
        let terminal = install_terminal(&cursor);

        cursor.request(4);
        assert_eq!(records.lock().len(), 4);
        assert_eq!(terminal.count(), 0);

        cursor.request(4);
        assert_eq!(records.lock().len(), 8);

        cursor.request(4);
        assert_eq!(records.lock().len(), 10);
        assert_eq!(terminal.count(), 1);
    }

    #[test]
    fn test_cancel_after_partial_stream() {
        let run = succeeded_run(&["n"]);
        let server = ScriptedServer::with_ints(10);
        let cursor = ResultCursor::new(&run, server.handler(run.keys())).unwrap();
        let records = count_records(&cursor);
        let terminal = install_terminal(&cursor);

        cursor.request(2);
        cursor.cancel();
        cursor.cancel();

        assert_eq!(records.lock().len(), 2);
        assert_eq!(terminal.count(), 1);
        let summary = terminal.first().unwrap().0.unwrap();
        assert!(summary.discarded);
        assert_eq!(
            server.sent(),
            vec![
                StreamRequest::Pull { n: 2, qid: None },
                StreamRequest::Discard { n: -1, qid: None },
            ]
        );
    }

    #[test]
    fn test_downstream_failure_after_records() {
        let run = succeeded_run(&["n"]);
        let server = ScriptedServer::failing(
            vec![vec![Value::Integer(1)], vec![Value::Integer(2)]],
            DriverError::server("Neo.DatabaseError.General.UnknownError", "boom"),
        );
        let cursor = ResultCursor::new(&run, server.handler(run.keys())).unwrap();
        let records = count_records(&cursor);
        let terminal = install_terminal(&cursor);

        cursor.request(100);

        assert_eq!(records.lock().len(), 2);
        assert_eq!(terminal.count(), 1);
        assert!(matches!(terminal.first().unwrap().1, Some(DriverError::Server { .. })));
    }

    #[test]
    fn test_reentrant_request_from_consumer() {
        let run = succeeded_run(&["n"]);
        let server = ScriptedServer::with_ints(5);
        let cursor = Arc::new(ResultCursor::new(&run, server.handler(run.keys())).unwrap());
        let terminal = install_terminal(&cursor);

        let received = Arc::new(Mutex::new(0usize));
        let weak = Arc::downgrade(&cursor);
        let counter = Arc::clone(&received);
        cursor.install_record_consumer(move |record, _| {
            if record.is_some() {
                *counter.lock() += 1;
                // 한 건씩 다시 요청
                if let Some(cursor) = weak.upgrade() {
                    cursor.request(1);
                }
            }
        });

        cursor.request(1);

        assert_eq!(*received.lock(), 5);
        assert_eq!(terminal.count(), 1);
    }

    #[test]
    fn test_concurrent_request_and_cancel() {
        for _ in 0..20 {
            let run = succeeded_run(&["n"]);
            let server = ScriptedServer::with_ints(1000);
            let cursor = Arc::new(ResultCursor::new(&run, server.handler(run.keys())).unwrap());
            let terminal = install_terminal(&cursor);
            count_records(&cursor);

            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let cursor = Arc::clone(&cursor);
                    thread::spawn(move || {
                        for _ in 0..50 {
                            if i % 2 == 0 {
                                cursor.request(3);
                            } else {
                                cursor.cancel();
                            }
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            // 취소가 적어도 한 번 처리되었으므로 반드시 종료됨
            assert_eq!(terminal.count(), 1);
        }
    }

    #[test]
    fn test_failure_async_is_inert() {
        let run = failed_run(&syntax_error());
        let server = ScriptedServer::new(vec![]);
        let cursor = ResultCursor::new(&run, server.handler(vec![])).unwrap();

        assert_eq!(futures::executor::block_on(cursor.failure_async()), None);
    }

    #[test]
    fn test_builder() {
        let run = StubRun {
            resolved: true,
            keys: vec!["x".into()],
            error: None,
        };
        let sink = Arc::new(RecordingSink::default());
        let pull: Arc<dyn PullController> =
            Arc::new(BasicPullHandler::new(vec!["x".into()], None, sink as Arc<dyn MessageSink>));

        let err = ResultCursor::builder().with_run(&run).build().unwrap_err();
        assert_eq!(err, DriverError::missing_argument("pull handler"));

        let err = ResultCursor::builder().with_pull(Arc::clone(&pull)).build().unwrap_err();
        assert_eq!(err, DriverError::missing_argument("run handler"));

        let cursor = ResultCursor::builder().with_run(&run).with_pull(pull).build().unwrap();
        assert_eq!(cursor.keys(), vec!["x"]);
    }

    #[test]
    fn test_capture_with_stub() {
        let pending = StubRun {
            resolved: false,
            keys: vec![],
            error: None,
        };
        assert!(matches!(
            RunPhaseResult::capture(&pending),
            Err(DriverError::IllegalState(_))
        ));

        let failed = StubRun {
            resolved: true,
            keys: vec!["ignored".into()],
            error: Some(syntax_error()),
        };
        let snapshot = RunPhaseResult::capture(&failed).unwrap();
        assert_eq!(snapshot, RunPhaseResult::Failure(syntax_error()));
        assert!(snapshot.keys().is_empty());
    }
}
