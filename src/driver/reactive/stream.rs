//! 비동기 레코드 스트림
//!
//! `ResultCursor`를 `futures::Stream`으로 감쌉니다. 소비 속도에 맞춰
//! `fetch_size` 단위로 요청하고, 종료 신호를 한 번 받으면 끝납니다.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use super::cursor::ResultCursor;
use crate::driver::driver::DriverConfig;
use crate::driver::error::{DriverError, DriverResult};
use crate::driver::record::Record;
use crate::driver::summary::ResultSummary;

enum Signal {
    Record(Record),
    Done(Option<ResultSummary>, Option<DriverError>),
}

/// 비동기 레코드 스트림
///
/// 레코드를 순서대로 내보내고, 실행이 실패하면 에러를 한 번 내보낸 뒤
/// 끝납니다. 끝나기 전에 버리면 커서를 취소합니다.
pub struct ReactiveRecordStream {
    cursor: Arc<ResultCursor>,
    rx: mpsc::UnboundedReceiver<Signal>,
    fetch_size: u64,
    outstanding: u64,
    keys: Vec<String>,
    summary: Option<ResultSummary>,
    finished: bool,
}

impl std::fmt::Debug for ReactiveRecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveRecordStream")
            .field("keys", &self.keys)
            .field("fetch_size", &self.fetch_size)
            .field("finished", &self.finished)
            .finish()
    }
}

impl ReactiveRecordStream {
    /// 커서에서 생성
    ///
    /// 커서에 레코드/요약 소비자를 설치합니다. 첫 요청은 처음 poll 할 때 보냅니다.
    pub fn new(cursor: Arc<ResultCursor>, fetch_size: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let records = tx.clone();
        cursor.install_record_consumer(move |record, _| {
            if let Some(record) = record {
                let _ = records.send(Signal::Record(record));
            }
        });
        cursor.install_summary_consumer(move |summary, error| {
            let _ = tx.send(Signal::Done(summary, error));
        });

        let keys = cursor.keys();
        Self {
            cursor,
            rx,
            fetch_size: fetch_size.max(1),
            outstanding: 0,
            keys,
            summary: None,
            finished: false,
        }
    }

    /// 드라이버 설정의 `fetch_size`로 생성
    pub fn with_config(cursor: Arc<ResultCursor>, config: &DriverConfig) -> Self {
        Self::new(cursor, config.fetch_size)
    }

    /// 키 목록
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// 결과 요약 (정상 종료 후에만 있음)
    pub fn summary(&self) -> Option<&ResultSummary> {
        self.summary.as_ref()
    }

    /// 남은 레코드를 더 받지 않음
    pub fn cancel(&self) {
        self.cursor.cancel();
    }

    /// 모든 레코드 수집
    pub async fn try_collect(mut self) -> DriverResult<Vec<Record>> {
        use tokio_stream::StreamExt;

        let mut records = Vec::new();
        while let Some(record) = self.next().await {
            records.push(record?);
        }
        Ok(records)
    }

    /// 남은 레코드를 버리고 요약 반환
    pub async fn consume(mut self) -> DriverResult<ResultSummary> {
        use tokio_stream::StreamExt;

        self.cancel();
        while let Some(result) = self.next().await {
            result?;
        }
        self.summary
            .take()
            .ok_or_else(|| DriverError::internal("stream ended without a summary"))
    }
}

impl Stream for ReactiveRecordStream {
    type Item = DriverResult<Record>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        if this.outstanding == 0 {
            this.outstanding = this.fetch_size;
            this.cursor.request(this.fetch_size);
        }

        match this.rx.poll_recv(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Signal::Record(record))) => {
                this.outstanding = this.outstanding.saturating_sub(1);
                Poll::Ready(Some(Ok(record)))
            }
            Poll::Ready(Some(Signal::Done(summary, error))) => {
                this.finished = true;
                this.summary = summary;
                Poll::Ready(error.map(Err))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(Some(Err(DriverError::internal(
                    "result consumers dropped before completion",
                ))))
            }
        }
    }
}

impl Drop for ReactiveRecordStream {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("record stream dropped before completion, canceling");
            self.cursor.cancel();
        }
    }
}
