//! 리액티브 결과 처리
//!
//! `ResultCursor`는 RUN/PULL 핸들러를 요청량 기반 구독 인터페이스로 묶고,
//! `ReactiveRecordStream`은 커서를 `futures::Stream`으로 노출합니다.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use zeta4g_driver_core::driver::handlers::{BasicPullHandler, RunResponseHandler};
//! use zeta4g_driver_core::driver::reactive::{ReactiveRecordStream, ResultCursor};
//!
//! run.resolved().await;
//! let pull = Arc::new(BasicPullHandler::for_run(&run, connection));
//! let cursor = ResultCursor::new(&run, pull)?;
//!
//! let mut stream = ReactiveRecordStream::new(Arc::new(cursor), 1000);
//! while let Some(record) = stream.next().await {
//!     println!("{}", record?);
//! }
//! println!("{:?}", stream.summary());
//! ```

mod cursor;
mod stream;

pub use cursor::{ResultCursor, ResultCursorBuilder, RunPhaseResult};
pub use stream::ReactiveRecordStream;
