//! 응답 핸들러
//!
//! RUN / PULL 응답을 받아 결과 커서에 필요한 상태로 바꿉니다.
//! 연결 계층은 응답을 디코딩한 뒤 해당 핸들러의 `on_*` 메서드를 호출합니다.

mod metadata;
mod pull;
mod run;

pub use metadata::SuccessMetadata;
pub use pull::{
    BasicPullHandler, MessageSink, PullController, PullState, RecordConsumer, StreamRequest,
    SummaryConsumer,
};
pub use run::{RunOutcome, RunResponseHandler};
