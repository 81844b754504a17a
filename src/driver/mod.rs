//! Driver Module
//!
//! 클러스터 드라이버의 라우팅과 결과 스트리밍 코어
//!
//! # Components
//!
//! - 라우팅: 역할별 라운드 로빈 서버 선택 (RoutingTable, LoadBalancer)
//! - 응답 핸들러: RUN / PULL 응답 상태 관리 (RunResponseHandler, BasicPullHandler)
//! - 리액티브 결과: 요청량 기반 결과 커서와 비동기 스트림 (ResultCursor, ReactiveRecordStream)
//!
//! # Example
//!
//! ```ignore
//! use zeta4g_driver_core::driver::routing::{AccessMode, LoadBalancer};
//! use zeta4g_driver_core::driver::DriverConfig;
//!
//! let config = DriverConfig::builder("zeta4g://server1:7687,server2:7687")?
//!     .with_fetch_size(500)
//!     .build();
//!
//! // 읽기 서버 선택
//! let balancer = LoadBalancer::from_config(&config);
//! let reader = balancer.select(AccessMode::Read)?;
//! ```

pub mod handlers;
pub mod reactive;
pub mod routing;
mod driver;
mod error;
mod record;
mod summary;
mod types;

// Re-exports
pub use driver::{
    parse_routers, DriverConfig, DriverConfigBuilder, ServerAddress, DEFAULT_DATABASE,
    DEFAULT_FETCH_SIZE, DEFAULT_PORT,
};
pub use error::{BoltError, DriverError, DriverResult};
pub use record::Record;
pub use summary::{Counters, QueryType, ResultSummary};
pub use types::Value;
