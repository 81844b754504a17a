//! 라우팅 모듈
//!
//! 클러스터 환경에서 읽기/쓰기 서버를 선택합니다.
//!
//! # 예시
//!
//! ```ignore
//! use zeta4g_driver_core::driver::routing::{AccessMode, LoadBalancer};
//! use zeta4g_driver_core::driver::DriverConfig;
//!
//! let config = DriverConfig::builder("zeta4g://server1:7687,server2:7687")?.build();
//! let balancer = LoadBalancer::from_config(&config);
//!
//! // 읽기는 팔로워로, 쓰기는 리더로
//! let reader = balancer.select(AccessMode::Read)?;
//! ```

mod balancer;
mod policy;
mod table;

pub use balancer::LoadBalancer;
pub use policy::{
    ConnectionCounter, LeastConnectedStrategy, LoadBalancingStrategy, RoundRobinIndex,
    RoundRobinStrategy, RoutingPolicy,
};
pub use table::{AccessMode, RoutingTable, ServerRole};
