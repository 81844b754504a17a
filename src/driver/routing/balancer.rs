//! 로드 밸런서
//!
//! 라우팅 테이블과 선택 전략을 묶어 접근 모드별로 서버를 고릅니다.

use std::sync::Arc;

use parking_lot::RwLock;

use super::policy::{ConnectionCounter, LoadBalancingStrategy, RoutingPolicy};
use super::table::{AccessMode, RoutingTable, ServerRole};
use super::super::driver::{DriverConfig, ServerAddress};
use super::super::error::{DriverError, DriverResult};

/// 로드 밸런서
///
/// 테이블이 갱신되어도 전략의 인덱스는 그대로 유지됩니다.
pub struct LoadBalancer {
    table: RwLock<RoutingTable>,
    strategy: Box<dyn LoadBalancingStrategy>,
    connections: Arc<ConnectionCounter>,
}

impl LoadBalancer {
    /// 새 로드 밸런서 생성
    pub fn new(table: RoutingTable, policy: RoutingPolicy) -> Self {
        let connections = Arc::new(ConnectionCounter::new());
        Self {
            table: RwLock::new(table),
            strategy: policy.into_strategy(Arc::clone(&connections)),
            connections,
        }
    }

    /// 설정으로 생성 (초기 라우터를 리더로 사용)
    pub fn from_config(config: &DriverConfig) -> Self {
        let table = RoutingTable::with_initial_routers(config.database.clone(), config.routers.clone());
        Self::new(table, config.routing_policy)
    }

    /// 접근 모드에 맞는 서버 선택
    pub fn select(&self, mode: AccessMode) -> DriverResult<ServerAddress> {
        let table = self.table.read();
        let selected = match mode.role() {
            ServerRole::Write => self.strategy.select_writer(&table.writers),
            _ => self.strategy.select_reader(&table.readers),
        };

        match selected {
            Some(address) => {
                tracing::debug!(
                    database = %table.database,
                    role = mode.role().as_str(),
                    %address,
                    "selected server"
                );
                Ok(address.clone())
            }
            None => Err(DriverError::service_unavailable(format!(
                "No {} servers available for database '{}'",
                mode.role().as_str().to_lowercase(),
                table.database
            ))),
        }
    }

    /// 라우팅 테이블 갱신
    pub fn update(
        &self,
        routers: Vec<ServerAddress>,
        writers: Vec<ServerAddress>,
        readers: Vec<ServerAddress>,
    ) {
        let mut table = self.table.write();
        table.update(routers, writers, readers);
        tracing::debug!(
            database = %table.database,
            routers = table.routers.len(),
            writers = table.writers.len(),
            readers = table.readers.len(),
            "routing table updated"
        );
    }

    /// 응답하지 않는 서버를 테이블에서 제거
    pub fn forget(&self, address: &ServerAddress) {
        self.table.write().remove_server(address);
        tracing::debug!(%address, "server removed from routing table");
    }

    /// 라우팅 테이블 스냅샷
    pub fn routing_table(&self) -> RoutingTable {
        self.table.read().clone()
    }

    /// 연결 획득 알림 (LeastConnected용)
    pub fn on_connection_acquired(&self, server: &ServerAddress) {
        self.connections.acquire(server);
    }

    /// 연결 해제 알림 (LeastConnected용)
    pub fn on_connection_released(&self, server: &ServerAddress) {
        self.connections.release(server);
    }
}
