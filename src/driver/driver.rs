//! Driver 설정
//!
//! 서버 주소와 라우팅/스트리밍 설정

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{DriverError, DriverResult};
use super::routing::RoutingPolicy;

/// 기본 Bolt 포트
pub const DEFAULT_PORT: u16 = 7687;

/// 기본 fetch size (PULL 한 번에 요청하는 레코드 수)
pub const DEFAULT_FETCH_SIZE: u64 = 1000;

/// 기본 데이터베이스
pub const DEFAULT_DATABASE: &str = "zeta4g";

// ============================================================================
// ServerAddress - 서버 주소
// ============================================================================

/// 서버 주소
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerAddress {
    /// 호스트
    pub host: String,
    /// 포트
    pub port: u16,
}

impl ServerAddress {
    /// 새 서버 주소 생성
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// URI에서 파싱
    pub fn from_uri(uri: &str) -> DriverResult<Self> {
        // bolt://host:port 또는 zeta4g://host:port 형식 파싱
        let uri = strip_scheme(uri);

        let parts: Vec<&str> = uri.split(':').collect();
        match parts.as_slice() {
            [host] if !host.is_empty() => Ok(Self::new(*host, DEFAULT_PORT)),
            [host, port] if !host.is_empty() => {
                let port = port
                    .parse()
                    .map_err(|_| DriverError::configuration(format!("Invalid port: {}", port)))?;
                Ok(Self::new(*host, port))
            }
            _ => Err(DriverError::configuration(format!(
                "Invalid server address: {}",
                uri
            ))),
        }
    }

    /// 소켓 주소로 변환
    pub fn to_socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_PORT)
    }
}

fn strip_scheme(uri: &str) -> &str {
    const SCHEMES: [&str; 6] = [
        "bolt://",
        "bolt+s://",
        "bolt+ssc://",
        "zeta4g://",
        "zeta4g+s://",
        "zeta4g+ssc://",
    ];
    SCHEMES
        .iter()
        .find_map(|scheme| uri.strip_prefix(scheme))
        .unwrap_or(uri)
        .trim_end_matches('/')
}

/// 쉼표로 구분된 라우터 목록 파싱
///
/// `zeta4g://server1:7687,server2:7687`
pub fn parse_routers(uri: &str) -> DriverResult<Vec<ServerAddress>> {
    let routers = strip_scheme(uri)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ServerAddress::from_uri)
        .collect::<DriverResult<Vec<_>>>()?;

    if routers.is_empty() {
        return Err(DriverError::configuration("At least one router is required"));
    }
    Ok(routers)
}

// ============================================================================
// DriverConfig - 드라이버 설정
// ============================================================================

/// 드라이버 설정
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// 초기 라우터 주소
    pub routers: Vec<ServerAddress>,
    /// 데이터베이스 이름
    pub database: String,
    /// 서버 선택 정책
    pub routing_policy: RoutingPolicy,
    /// Fetch Size
    pub fetch_size: u64,
}

impl DriverConfig {
    /// 새 설정 생성
    pub fn new(uri: &str) -> DriverResult<Self> {
        Ok(Self {
            routers: parse_routers(uri)?,
            ..Self::default()
        })
    }

    /// 빌더 시작
    pub fn builder(uri: &str) -> DriverResult<DriverConfigBuilder> {
        let config = Self::new(uri)?;
        Ok(DriverConfigBuilder { config })
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            routers: vec![ServerAddress::default()],
            database: DEFAULT_DATABASE.to_string(),
            routing_policy: RoutingPolicy::default(),
            fetch_size: DEFAULT_FETCH_SIZE,
        }
    }
}

// ============================================================================
// DriverConfigBuilder - 설정 빌더
// ============================================================================

/// 드라이버 설정 빌더
pub struct DriverConfigBuilder {
    config: DriverConfig,
}

impl DriverConfigBuilder {
    /// 데이터베이스 설정
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.config.database = database.into();
        self
    }

    /// 라우팅 정책 설정
    pub fn with_routing_policy(mut self, policy: RoutingPolicy) -> Self {
        self.config.routing_policy = policy;
        self
    }

    /// Fetch Size 설정 (0은 1로 올림)
    pub fn with_fetch_size(mut self, size: u64) -> Self {
        self.config.fetch_size = size.max(1);
        self
    }

    /// 빌드
    pub fn build(self) -> DriverConfig {
        self.config
    }
}
