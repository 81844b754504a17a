//! 라우팅 테이블
//!
//! 클러스터의 서버 역할별 목록을 담습니다. 테이블을 채우고 갱신하는 일은
//! 라우팅 프로시저를 호출하는 상위 계층의 몫입니다.

use super::super::driver::ServerAddress;

/// 서버 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerRole {
    /// 라우팅 테이블 제공자
    Route,
    /// 쓰기 트랜잭션 처리 (리더)
    Write,
    /// 읽기 트랜잭션 처리 (팔로워)
    Read,
}

impl ServerRole {
    /// 문자열에서 역할 파싱
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ROUTE" => Some(Self::Route),
            "WRITE" => Some(Self::Write),
            "READ" => Some(Self::Read),
            _ => None,
        }
    }

    /// 역할을 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "ROUTE",
            Self::Write => "WRITE",
            Self::Read => "READ",
        }
    }
}

/// 접근 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// 읽기
    #[default]
    Read,
    /// 쓰기
    Write,
}

impl AccessMode {
    /// 접근 모드에 대응하는 서버 역할
    pub fn role(&self) -> ServerRole {
        match self {
            Self::Read => ServerRole::Read,
            Self::Write => ServerRole::Write,
        }
    }
}

/// 라우팅 테이블
#[derive(Debug, Clone)]
pub struct RoutingTable {
    /// 라우터 목록 (라우팅 테이블 조회용)
    pub routers: Vec<ServerAddress>,
    /// 라이터 목록 (쓰기 트랜잭션용)
    pub writers: Vec<ServerAddress>,
    /// 리더 목록 (읽기 트랜잭션용)
    pub readers: Vec<ServerAddress>,
    /// 데이터베이스 이름
    pub database: String,
}

impl RoutingTable {
    /// 빈 라우팅 테이블 생성
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            routers: Vec::new(),
            writers: Vec::new(),
            readers: Vec::new(),
            database: database.into(),
        }
    }

    /// 초기 라우터로 테이블 생성
    ///
    /// 첫 갱신 전까지 초기 라우터를 리더로도 사용합니다.
    pub fn with_initial_routers(database: impl Into<String>, routers: Vec<ServerAddress>) -> Self {
        Self {
            readers: routers.clone(),
            routers,
            writers: Vec::new(),
            database: database.into(),
        }
    }

    /// 역할별 목록 전체 교체
    pub fn update(
        &mut self,
        routers: Vec<ServerAddress>,
        writers: Vec<ServerAddress>,
        readers: Vec<ServerAddress>,
    ) {
        self.routers = routers;
        self.writers = writers;
        self.readers = readers;
    }

    /// 역할별 서버 목록
    pub fn servers(&self, role: ServerRole) -> &[ServerAddress] {
        match role {
            ServerRole::Route => &self.routers,
            ServerRole::Write => &self.writers,
            ServerRole::Read => &self.readers,
        }
    }

    /// 서버 제거 (연결 실패 등)
    pub fn remove_server(&mut self, address: &ServerAddress) {
        self.routers.retain(|a| a != address);
        self.writers.retain(|a| a != address);
        self.readers.retain(|a| a != address);
    }

    /// 쓰기 가능한 서버가 있는지 확인
    pub fn has_writers(&self) -> bool {
        !self.writers.is_empty()
    }

    /// 읽기 가능한 서버가 있는지 확인
    pub fn has_readers(&self) -> bool {
        !self.readers.is_empty()
    }
}
