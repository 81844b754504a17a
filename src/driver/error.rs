//! Driver Error Types
//!
//! 드라이버 에러 정의

use std::fmt;
use thiserror::Error;

// ============================================================================
// DriverError - 드라이버 에러
// ============================================================================

/// 드라이버 에러
///
/// RUN 실패는 소비자 콜백으로 여러 번 전달될 수 있으므로 `Clone`을 구현합니다.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// 연결 에러
    #[error("Connection error: {0}")]
    Connection(String),

    /// 프로토콜 에러
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// 쿼리 에러
    #[error("Query error: {code} - {message}")]
    Query { code: String, message: String },

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 타입 변환 에러
    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    /// 서버 에러
    #[error("Server error: {code} - {message}")]
    Server { code: String, message: String },

    /// 서비스 불가 (선택 가능한 서버 없음 등)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// 잘못된 호출 순서 (예: RUN 응답 전에 커서 생성)
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// 필수 인자 누락
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    /// 내부 에러
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DriverError {
    /// 연결 에러 생성
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// 프로토콜 에러 생성
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// 쿼리 에러 생성
    pub fn query(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 설정 에러 생성
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// 서비스 불가 에러 생성
    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// 타입 변환 에러 생성
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion(msg.into())
    }

    /// 서버 에러 생성
    pub fn server(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Server {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 상태 에러 생성
    pub fn illegal_state(msg: impl Into<String>) -> Self {
        Self::IllegalState(msg.into())
    }

    /// 인자 누락 에러 생성
    pub fn missing_argument(name: impl Into<String>) -> Self {
        Self::MissingArgument(name.into())
    }

    /// 내부 에러 생성
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 재시도 가능 여부
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::ServiceUnavailable(_) => true,
            Self::Server { code, .. } => is_retryable_code(code),
            _ => false,
        }
    }

    /// 클라이언트 에러 여부
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::TypeConversion(_)
                | Self::Query { .. }
                | Self::IllegalState(_)
                | Self::MissingArgument(_)
        )
    }
}

/// 재시도 가능한 에러 코드 확인
fn is_retryable_code(code: &str) -> bool {
    code.starts_with("Neo.TransientError")
        || code == "Neo.ClientError.Cluster.NotALeader"
        || code == "Neo.ClientError.General.ForbiddenOnReadOnlyDatabase"
}

// ============================================================================
// Result Type
// ============================================================================

/// 드라이버 결과 타입
pub type DriverResult<T> = Result<T, DriverError>;

// ============================================================================
// Bolt Server Error Codes
// ============================================================================

/// Bolt 서버 에러 코드
///
/// 서버의 FAILURE 응답을 나타냅니다.
/// 에러 코드는 "Neo.{Category}.{SubCategory}.{ErrorType}" 형식을 따릅니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoltError {
    /// 에러 코드
    pub code: String,
    /// 에러 메시지
    pub message: String,
}

impl BoltError {
    /// 새 에러 생성
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 클라이언트 에러 여부
    pub fn is_client_error(&self) -> bool {
        self.code.starts_with("Neo.ClientError")
    }

    /// 트랜지언트 에러 여부 (재시도 가능)
    pub fn is_transient_error(&self) -> bool {
        self.code.starts_with("Neo.TransientError")
    }

    /// 구문/의미 에러 여부
    pub fn is_statement_error(&self) -> bool {
        self.code.starts_with("Neo.ClientError.Statement")
    }
}

impl fmt::Display for BoltError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for BoltError {}

impl From<BoltError> for DriverError {
    fn from(err: BoltError) -> Self {
        if err.is_statement_error() {
            DriverError::Query {
                code: err.code,
                message: err.message,
            }
        } else if err.is_transient_error() {
            DriverError::ServiceUnavailable(err.message)
        } else {
            DriverError::Server {
                code: err.code,
                message: err.message,
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
