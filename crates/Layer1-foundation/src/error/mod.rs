//! Error types for Lineage
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Lineage 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 조회 관련
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ========================================================================
    // 등록 관련
    // ========================================================================
    #[error("Already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 생성 / 컨텍스트 관련
    // ========================================================================
    #[error("Construction failed: {component} - {message}")]
    Construction { component: String, message: String },

    #[error("Context released: {0}")]
    ContextReleased(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // ========================================================================
    // 채널 관련
    // ========================================================================
    #[error("Listener failed: {listener} - {message}")]
    Listener { listener: String, message: String },

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 조회 실패 에러인지 확인
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// 재시도 가능한 에러인지 확인
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// 호출자에게 그대로 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::Configuration(_)
                | Error::AlreadyRegistered(_)
                | Error::InvalidInput(_)
        )
    }

    /// 생성 에러 생성 헬퍼
    pub fn construction(component: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Construction {
            component: component.into(),
            message: message.into(),
        }
    }

    /// 리스너 에러 생성 헬퍼
    pub fn listener(listener: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Listener {
            listener: listener.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Internal(format!("{:#}", e))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
