//! 시스템 공용 에러 타입.
//!
//! 저장소 어댑터, 설정 로더 등 도메인 경계에서 사용하는 에러를 정의합니다.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum AssetError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 인증 에러
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 중복 (유니크 제약 위반)
    #[error("중복: {0}")]
    Conflict(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type AssetResult<T> = Result<T, AssetError>;

impl AssetError {
    /// 임의의 드라이버 에러를 데이터베이스 에러로 변환합니다.
    pub fn database(err: impl std::fmt::Display) -> Self {
        AssetError::Database(err.to_string())
    }

    /// 호출자가 입력을 고쳐 다시 시도할 수 있는 에러인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AssetError::InvalidInput(_) | AssetError::NotFound(_) | AssetError::Conflict(_)
        )
    }
}

impl From<serde_json::Error> for AssetError {
    fn from(err: serde_json::Error) -> Self {
        AssetError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for AssetError {
    fn from(err: config::ConfigError) -> Self {
        AssetError::Config(err.to_string())
    }
}
