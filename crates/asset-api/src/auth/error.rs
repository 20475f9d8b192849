//! 인증/인가 에러.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use asset_core::AssetError;

use super::jwt::TokenError;
use super::password::PasswordError;
use crate::error::ApiErrorResponse;

/// 인증 흐름 에러.
///
/// 클라이언트에 보이는 메시지는 실패 원인을 드러내지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// 헤더 누락/형식 오류, 서명 불일치, 만료된 access 토큰
    #[error("authentication required")]
    Unauthenticated,
    /// 인증되었으나 허용되지 않은 역할
    #[error("insufficient permissions")]
    Forbidden,
    /// 로그인 실패 (사용자 없음, 비밀번호 불일치, 비활성 계정)
    #[error("invalid username/email or password")]
    InvalidCredentials,
    /// refresh 토큰 검증/대조 실패
    #[error("invalid or expired refresh token")]
    RefreshRejected,
    #[error("비밀번호 처리 실패: {0}")]
    Password(#[from] PasswordError),
    #[error("토큰 처리 실패: {0}")]
    Token(#[from] TokenError),
    #[error("저장소 에러: {0}")]
    Store(#[from] AssetError),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated
            | AuthError::InvalidCredentials
            | AuthError::RefreshRejected
            | AuthError::Token(TokenError::Invalid) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Password(_) | AuthError::Token(_) | AuthError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 클라이언트에 노출할 메시지.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Token(TokenError::Invalid) => AuthError::Unauthenticated.to_string(),
            AuthError::Password(_) | AuthError::Token(_) | AuthError::Store(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Authentication flow failed");
        }

        (status, Json(ApiErrorResponse::new(self.public_message()))).into_response()
    }
}

impl From<AuthError> for (StatusCode, Json<ApiErrorResponse>) {
    fn from(err: AuthError) -> Self {
        let status = err.status_code();
        if status.is_server_error() {
            error!(error = %err, "Authentication flow failed");
        }
        (status, Json(ApiErrorResponse::new(err.public_message())))
    }
}
