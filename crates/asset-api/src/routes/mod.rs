//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/v1/auth` - 로그인, 토큰 갱신, 로그아웃, 현재 사용자
//! - `/api/v1/users` - 사용자 관리 (관리자 전용)
//! - `/api-docs/openapi.json` - OpenAPI 문서

pub mod auth;
pub mod health;
pub mod users;

pub use auth::{auth_router, LoginRequest, LoginResponse, RefreshRequest, TokenResponse, UserResponse};
pub use health::{health_router, HealthResponse};
pub use users::{users_router, CreateUserRequest, UpdateRoleRequest, UpdateStatusRequest};

use std::sync::Arc;

use axum::{http::StatusCode, Extension, Router};
use validator::Validate;

use crate::error::{ApiErrorResponse, ApiResult};
use crate::openapi::openapi_router;
use crate::state::AppState;

/// 전체 API 라우터 생성 (상태 미적용).
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/v1/auth", auth_router())
        .nest("/api/v1/users", users_router())
}

/// 상태와 인증 Extension이 적용된 라우터.
///
/// 인증 추출기는 Extension으로 등록된 `TokenService`를 사용합니다.
pub fn app_router(state: Arc<AppState>) -> Router {
    let tokens = state.tokens.clone();

    create_api_router()
        .with_state(state)
        .merge(openapi_router())
        .layer(Extension(tokens))
}

/// 요청 DTO 검증. 실패 시 400과 필드별 상세를 반환합니다.
pub(crate) fn validate_request<T: Validate>(request: &T) -> ApiResult<()> {
    request.validate().map_err(|errors| {
        let field_errors = errors.field_errors();
        let message = field_errors
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{}: invalid value", field))
                })
            })
            .collect::<Vec<_>>()
            .join("; ");

        let details = serde_json::to_value(&errors).unwrap_or_default();
        (
            StatusCode::BAD_REQUEST,
            axum::Json(ApiErrorResponse::new(message).with_details(details)),
        )
    })
}
