//! 인증 endpoint.
//!
//! - `POST /api/v1/auth/login` - 로그인 (access + refresh 토큰 발급)
//! - `POST /api/v1/auth/refresh` - 토큰 갱신 (refresh 토큰 rotation)
//! - `POST /api/v1/auth/logout` - 로그아웃 (refresh 토큰 폐기)
//! - `GET /api/v1/auth/me` - 현재 사용자

use std::sync::Arc;

use axum::{extract::State, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use asset_core::{Principal, Role, UserIdentity, UserStatus};

use super::validate_request;
use crate::auth::{AnyRole, Authorized, TokenPair};
use crate::error::{ApiResponse, ApiResult};
use crate::state::AppState;

// ==================== 요청/응답 타입 ====================

/// 로그인 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// 사용자명 또는 이메일
    #[validate(length(min = 1, max = 255, message = "usernameOrEmail is required"))]
    pub username_or_email: String,
    #[validate(length(min = 1, max = 1024, message = "password is required"))]
    pub password: String,
}

/// refresh 토큰 요청 (갱신/로그아웃 공용).
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refreshToken is required"))]
    pub refresh_token: String,
}

/// 사용자 공개 정보.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub status: UserStatus,
}

impl From<&UserIdentity> for UserResponse {
    fn from(user: &UserIdentity) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            status: user.status,
        }
    }
}

/// 발급된 토큰 쌍.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// access 토큰 수명 (초)
    pub expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        let expires_in = pair.expires_in();
        Self {
            access_token: pair.access.token,
            refresh_token: pair.refresh.token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// 로그인 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenResponse,
    pub user: UserResponse,
}

// ==================== 핸들러 ====================

/// 로그인.
///
/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = LoginResponse),
        (status = 400, description = "입력 검증 실패", body = crate::error::ApiErrorResponse),
        (status = 401, description = "자격 증명 불일치", body = crate::error::ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    validate_request(&request)?;

    let outcome = state
        .auth
        .login(&request.username_or_email, &request.password)
        .await?;

    Ok(Json(ApiResponse::ok(LoginResponse {
        user: UserResponse::from(&outcome.user),
        tokens: outcome.tokens.into(),
    })))
}

/// 토큰 갱신.
///
/// POST /api/v1/auth/refresh
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "갱신 성공", body = TokenResponse),
        (status = 401, description = "refresh 토큰 거부", body = crate::error::ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<TokenResponse>>> {
    validate_request(&request)?;

    let pair = state.auth.refresh(&request.refresh_token).await?;
    Ok(Json(ApiResponse::ok(pair.into())))
}

/// 로그아웃.
///
/// POST /api/v1/auth/logout
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    request_body = RefreshRequest,
    responses((status = 200, description = "로그아웃 완료")),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.auth.logout(&request.refresh_token).await?;
    Ok(Json(ApiResponse::empty()))
}

/// 현재 사용자.
///
/// GET /api/v1/auth/me
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "현재 사용자", body = Principal),
        (status = 401, description = "인증 필요", body = crate::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(user: Authorized<AnyRole>) -> Json<ApiResponse<Principal>> {
    Json(ApiResponse::ok(user.into_principal()))
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
}
