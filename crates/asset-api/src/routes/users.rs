//! 사용자 관리 endpoint (관리자 전용).
//!
//! 사용자는 삭제되지 않으며, 역할/상태 변경만 가능합니다.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{patch, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use asset_core::{NewUser, Role, UserStatus};

use super::auth::UserResponse;
use super::validate_request;
use crate::auth::{validate_password_strength, AdminOnly, Authorized, AuthError};
use crate::error::{api_error, store_error, ApiResponse, ApiResult};
use crate::state::AppState;

// ==================== 요청 타입 ====================

fn validate_password(password: &str) -> Result<(), ValidationError> {
    validate_password_strength(password).map_err(|msg| {
        let mut err = ValidationError::new("password_strength");
        err.message = Some(msg.into());
        err
    })
}

/// 사용자 생성 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50, message = "username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "fullName is required"))]
    pub full_name: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    pub role: Role,
}

/// 역할 변경 요청.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// 상태 변경 요청.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: UserStatus,
}

// ==================== 핸들러 ====================

/// 사용자 생성.
///
/// POST /api/v1/users
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "생성됨", body = UserResponse),
        (status = 400, description = "입력 검증 실패", body = crate::error::ApiErrorResponse),
        (status = 403, description = "관리자 권한 필요", body = crate::error::ApiErrorResponse),
        (status = 409, description = "사용자명/이메일 중복", body = crate::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user(
    admin: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    validate_request(&request)?;

    let password_hash = state
        .auth
        .hasher()
        .hash_async(request.password)
        .await
        .map_err(AuthError::from)?;

    let user = state
        .users
        .create(NewUser {
            username: request.username,
            email: request.email,
            full_name: request.full_name,
            password_hash,
            role: request.role,
        })
        .await
        .map_err(store_error)?;

    info!(
        admin_id = %admin.principal.user_id,
        user_id = %user.id,
        role = %user.role,
        "User created"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(UserResponse::from(&user)))))
}

/// 역할 변경.
///
/// PATCH /api/v1/users/{id}/role
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}/role",
    params(("id" = Uuid, Path, description = "사용자 ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "변경됨", body = UserResponse),
        (status = 403, description = "관리자 권한 필요", body = crate::error::ApiErrorResponse),
        (status = 404, description = "사용자 없음", body = crate::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_role(
    admin: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRoleRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    if id == admin.principal.user_id {
        return Err(api_error(StatusCode::BAD_REQUEST, "cannot change your own role"));
    }

    let user = state
        .users
        .set_role(id, request.role)
        .await
        .map_err(store_error)?;

    info!(admin_id = %admin.principal.user_id, user_id = %id, role = %user.role, "User role changed");
    Ok(Json(ApiResponse::ok(UserResponse::from(&user))))
}

/// 상태 변경.
///
/// 비활성화 시 해당 사용자의 모든 refresh 토큰이 폐기됩니다.
/// 이미 발급된 access 토큰은 만료될 때까지 유효합니다.
///
/// PATCH /api/v1/users/{id}/status
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}/status",
    params(("id" = Uuid, Path, description = "사용자 ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "변경됨", body = UserResponse),
        (status = 403, description = "관리자 권한 필요", body = crate::error::ApiErrorResponse),
        (status = 404, description = "사용자 없음", body = crate::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_status(
    admin: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    if id == admin.principal.user_id {
        return Err(api_error(StatusCode::BAD_REQUEST, "cannot change your own status"));
    }

    let user = state
        .users
        .set_status(id, request.status)
        .await
        .map_err(store_error)?;

    if !user.is_active() {
        state.auth.revoke_sessions(&user).await?;
    }

    info!(admin_id = %admin.principal.user_id, user_id = %id, status = %user.status, "User status changed");
    Ok(Json(ApiResponse::ok(UserResponse::from(&user))))
}

/// 사용자 관리 라우터 생성.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_user))
        .route("/{id}/role", patch(update_role))
        .route("/{id}/status", patch(update_status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_validation() {
        let valid = CreateUserRequest {
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            full_name: "Bob Lee".to_string(),
            password: "Password1".to_string(),
            role: Role::Staff,
        };
        assert!(valid.validate().is_ok());

        let weak = CreateUserRequest {
            password: "password".to_string(),
            ..valid
        };
        let errors = weak.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_create_user_rejects_bad_email() {
        let request = CreateUserRequest {
            username: "bob".to_string(),
            email: "not-an-email".to_string(),
            full_name: "Bob Lee".to_string(),
            password: "Password1".to_string(),
            role: Role::Staff,
        };
        assert!(request.validate().unwrap_err().field_errors().contains_key("email"));
    }

    #[test]
    fn test_role_request_rejects_unknown_role() {
        let parsed = serde_json::from_str::<UpdateRoleRequest>(r#"{"role":"superuser"}"#);
        assert!(parsed.is_err());
    }
}
