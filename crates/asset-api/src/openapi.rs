//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성하고
//! `/api-docs/openapi.json` 경로로 제공합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::{routing::get, Json, Router};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use asset_core::{Principal, Role, UserStatus};

use crate::error::{ApiErrorResponse, ErrorBody};
use crate::routes::{
    CreateUserRequest, HealthResponse, LoginRequest, LoginResponse, RefreshRequest,
    TokenResponse, UpdateRoleRequest, UpdateStatusRequest, UserResponse,
};

/// Bearer 인증 스키마 등록.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// Asset Tracker API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Asset Tracker API",
        description = r#"
# Asset Tracker 인증/권한 API

자산/장비/수리 이력 관리 시스템의 인증 및 사용자 관리 API입니다.

## 인증

보호된 엔드포인트는 `Authorization: Bearer <accessToken>` 헤더가 필요합니다.
access 토큰이 만료되면 `POST /api/v1/auth/refresh`로 새 토큰 쌍을 발급받으세요.
"#,
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::health_ready,
        crate::routes::auth::login,
        crate::routes::auth::refresh,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::users::create_user,
        crate::routes::users::update_role,
        crate::routes::users::update_status,
    ),
    components(schemas(
        ApiErrorResponse,
        ErrorBody,
        HealthResponse,
        LoginRequest,
        LoginResponse,
        RefreshRequest,
        TokenResponse,
        UserResponse,
        CreateUserRequest,
        UpdateRoleRequest,
        UpdateStatusRequest,
        Principal,
        Role,
        UserStatus,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "헬스 체크"),
        (name = "auth", description = "로그인, 토큰 갱신, 로그아웃"),
        (name = "users", description = "사용자 관리 (관리자 전용)")
    )
)]
pub struct ApiDoc;

/// OpenAPI JSON 라우터.
pub fn openapi_router() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_contains_auth_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/api/v1/auth/login",
            "/api/v1/auth/refresh",
            "/api/v1/auth/logout",
            "/api/v1/auth/me",
            "/api/v1/users",
            "/api/v1/users/{id}/role",
            "/api/v1/users/{id}/status",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_openapi_serializes() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("bearer_auth"));
    }
}
