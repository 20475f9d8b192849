//! Axum용 인증/인가 추출기.
//!
//! 요청 처리 순서: 미인증 → 인증(토큰 검증) → 인가(역할 확인) → 핸들러.
//! 어느 단계든 실패하면 즉시 응답하며 다음 단계는 실행되지 않습니다.

use std::marker::PhantomData;
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::{debug, error};

use asset_core::Principal;

use super::error::AuthError;
use super::jwt::{TokenKind, TokenService};
use super::roles::{authorize, RolePolicy};

/// `Authorization` 헤더에서 bearer 토큰을 추출합니다.
///
/// 헤더는 정확히 `Bearer <token>` 형식이어야 합니다.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::Unauthenticated)?;

    match header.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::Unauthenticated),
    }
}

/// 인증 추출기.
///
/// 검증된 access 토큰의 주체를 핸들러에 전달합니다.
/// 저장소는 조회하지 않습니다.
///
/// ```rust,ignore
/// async fn me(AuthUser(principal): AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", principal.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(&parts.headers).inspect_err(|_| {
            debug!(path = %parts.uri.path(), "Missing or malformed Authorization header");
        })?;

        // 라우터가 Extension으로 등록한 토큰 서비스
        let tokens = parts.extensions.get::<Arc<TokenService>>().ok_or_else(|| {
            error!("TokenService extension is not installed on the router");
            AuthError::Store(asset_core::AssetError::Internal(
                "TokenService 미등록".to_string(),
            ))
        })?;

        let claims = tokens
            .verify(token, TokenKind::Access)
            .map_err(|_| AuthError::Unauthenticated)?;

        Ok(AuthUser(claims.principal()))
    }
}

/// 역할 정책을 요구하는 추출기.
///
/// ```rust,ignore
/// async fn create_user(user: Authorized<AdminOnly>) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct Authorized<P> {
    pub principal: Principal,
    _policy: PhantomData<fn() -> P>,
}

impl<P> Authorized<P> {
    pub fn into_principal(self) -> Principal {
        self.principal
    }
}

impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: RolePolicy,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;

        authorize(P::ALLOWED, &principal).inspect_err(|_| {
            debug!(
                user_id = %principal.user_id,
                role = %principal.role,
                path = %parts.uri.path(),
                "Role not permitted"
            );
        })?;

        Ok(Authorized {
            principal,
            _policy: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_bearer_rejects_other_forms() {
        for value in ["Token abc", "bearer abc", "Bearer", "Bearer ", "Basic dXNlcjpwYXNz", "abc"] {
            assert!(
                matches!(extract_bearer(&headers(value)), Err(AuthError::Unauthenticated)),
                "accepted {:?}",
                value
            );
        }
    }

    #[test]
    fn test_extract_bearer_missing_header() {
        assert!(matches!(
            extract_bearer(&HeaderMap::new()),
            Err(AuthError::Unauthenticated)
        ));
    }
}
