//! 역할 기반 접근 제어 (RBAC).
//!
//! 라우트가 선언한 허용 역할 집합과 요청 주체의 역할을 정확히 비교합니다.
//! 역할 간 상하 관계는 없습니다.

use asset_core::{Principal, Role};

use super::error::AuthError;

/// 허용 역할 집합에 주체의 역할이 포함되는지 확인합니다.
///
/// 빈 집합은 모든 요청을 거부합니다.
pub fn authorize(allowed: &[Role], principal: &Principal) -> Result<(), AuthError> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// 라우트별 허용 역할 정책.
pub trait RolePolicy: Send + Sync + 'static {
    /// 허용 역할 집합
    const ALLOWED: &'static [Role];
}

/// 관리자 전용.
#[derive(Debug, Clone, Copy)]
pub struct AdminOnly;

impl RolePolicy for AdminOnly {
    const ALLOWED: &'static [Role] = &[Role::Admin];
}

/// 로그인한 모든 역할.
#[derive(Debug, Clone, Copy)]
pub struct AnyRole;

impl RolePolicy for AnyRole {
    const ALLOWED: &'static [Role] = &Role::ALL;
}
