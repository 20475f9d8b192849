//! 사용자 식별 정보.
//!
//! 사용자는 관리자만 생성할 수 있으며 역할/상태 변경으로만 수정되고,
//! 물리적으로 삭제되지 않습니다 (비활성화만 가능).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 사용자 역할.
///
/// 닫힌 집합이며 역할 간 상하 관계는 없습니다.
/// 접근 허용 여부는 라우트가 선언한 허용 역할 집합과의 정확한 일치로만 판단합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 관리자 - 사용자 관리 포함
    Admin,
    /// 직원 - 자산/장비/수리 기록 업무
    Staff,
}

impl Role {
    /// 모든 역할.
    pub const ALL: [Role; 2] = [Role::Admin, Role::Staff];

    /// 문자열에서 역할 파싱 (대소문자 무시).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }

    /// 저장소/직렬화용 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 계정 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// 로그인 가능
    #[default]
    Active,
    /// 로그인/토큰 갱신 불가
    Inactive,
}

impl UserStatus {
    /// 문자열에서 상태 파싱 (대소문자 무시).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(UserStatus::Active),
            "inactive" => Some(UserStatus::Inactive),
            _ => None,
        }
    }

    /// 저장소/직렬화용 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 저장된 사용자 레코드.
///
/// `password_hash`는 항상 PHC 형식 해시이며 평문이 저장되지 않습니다.
/// `Debug` 출력에서도 해시는 가려집니다.
#[derive(Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserIdentity")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("status", &self.status)
            .finish()
    }
}

impl UserIdentity {
    /// 활성 계정 여부.
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// 토큰에 담길 식별 스냅샷.
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// 새 사용자 생성 입력 (해시는 호출자가 미리 계산).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    /// 생성 시각을 받아 활성 상태의 레코드로 변환합니다.
    pub fn into_identity(self, now: DateTime<Utc>) -> UserIdentity {
        UserIdentity {
            id: Uuid::new_v4(),
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            password_hash: self.password_hash,
            role: self.role,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 인증된 요청 주체.
///
/// 토큰 발급 시점의 스냅샷이며 요청마다 사용자 상태를 다시 조회하지 않습니다.
/// 역할/상태 변경은 최대 access 토큰 수명만큼 늦게 반영됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_user() -> UserIdentity {
        NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice Kim".to_string(),
            password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            role: Role::Staff,
        }
        .into_identity(Utc::now())
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("STAFF"), Some(Role::Staff));
        assert_eq!(Role::parse("viewer"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let parsed: Role = serde_json::from_str("\"staff\"").unwrap();
        assert_eq!(parsed, Role::Staff);

        // 닫힌 집합 밖의 역할은 역직렬화 단계에서 거부된다
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(UserStatus::parse("Active"), Some(UserStatus::Active));
        assert_eq!(UserStatus::parse("inactive"), Some(UserStatus::Inactive));
        assert_eq!(UserStatus::parse("deleted"), None);
    }

    #[test]
    fn test_new_user_is_active() {
        let user = sample_user();
        assert!(user.is_active());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_principal_snapshot() {
        let user = sample_user();
        let principal = user.principal();

        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.role, Role::Staff);

        let json = serde_json::to_value(&principal).unwrap();
        assert!(json.get("userId").is_some());
    }

    #[test]
    fn test_debug_redacts_hash() {
        let user = sample_user();
        let debug = format!("{:?}", user);
        assert!(!debug.contains("argon2id"));
        assert!(debug.contains("<redacted>"));
    }

    proptest! {
        #[test]
        fn prop_role_str_round_trip(role in prop::sample::select(Role::ALL.to_vec())) {
            prop_assert_eq!(Role::parse(role.as_str()), Some(role));
            prop_assert_eq!(Role::parse(&role.to_string().to_uppercase()), Some(role));
        }
    }
}
