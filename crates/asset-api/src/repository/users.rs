//! User Repository
//!
//! 사용자 식별 정보(credential store) 조회 및 관리.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;
use uuid::Uuid;

use asset_core::{AssetError, AssetResult, NewUser, Role, UserIdentity, UserStatus};

// ================================================================================================
// Trait
// ================================================================================================

/// 사용자 저장소.
///
/// 사용자는 삭제되지 않으며 역할/상태 변경으로만 수정됩니다.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 사용자명 또는 이메일로 활성 사용자 조회.
    ///
    /// 비활성 사용자는 존재하지 않는 것처럼 `None`을 반환합니다.
    /// 한 사용자의 사용자명이 다른 사용자의 이메일과 같으면 사용자명 일치가 우선합니다.
    async fn find_active_by_username_or_email(
        &self,
        identifier: &str,
    ) -> AssetResult<Option<UserIdentity>>;

    /// ID로 사용자 조회 (상태 무관).
    async fn find_by_id(&self, id: Uuid) -> AssetResult<Option<UserIdentity>>;

    /// 사용자 생성. 사용자명/이메일 중복 시 `AssetError::Conflict`.
    async fn create(&self, user: NewUser) -> AssetResult<UserIdentity>;

    /// 역할 변경. 대상이 없으면 `AssetError::NotFound`.
    async fn set_role(&self, id: Uuid, role: Role) -> AssetResult<UserIdentity>;

    /// 상태 변경. 대상이 없으면 `AssetError::NotFound`.
    async fn set_status(&self, id: Uuid, status: UserStatus) -> AssetResult<UserIdentity>;
}

// ================================================================================================
// PostgreSQL
// ================================================================================================

/// `users` 테이블 레코드.
#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    full_name: String,
    password_hash: String,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserIdentity {
    type Error = AssetError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| AssetError::Database(format!("알 수 없는 역할: {}", row.role)))?;
        let status = UserStatus::parse(&row.status)
            .ok_or_else(|| AssetError::Database(format!("알 수 없는 상태: {}", row.status)))?;

        Ok(UserIdentity {
            id: row.id,
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            password_hash: row.password_hash,
            role,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str =
    "id, username, email, full_name, password_hash, role, status, created_at, updated_at";

/// PostgreSQL 사용자 저장소.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn update_column(
        &self,
        id: Uuid,
        column: &'static str,
        value: &str,
    ) -> AssetResult<UserIdentity> {
        let query = format!(
            "UPDATE users SET {} = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            column, USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(value)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AssetError::database)?
            .ok_or_else(|| AssetError::NotFound(format!("사용자 {}", id)))?;

        row.try_into()
    }
}

fn map_insert_error(err: sqlx::Error) -> AssetError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AssetError::Conflict("이미 사용 중인 사용자명 또는 이메일".to_string())
        }
        _ => AssetError::database(err),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_active_by_username_or_email(
        &self,
        identifier: &str,
    ) -> AssetResult<Option<UserIdentity>> {
        let query = format!(
            r#"
            SELECT {}
            FROM users
            WHERE (username = $1 OR LOWER(email) = LOWER($1))
              AND status = 'active'
            ORDER BY (username = $1) DESC, created_at ASC
            LIMIT 1
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(AssetError::database)?;

        row.map(UserIdentity::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> AssetResult<Option<UserIdentity>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AssetError::database)?;

        row.map(UserIdentity::try_from).transpose()
    }

    async fn create(&self, user: NewUser) -> AssetResult<UserIdentity> {
        let identity = user.into_identity(Utc::now());
        let query = format!(
            r#"
            INSERT INTO users (id, username, email, full_name, password_hash, role, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(identity.id)
            .bind(&identity.username)
            .bind(&identity.email)
            .bind(&identity.full_name)
            .bind(&identity.password_hash)
            .bind(identity.role.as_str())
            .bind(identity.status.as_str())
            .bind(identity.created_at)
            .bind(identity.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)?;

        row.try_into()
    }

    async fn set_role(&self, id: Uuid, role: Role) -> AssetResult<UserIdentity> {
        self.update_column(id, "role", role.as_str()).await
    }

    async fn set_status(&self, id: Uuid, status: UserStatus) -> AssetResult<UserIdentity> {
        self.update_column(id, "status", status.as_str()).await
    }
}

// ================================================================================================
// In-memory
// ================================================================================================

/// 인메모리 사용자 저장소 (개발 모드 및 테스트용).
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, UserIdentity>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> AssetResult<UserIdentity>
    where
        F: FnOnce(&mut UserIdentity) + Send,
    {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AssetError::NotFound(format!("사용자 {}", id)))?;

        apply(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_active_by_username_or_email(
        &self,
        identifier: &str,
    ) -> AssetResult<Option<UserIdentity>> {
        let users = self.users.read().await;

        // 사용자명 일치가 이메일 일치보다 우선
        let by_username = users
            .values()
            .find(|u| u.is_active() && u.username == identifier);
        let found = by_username.or_else(|| {
            users
                .values()
                .find(|u| u.is_active() && u.email.eq_ignore_ascii_case(identifier))
        });
        Ok(found.cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AssetResult<Option<UserIdentity>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> AssetResult<UserIdentity> {
        let mut users = self.users.write().await;
        let duplicate = users.values().any(|u| {
            u.username == user.username || u.email.eq_ignore_ascii_case(&user.email)
        });
        if duplicate {
            return Err(AssetError::Conflict(
                "이미 사용 중인 사용자명 또는 이메일".to_string(),
            ));
        }

        let identity = user.into_identity(Utc::now());
        users.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> AssetResult<UserIdentity> {
        self.update(id, |u| u.role = role).await
    }

    async fn set_status(&self, id: Uuid, status: UserStatus) -> AssetResult<UserIdentity> {
        self.update(id, |u| u.status = status).await
    }
}
