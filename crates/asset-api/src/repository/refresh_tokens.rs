//! Refresh Token Repository
//!
//! refresh 토큰 해시 저장소. 평문 토큰은 저장하지 않습니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;
use uuid::Uuid;

use asset_core::{AssetError, AssetResult};

// ================================================================================================
// Types
// ================================================================================================

/// refresh 토큰 레코드.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// 솔트가 포함된 단방향 해시 (PHC 형식)
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// 새 refresh 토큰 레코드 입력.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewRefreshToken {
    fn into_record(self) -> RefreshTokenRecord {
        RefreshTokenRecord {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

// ================================================================================================
// Trait
// ================================================================================================

/// refresh 토큰 저장소.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// 레코드 저장.
    async fn insert(&self, token: NewRefreshToken) -> AssetResult<RefreshTokenRecord>;

    /// 사용자의 만료되지 않은 레코드를 최신순으로 조회.
    async fn list_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AssetResult<Vec<RefreshTokenRecord>>;

    /// 단일 레코드 삭제. 삭제 여부 반환.
    async fn delete(&self, id: Uuid) -> AssetResult<bool>;

    /// 사용자의 모든 레코드 삭제. 삭제된 개수 반환.
    async fn delete_for_user(&self, user_id: Uuid) -> AssetResult<u64>;

    /// 만료된 레코드 삭제. 삭제된 개수 반환.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AssetResult<u64>;
}

// ================================================================================================
// PostgreSQL
// ================================================================================================

/// PostgreSQL refresh 토큰 저장소 (`refresh_tokens` 테이블).
#[derive(Debug, Clone)]
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn insert(&self, token: NewRefreshToken) -> AssetResult<RefreshTokenRecord> {
        let record = token.into_record();

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.token_hash)
        .bind(record.expires_at)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(AssetError::database)?;

        Ok(record)
    }

    async fn list_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AssetResult<Vec<RefreshTokenRecord>> {
        sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at
            FROM refresh_tokens
            WHERE user_id = $1 AND expires_at > $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(AssetError::database)
    }

    async fn delete(&self, id: Uuid) -> AssetResult<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AssetError::database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> AssetResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AssetError::database)?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AssetResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(AssetError::database)?;

        Ok(result.rows_affected())
    }
}

// ================================================================================================
// In-memory
// ================================================================================================

/// 인메모리 refresh 토큰 저장소 (개발 모드 및 테스트용).
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    records: RwLock<Vec<RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 전체 레코드 수 (만료 포함).
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn insert(&self, token: NewRefreshToken) -> AssetResult<RefreshTokenRecord> {
        let record = token.into_record();
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AssetResult<Vec<RefreshTokenRecord>> {
        // 같은 시각에 저장된 레코드는 나중에 저장된 것이 앞에 온다
        let mut active: Vec<RefreshTokenRecord> = self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id && r.expires_at > now)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active)
    }

    async fn delete(&self, id: Uuid) -> AssetResult<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> AssetResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.user_id != user_id);
        Ok((before - records.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AssetResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.expires_at > now);
        Ok((before - records.len()) as u64)
    }
}
