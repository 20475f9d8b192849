//! Refresh token ledger.
//!
//! 발급된 refresh 토큰을 해시로만 기록하고, 제시된 평문 토큰이 기록된 세션과
//! 일치하는지 확인합니다. 사용자별 여러 세션(멀티 디바이스)을 허용합니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use asset_core::{AssetError, AssetResult};

use super::clock::Clock;
use super::password::PasswordHasher;
use crate::repository::{NewRefreshToken, RefreshTokenRecord, RefreshTokenStore};

/// refresh 토큰 ledger.
pub struct RefreshTokenLedger {
    store: Arc<dyn RefreshTokenStore>,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
}

impl RefreshTokenLedger {
    pub fn new(
        store: Arc<dyn RefreshTokenStore>,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            hasher,
            clock,
        }
    }

    /// refresh 토큰을 해싱하여 기록합니다.
    pub async fn store(
        &self,
        user_id: Uuid,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> AssetResult<RefreshTokenRecord> {
        let token_hash = self
            .hasher
            .hash_async(refresh_token.to_string())
            .await
            .map_err(|e| AssetError::Internal(e.to_string()))?;

        let record = self
            .store
            .insert(NewRefreshToken {
                user_id,
                token_hash,
                expires_at,
                created_at: self.clock.now(),
            })
            .await?;

        debug!(user_id = %user_id, record_id = %record.id, "Refresh token recorded");
        Ok(record)
    }

    /// 제시된 토큰과 일치하는 유효 레코드를 찾습니다.
    ///
    /// 만료되지 않은 레코드를 최신순으로 하나씩 검증하므로 비용은 사용자의
    /// 활성 세션 수에 비례합니다. 해시 검증은 하나의 블로킹 작업에서 수행됩니다.
    pub async fn find_matching(
        &self,
        user_id: Uuid,
        refresh_token: &str,
    ) -> AssetResult<Option<RefreshTokenRecord>> {
        let records = self.store.list_active(user_id, self.clock.now()).await?;
        if records.is_empty() {
            return Ok(None);
        }

        let hasher = self.hasher.clone();
        let plaintext = refresh_token.to_string();

        tokio::task::spawn_blocking(move || {
            records.into_iter().find(|record| {
                match hasher.verify(&plaintext, &record.token_hash) {
                    Ok(matched) => matched,
                    Err(e) => {
                        // 손상된 레코드 하나가 다른 세션을 막지 않도록 건너뛴다
                        warn!(record_id = %record.id, error = %e, "Unreadable refresh token hash");
                        false
                    }
                }
            })
        })
        .await
        .map_err(|e| AssetError::Internal(format!("ledger 검증 작업 실패: {}", e)))
    }

    /// 제시된 토큰이 사용자의 유효한 세션인지 확인합니다.
    pub async fn is_valid(&self, user_id: Uuid, refresh_token: &str) -> AssetResult<bool> {
        Ok(self.find_matching(user_id, refresh_token).await?.is_some())
    }

    /// 단일 세션 폐기.
    pub async fn revoke(&self, record_id: Uuid) -> AssetResult<bool> {
        self.store.delete(record_id).await
    }

    /// 사용자의 모든 세션 폐기.
    pub async fn revoke_all(&self, user_id: Uuid) -> AssetResult<u64> {
        self.store.delete_for_user(user_id).await
    }

    /// 만료된 레코드 정리.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> AssetResult<u64> {
        self.store.delete_expired(now).await
    }

    /// ledger 시계 기준 현재 시각.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::auth::password::test_hasher;
    use crate::repository::InMemoryRefreshTokenStore;
    use chrono::Duration;

    fn ledger() -> (RefreshTokenLedger, Arc<InMemoryRefreshTokenStore>, ManualClock) {
        let store = Arc::new(InMemoryRefreshTokenStore::new());
        let clock = ManualClock::starting_now();
        let ledger = RefreshTokenLedger::new(store.clone(), test_hasher(), Arc::new(clock.clone()));
        (ledger, store, clock)
    }

    #[tokio::test]
    async fn test_stored_token_is_valid() {
        let (ledger, _, clock) = ledger();
        let user = Uuid::new_v4();

        ledger
            .store(user, "refresh-token-a", clock.now() + Duration::days(7))
            .await
            .unwrap();

        assert!(ledger.is_valid(user, "refresh-token-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_plaintext_never_stored() {
        let (ledger, store, clock) = ledger();
        let user = Uuid::new_v4();

        let record = ledger
            .store(user, "refresh-token-a", clock.now() + Duration::days(7))
            .await
            .unwrap();

        assert!(!record.token_hash.contains("refresh-token-a"));
        assert!(record.token_hash.starts_with("$argon2id$"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_different_plaintext_never_matches() {
        let (ledger, _, clock) = ledger();
        let user = Uuid::new_v4();

        ledger
            .store(user, "refresh-token-a", clock.now() + Duration::days(7))
            .await
            .unwrap();

        assert!(!ledger.is_valid(user, "refresh-token-b").await.unwrap());
        assert!(!ledger.is_valid(user, "").await.unwrap());
        // 다른 사용자로는 조회되지 않는다
        assert!(!ledger.is_valid(Uuid::new_v4(), "refresh-token-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_record_ignored() {
        let (ledger, _, clock) = ledger();
        let user = Uuid::new_v4();
        let expires_at = clock.now() + Duration::days(7);

        ledger.store(user, "refresh-token-a", expires_at).await.unwrap();

        clock.set(expires_at);
        assert!(!ledger.is_valid(user, "refresh-token-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_multiple_sessions_per_user() {
        let (ledger, _, clock) = ledger();
        let user = Uuid::new_v4();
        let expires_at = clock.now() + Duration::days(7);

        let laptop = ledger.store(user, "laptop-token", expires_at).await.unwrap();
        clock.advance(Duration::seconds(5));
        let phone = ledger.store(user, "phone-token", expires_at).await.unwrap();

        let found = ledger.find_matching(user, "laptop-token").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(laptop.id));
        let found = ledger.find_matching(user, "phone-token").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(phone.id));
    }

    #[tokio::test]
    async fn test_revoke_single_session() {
        let (ledger, _, clock) = ledger();
        let user = Uuid::new_v4();
        let expires_at = clock.now() + Duration::days(7);

        let laptop = ledger.store(user, "laptop-token", expires_at).await.unwrap();
        ledger.store(user, "phone-token", expires_at).await.unwrap();

        assert!(ledger.revoke(laptop.id).await.unwrap());
        assert!(!ledger.is_valid(user, "laptop-token").await.unwrap());
        assert!(ledger.is_valid(user, "phone-token").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_all_sessions() {
        let (ledger, _, clock) = ledger();
        let user = Uuid::new_v4();
        let expires_at = clock.now() + Duration::days(7);

        ledger.store(user, "laptop-token", expires_at).await.unwrap();
        ledger.store(user, "phone-token", expires_at).await.unwrap();

        assert_eq!(ledger.revoke_all(user).await.unwrap(), 2);
        assert!(!ledger.is_valid(user, "phone-token").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (ledger, store, clock) = ledger();
        let user = Uuid::new_v4();
        let now = clock.now();

        ledger.store(user, "short", now + Duration::hours(1)).await.unwrap();
        ledger.store(user, "long", now + Duration::days(7)).await.unwrap();

        assert_eq!(ledger.purge_expired(now + Duration::hours(2)).await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_corrupt_hash_skipped() {
        let (ledger, store, clock) = ledger();
        let user = Uuid::new_v4();
        let expires_at = clock.now() + Duration::days(7);

        ledger.store(user, "good-token", expires_at).await.unwrap();
        clock.advance(Duration::seconds(1));
        store
            .insert(NewRefreshToken {
                user_id: user,
                token_hash: "not-a-phc-string".to_string(),
                expires_at,
                created_at: clock.now(),
            })
            .await
            .unwrap();

        assert!(ledger.is_valid(user, "good-token").await.unwrap());
    }
}
