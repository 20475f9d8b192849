//! 로그인 / 토큰 갱신 / 로그아웃 흐름.

use std::sync::Arc;

use tracing::{debug, info, warn};

use asset_core::UserIdentity;

use super::error::AuthError;
use super::jwt::{TokenKind, TokenPair, TokenService};
use super::ledger::RefreshTokenLedger;
use super::password::PasswordHasher;
use crate::metrics::{record_login, record_refresh};
use crate::repository::UserStore;

/// 로그인 결과.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserIdentity,
    pub tokens: TokenPair,
}

/// 인증 흐름 조정자.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
    ledger: Arc<RefreshTokenLedger>,
    hasher: PasswordHasher,
    /// 존재하지 않는 사용자에 대해서도 같은 비용의 검증을 수행하기 위한 해시
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<TokenService>,
        ledger: Arc<RefreshTokenLedger>,
        hasher: PasswordHasher,
    ) -> Result<Self, AuthError> {
        let dummy_hash = hasher.hash("timing-equalizer-password")?;
        Ok(Self {
            users,
            tokens,
            ledger,
            hasher,
            dummy_hash,
        })
    }

    /// 사용자명 또는 이메일과 비밀번호로 로그인합니다.
    ///
    /// 사용자 없음, 비밀번호 불일치, 비활성 계정은 모두 같은 에러로 보고됩니다.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = self.users.find_active_by_username_or_email(identifier).await?;

        let (hash, user) = match user {
            Some(user) => (user.password_hash.clone(), Some(user)),
            None => (self.dummy_hash.clone(), None),
        };

        let matched = self
            .hasher
            .verify_async(password.to_string(), hash)
            .await?;

        let user = match user {
            Some(user) if matched && user.is_active() => user,
            _ => {
                record_login("failure");
                debug!("Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let tokens = self.tokens.issue_pair(&user.principal())?;
        // ledger 기록이 마지막 단계
        self.ledger
            .store(user.id, &tokens.refresh.token, tokens.refresh.claims.expires_at())
            .await?;

        record_login("success");
        info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(LoginOutcome { user, tokens })
    }

    /// refresh 토큰으로 새 토큰 쌍을 발급합니다 (rotation).
    ///
    /// 사용된 refresh 토큰은 폐기되고 새 refresh 토큰이 기록됩니다.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let result = self.rotate(refresh_token).await;
        match &result {
            Ok(_) => record_refresh("success"),
            Err(AuthError::RefreshRejected) => record_refresh("rejected"),
            Err(_) => record_refresh("error"),
        }
        result
    }

    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .tokens
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|_| AuthError::RefreshRejected)?;

        let record = self
            .ledger
            .find_matching(claims.sub, refresh_token)
            .await?
            .ok_or_else(|| {
                debug!(user_id = %claims.sub, "Refresh token not in ledger");
                AuthError::RefreshRejected
            })?;

        // 비활성화되었거나 역할이 바뀐 사용자는 저장소 기준으로 다시 확인한다
        let user = match self.users.find_by_id(claims.sub).await? {
            Some(user) if user.is_active() => user,
            _ => {
                warn!(user_id = %claims.sub, "Refresh attempted for inactive or missing user");
                self.ledger.revoke(record.id).await?;
                return Err(AuthError::RefreshRejected);
            }
        };

        // 행을 먼저 삭제한 요청만 새 토큰을 받는다 (동시 갱신 시 한쪽만 성공)
        if !self.ledger.revoke(record.id).await? {
            debug!(user_id = %user.id, record_id = %record.id, "Refresh token already redeemed");
            return Err(AuthError::RefreshRejected);
        }

        let tokens = self.tokens.issue_pair(&user.principal())?;
        self.ledger
            .store(user.id, &tokens.refresh.token, tokens.refresh.claims.expires_at())
            .await?;

        info!(user_id = %user.id, "Refresh token rotated");
        Ok(tokens)
    }

    /// refresh 토큰에 해당하는 세션을 폐기합니다.
    ///
    /// 유효하지 않거나 이미 폐기된 토큰도 성공으로 처리합니다.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let Ok(claims) = self.tokens.verify(refresh_token, TokenKind::Refresh) else {
            return Ok(());
        };

        if let Some(record) = self.ledger.find_matching(claims.sub, refresh_token).await? {
            self.ledger.revoke(record.id).await?;
            info!(user_id = %claims.sub, "User logged out");
        }
        Ok(())
    }

    /// 사용자의 모든 세션을 폐기합니다 (계정 비활성화 시).
    pub async fn revoke_sessions(&self, user: &UserIdentity) -> Result<u64, AuthError> {
        let revoked = self.ledger.revoke_all(user.id).await?;
        info!(user_id = %user.id, revoked, "All sessions revoked");
        Ok(revoked)
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::auth::password::test_hasher;
    use crate::repository::{InMemoryRefreshTokenStore, InMemoryUserStore};
    use asset_core::{AuthConfig, NewUser, Role, UserStatus};
    use chrono::Duration;

    struct Fixture {
        service: AuthService,
        users: Arc<InMemoryUserStore>,
        refresh_store: Arc<InMemoryRefreshTokenStore>,
        clock: ManualClock,
    }

    async fn fixture() -> Fixture {
        let clock = ManualClock::starting_now();
        let config = AuthConfig::new(
            "service-test-access-secret-0123456789",
            "service-test-refresh-secret-0123456789",
        );
        let hasher = test_hasher();
        let users = Arc::new(InMemoryUserStore::new());
        let refresh_store = Arc::new(InMemoryRefreshTokenStore::new());
        let tokens = Arc::new(TokenService::new(&config, Arc::new(clock.clone())));
        let ledger = Arc::new(RefreshTokenLedger::new(
            refresh_store.clone(),
            hasher.clone(),
            Arc::new(clock.clone()),
        ));

        users
            .create(NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                full_name: "Alice Kim".to_string(),
                password_hash: hasher.hash("Password1").unwrap(),
                role: Role::Staff,
            })
            .await
            .unwrap();

        let service = AuthService::new(users.clone(), tokens, ledger, hasher).unwrap();
        Fixture {
            service,
            users,
            refresh_store,
            clock,
        }
    }

    #[tokio::test]
    async fn test_login_success() {
        let f = fixture().await;
        let outcome = f.service.login("alice", "Password1").await.unwrap();

        assert_eq!(outcome.user.username, "alice");
        assert_eq!(f.refresh_store.len().await, 1);

        let claims = f
            .service
            .tokens()
            .verify(&outcome.tokens.access.token, TokenKind::Access)
            .unwrap();
        assert_eq!(claims.role, Role::Staff);
    }

    #[tokio::test]
    async fn test_login_by_email() {
        let f = fixture().await;
        assert!(f.service.login("alice@example.com", "Password1").await.is_ok());
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let f = fixture().await;
        let alice = f
            .users
            .find_active_by_username_or_email("alice")
            .await
            .unwrap()
            .unwrap();

        let wrong_password = f.service.login("alice", "Password2").await.unwrap_err();
        let unknown_user = f.service.login("mallory", "Password1").await.unwrap_err();

        f.users.set_status(alice.id, UserStatus::Inactive).await.unwrap();
        let inactive = f.service.login("alice", "Password1").await.unwrap_err();

        for err in [wrong_password, unknown_user, inactive] {
            assert!(matches!(err, AuthError::InvalidCredentials));
            assert_eq!(err.public_message(), "invalid username/email or password");
        }
        assert!(f.refresh_store.is_empty().await);
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let f = fixture().await;
        let outcome = f.service.login("alice", "Password1").await.unwrap();
        let old_refresh = outcome.tokens.refresh.token;

        f.clock.advance(Duration::seconds(10));
        let rotated = f.service.refresh(&old_refresh).await.unwrap();

        assert_ne!(rotated.refresh.token, old_refresh);
        assert_eq!(f.refresh_store.len().await, 1);
        // 사용된 토큰은 재사용할 수 없다
        assert!(matches!(
            f.service.refresh(&old_refresh).await,
            Err(AuthError::RefreshRejected)
        ));
        assert!(f.service.refresh(&rotated.refresh.token).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refresh_redeems_token_once() {
        for _ in 0..5 {
            let f = fixture().await;
            let outcome = f.service.login("alice", "Password1").await.unwrap();
            let token = outcome.tokens.refresh.token;

            let (first, second) = tokio::join!(f.service.refresh(&token), f.service.refresh(&token));

            let succeeded = [&first, &second].iter().filter(|r| r.is_ok()).count();
            assert_eq!(succeeded, 1, "refresh token redeemed {} times", succeeded);
            for result in [first, second] {
                if let Err(err) = result {
                    assert!(matches!(err, AuthError::RefreshRejected));
                }
            }
            assert_eq!(f.refresh_store.len().await, 1);
        }
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let f = fixture().await;
        let outcome = f.service.login("alice", "Password1").await.unwrap();

        assert!(matches!(
            f.service.refresh(&outcome.tokens.access.token).await,
            Err(AuthError::RefreshRejected)
        ));
    }

    #[tokio::test]
    async fn test_refresh_after_expiry_rejected() {
        let f = fixture().await;
        let outcome = f.service.login("alice", "Password1").await.unwrap();

        f.clock.advance(Duration::seconds(604_800));
        assert!(matches!(
            f.service.refresh(&outcome.tokens.refresh.token).await,
            Err(AuthError::RefreshRejected)
        ));
    }

    #[tokio::test]
    async fn test_refresh_rejected_for_deactivated_user() {
        let f = fixture().await;
        let outcome = f.service.login("alice", "Password1").await.unwrap();

        f.users
            .set_status(outcome.user.id, UserStatus::Inactive)
            .await
            .unwrap();
        assert!(matches!(
            f.service.refresh(&outcome.tokens.refresh.token).await,
            Err(AuthError::RefreshRejected)
        ));
        assert!(f.refresh_store.is_empty().await);
    }

    #[tokio::test]
    async fn test_refresh_picks_up_role_change() {
        let f = fixture().await;
        let outcome = f.service.login("alice", "Password1").await.unwrap();

        f.users.set_role(outcome.user.id, Role::Admin).await.unwrap();
        let rotated = f.service.refresh(&outcome.tokens.refresh.token).await.unwrap();

        assert_eq!(rotated.access.claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let f = fixture().await;
        let outcome = f.service.login("alice", "Password1").await.unwrap();

        f.service.logout(&outcome.tokens.refresh.token).await.unwrap();
        assert!(f.refresh_store.is_empty().await);
        assert!(f.service.refresh(&outcome.tokens.refresh.token).await.is_err());

        // 멱등
        f.service.logout(&outcome.tokens.refresh.token).await.unwrap();
        f.service.logout("garbage").await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_sessions() {
        let f = fixture().await;
        let first = f.service.login("alice", "Password1").await.unwrap();
        f.service.login("alice", "Password1").await.unwrap();

        assert_eq!(f.service.revoke_sessions(&first.user).await.unwrap(), 2);
        assert!(f.service.refresh(&first.tokens.refresh.token).await.is_err());
    }
}
