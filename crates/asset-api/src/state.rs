//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 공유됩니다.
//! 설정 값(시크릿, 토큰 수명)은 시작 시 한 번 읽혀 불변으로 유지됩니다.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

use asset_core::{
    AppConfig, AssetError, AssetResult, AuthConfig, BootstrapAdminConfig, NewUser, Role,
};

use crate::auth::{
    validate_password_strength, AuthError, AuthService, Clock, PasswordHasher,
    RefreshTokenLedger, SystemClock, TokenService,
};
use crate::repository::{
    InMemoryRefreshTokenStore, InMemoryUserStore, PgRefreshTokenStore, PgUserStore,
    RefreshTokenStore, UserStore,
};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 사용자 저장소 (credential store)
    pub users: Arc<dyn UserStore>,

    /// 토큰 발급/검증기
    pub tokens: Arc<TokenService>,

    /// refresh 토큰 ledger
    pub ledger: Arc<RefreshTokenLedger>,

    /// 로그인/갱신/로그아웃 흐름
    pub auth: Arc<AuthService>,

    /// 데이터베이스 연결 풀 (인메모리 모드에서는 None)
    pub db_pool: Option<PgPool>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 저장소와 시계로 상태를 구성합니다.
    pub fn new(
        auth_config: &AuthConfig,
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(&auth_config.password)?;
        let tokens = Arc::new(TokenService::new(auth_config, clock.clone()));
        let ledger = Arc::new(RefreshTokenLedger::new(refresh_tokens, hasher.clone(), clock));
        let auth = Arc::new(AuthService::new(
            users.clone(),
            tokens.clone(),
            ledger.clone(),
            hasher,
        )?);

        Ok(Self {
            users,
            tokens,
            ledger,
            auth,
            db_pool: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// 인메모리 저장소로 상태를 구성합니다 (개발 모드 및 테스트용).
    pub fn in_memory(auth_config: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        Self::new(
            auth_config,
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryRefreshTokenStore::new()),
            clock,
        )
    }

    /// PostgreSQL 저장소로 상태를 구성합니다.
    pub fn with_postgres(auth_config: &AuthConfig, pool: PgPool) -> Result<Self, AuthError> {
        let mut state = Self::new(
            auth_config,
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgRefreshTokenStore::new(pool.clone())),
            Arc::new(SystemClock),
        )?;
        state.db_pool = Some(pool);
        Ok(state)
    }

    /// 설정에 따라 상태를 구성합니다.
    ///
    /// `database.url`이 있으면 PostgreSQL에 연결하고, 없으면 인메모리 저장소를 사용합니다.
    /// `auth.bootstrap_admin`이 설정되어 있으면 초기 관리자를 생성합니다.
    pub async fn from_config(config: &AppConfig) -> AssetResult<Self> {
        let state = match &config.database.url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .acquire_timeout(Duration::from_secs(config.database.connection_timeout_secs))
                    .connect(url)
                    .await
                    .map_err(AssetError::database)?;
                info!("Connected to PostgreSQL");
                Self::with_postgres(&config.auth, pool)
            }
            None => {
                info!("database.url not set, using in-memory stores");
                Self::in_memory(&config.auth, Arc::new(SystemClock))
            }
        };

        let state = state.map_err(|e| AssetError::Internal(e.to_string()))?;

        if let Some(admin) = &config.auth.bootstrap_admin {
            state.bootstrap_admin(admin).await?;
        } else if state.db_pool.is_none() {
            tracing::warn!(
                "In-memory user store is empty and auth.bootstrap_admin is not set; no login is possible"
            );
        }

        Ok(state)
    }

    /// 초기 관리자 계정을 생성합니다.
    ///
    /// 같은 사용자명이나 이메일이 이미 있으면 `false`를 반환하고 아무것도 바꾸지 않습니다.
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdminConfig) -> AssetResult<bool> {
        let password = admin.password.expose_secret();
        validate_password_strength(password).map_err(|msg| {
            AssetError::Config(format!("auth.bootstrap_admin.password: {}", msg))
        })?;

        let password_hash = self
            .auth
            .hasher()
            .hash_async(password.to_string())
            .await
            .map_err(|e| AssetError::Internal(e.to_string()))?;

        let created = self
            .users
            .create(NewUser {
                username: admin.username.clone(),
                email: admin.email.clone(),
                full_name: admin.full_name.clone(),
                password_hash,
                role: Role::Admin,
            })
            .await;

        match created {
            Ok(user) => {
                info!(user_id = %user.id, username = %user.username, "Bootstrap admin created");
                Ok(true)
            }
            Err(AssetError::Conflict(_)) => {
                info!(username = %admin.username, "Bootstrap admin already exists, skipping");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// DB 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        match &self.db_pool {
            Some(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
            None => false,
        }
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}
