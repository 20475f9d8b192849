//! 설정 관리.
//!
//! 설정은 프로세스 시작 시 한 번 로드되는 불변 값입니다.
//! 로드 순서는 내장 기본값 → `config/default.toml` (선택) → `ASSET__` 접두사 환경 변수입니다.
//!
//! 예: `ASSET__AUTH__ACCESS_SECRET`, `ASSET__SERVER__PORT`

use std::path::Path;

use chrono::Duration;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AssetError, AssetResult};

/// 개발용 기본 access 토큰 서명 시크릿. 운영 환경에서는 거부됩니다.
pub const DEV_ACCESS_SECRET: &str = "dev-access-secret-change-in-production";
/// 개발용 기본 refresh 토큰 서명 시크릿. 운영 환경에서는 거부됩니다.
pub const DEV_REFRESH_SECRET: &str = "dev-refresh-secret-change-in-production";
/// Access 토큰 기본 수명 (초, 24시간)
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 86_400;
/// Refresh 토큰 기본 수명 (초, 7일)
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 604_800;
/// 토큰 수명 상한 (초, 365일)
pub const MAX_TOKEN_TTL_SECS: i64 = 31_536_000;
/// 서명 시크릿 최소 길이 (바이트)
pub const MIN_SECRET_LEN: usize = 32;

/// 애플리케이션 설정.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 인증 설정
    pub auth: AuthConfig,
}

/// 실행 환경.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 실행 환경
    #[serde(default)]
    pub environment: Environment,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: Environment::Development,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// 운영 환경 여부.
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

/// 데이터베이스 설정.
///
/// `url`이 없으면 인메모리 저장소로 동작합니다 (개발/테스트용).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL
    #[serde(default)]
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout_secs: 5,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 비밀번호 해싱 파라미터 (Argon2id).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PasswordConfig {
    /// 메모리 비용 (KiB)
    pub memory_kib: u32,
    /// 반복 횟수
    pub iterations: u32,
    /// 병렬도
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    /// argon2 크레이트 기본값 (OWASP 권장 최소치).
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// 인증 설정.
///
/// 서명 시크릿은 `SecretString`으로 보관되어 `Debug` 출력에 노출되지 않습니다.
/// 시크릿을 교체하면 해당 종류의 기존 토큰은 모두 무효가 됩니다.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// Access 토큰 서명 시크릿
    #[serde(deserialize_with = "deserialize_secret")]
    pub access_secret: SecretString,
    /// Refresh 토큰 서명 시크릿 (access와 달라야 함)
    #[serde(deserialize_with = "deserialize_secret")]
    pub refresh_secret: SecretString,
    /// Access 토큰 수명 (초)
    pub access_ttl_secs: i64,
    /// Refresh 토큰 수명 (초)
    pub refresh_ttl_secs: i64,
    /// 비밀번호 해싱 파라미터
    #[serde(default)]
    pub password: PasswordConfig,
    /// 만료된 refresh 토큰 정리 주기 (초)
    pub ledger_cleanup_interval_secs: u64,
    /// 시작 시 생성할 초기 관리자 (없으면 생성하지 않음)
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

/// 초기 관리자 계정.
///
/// 사용자 생성은 관리자만 할 수 있으므로 빈 저장소에서 첫 관리자를 만드는 데 사용합니다.
/// 같은 사용자명이나 이메일이 이미 있으면 아무것도 하지 않습니다.
#[derive(Debug, Deserialize)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub email: String,
    #[serde(default = "default_bootstrap_full_name")]
    pub full_name: String,
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,
}

fn default_bootstrap_full_name() -> String {
    "Administrator".to_string()
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl AuthConfig {
    /// 주어진 시크릿과 기본 수명으로 설정을 생성합니다.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: SecretString::from(access_secret.into()),
            refresh_secret: SecretString::from(refresh_secret.into()),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            password: PasswordConfig::default(),
            ledger_cleanup_interval_secs: 3_600,
            bootstrap_admin: None,
        }
    }

    /// Access 토큰 수명을 설정합니다.
    pub fn with_access_ttl_secs(mut self, secs: i64) -> Self {
        self.access_ttl_secs = secs;
        self
    }

    /// Refresh 토큰 수명을 설정합니다.
    pub fn with_refresh_ttl_secs(mut self, secs: i64) -> Self {
        self.refresh_ttl_secs = secs;
        self
    }

    /// 비밀번호 해싱 파라미터를 설정합니다.
    pub fn with_password(mut self, password: PasswordConfig) -> Self {
        self.password = password;
        self
    }

    /// 초기 관리자 계정을 설정합니다.
    pub fn with_bootstrap_admin(mut self, admin: BootstrapAdminConfig) -> Self {
        self.bootstrap_admin = Some(admin);
        self
    }

    /// Access 토큰 수명.
    ///
    /// `Duration` 범위를 넘는 값은 최대값으로 고정됩니다 (발급 시 에러가 됨).
    pub fn access_ttl(&self) -> Duration {
        Duration::try_seconds(self.access_ttl_secs).unwrap_or(Duration::MAX)
    }

    /// Refresh 토큰 수명.
    pub fn refresh_ttl(&self) -> Duration {
        Duration::try_seconds(self.refresh_ttl_secs).unwrap_or(Duration::MAX)
    }

    /// 보안 관련 설정을 점검합니다.
    ///
    /// 수명이 0 이하이거나 상한을 넘으면 환경과 관계없이 에러입니다.
    /// 기본 시크릿, 짧은 시크릿, access/refresh 동일 시크릿은 운영 환경에서 에러,
    /// 그 외 환경에서는 경고 로그를 남기고 발견된 문제 목록을 반환합니다.
    pub fn validate(&self, environment: Environment) -> AssetResult<Vec<String>> {
        if self.access_ttl_secs <= 0 || self.refresh_ttl_secs <= 0 {
            return Err(AssetError::Config(
                "token lifetimes must be positive".to_string(),
            ));
        }
        if self.access_ttl_secs > MAX_TOKEN_TTL_SECS || self.refresh_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(AssetError::Config(format!(
                "token lifetimes must not exceed {} seconds",
                MAX_TOKEN_TTL_SECS
            )));
        }

        let access = self.access_secret.expose_secret();
        let refresh = self.refresh_secret.expose_secret();
        let mut issues = Vec::new();

        if access == DEV_ACCESS_SECRET {
            issues.push("access token secret is the built-in development default".to_string());
        }
        if refresh == DEV_REFRESH_SECRET {
            issues.push("refresh token secret is the built-in development default".to_string());
        }
        if access.len() < MIN_SECRET_LEN {
            issues.push(format!(
                "access token secret is shorter than {} bytes",
                MIN_SECRET_LEN
            ));
        }
        if refresh.len() < MIN_SECRET_LEN {
            issues.push(format!(
                "refresh token secret is shorter than {} bytes",
                MIN_SECRET_LEN
            ));
        }
        if access == refresh {
            issues.push("access and refresh token secrets are identical".to_string());
        }
        if self.refresh_ttl_secs < self.access_ttl_secs {
            issues.push("refresh token lifetime is shorter than access token lifetime".to_string());
        }

        if environment == Environment::Production && !issues.is_empty() {
            return Err(AssetError::Config(format!(
                "refusing to start with insecure auth settings: {}",
                issues.join("; ")
            )));
        }

        for issue in &issues {
            tracing::warn!(issue = %issue, "Insecure auth configuration (development only)");
        }

        Ok(issues)
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없어도 에러가 아니며, `database.url`이 비어 있으면 `DATABASE_URL`을 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> AssetResult<Self> {
        let config = Self::defaults()?
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("ASSET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app: AppConfig = config.try_deserialize()?;
        if app.database.url.is_none() {
            app.database.url = std::env::var("DATABASE_URL").ok();
        }
        Ok(app)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> AssetResult<Self> {
        Self::load("config/default.toml")
    }

    /// 설정 값의 일관성을 점검합니다.
    pub fn validate(&self) -> AssetResult<Vec<String>> {
        self.auth.validate(self.server.environment)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.environment", "development")?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("database.max_connections", 10)?
            .set_default("database.connection_timeout_secs", 5)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("auth.access_secret", DEV_ACCESS_SECRET)?
            .set_default("auth.refresh_secret", DEV_REFRESH_SECRET)?
            .set_default("auth.access_ttl_secs", DEFAULT_ACCESS_TTL_SECS)?
            .set_default("auth.refresh_ttl_secs", DEFAULT_REFRESH_TTL_SECS)?
            .set_default("auth.password.memory_kib", 19_456)?
            .set_default("auth.password.iterations", 2)?
            .set_default("auth.password.parallelism", 1)?
            .set_default("auth.ledger_cleanup_interval_secs", 3_600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRONG_ACCESS: &str = "access-secret-for-tests-0123456789abcdef";
    const STRONG_REFRESH: &str = "refresh-secret-for-tests-0123456789abcdef";

    fn from_toml(toml: &str) -> AppConfig {
        AppConfig::defaults()
            .unwrap()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = from_toml("");

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.auth.access_ttl_secs, 86_400);
        assert_eq!(config.auth.refresh_ttl_secs, 604_800);
        assert_eq!(config.auth.password, PasswordConfig::default());
        assert_eq!(config.auth.access_secret.expose_secret(), DEV_ACCESS_SECRET);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = from_toml(
            r#"
            [server]
            environment = "production"

            [auth]
            access_secret = "file-access-secret"
            access_ttl_secs = 900
            "#,
        );

        assert!(config.server.is_production());
        assert_eq!(config.auth.access_ttl_secs, 900);
        assert_eq!(config.auth.access_secret.expose_secret(), "file-access-secret");
    }

    #[test]
    fn test_bootstrap_admin_from_file() {
        let config = from_toml(
            r#"
            [auth.bootstrap_admin]
            username = "root"
            email = "root@example.com"
            password = "ChangeMe123"
            "#,
        );

        let admin = config.auth.bootstrap_admin.expect("bootstrap admin");
        assert_eq!(admin.username, "root");
        assert_eq!(admin.full_name, "Administrator");
        assert_eq!(admin.password.expose_secret(), "ChangeMe123");
        assert!(!format!("{:?}", admin).contains("ChangeMe123"));

        assert!(from_toml("").auth.bootstrap_admin.is_none());
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        let auth = AuthConfig::new(STRONG_ACCESS, STRONG_REFRESH);
        let debug = format!("{:?}", auth);
        assert!(!debug.contains(STRONG_ACCESS));
        assert!(!debug.contains(STRONG_REFRESH));
    }

    #[test]
    fn test_validate_strong_secrets() {
        let auth = AuthConfig::new(STRONG_ACCESS, STRONG_REFRESH);
        assert!(auth.validate(Environment::Production).unwrap().is_empty());
    }

    #[test]
    fn test_validate_default_secret_refused_in_production() {
        let auth = AuthConfig::new(DEV_ACCESS_SECRET, DEV_REFRESH_SECRET);
        assert!(matches!(
            auth.validate(Environment::Production),
            Err(AssetError::Config(_))
        ));

        // 개발 환경에서는 경고만 남긴다
        let issues = auth.validate(Environment::Development).unwrap();
        assert!(issues.iter().any(|i| i.contains("development default")));
    }

    #[test]
    fn test_validate_identical_secrets() {
        let auth = AuthConfig::new(STRONG_ACCESS, STRONG_ACCESS);
        let issues = auth.validate(Environment::Development).unwrap();
        assert!(issues.iter().any(|i| i.contains("identical")));
        assert!(auth.validate(Environment::Production).is_err());
    }

    #[test]
    fn test_validate_non_positive_ttl() {
        let auth = AuthConfig::new(STRONG_ACCESS, STRONG_REFRESH).with_access_ttl_secs(0);
        assert!(auth.validate(Environment::Development).is_err());
    }

    #[test]
    fn test_validate_oversized_ttl() {
        let auth = AuthConfig::new(STRONG_ACCESS, STRONG_REFRESH)
            .with_access_ttl_secs(1_000_000_000_000_000)
            .with_refresh_ttl_secs(1_000_000_000_000_000);
        assert!(matches!(
            auth.validate(Environment::Development),
            Err(AssetError::Config(_))
        ));

        let auth = AuthConfig::new(STRONG_ACCESS, STRONG_REFRESH)
            .with_refresh_ttl_secs(MAX_TOKEN_TTL_SECS + 1);
        assert!(auth.validate(Environment::Development).is_err());

        let auth = AuthConfig::new(STRONG_ACCESS, STRONG_REFRESH)
            .with_refresh_ttl_secs(MAX_TOKEN_TTL_SECS);
        assert!(auth.validate(Environment::Production).unwrap().is_empty());
    }

    #[test]
    fn test_ttl_beyond_duration_range_does_not_panic() {
        let auth = AuthConfig::new(STRONG_ACCESS, STRONG_REFRESH).with_access_ttl_secs(i64::MAX);
        assert_eq!(auth.access_ttl(), Duration::MAX);
    }
}
