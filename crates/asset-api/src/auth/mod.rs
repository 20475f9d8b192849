//! 인증 및 권한 부여.
//!
//! JWT 기반 인증, refresh 토큰 rotation, 역할 기반 접근 제어(RBAC)를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`PasswordHasher`]: Argon2id 비밀번호 해싱
//! - [`TokenService`]: access/refresh 토큰 발급 및 검증
//! - [`RefreshTokenLedger`]: refresh 토큰 해시 기록 및 대조
//! - [`AuthUser`], [`Authorized`]: Axum 인증/인가 추출기
//! - [`AuthService`]: 로그인/갱신/로그아웃 흐름
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn admin_only(user: Authorized<AdminOnly>) -> impl IntoResponse {
//!     format!("Hello, {}!", user.principal.username)
//! }
//! ```

pub mod clock;
mod error;
mod jwt;
mod ledger;
mod middleware;
mod password;
mod roles;
mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AuthError;
pub use jwt::{Claims, IssuedToken, TokenError, TokenKind, TokenPair, TokenService};
pub use ledger::RefreshTokenLedger;
pub use middleware::{extract_bearer, AuthUser, Authorized};
pub use password::{validate_password_strength, PasswordError, PasswordHasher};
pub use roles::{authorize, AdminOnly, AnyRole, RolePolicy};
pub use service::{AuthService, LoginOutcome};

#[cfg(test)]
pub(crate) use password::test_hasher;
