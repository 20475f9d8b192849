//! Repository pattern for database operations.
//!
//! 데이터베이스 접근 로직을 라우트 핸들러에서 분리하여 관리합니다.
//! 각 저장소는 trait으로 정의되며 PostgreSQL 구현과 인메모리 구현을 가집니다.

pub mod refresh_tokens;
pub mod users;

pub use refresh_tokens::{
    InMemoryRefreshTokenStore, NewRefreshToken, PgRefreshTokenStore, RefreshTokenRecord,
    RefreshTokenStore,
};
pub use users::{InMemoryUserStore, PgUserStore, UserStore};
