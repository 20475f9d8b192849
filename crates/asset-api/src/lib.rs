//! Asset Tracker 인증/권한 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API
//! - JWT 인증 (access/refresh 토큰, refresh 토큰 rotation)
//! - 역할 기반 접근 제어
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 비밀번호 해싱, 토큰, refresh ledger, 인증/인가 추출기
//! - [`repository`]: 사용자 및 refresh 토큰 저장소
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`openapi`]: OpenAPI 문서
//! - [`tasks`]: 백그라운드 태스크

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod state;
pub mod tasks;

pub use auth::{AuthError, AuthService, AuthUser, Authorized, TokenService};
pub use error::{ApiErrorResponse, ApiResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::{app_router, create_api_router};
pub use state::AppState;
