//! # Asset Core
//!
//! 자산/장비/수리 이력 관리 시스템의 핵심 도메인 모델 및 공용 인프라를 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 사용자 식별 정보 및 역할/상태 정의
//! - 설정 관리 (서명 시크릿, 토큰 수명, 비밀번호 해싱 파라미터)
//! - 에러 타입
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
