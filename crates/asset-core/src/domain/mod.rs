//! 자산 관리 시스템의 도메인 모델.

mod user;

pub use user::*;
