//! 백그라운드 태스크 모듈.
//!
//! 서버 실행 중 주기적으로 실행되는 백그라운드 작업을 정의합니다.
//! - Ledger 정리: 만료된 refresh 토큰 레코드 삭제

pub mod ledger_cleanup;

pub use ledger_cleanup::{run_cleanup_once, start_ledger_cleanup, LedgerCleanupConfig};
