//! 만료된 refresh 토큰 정리기.
//!
//! 만료된 레코드는 검증에서 이미 제외되므로 정리는 저장 공간 회수 목적입니다.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use asset_core::AssetResult;

use crate::auth::RefreshTokenLedger;

/// 정리기 설정.
#[derive(Debug, Clone)]
pub struct LedgerCleanupConfig {
    /// 정리 주기 (기본: 1시간)
    pub interval: Duration,
}

impl Default for LedgerCleanupConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
        }
    }
}

impl LedgerCleanupConfig {
    pub fn from_secs(secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(secs.max(1)),
        }
    }
}

/// 정리 1회 실행. 삭제된 레코드 수를 반환합니다.
pub async fn run_cleanup_once(ledger: &RefreshTokenLedger) -> AssetResult<u64> {
    let purged = ledger.purge_expired(ledger.now()).await?;
    if purged > 0 {
        info!(purged, "Expired refresh tokens purged");
    } else {
        debug!("No expired refresh tokens");
    }
    Ok(purged)
}

/// 정리기를 백그라운드로 시작합니다.
///
/// 종료 토큰이 취소되면 루프를 빠져나옵니다.
pub fn start_ledger_cleanup(
    ledger: Arc<RefreshTokenLedger>,
    config: LedgerCleanupConfig,
    shutdown_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = config.interval.as_secs(), "Ledger 정리기 시작");

        let mut ticker = interval(config.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = run_cleanup_once(&ledger).await {
                        error!(error = %e, "Ledger 정리 실패");
                    }
                }
                _ = shutdown_token.cancelled() => {
                    info!("Ledger 정리기: 종료 시그널 수신");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{test_hasher, Clock, ManualClock};
    use crate::repository::InMemoryRefreshTokenStore;
    use chrono::Duration as ChronoDuration;
    use uuid::Uuid;

    fn ledger(clock: &ManualClock) -> (Arc<RefreshTokenLedger>, Arc<InMemoryRefreshTokenStore>) {
        let store = Arc::new(InMemoryRefreshTokenStore::new());
        let ledger = Arc::new(RefreshTokenLedger::new(
            store.clone(),
            test_hasher(),
            Arc::new(clock.clone()),
        ));
        (ledger, store)
    }

    #[tokio::test]
    async fn test_run_cleanup_once() {
        let clock = ManualClock::starting_now();
        let (ledger, store) = ledger(&clock);
        let user = Uuid::new_v4();

        ledger
            .store(user, "short-lived", clock.now() + ChronoDuration::minutes(5))
            .await
            .unwrap();
        ledger
            .store(user, "long-lived", clock.now() + ChronoDuration::days(7))
            .await
            .unwrap();

        assert_eq!(run_cleanup_once(&ledger).await.unwrap(), 0);

        clock.advance(ChronoDuration::minutes(10));
        assert_eq!(run_cleanup_once(&ledger).await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_cleanup_stops_on_shutdown() {
        let clock = ManualClock::starting_now();
        let (ledger, _) = ledger(&clock);
        let shutdown = CancellationToken::new();

        let handle = start_ledger_cleanup(
            ledger,
            LedgerCleanupConfig::from_secs(3600),
            shutdown.clone(),
        );
        shutdown.cancel();

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("cleanup task did not stop")
            .unwrap();
    }
}
