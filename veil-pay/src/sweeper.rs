//! Background Sweeper
//!
//! Periodic expiry and retention sweep over a ledger store, run on a tokio
//! interval until shut down. Sweeps use the same locking discipline as
//! request-path mutations and may run concurrently with traffic.

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::store::LedgerStore;

/// Handle to a running sweeper task
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: tokio::task::JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.join.await;
    }
}

/// Spawn a sweeper over the store.
///
/// `period` is the tick interval (60 s in production); `retention_secs`
/// bounds how long records are kept.
pub fn spawn_sweeper<S: LedgerStore + 'static>(
    store: Arc<S>,
    period: Duration,
    retention_secs: i64,
) -> SweeperHandle {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

    let join = tokio::spawn(async move {
        let mut timer = interval(period);
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("ledger sweeper received shutdown signal");
                    break;
                }
                _ = timer.tick() => {
                    match store
                        .sweep(Utc::now(), ChronoDuration::seconds(retention_secs))
                        .await
                    {
                        Ok(outcome) => {
                            if outcome.requirements_expired > 0 || outcome.records_purged > 0 {
                                debug!(
                                    requirements_expired = outcome.requirements_expired,
                                    records_purged = outcome.records_purged,
                                    "sweep pass"
                                );
                            }
                        }
                        Err(error) => {
                            warn!(error = %error, "sweep pass failed");
                        }
                    }
                }
            }
        }
    });

    SweeperHandle { shutdown_tx, join }
}
