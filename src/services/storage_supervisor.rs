//! Keeps the storage backend connected, flipping the shared state in and out
//! of degraded mode as health checks succeed or fail.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{pool_store::PoolStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the storage backend and keep it healthy, entering degraded mode
/// while it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn PoolStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                watch_health(&state, store.as_ref()).await;

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Poll the store's health until reconnection attempts are exhausted; returns
/// to let the caller rebuild the connection from scratch.
async fn watch_health(state: &SharedState, store: &dyn PoolStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                if !try_reconnect(state, store).await {
                    warn!("exhausted storage reconnect attempts; staying in degraded mode");
                    return;
                }
                state.update_degraded(false);
                sleep(HEALTH_POLL_INTERVAL).await;
            }
        }
    }
}

async fn try_reconnect(state: &SharedState, store: &dyn PoolStore) -> bool {
    let mut delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!("storage reconnection succeeded after health check failure");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(
                        attempt,
                        error = %err,
                        "storage reconnect attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }

    false
}
