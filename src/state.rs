//! Central application state shared by the webhook handlers, the command
//! layer and the background loops.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    commands::CommandRegistry, config::AppConfig, dao::pool_store::PoolStore, error::ServiceError,
    gateway::MessagingGateway,
};

/// Cheaply cloneable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Shared state: configuration, the supervised storage slot and the reminder
/// sweep gate.
pub struct AppState {
    config: AppConfig,
    store: RwLock<Option<Arc<dyn PoolStore>>>,
    degraded: watch::Sender<bool>,
    reminder_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`].
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed by the supervisor.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            store: RwLock::new(None),
            degraded: degraded_tx,
            reminder_gate: Mutex::new(()),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain the storage handle, or fail with `Degraded` when the backend is
    /// missing or known to be unhealthy.
    pub async fn store(&self) -> Result<Arc<dyn PoolStore>, ServiceError> {
        if *self.degraded.borrow() {
            return Err(ServiceError::Degraded);
        }
        let guard = self.store.read().await;
        guard.as_ref().cloned().ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn PoolStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Whether the application currently has no healthy storage backend.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Flip the degraded flag, notifying watchers on change.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Gate preventing overlapping reminder sweeps.
    pub fn reminder_gate(&self) -> &Mutex<()> {
        &self.reminder_gate
    }
}

/// Everything a webhook request needs to dispatch a command.
#[derive(Clone)]
pub struct BotContext {
    /// Shared application state.
    pub state: SharedState,
    /// Messaging bridge handle.
    pub gateway: Arc<dyn MessagingGateway>,
    /// Static command registry.
    pub registry: Arc<CommandRegistry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::pool_store::memory::MemoryPoolStore;

    #[tokio::test]
    async fn starts_degraded_until_store_installed() {
        let state = AppState::new(AppConfig::for_tests());
        assert!(state.is_degraded());
        assert!(matches!(
            state.store().await,
            Err(ServiceError::Degraded)
        ));

        state.set_store(Arc::new(MemoryPoolStore::new())).await;
        assert!(!state.is_degraded());
        assert!(state.store().await.is_ok());
    }

    #[tokio::test]
    async fn degraded_flag_gates_store_access() {
        let state = AppState::new(AppConfig::for_tests());
        state.set_store(Arc::new(MemoryPoolStore::new())).await;
        state.update_degraded(true);
        assert!(matches!(
            state.store().await,
            Err(ServiceError::Degraded)
        ));
    }
}
