// Session controller for the gate state machine

use super::store::SessionStore;
use super::types::{ActivityKind, GateConfig, GateState};
use crate::clock::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

/// Single source of truth for "is the caller currently authenticated".
///
/// Validity is always derived from the [`SessionStore`] contents and the
/// configured inactivity timeout; the controller evicts stale sessions at
/// the point of detection and signals `Locked`/`Unlocked` transitions
/// through a watch channel.
pub struct SessionController {
    inner: Arc<ControllerInner>,
    staleness_task: Mutex<Option<JoinHandle<()>>>,
    activity_tasks: Mutex<Vec<JoinHandle<()>>>,
}

struct ControllerInner {
    config: GateConfig,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    state_tx: watch::Sender<GateState>,
}

impl ControllerInner {
    /// Transition to `next` if different; returns whether a transition
    /// happened (and was signalled to subscribers).
    fn set_state(&self, next: GateState) -> bool {
        self.state_tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        })
    }

    fn state(&self) -> GateState {
        *self.state_tx.borrow()
    }

    /// Derive the current state from storage, evicting a stale session as
    /// a side effect. Used at initialization and on validity queries.
    async fn resolve_from_store(&self) -> GateState {
        let record = self.store.read(&self.config.storage_key).await;

        if !record.authenticated {
            return GateState::Locked;
        }

        if self.config.auto_lock_enabled() {
            let elapsed = self.clock.now_ms() - record.last_activity_ms;
            if elapsed > self.config.timeout_ms as i64 {
                self.store.clear(&self.config.storage_key).await;
                info!("Evicting stale session (idle for {}ms)", elapsed);
                return GateState::Locked;
            }
        }

        GateState::Unlocked
    }

    /// Refresh the activity timestamp. Only while unlocked and only when
    /// auto-lock is enabled; otherwise there is no bookkeeping at all.
    async fn refresh_activity(&self) {
        if !self.config.auto_lock_enabled() {
            return;
        }

        if self.state() != GateState::Unlocked {
            return;
        }

        let now = self.clock.now_ms();
        self.store.write(&self.config.storage_key, now).await;
        debug!("Refreshed session activity at {}", now);
    }

    /// Periodic staleness check. Clears storage and locks when the session
    /// has been idle past the timeout. Revokes access even with no user
    /// interaction, e.g. a background tab.
    async fn check_staleness(&self) {
        if self.state() != GateState::Unlocked {
            return;
        }

        let record = self.store.read(&self.config.storage_key).await;

        if !record.authenticated {
            // Another instance sharing the key already cleared the session
            if self.set_state(GateState::Locked) {
                info!("Session gone from storage; locking");
            }
            return;
        }

        let elapsed = self.clock.now_ms() - record.last_activity_ms;
        if elapsed > self.config.timeout_ms as i64 {
            self.store.clear(&self.config.storage_key).await;
            if self.set_state(GateState::Locked) {
                info!("Session stale (idle for {}ms); locking", elapsed);
            }
        }
    }
}

impl SessionController {
    /// Create a controller using the system clock
    pub fn new(config: GateConfig, store: Arc<dyn SessionStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Create a controller with an explicit clock
    pub fn with_clock(
        config: GateConfig,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state_tx, _) = watch::channel(GateState::Unknown);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                clock,
                state_tx,
            }),
            staleness_task: Mutex::new(None),
            activity_tasks: Mutex::new(Vec::new()),
        }
    }

    /// Resolve the initial state from storage and start the periodic
    /// staleness check. A session recovered from storage that is already
    /// past the timeout is evicted here. Calling this again never spawns
    /// a second checker.
    pub async fn initialize(&self) -> GateState {
        let resolved = self.inner.resolve_from_store().await;
        self.inner.set_state(resolved);

        if self.inner.config.auto_lock_enabled() {
            let mut task = self.staleness_task.lock().await;
            if task.is_none() {
                let inner = Arc::clone(&self.inner);
                debug!(
                    "Starting staleness checker (interval: {}ms)",
                    inner.config.check_interval_ms
                );

                *task = Some(tokio::spawn(async move {
                    let mut ticker =
                        interval(Duration::from_millis(inner.config.check_interval_ms));

                    loop {
                        ticker.tick().await;
                        inner.check_staleness().await;
                    }
                }));
            }
        }

        resolved
    }

    /// Compare a candidate against the configured secret.
    ///
    /// Exact, case-sensitive equality with no trimming. On match the
    /// session is written and the gate unlocks; on mismatch the state is
    /// untouched. Repeated failures carry no penalty.
    pub async fn attempt_unlock(&self, candidate: &str) -> bool {
        if candidate == self.inner.config.secret {
            let now = self.inner.clock.now_ms();
            self.inner
                .store
                .write(&self.inner.config.storage_key, now)
                .await;
            self.inner.set_state(GateState::Unlocked);
            info!("Gate unlocked");
            true
        } else {
            debug!("Unlock attempt rejected");
            false
        }
    }

    /// Record a qualifying user interaction. No-op when locked or when
    /// auto-lock is disabled.
    pub async fn report_activity(&self) {
        self.inner.refresh_activity().await;
    }

    /// Force the gate locked and clear the stored session. Idempotent.
    pub async fn lock(&self) {
        self.inner.store.clear(&self.inner.config.storage_key).await;
        if self.inner.set_state(GateState::Locked) {
            info!("Gate locked");
        }
    }

    /// Whether a valid session currently exists. Re-derives validity from
    /// storage and evicts the session if it has gone stale.
    pub async fn is_authenticated(&self) -> bool {
        let resolved = self.inner.resolve_from_store().await;
        self.inner.set_state(resolved);
        resolved == GateState::Unlocked
    }

    /// Current machine state without re-deriving from storage
    pub fn state(&self) -> GateState {
        self.inner.state()
    }

    /// Subscribe to `Locked`/`Unlocked` transitions. The receiver only
    /// wakes on genuine state changes.
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.inner.state_tx.subscribe()
    }

    /// Attach a source of activity signals (clicks, key presses, scrolls).
    /// Each received event refreshes the session timestamp. When auto-lock
    /// is disabled the source is not subscribed to at all.
    pub async fn attach_activity_source(&self, mut events: mpsc::UnboundedReceiver<ActivityKind>) {
        if !self.inner.config.auto_lock_enabled() {
            debug!("Auto-lock disabled; not subscribing to activity events");
            return;
        }

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            while let Some(kind) = events.recv().await {
                debug!("Activity signal: {:?}", kind);
                inner.refresh_activity().await;
            }
        });

        self.activity_tasks.lock().await.push(handle);
    }

    /// Tear down the staleness checker and any attached activity sources.
    /// Also runs on drop.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.staleness_task.lock().await.take() {
            handle.abort();
        }

        for handle in self.activity_tasks.lock().await.drain(..) {
            handle.abort();
        }

        debug!("Gate controller shut down");
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(handle) = self.staleness_task.get_mut().take() {
            handle.abort();
        }

        for handle in self.activity_tasks.get_mut().drain(..) {
            handle.abort();
        }
    }
}
