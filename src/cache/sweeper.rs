//! Background eviction of expired entries for the local backends.
//!
//! Lazy eviction only reclaims an entry when its key is touched again. The
//! sweeper revisits every tracked key once per TTL interval and runs the normal
//! existence check on it, which evicts whatever has gone stale.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::BackendKind;
use crate::cache::facade::CacheCore;

/// Lifecycle of a cache instance's sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SweeperState {
    /// No sweeper: the TTL is zero or the backend expires entries itself.
    Idle = 0,
    /// Waiting for the next interval to elapse.
    Armed = 1,
    /// Revisiting tracked keys.
    Sweeping = 2,
    /// Stopped for good.
    Terminated = 3,
}

impl SweeperState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SweeperState::Armed,
            2 => SweeperState::Sweeping,
            3 => SweeperState::Terminated,
            _ => SweeperState::Idle,
        }
    }
}

#[derive(Debug, Clone)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new(state: SweeperState) -> Self {
        Self(Arc::new(AtomicU8::new(state as u8)))
    }

    fn set(&self, state: SweeperState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn get(&self) -> SweeperState {
        SweeperState::from_u8(self.0.load(Ordering::Acquire))
    }
}

/// Handle to a running sweeper task. Dropping it stops the task.
pub(crate) struct Sweeper {
    token: CancellationToken,
    state: SharedState,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn a sweeper on the current Tokio runtime.
    ///
    /// Returns `None` when there is nothing to sweep or no runtime to run on.
    pub(crate) fn spawn(core: Arc<CacheCore>) -> Option<Self> {
        let interval = core.policy().ttl()?;
        if core.kind().expires_natively() {
            return None;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!(
                    backend = %core.kind(),
                    "no tokio runtime available, expired entries are only evicted on access"
                );
                return None;
            }
        };

        let token = CancellationToken::new();
        let state = SharedState::new(SweeperState::Armed);
        let handle = runtime.spawn(run(core, interval, token.clone(), state.clone()));

        Some(Self {
            token,
            state,
            handle,
        })
    }

    pub(crate) fn state(&self) -> SweeperState {
        self.state.get()
    }

    pub(crate) fn stop(&self) {
        self.token.cancel();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(
    core: Arc<CacheCore>,
    interval: Duration,
    token: CancellationToken,
    state: SharedState,
) {
    tracing::info!(
        backend = %core.kind(),
        interval_ms = interval.as_millis() as u64,
        "starting expiry sweeper"
    );

    loop {
        state.set(SweeperState::Armed);
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        state.set(SweeperState::Sweeping);
        tokio::select! {
            _ = token.cancelled() => break,
            _ = sweep(&core) => {}
        }
    }

    state.set(SweeperState::Terminated);
    tracing::info!(backend = %core.kind(), "expiry sweeper stopped");
}

/// One pass over every tracked key.
async fn sweep(core: &Arc<CacheCore>) {
    let keys = core.tracked_keys().await;
    tracing::debug!(backend = %core.kind(), keys = keys.len(), "sweeping tracked keys");

    match core.kind() {
        BackendKind::Memory => {
            for key in keys {
                core.has(&key).await;
            }
        }
        BackendKind::File => {
            for key in keys {
                let core = Arc::clone(core);
                tokio::spawn(async move {
                    core.has(&key).await;
                });
            }
        }
        BackendKind::Redis | BackendKind::RedisCluster => {}
    }
}
