//! Shared connection readiness state.
//!
//! A [`Readiness`] handle is created together with a lazily-connected client and
//! cloned into every consumer. The background connection task
//! ([`Readiness::supervise`]) flips it to [`ConnectionState::Failed`] when a
//! round of retries is exhausted and keeps retrying until it can flip it to
//! [`ConnectionState::Connected`]. Request paths call
//! [`Readiness::ensure_ready`] to reject work early instead of surfacing raw
//! driver errors.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};

use super::error::{DatabaseError, DatabaseResult};
use super::retry::{RetryConfig, retry_with_backoff};

/// Connection state of a store handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connection is being established
    Connecting,
    /// Connectivity verified and store initialized
    Connected,
    /// Connection attempts were exhausted
    Failed,
}

impl ConnectionState {
    fn as_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Connected => 1,
            Self::Failed => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connected,
            2 => Self::Failed,
            _ => Self::Connecting,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloneable readiness flag shared between the connection task and request handlers
#[derive(Clone, Debug)]
pub struct Readiness {
    state: Arc<AtomicU8>,
}

impl Readiness {
    /// Create a handle in the `Connecting` state
    pub fn new() -> Self {
        Self::with_state(ConnectionState::Connecting)
    }

    /// Create a handle that is already `Connected`
    pub fn connected() -> Self {
        Self::with_state(ConnectionState::Connected)
    }

    fn with_state(state: ConnectionState) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(state.as_u8())),
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn mark_connected(&self) {
        self.state
            .store(ConnectionState::Connected.as_u8(), Ordering::Release);
        info!("Store marked as connected");
    }

    pub fn mark_failed(&self) {
        self.state
            .store(ConnectionState::Failed.as_u8(), Ordering::Release);
        warn!("Store marked as failed");
    }

    /// Return `Ok(())` only when the store is connected
    pub fn ensure_ready(&self) -> DatabaseResult<()> {
        match self.state() {
            ConnectionState::Connected => Ok(()),
            state => Err(DatabaseError::NotReady(state)),
        }
    }

    /// Run `attempt` in rounds of `policy` retries until it succeeds, then mark
    /// the store connected.
    ///
    /// An exhausted round marks the store failed; the next round starts after
    /// `policy.max_delay_ms`, so an outage longer than one round recovers
    /// without a restart.
    pub async fn supervise<F, Fut, E>(&self, policy: RetryConfig, mut attempt: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: fmt::Display,
    {
        let pause = Duration::from_millis(policy.max_delay_ms);
        let mut rounds = 0u32;

        loop {
            match retry_with_backoff(&mut attempt, policy.clone()).await {
                Ok(()) => {
                    if rounds > 0 {
                        info!(rounds, "Store recovered after failed connection rounds");
                    }
                    self.mark_connected();
                    return;
                }
                Err(e) => {
                    rounds += 1;
                    error!(error = %e, rounds, "Store connection round failed, retrying in {:?}", pause);
                    if self.state() != ConnectionState::Failed {
                        self.mark_failed();
                    }
                    tokio::time::sleep(pause).await;
                }
            }
        }
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}
