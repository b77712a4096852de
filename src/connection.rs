//! # Connection manager
//!
//! Verifies that the vector store is reachable before any graph operation runs.
//!
//! The first [`ConnectionManager::ensure_connected`] call performs a liveness
//! check (listing collections) with bounded retry and exponential backoff.
//! Once a check succeeds the manager stays initialized for its lifetime and
//! later calls return immediately. A failed round leaves it uninitialized, so
//! the next call starts again from the first attempt.
//!
//! Concurrent callers share one in-flight check instead of each running their
//! own retry loop, and all of them see that round's outcome, success or failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result, StoreError};
use crate::vector_store::VectorStore;

/// How many liveness checks to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait before the second attempt; doubled before each one after that.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before `attempt` (1-based). The first attempt is immediate.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        match attempt {
            0 | 1 => Duration::ZERO,
            n => self.initial_delay.saturating_mul(1 << (n - 2).min(16)),
        }
    }
}

/// Outcome of the most recent failed round, handed to callers that queued on it.
struct FailedRound {
    attempts: u32,
    source: Arc<StoreError>,
}

/// Owns the "store is reachable" state for one store handle.
pub struct ConnectionManager {
    store: Arc<dyn VectorStore>,
    policy: RetryPolicy,
    ready: AtomicBool,
    /// Number of finished retry rounds. Read before queueing on `round`.
    finished_rounds: AtomicU64,
    /// Held for the whole retry loop; waiters queue here.
    round: Mutex<Option<FailedRound>>,
}

impl ConnectionManager {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self::with_policy(store, RetryPolicy::default())
    }

    pub fn with_policy(store: Arc<dyn VectorStore>, policy: RetryPolicy) -> Self {
        Self {
            store,
            policy,
            ready: AtomicBool::new(false),
            finished_rounds: AtomicU64::new(0),
            round: Mutex::new(None),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Make sure the store answered a liveness check at least once.
    ///
    /// Callers that arrive while a round is in flight wait for it and get its
    /// outcome. A call made after a failed round has finished starts a new
    /// round from the first attempt.
    ///
    /// # Errors
    /// [`Error::Connection`] with the last underlying error when every attempt failed.
    pub async fn ensure_connected(&self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let seen = self.finished_rounds.load(Ordering::Acquire);
        let mut last_failure = self.round.lock().await;

        if self.is_initialized() {
            return Ok(());
        }
        if self.finished_rounds.load(Ordering::Acquire) != seen
            && let Some(failed) = last_failure.as_ref()
        {
            debug!("Sharing the result of the liveness round that just failed");
            return Err(Error::Connection {
                attempts: failed.attempts,
                source: failed.source.clone(),
            });
        }

        let outcome = self.check_with_retry().await;
        let result = match outcome {
            Ok(()) => {
                self.ready.store(true, Ordering::Release);
                *last_failure = None;
                Ok(())
            }
            Err((attempts, source)) => {
                let source = Arc::new(source);
                *last_failure = Some(FailedRound {
                    attempts,
                    source: source.clone(),
                });
                Err(Error::Connection { attempts, source })
            }
        };
        self.finished_rounds.fetch_add(1, Ordering::AcqRel);
        result
    }

    async fn check_with_retry(&self) -> std::result::Result<(), (u32, StoreError)> {
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error: Option<StoreError> = None;

        for attempt in 1..=attempts {
            let delay = self.policy.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.store.list_collections().await {
                Ok(_) => {
                    info!("Connected to vector store on attempt {}", attempt);
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        "Vector store liveness check {}/{} failed: {}",
                        attempt, attempts, e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err((
            attempts,
            last_error.unwrap_or_else(|| {
                StoreError::InvalidResponse("no connection attempt was made".to_string())
            }),
        ))
    }
}
