//! Listening window: a discovery listener with an extendable deadline.
//!
//! Status polls and full scans both request listening time. Rather than run two
//! listeners, overlapping requests share one socket and the window stays open for
//! the sum of the requested durations. A watchdog task stops the listener once
//! the deadline passes.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use super::listener::{DiscoveryListener, ListenerConfig, MessageHandler};
use crate::error::DiscoveryError;

/// Expiry bookkeeping for a listening window.
///
/// Extending a live deadline adds to it; extending an expired (or unset)
/// deadline restarts it from `now`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Expiry {
    deadline: Option<Instant>,
}

impl Expiry {
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Extend by `by` as of `now` and return the new deadline.
    pub fn extend_at(&mut self, now: Instant, by: Duration) -> Instant {
        let next = match self.deadline {
            Some(deadline) if now < deadline => deadline + by,
            _ => now + by,
        };
        self.deadline = Some(next);
        next
    }

    /// An unset deadline never expires.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }
}

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub listener: ListenerConfig,
    /// How often the watchdog compares the deadline against the clock
    pub watchdog_tick: Duration,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            watchdog_tick: Duration::from_millis(500),
        }
    }
}

struct WindowShared {
    config: WindowConfig,
    handler: MessageHandler,
    /// Owns the one receive socket of this window; also serializes start/stop.
    listener: tokio::sync::Mutex<Option<DiscoveryListener>>,
    expiry: Mutex<Expiry>,
    active: AtomicBool,
    /// Bumped on every start so a stale watchdog cannot stop a newer run.
    generation: AtomicU64,
}

/// A [`DiscoveryListener`] that stops itself when its deadline elapses.
///
/// Cheap to clone; clones share the same window.
#[derive(Clone)]
pub struct ListeningWindow {
    shared: Arc<WindowShared>,
}

impl ListeningWindow {
    pub fn new(config: WindowConfig, handler: MessageHandler) -> Self {
        Self {
            shared: Arc::new(WindowShared {
                config,
                handler,
                listener: tokio::sync::Mutex::new(None),
                expiry: Mutex::new(Expiry::default()),
                active: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Whether the window currently owns a live receive socket.
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.shared.expiry.lock().deadline()
    }

    /// Address of the receive socket while the window is active.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.shared
            .listener
            .lock()
            .await
            .as_ref()
            .map(DiscoveryListener::local_addr)
    }

    /// Start listening for `duration`. If the window is already active this
    /// extends it instead.
    pub async fn start(&self, duration: Duration) -> Result<(), DiscoveryError> {
        self.ensure_active(duration).await.map(|_| ())
    }

    /// Extend an active window or start a new one.
    ///
    /// Returns `true` if a new listener was started. Bind/join failures
    /// propagate; the window stays inactive.
    pub async fn ensure_active(&self, duration: Duration) -> Result<bool, DiscoveryError> {
        let mut slot = self.shared.listener.lock().await;

        if slot.is_some() && self.is_active() {
            let deadline = self.extend(duration);
            debug!(
                "Listening window extended by {:?} (closes in {:?})",
                duration,
                deadline.saturating_duration_since(Instant::now())
            );
            return Ok(false);
        }

        // A window that expired between ticks may still hold its old listener.
        if let Some(mut stale) = slot.take() {
            stale.stop().await;
        }

        let listener =
            DiscoveryListener::start(&self.shared.config.listener, self.shared.handler.clone())?;
        *slot = Some(listener);

        {
            let mut expiry = self.shared.expiry.lock();
            expiry.clear();
            expiry.extend_at(Instant::now(), duration);
        }
        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.shared.active.store(true, Ordering::Release);

        tokio::spawn(watchdog(self.shared.clone(), generation));
        info!("Listening window opened for {:?}", duration);

        Ok(true)
    }

    /// Push the deadline out by `by`. Thread-safe; callable without a runtime.
    pub fn extend(&self, by: Duration) -> Instant {
        self.shared.expiry.lock().extend_at(Instant::now(), by)
    }

    /// Close the window and release its listener. Idempotent.
    pub async fn stop(&self) {
        self.shared.stop(None).await;
    }
}

impl WindowShared {
    /// Stop the window. With `only_generation`, stop only if that run is still
    /// current and its deadline has passed. Returns false when nothing was stopped.
    async fn stop(&self, only_generation: Option<u64>) -> bool {
        let mut slot = self.listener.lock().await;

        if let Some(generation) = only_generation {
            if self.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            // An extension may have landed while we waited on the slot.
            if !self.expiry.lock().is_expired_at(Instant::now()) {
                debug!("Listening window extended before it closed");
                return false;
            }
        }

        let was_active = self.active.swap(false, Ordering::AcqRel);
        self.expiry.lock().clear();

        if let Some(mut listener) = slot.take() {
            listener.stop().await;
        }

        if was_active {
            info!("Listening window closed");
        }
        true
    }
}

async fn watchdog(shared: Arc<WindowShared>, generation: u64) {
    let tick = shared.config.watchdog_tick;

    loop {
        tokio::time::sleep(tick).await;

        if !shared.active.load(Ordering::Acquire)
            || shared.generation.load(Ordering::Acquire) != generation
        {
            return;
        }

        let expired = shared.expiry.lock().is_expired_at(Instant::now());
        if expired {
            debug!("Listening window deadline reached");
            if shared.stop(Some(generation)).await {
                return;
            }
        }
    }
}
