//! Rolling-window circuit breaker.
//!
//! ```text
//! CLOSED ──[failure rate > threshold over ≥ volume calls]──► OPEN
//!    ▲                                                        │
//!    │                                              [reset timeout]
//!    │                                                        ▼
//!    └────────────[probe succeeds]──────────────────── HALF-OPEN
//!                                                             │
//!                          OPEN ◄────[probe fails]────────────┘
//! ```
//!
//! Every admitted call holds a [`CircuitPermit`]. The permit records the
//! outcome exactly once; dropping it unsettled (cancelled or abandoned call)
//! frees the HalfOpen slot without counting anything.
//!
//! Each state transition bumps a generation counter. A permit only counts if
//! its generation is still current, so a slow call admitted while Closed
//! cannot close or reopen the circuit on behalf of a later trial call.
//!
//! Every transition is logged and broadcast as a [`CircuitEvent`]. Nothing in
//! the call path reads those events.
//!
//! State lives behind one `std::sync::Mutex` that is never held across an
//! `.await`, so each acquire/record is a single atomic update.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use gon_core::config::CircuitConfig;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::error::InvokeError;

const EVENT_CAPACITY: usize = 16;

/// Breaker state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "halfOpen",
        };
        f.write_str(s)
    }
}

/// Transition notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircuitEvent {
    Opened,
    HalfOpen,
    Closed,
}

/// Point-in-time view for health reporting.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitSnapshot {
    pub state: CircuitState,
    pub window_len: usize,
    pub failures: usize,
}

struct Inner {
    state: CircuitState,
    /// Bumped on every transition.
    generation: u64,
    /// Most recent outcomes, `true` = failure. Bounded by `window_size`.
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

pub struct CircuitBreaker {
    name: String,
    config: CircuitConfig,
    inner: Mutex<Inner>,
    events: broadcast::Sender<CircuitEvent>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

// ─────────────────────────────────────────────
// Permit
// ─────────────────────────────────────────────

/// Admission to make one call. Settle with [`CircuitPermit::success`] or
/// [`CircuitPermit::failure`]; dropping it unsettled releases the slot.
#[must_use = "an unsettled permit records nothing"]
pub struct CircuitPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl std::fmt::Debug for CircuitPermit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitPermit")
            .field("generation", &self.generation)
            .field("settled", &self.settled)
            .finish()
    }
}

impl CircuitPermit<'_> {
    /// Record a successful call. A successful probe closes the circuit and
    /// clears the window.
    pub fn success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.generation);
    }

    /// Record a failed call (including timeouts).
    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.generation);
    }
}

impl Drop for CircuitPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release(self.generation);
        }
    }
}

// ─────────────────────────────────────────────
// CircuitBreaker
// ─────────────────────────────────────────────

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            name: name.into(),
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                generation: 0,
                window: VecDeque::with_capacity(config.window_size as usize),
                opened_at: None,
                probe_in_flight: false,
            }),
            config,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.config.reset_timeout_ms)
    }

    /// Ask permission for one call.
    ///
    /// - Closed: allowed.
    /// - Open, cool-down not elapsed: [`InvokeError::CircuitOpen`].
    /// - Open, cool-down elapsed: moves to HalfOpen and this caller becomes
    ///   the single probe.
    /// - HalfOpen with a probe already out: [`InvokeError::CircuitOpen`].
    pub fn try_acquire(&self) -> Result<CircuitPermit<'_>, InvokeError> {
        let mut inner = self.lock();
        let state = inner.state;
        match state {
            CircuitState::Closed => Ok(self.permit(inner.generation)),
            CircuitState::Open => {
                let elapsed = inner.opened_at.map_or(Duration::MAX, |t| t.elapsed());
                if elapsed >= self.reset_timeout() {
                    inner.state = CircuitState::HalfOpen;
                    inner.generation += 1;
                    inner.probe_in_flight = true;
                    let generation = inner.generation;
                    drop(inner);
                    self.emit(CircuitEvent::HalfOpen);
                    Ok(self.permit(generation))
                } else {
                    Err(InvokeError::CircuitOpen)
                }
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    Err(InvokeError::CircuitOpen)
                } else {
                    inner.probe_in_flight = true;
                    Ok(self.permit(inner.generation))
                }
            }
        }
    }

    fn permit(&self, generation: u64) -> CircuitPermit<'_> {
        CircuitPermit {
            breaker: self,
            generation,
            settled: false,
        }
    }

    fn on_success(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(breaker = %self.name, "Ignoring stale success");
            return;
        }
        let state = inner.state;
        match state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.generation += 1;
                inner.window.clear();
                inner.opened_at = None;
                inner.probe_in_flight = false;
                drop(inner);
                self.emit(CircuitEvent::Closed);
            }
            CircuitState::Closed => self.push_outcome(&mut inner, false),
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(breaker = %self.name, "Ignoring stale failure");
            return;
        }
        let state = inner.state;
        match state {
            CircuitState::HalfOpen => {
                self.open(&mut inner);
                drop(inner);
                self.emit(CircuitEvent::Opened);
            }
            CircuitState::Closed => {
                self.push_outcome(&mut inner, true);
                if self.should_trip(&inner) {
                    self.open(&mut inner);
                    drop(inner);
                    self.emit(CircuitEvent::Opened);
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Give back the HalfOpen slot without recording an outcome.
    fn release(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation && inner.state == CircuitState::HalfOpen {
            inner.probe_in_flight = false;
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Failures currently in the rolling window.
    pub fn failure_count(&self) -> usize {
        self.lock().window.iter().filter(|failed| **failed).count()
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.lock();
        CircuitSnapshot {
            state: inner.state,
            window_len: inner.window.len(),
            failures: inner.window.iter().filter(|failed| **failed).count(),
        }
    }

    /// Subscribe to transition events.
    pub fn subscribe(&self) -> broadcast::Receiver<CircuitEvent> {
        self.events.subscribe()
    }

    fn push_outcome(&self, inner: &mut Inner, failed: bool) {
        inner.window.push_back(failed);
        while inner.window.len() > self.config.window_size as usize {
            inner.window.pop_front();
        }
    }

    fn should_trip(&self, inner: &Inner) -> bool {
        let total = inner.window.len();
        if total < self.config.volume_threshold as usize {
            return false;
        }
        let failures = inner.window.iter().filter(|failed| **failed).count();
        failures * 100 > self.config.error_threshold_percentage as usize * total
    }

    fn open(&self, inner: &mut Inner) {
        inner.state = CircuitState::Open;
        inner.generation += 1;
        inner.opened_at = Some(Instant::now());
        inner.probe_in_flight = false;
    }

    fn emit(&self, event: CircuitEvent) {
        match event {
            CircuitEvent::Opened => error!(
                breaker = %self.name,
                reset_timeout_ms = self.config.reset_timeout_ms,
                "Circuit breaker opened"
            ),
            CircuitEvent::HalfOpen => info!(breaker = %self.name, "Circuit breaker half-open"),
            CircuitEvent::Closed => info!(breaker = %self.name, "Circuit breaker closed"),
        }
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
