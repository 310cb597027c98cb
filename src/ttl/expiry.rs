//! Countdown state derived from a TTL descriptor and the current time.
//!
//! [`derive`] is pure: the same `(descriptor, now)` always yields the same
//! state. Views call it once per tick instead of keeping their own clocks.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use super::descriptor::TtlDescriptor;
use super::duration::format_time_remaining;

/// Below this many milliseconds a live countdown is urgent.
pub const URGENT_THRESHOLD_MS: i64 = 60 * 1000;

/// Snapshot of a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownState {
    /// Milliseconds left, clamped at zero.
    pub remaining_ms: i64,
    pub is_expired: bool,
    pub is_urgent: bool,
}

impl CountdownState {
    pub fn at(expires_at: i64, now_ms: i64) -> Self {
        let remaining = expires_at.saturating_sub(now_ms);
        if remaining <= 0 {
            return Self {
                remaining_ms: 0,
                is_expired: true,
                is_urgent: false,
            };
        }

        Self {
            remaining_ms: remaining,
            is_expired: false,
            is_urgent: remaining < URGENT_THRESHOLD_MS,
        }
    }

    pub fn label(&self) -> String {
        format_time_remaining(self.remaining_ms)
    }
}

/// What a post's TTL means for presentation right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryState {
    /// No descriptor, or self-destruction is not enabled.
    NotApplicable,
    /// Enabled, but the server has not stamped an expiry yet.
    Untimed,
    Countdown(CountdownState),
}

impl ExpiryState {
    pub fn is_applicable(&self) -> bool {
        !matches!(self, Self::NotApplicable)
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Countdown(state) if state.is_expired)
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::Countdown(state) if state.is_urgent)
    }

    /// Countdown label, when there is a countdown to show.
    pub fn label(&self) -> Option<String> {
        match self {
            Self::Countdown(state) => Some(state.label()),
            _ => None,
        }
    }
}

/// Derive the expiry state of `descriptor` at `now_ms`.
pub fn derive(descriptor: Option<&TtlDescriptor>, now_ms: i64) -> ExpiryState {
    let Some(ttl) = descriptor.filter(|ttl| ttl.enabled) else {
        return ExpiryState::NotApplicable;
    };

    match ttl.expires_at {
        None => ExpiryState::Untimed,
        Some(expires_at) => ExpiryState::Countdown(CountdownState::at(expires_at, now_ms)),
    }
}

/// Source of "now" in milliseconds since the epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by_ms: i64) {
        self.now.fetch_add(by_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
