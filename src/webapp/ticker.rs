//! One-second countdown polling for mounted views.
//!
//! A [`Ticker`] keeps at most one tokio task per live post. The task
//! re-derives the expiry state on a fixed cadence and publishes it on a
//! `watch` channel; every view mounted on that post (indicator, placeholder,
//! expiring body) renders from the same channel, so the views of one post
//! never disagree. The task is dropped with the last [`MountedView`] that
//! uses it, and stops by itself once the post has expired.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::components::Rendered;
use crate::ttl::{derive, Clock, ExpiryState, Post, PostId, TtlDescriptor};

/// Default re-render cadence.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

type Render = Box<dyn Fn(ExpiryState) -> Rendered + Send + Sync>;

/// Timers are per post and per expiry, so an edited post gets a fresh one.
type TimerKey = (PostId, i64);

/// The polling task of one live post.
struct CountdownTimer {
    states: watch::Receiver<ExpiryState>,
    task: JoinHandle<()>,
}

impl CountdownTimer {
    fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A view mounted by the host.
///
/// Holds the latest frame and, while the countdown is live, a share of the
/// post's timer.
pub struct MountedView {
    last: Rendered,
    live: Option<LiveView>,
}

struct LiveView {
    states: watch::Receiver<ExpiryState>,
    render: Render,
    timer: Arc<CountdownTimer>,
}

impl MountedView {
    /// A view whose frame never changes.
    pub fn fixed(frame: Rendered) -> Self {
        Self {
            last: frame,
            live: None,
        }
    }

    /// Latest rendered frame.
    pub fn current(&self) -> Rendered {
        match &self.live {
            Some(live) => (live.render)(*live.states.borrow()),
            None => self.last.clone(),
        }
    }

    /// Wait for the next frame change.
    ///
    /// Returns `false` once the view can no longer change (fixed view,
    /// expired countdown, or unmounted).
    pub async fn changed(&mut self) -> bool {
        let Some(live) = self.live.as_mut() else {
            return false;
        };

        loop {
            if live.states.changed().await.is_err() {
                return false;
            }
            let frame = (live.render)(*live.states.borrow_and_update());
            if frame != self.last {
                self.last = frame;
                return true;
            }
        }
    }

    /// Whether the post's timer is still running for this view.
    pub fn is_ticking(&self) -> bool {
        self.live.as_ref().is_some_and(|live| live.timer.is_running())
    }

    /// Release this view's share of the timer, keeping the last frame.
    /// Safe to call more than once.
    pub fn unmount(&mut self) {
        if let Some(live) = self.live.take() {
            self.last = (live.render)(*live.states.borrow());
        }
    }
}

impl fmt::Debug for MountedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedView")
            .field("frame", &self.current())
            .field("ticking", &self.is_ticking())
            .finish()
    }
}

impl Drop for MountedView {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Shared source of countdown timers. Clones share the same timers.
#[derive(Clone)]
pub struct Ticker {
    clock: Arc<dyn Clock>,
    period: Duration,
    timers: Arc<Mutex<HashMap<TimerKey, Weak<CountdownTimer>>>>,
}

impl Ticker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            period: TICK_PERIOD,
            timers: Arc::default(),
        }
    }

    /// Re-derive every `period` instead of every second.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Mount a view of `post`.
    ///
    /// The first frame is rendered synchronously. A timer is only needed for
    /// a live countdown, and the post's existing timer is reused when another
    /// view already started one. Outside a tokio runtime the view is rendered
    /// once and stays fixed.
    pub fn mount<F>(&self, post: &Post, render: F) -> MountedView
    where
        F: Fn(ExpiryState) -> Rendered + Send + Sync + 'static,
    {
        let ttl = post.ttl();
        let state = derive(ttl.as_ref(), self.clock.now_ms());

        let live = matches!(state, ExpiryState::Countdown(countdown) if !countdown.is_expired);
        let ttl = match ttl {
            Some(ttl) if live => ttl,
            _ => return MountedView::fixed(render(state)),
        };
        let Some(timer) = self.timer_for(&post.id, ttl) else {
            return MountedView::fixed(render(state));
        };

        let mut states = timer.states.clone();
        let last = render(*states.borrow_and_update());
        MountedView {
            last,
            live: Some(LiveView {
                states,
                render: Box::new(render),
                timer,
            }),
        }
    }

    /// Number of timers currently polling.
    pub fn active_timers(&self) -> usize {
        self.lock()
            .values()
            .filter_map(Weak::upgrade)
            .filter(|timer| timer.is_running())
            .count()
    }

    fn timer_for(&self, post_id: &PostId, ttl: TtlDescriptor) -> Option<Arc<CountdownTimer>> {
        let expires_at = ttl.expires_at?;
        let key = (post_id.clone(), expires_at);

        let mut timers = self.lock();
        timers.retain(|_, timer| timer.strong_count() > 0);
        if let Some(timer) = timers.get(&key).and_then(Weak::upgrade) {
            if timer.is_running() {
                return Some(timer);
            }
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(post_id = %post_id, "no tokio runtime, countdown will not tick");
            return None;
        };

        let timer = Arc::new(self.spawn(&runtime, ttl));
        timers.insert(key, Arc::downgrade(&timer));
        Some(timer)
    }

    fn spawn(&self, runtime: &tokio::runtime::Handle, ttl: TtlDescriptor) -> CountdownTimer {
        let clock = self.clock.clone();
        let period = self.period;
        let (tx, states) = watch::channel(derive(Some(&ttl), clock.now_ms()));

        let task = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; the first state is already out.
            interval.tick().await;

            loop {
                interval.tick().await;

                let state = derive(Some(&ttl), clock.now_ms());
                tx.send_if_modified(|current| {
                    if *current == state {
                        return false;
                    }
                    *current = state;
                    true
                });

                // An expired state never changes again.
                if state.is_expired() {
                    break;
                }
            }
        });

        CountdownTimer { states, task }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TimerKey, Weak<CountdownTimer>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
