//! The alert stack: newest-first, lock-guarded, always consistently indexed.
//!
//! Alerts are kept in a `Vec` whose index is the stack position (0 = top).
//! Every public operation holds the lock from its first read to the end of
//! the reindex, so positions are a permutation of `0..N-1` whenever the lock
//! can be observed free.
//!
//! Countdowns are approximate: an alert is dropped once no more than
//! `EXPIRY_EPSILON` (0.1 ms) of its countdown remains, so it can expire up
//! to that much early.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use agenda_core::config::DisplayConfig;
use tracing::debug;

use crate::layout::AlertLayout;
use crate::surface::Point;

/// Countdowns at or below this are treated as expired; absorbs rounding
/// from summing many small frame deltas.
const EXPIRY_EPSILON: f64 = 1e-4;

/// Process-unique identifier of one alert instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertId(pub u64);

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alert-{}", self.0)
    }
}

/// One visible notification. Handed out by value only.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: AlertId,
    pub title: String,
    pub message: String,
    pub time_str: String,
    /// Current top edge; eases toward the position's target each tick.
    pub offset: f32,
    /// Seconds until auto-expiry.
    pub countdown: f64,
    /// 0 = topmost.
    pub position: usize,
}

/// Timing and capacity knobs for a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct StackSettings {
    pub layout: AlertLayout,
    /// Countdown every new alert starts with.
    pub countdown_secs: f64,
    pub animation_speed: f32,
    /// Alerts beyond this are evicted oldest-first into the overflow count.
    pub max_alerts: usize,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default())
    }
}

impl StackSettings {
    pub fn from_config(cfg: &DisplayConfig) -> Self {
        Self {
            layout: AlertLayout::from_config(cfg),
            countdown_secs: f64::from(cfg.countdown_secs),
            animation_speed: cfg.animation_speed,
            max_alerts: cfg.max_alerts.max(1),
        }
    }
}

/// A consistent copy of the stack taken under the lock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackSnapshot {
    /// Newest first; `alerts[i].position == i`.
    pub alerts: Vec<Alert>,
    /// Alerts evicted by the capacity cap that are still within their
    /// countdown. Cleared once any shown alert expires, since every evicted
    /// alert was older.
    pub overflow: usize,
}

#[derive(Debug, Default)]
struct StackState {
    alerts: Vec<Alert>,
    overflow: usize,
    next_id: u64,
}

impl StackState {
    fn reindex(&mut self) {
        for (i, alert) in self.alerts.iter_mut().enumerate() {
            alert.position = i;
        }
        if self.alerts.is_empty() {
            self.overflow = 0;
        }
    }
}

/// Shared handle to one alert stack. Clones refer to the same stack.
#[derive(Clone)]
pub struct AlertStack {
    state: Arc<Mutex<StackState>>,
    settings: Arc<StackSettings>,
}

impl AlertStack {
    /// Create an empty stack.
    pub fn new(settings: StackSettings) -> Self {
        Self {
            state: Arc::new(Mutex::new(StackState::default())),
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &StackSettings {
        &self.settings
    }

    pub fn layout(&self) -> &AlertLayout {
        &self.settings.layout
    }

    fn lock(&self) -> MutexGuard<'_, StackState> {
        // A panic elsewhere cannot leave positions half-written: every
        // mutation reindexes before the guard drops.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push a new alert on top, starting above the visible area.
    pub fn insert(&self, title: &str, message: &str, time_str: &str) -> AlertId {
        let mut state = self.lock();
        let id = AlertId(state.next_id);
        state.next_id += 1;

        state.alerts.insert(
            0,
            Alert {
                id,
                title: title.to_string(),
                message: message.to_string(),
                time_str: time_str.to_string(),
                offset: self.settings.layout.spawn_offset(),
                countdown: self.settings.countdown_secs,
                position: 0,
            },
        );

        let cap = self.settings.max_alerts;
        if state.alerts.len() > cap {
            let evicted = state.alerts.len() - cap;
            state.alerts.truncate(cap);
            state.overflow += evicted;
            debug!(evicted, overflow = state.overflow, "alert stack over capacity");
        }
        state.reindex();
        debug!(alert_id = %id, len = state.alerts.len(), "alert inserted");
        id
    }

    /// Advance animations and countdowns by `delta` seconds, dropping expired
    /// alerts. Returns how many expired.
    pub fn tick(&self, delta: f32) -> usize {
        let delta = delta.max(0.0);
        // Clamped so a long frame lands on the target instead of overshooting.
        let ease = (self.settings.animation_speed * delta).min(1.0);
        let layout = &self.settings.layout;

        let mut state = self.lock();
        for alert in state.alerts.iter_mut() {
            let target = layout.target_y(alert.position);
            alert.offset += (target - alert.offset) * ease;
            alert.countdown -= f64::from(delta);
        }

        let before = state.alerts.len();
        state.alerts.retain(|a| a.countdown > EXPIRY_EPSILON);
        let expired = before - state.alerts.len();
        if expired > 0 {
            state.overflow = 0;
            state.reindex();
            debug!(expired, len = state.alerts.len(), "alerts expired");
        }
        expired
    }

    /// Remove the first alert (top-down) whose dismiss button contains `pointer`.
    pub fn dismiss_at(&self, pointer: Point) -> bool {
        let layout = &self.settings.layout;
        let mut state = self.lock();
        let hit = state
            .alerts
            .iter()
            .position(|a| layout.dismiss_rect(a.offset).contains(pointer));
        match hit {
            Some(index) => {
                let removed = state.alerts.remove(index);
                state.reindex();
                debug!(alert_id = %removed.id, "alert dismissed");
                true
            }
            None => false,
        }
    }

    /// Remove every alert. Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let mut state = self.lock();
        let removed = state.alerts.len();
        state.alerts.clear();
        state.reindex();
        debug!(removed, "alert stack cleared");
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.lock().alerts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().alerts.len()
    }

    pub fn snapshot(&self) -> StackSnapshot {
        let state = self.lock();
        StackSnapshot {
            alerts: state.alerts.clone(),
            overflow: state.overflow,
        }
    }
}

impl Default for AlertStack {
    fn default() -> Self {
        Self::new(StackSettings::default())
    }
}

impl fmt::Debug for AlertStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertStack")
            .field("len", &self.len())
            .finish()
    }
}
