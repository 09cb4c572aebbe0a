use std::sync::Arc;
use std::time::Duration as StdDuration;

use agenda_core::config::NotifyConfig;
use agenda_core::datetime::format_time_for_display;
use agenda_core::{DueWindow, ScheduledItem, StoreGateway};
use chrono::{DateTime, Duration, Local, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::sink::NotificationSink;
use crate::stack::AlertStack;

/// Cadence and window of the eligibility scan.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    pub advance: Duration,
    pub tolerance: Duration,
    pub interval: StdDuration,
    /// Title given to every alert the poller raises.
    pub title: String,
}

impl PollSettings {
    pub fn from_config(cfg: &NotifyConfig) -> Self {
        Self {
            advance: Duration::minutes(cfg.advance_minutes as i64),
            tolerance: Duration::seconds(cfg.tolerance_secs as i64),
            interval: StdDuration::from_secs(cfg.poll_interval_secs.max(1)),
            title: cfg.title.clone(),
        }
    }

    pub fn window_at(&self, now: DateTime<Utc>) -> DueWindow {
        DueWindow::around(now, self.advance, self.tolerance)
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from_config(&NotifyConfig::default())
    }
}

/// What one poll cycle did. Counts are per item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub window: Option<DueWindow>,
    /// The gateway query itself failed; nothing else was attempted.
    pub fetch_failed: bool,
    pub fetched: usize,
    /// Alerts inserted into the stack.
    pub surfaced: usize,
    /// Items ignored: already notified, or an unusable scheduled instant.
    pub skipped: usize,
    pub sink_failures: usize,
    /// Surfaced items whose notified flag could not be set; they will be
    /// surfaced again next cycle.
    pub mark_failures: usize,
}

/// Periodically moves due items from the store into the alert stack.
///
/// Per item, the order is: stack insert, OS notification, notified mark.
/// A crash between the first and last step re-surfaces the item after
/// restart rather than losing it (at-least-once).
pub struct EligibilityPoller<G: StoreGateway> {
    gateway: G,
    sink: Arc<dyn NotificationSink>,
    stack: AlertStack,
    settings: PollSettings,
    /// Signalled after any cycle that surfaced alerts.
    wake_tx: Option<mpsc::Sender<()>>,
}

impl<G: StoreGateway> EligibilityPoller<G> {
    pub fn new(
        gateway: G,
        sink: Arc<dyn NotificationSink>,
        stack: AlertStack,
        settings: PollSettings,
    ) -> Self {
        Self {
            gateway,
            sink,
            stack,
            settings,
            wake_tx: None,
        }
    }

    /// Send a unit message on `tx` whenever a cycle surfaces alerts.
    ///
    /// Uses `try_send`, so a full channel (a wake already pending) never
    /// stalls the poller.
    pub fn with_wake(mut self, tx: mpsc::Sender<()>) -> Self {
        self.wake_tx = Some(tx);
        self
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Main loop. Polls every `interval` until `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.settings.interval.as_secs(),
            advance_mins = self.settings.advance.num_minutes(),
            tolerance_secs = self.settings.tolerance.num_seconds(),
            "eligibility poller started"
        );

        let mut interval = tokio::time::interval(self.settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.poll_once(Utc::now()).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("eligibility poller shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Run a single cycle as of `now`.
    pub async fn poll_once(&self, now: DateTime<Utc>) -> CycleReport {
        let window = self.settings.window_at(now);
        let mut report = CycleReport {
            window: Some(window),
            ..CycleReport::default()
        };

        let items = match self.gateway.fetch_due(&window) {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "fetching due items failed; retrying next cycle");
                report.fetch_failed = true;
                return report;
            }
        };
        report.fetched = items.len();
        if !items.is_empty() {
            info!(count = items.len(), "found pending notifications");
        }

        for item in items {
            if item.notified {
                debug!(item_id = %item.id, "item already notified, skipping");
                report.skipped += 1;
                continue;
            }
            let Some(time_str) = display_time(&item) else {
                warn!(
                    item_id = %item.id,
                    scheduled_at = item.scheduled_at,
                    "item has an unusable scheduled time, skipping"
                );
                report.skipped += 1;
                continue;
            };

            let alert_id = self
                .stack
                .insert(&self.settings.title, &item.description, &time_str);
            report.surfaced += 1;
            info!(item_id = %item.id, %alert_id, time = %time_str, "alert raised");

            if let Err(e) = self.sink.notify(&self.settings.title, &item.description).await {
                warn!(item_id = %item.id, sink = self.sink.name(), error = %e, "os notification failed");
                report.sink_failures += 1;
            }

            if let Err(e) = self.gateway.mark_notified(item.id) {
                warn!(item_id = %item.id, error = %e, "marking item notified failed; it may be shown again");
                report.mark_failures += 1;
            }
        }

        if report.surfaced > 0 {
            if let Some(tx) = &self.wake_tx {
                if tx.try_send(()).is_err() {
                    debug!("display wake already pending or display stopped");
                }
            }
        }
        report
    }
}

/// `hh:MM AM` for the alert, from the stored time string or, failing that,
/// the scheduled instant. `None` when neither is usable.
fn display_time(item: &ScheduledItem) -> Option<String> {
    let instant = item.scheduled_instant()?;
    let formatted = format_time_for_display(&item.time);
    if formatted != item.time {
        return Some(formatted);
    }
    Some(instant.with_timezone(&Local).format("%I:%M %p").to_string())
}
