use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use agenda_alerts::{AlertStack, EligibilityPoller, NotificationSink, PollSettings, SinkError};
use agenda_core::{CoreError, DueWindow, ItemId, ScheduledItem, StoreGateway};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::{mpsc, watch};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeGateway {
    items: Mutex<Vec<ScheduledItem>>,
    fail_fetch: bool,
    fail_mark: bool,
    windows: Mutex<Vec<DueWindow>>,
    marked: Mutex<Vec<ItemId>>,
    /// Stack the poller under test writes to, seen from `mark_notified`.
    stack: Mutex<Option<AlertStack>>,
    /// Per mark: whether the item's alert was already on the stack.
    shown_before_mark: Mutex<Vec<bool>>,
}

impl FakeGateway {
    fn with_items(items: Vec<ScheduledItem>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }
}

impl StoreGateway for FakeGateway {
    /// Returns every stored item regardless of window or flag, so the
    /// poller's own filtering is what gets tested.
    fn fetch_due(&self, window: &DueWindow) -> agenda_core::Result<Vec<ScheduledItem>> {
        self.windows.lock().unwrap().push(*window);
        if self.fail_fetch {
            return Err(CoreError::Database("database is locked".into()));
        }
        Ok(self.items.lock().unwrap().clone())
    }

    fn mark_notified(&self, id: ItemId) -> agenda_core::Result<()> {
        if self.fail_mark {
            return Err(CoreError::Database("disk I/O error".into()));
        }
        self.marked.lock().unwrap().push(id);
        let mut items = self.items.lock().unwrap();
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            return Ok(());
        };
        if let Some(stack) = self.stack.lock().unwrap().as_ref() {
            let shown = stack
                .snapshot()
                .alerts
                .iter()
                .any(|a| a.message == item.description);
            self.shown_before_mark.lock().unwrap().push(shown);
        }
        item.notified = true;
        Ok(())
    }
}

#[derive(Default)]
struct FakeSink {
    fail: bool,
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl NotificationSink for FakeSink {
    fn name(&self) -> &str {
        "fake"
    }

    async fn notify(&self, title: &str, message: &str) -> Result<(), SinkError> {
        self.calls
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        if self.fail {
            return Err(SinkError::Failed { status: Some(1) });
        }
        Ok(())
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 15, 8, 45, 0).unwrap()
}

fn item(id: i64, description: &str, at: DateTime<Utc>) -> ScheduledItem {
    ScheduledItem {
        id: ItemId(id),
        date: at.format("%Y-%m-%d").to_string(),
        time: at.format("%H:%M:%S").to_string(),
        description: description.to_string(),
        scheduled_at: at.timestamp(),
        notified: false,
    }
}

fn poller(
    gateway: Arc<FakeGateway>,
    sink: Arc<FakeSink>,
) -> (EligibilityPoller<Arc<FakeGateway>>, AlertStack) {
    let stack = AlertStack::default();
    *gateway.stack.lock().unwrap() = Some(stack.clone());
    let poller = EligibilityPoller::new(gateway, sink, stack.clone(), PollSettings::default());
    (poller, stack)
}

// ---------------------------------------------------------------------------
// Cycles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn window_is_advance_plus_minus_tolerance() {
    let gateway = Arc::new(FakeGateway::default());
    let (poller, _stack) = poller(gateway.clone(), Arc::new(FakeSink::default()));

    let report = poller.poll_once(now()).await;
    let target = (now() + Duration::minutes(15)).timestamp();
    let expected = DueWindow {
        start: target - 30,
        end: target + 30,
    };
    assert_eq!(report.window, Some(expected));
    assert_eq!(gateway.windows.lock().unwrap().as_slice(), &[expected]);
}

#[tokio::test]
async fn due_items_surface_notify_and_mark_in_order() {
    let at = now() + Duration::minutes(15);
    let gateway = Arc::new(FakeGateway::with_items(vec![
        item(1, "standup", at),
        item(2, "review", at + Duration::seconds(10)),
    ]));
    let sink = Arc::new(FakeSink::default());
    let (poller, stack) = poller(gateway.clone(), sink.clone());

    let report = poller.poll_once(now()).await;
    assert_eq!(report.fetched, 2);
    assert_eq!(report.surfaced, 2);
    assert_eq!(report.skipped, 0);

    // Inserted in fetch order, so the later item is on top.
    let snap = stack.snapshot();
    let messages: Vec<_> = snap.alerts.iter().map(|a| a.message.as_str()).collect();
    assert_eq!(messages, ["review", "standup"]);
    assert!(snap.alerts.iter().all(|a| a.title == "Agenda Reminder"));
    assert_eq!(snap.alerts[1].time_str, "09:00 AM");

    let calls = sink.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            ("Agenda Reminder".to_string(), "standup".to_string()),
            ("Agenda Reminder".to_string(), "review".to_string()),
        ]
    );
    assert_eq!(*gateway.marked.lock().unwrap(), vec![ItemId(1), ItemId(2)]);
}

#[tokio::test]
async fn alert_is_on_stack_before_item_is_marked() {
    let at = now() + Duration::minutes(15);
    let gateway = Arc::new(FakeGateway::with_items(vec![
        item(1, "standup", at),
        item(2, "review", at + Duration::seconds(10)),
    ]));
    let (poller, _stack) = poller(gateway.clone(), Arc::new(FakeSink::default()));

    let report = poller.poll_once(now()).await;
    assert_eq!(report.surfaced, 2);
    assert_eq!(*gateway.shown_before_mark.lock().unwrap(), vec![true, true]);
}

#[tokio::test]
async fn marked_items_are_not_surfaced_again() {
    let at = now() + Duration::minutes(15);
    let gateway = Arc::new(FakeGateway::with_items(vec![item(1, "standup", at)]));
    let sink = Arc::new(FakeSink::default());
    let (poller, stack) = poller(gateway.clone(), sink.clone());

    poller.poll_once(now()).await;
    let second = poller.poll_once(now() + Duration::seconds(30)).await;

    assert_eq!(second.surfaced, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(stack.len(), 1);
    assert_eq!(sink.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn already_notified_items_are_ignored() {
    let mut done = item(1, "standup", now() + Duration::minutes(15));
    done.notified = true;
    let gateway = Arc::new(FakeGateway::with_items(vec![done]));
    let sink = Arc::new(FakeSink::default());
    let (poller, stack) = poller(gateway.clone(), sink.clone());

    let report = poller.poll_once(now()).await;
    assert_eq!(report.skipped, 1);
    assert!(stack.is_empty());
    assert!(sink.calls.lock().unwrap().is_empty());
    assert!(gateway.marked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sink_failure_still_marks_item() {
    let gateway = Arc::new(FakeGateway::with_items(vec![item(
        7,
        "dentist",
        now() + Duration::minutes(15),
    )]));
    let sink = Arc::new(FakeSink {
        fail: true,
        ..FakeSink::default()
    });
    let (poller, stack) = poller(gateway.clone(), sink);

    let report = poller.poll_once(now()).await;
    assert_eq!(report.sink_failures, 1);
    assert_eq!(report.surfaced, 1);
    assert_eq!(stack.len(), 1);
    assert_eq!(*gateway.marked.lock().unwrap(), vec![ItemId(7)]);
}

#[tokio::test]
async fn mark_failure_surfaces_again_next_cycle() {
    let gateway = Arc::new(FakeGateway {
        items: Mutex::new(vec![item(3, "call mum", now() + Duration::minutes(15))]),
        fail_mark: true,
        ..FakeGateway::default()
    });
    let (poller, stack) = poller(gateway, Arc::new(FakeSink::default()));

    let first = poller.poll_once(now()).await;
    let second = poller.poll_once(now() + Duration::seconds(30)).await;

    assert_eq!(first.mark_failures, 1);
    assert_eq!(second.surfaced, 1);
    assert_eq!(stack.len(), 2);
}

#[tokio::test]
async fn fetch_failure_is_reported_and_nothing_happens() {
    let gateway = Arc::new(FakeGateway {
        items: Mutex::new(vec![item(1, "standup", now() + Duration::minutes(15))]),
        fail_fetch: true,
        ..FakeGateway::default()
    });
    let sink = Arc::new(FakeSink::default());
    let (poller, stack) = poller(gateway, sink.clone());

    let report = poller.poll_once(now()).await;
    assert!(report.fetch_failed);
    assert_eq!(report.fetched, 0);
    assert!(stack.is_empty());
    assert!(sink.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unusable_instant_is_skipped_and_left_unmarked() {
    let good = item(1, "standup", now() + Duration::minutes(15));
    let mut bad = item(2, "corrupt", now() + Duration::minutes(15));
    bad.scheduled_at = i64::MAX;
    let gateway = Arc::new(FakeGateway::with_items(vec![bad, good]));
    let (poller, stack) = poller(gateway.clone(), Arc::new(FakeSink::default()));

    let report = poller.poll_once(now()).await;
    assert_eq!(report.skipped, 1);
    assert_eq!(report.surfaced, 1);
    assert_eq!(stack.snapshot().alerts[0].message, "standup");
    assert_eq!(*gateway.marked.lock().unwrap(), vec![ItemId(1)]);
}

// ---------------------------------------------------------------------------
// Wake channel and run loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wake_is_sent_only_when_something_surfaced() {
    let gateway = Arc::new(FakeGateway::default());
    let (tx, mut rx) = mpsc::channel(1);
    let (poller, _stack) = poller(gateway.clone(), Arc::new(FakeSink::default()));
    let poller = poller.with_wake(tx);

    poller.poll_once(now()).await;
    assert!(rx.try_recv().is_err());

    gateway
        .items
        .lock()
        .unwrap()
        .push(item(1, "standup", now() + Duration::minutes(15)));
    poller.poll_once(now()).await;
    assert!(rx.try_recv().is_ok());
}

#[tokio::test]
async fn full_wake_channel_does_not_block() {
    let at = now() + Duration::minutes(15);
    let gateway = Arc::new(FakeGateway::with_items(vec![item(1, "a", at)]));
    let (tx, mut rx) = mpsc::channel(1);
    let (poller, stack) = poller(gateway.clone(), Arc::new(FakeSink::default()));
    let poller = poller.with_wake(tx);

    poller.poll_once(now()).await;
    gateway.items.lock().unwrap().push(item(2, "b", at));
    let report = tokio::time::timeout(StdDuration::from_secs(1), poller.poll_once(now()))
        .await
        .expect("poll blocked on a full wake channel");

    assert_eq!(report.surfaced, 1);
    assert_eq!(stack.len(), 2);
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn run_polls_immediately_and_stops_on_shutdown() {
    let due = Utc::now() + Duration::minutes(15);
    let gateway = Arc::new(FakeGateway::with_items(vec![item(1, "standup", due)]));
    let (wake_tx, mut wake_rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (poller, stack) = poller(gateway.clone(), Arc::new(FakeSink::default()));
    let handle = tokio::spawn(poller.with_wake(wake_tx).run(shutdown_rx));

    tokio::time::timeout(StdDuration::from_secs(5), wake_rx.recv())
        .await
        .expect("first cycle never ran");
    assert_eq!(stack.len(), 1);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(StdDuration::from_secs(5), handle)
        .await
        .expect("poller ignored shutdown")
        .unwrap();
}
