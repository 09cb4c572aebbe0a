use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier of an agenda item (SQLite rowid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub i64);

impl ItemId {
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// One persisted agenda entry, as handed to the alert engine.
///
/// Read-only to the engine: the only write it ever requests is
/// [`crate::StoreGateway::mark_notified`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub id: ItemId,
    /// `YYYY-MM-DD`, as entered.
    pub date: String,
    /// `HH:MM:SS`, as entered.
    pub time: String,
    pub description: String,
    /// Absolute scheduled instant, Unix seconds.
    pub scheduled_at: i64,
    pub notified: bool,
}

impl ScheduledItem {
    /// The scheduled instant, or `None` when the stored timestamp is out of range.
    pub fn scheduled_instant(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.scheduled_at, 0)
    }
}

/// Closed range of scheduled instants eligible for notification in one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueWindow {
    /// Inclusive lower bound, Unix seconds.
    pub start: i64,
    /// Inclusive upper bound, Unix seconds.
    pub end: i64,
}

impl DueWindow {
    /// `[now + advance - tolerance, now + advance + tolerance]`.
    pub fn around(now: DateTime<Utc>, advance: Duration, tolerance: Duration) -> Self {
        let target = now + advance;
        Self {
            start: (target - tolerance).timestamp(),
            end: (target + tolerance).timestamp(),
        }
    }

    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// True when `next` starts no later than one second after `self` ends,
    /// i.e. no whole-second instant falls between the two windows.
    pub fn is_contiguous_with(&self, next: &DueWindow) -> bool {
        next.start <= self.end + 1
    }
}

/// Listing period for `agenda get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Today,
    /// ISO week, Monday through Sunday.
    Week,
    Month,
}

impl View {
    /// Half-open `[start, end)` span in Unix seconds containing `now`,
    /// computed on local midnights of `now`'s timezone.
    pub fn range<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<(i64, i64)> {
        let today = now.date_naive();
        let (first, next): (NaiveDate, NaiveDate) = match self {
            View::Today => (today, today.succ_opt()?),
            View::Week => {
                let monday =
                    today - Duration::days(today.weekday().num_days_from_monday() as i64);
                (monday, monday + Duration::days(7))
            }
            View::Month => {
                let first = today.with_day(1)?;
                (first, first.checked_add_months(Months::new(1))?)
            }
        };
        let tz = now.timezone();
        let start = tz
            .from_local_datetime(&first.and_hms_opt(0, 0, 0)?)
            .earliest()?;
        let end = tz.from_local_datetime(&next.and_hms_opt(0, 0, 0)?).earliest()?;
        Some((start.timestamp(), end.timestamp()))
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            View::Today => "today",
            View::Week => "week",
            View::Month => "month",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "today" => Ok(View::Today),
            "week" => Ok(View::Week),
            "month" => Ok(View::Month),
            other => Err(format!("unknown period: {other}")),
        }
    }
}
