use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use agenda_core::datetime::{combine_datetime, DATE_FORMAT, TIME_FORMAT};
use agenda_core::{DueWindow, ItemId, ScheduledItem, StoreGateway, View};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use rusqlite::{Connection, Row};
use tracing::{debug, info, instrument, warn};

use crate::db::init_db;
use crate::error::{Result, StoreError};

const SELECT_COLUMNS: &str = "SELECT id, date, time, description, datetime, notified FROM agenda_items";

/// Thread-safe handle to the agenda database.
///
/// Wraps a single SQLite connection in a `Mutex`; the CLI and the poller each
/// open their own `AgendaStore` on the same file.
pub struct AgendaStore {
    db: Mutex<Connection>,
}

impl AgendaStore {
    /// Wrap an open connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::new(conn)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an item scheduled at local wall-clock `date` + `time`.
    pub fn add_item(&self, date: NaiveDate, time: NaiveTime, description: &str) -> Result<ScheduledItem> {
        self.add_item_in(&Local, date, time, description)
    }

    /// Like [`add_item`](Self::add_item) with an explicit timezone.
    #[instrument(skip(self, tz, description))]
    pub fn add_item_in<Tz: TimeZone>(
        &self,
        tz: &Tz,
        date: NaiveDate,
        time: NaiveTime,
        description: &str,
    ) -> Result<ScheduledItem> {
        let scheduled = combine_datetime(tz, date, time)
            .map_err(|e| StoreError::InvalidDateTime(e.to_string()))?;
        let date_str = date.format(DATE_FORMAT).to_string();
        let time_str = time.format(TIME_FORMAT).to_string();
        let ts = scheduled.timestamp();

        let db = self.conn();
        db.execute(
            "INSERT INTO agenda_items (date, time, description, datetime)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![date_str, time_str, description, ts],
        )?;
        let id = ItemId(db.last_insert_rowid());
        info!(item_id = %id, scheduled_at = ts, "agenda item added");

        Ok(ScheduledItem {
            id,
            date: date_str,
            time: time_str,
            description: description.to_string(),
            scheduled_at: ts,
            notified: false,
        })
    }

    /// Retrieve a single item, `None` if it does not exist.
    pub fn get(&self, id: ItemId) -> Result<Option<ScheduledItem>> {
        let db = self.conn();
        match db.query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            [id.get()],
            row_to_item,
        ) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// Items scheduled within `view`'s span around `now`, earliest first.
    pub fn items_in<Tz: TimeZone>(&self, view: View, now: &DateTime<Tz>) -> Result<Vec<ScheduledItem>> {
        let (start, end) = view
            .range(now)
            .ok_or_else(|| StoreError::InvalidDateTime(format!("no {view} range around now")))?;
        let db = self.conn();
        let mut stmt = db.prepare(&format!(
            "{SELECT_COLUMNS} WHERE datetime >= ?1 AND datetime < ?2 ORDER BY datetime"
        ))?;
        let items = stmt
            .query_map([start, end], row_to_item)?
            .filter_map(|r| match r {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("skipping unreadable agenda row: {e}");
                    None
                }
            })
            .collect();
        Ok(items)
    }

    /// Not-yet-notified items inside `window` (both ends inclusive), earliest first.
    #[instrument(skip(self), fields(start = window.start, end = window.end))]
    pub fn fetch_due(&self, window: &DueWindow) -> Result<Vec<ScheduledItem>> {
        let db = self.conn();
        let mut stmt = db.prepare_cached(&format!(
            "{SELECT_COLUMNS}
             WHERE notified = 0 AND datetime >= ?1 AND datetime <= ?2
             ORDER BY datetime"
        ))?;
        let items: Vec<ScheduledItem> = stmt
            .query_map([window.start, window.end], row_to_item)?
            .filter_map(|r| match r {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("skipping unreadable agenda row: {e}");
                    None
                }
            })
            .collect();
        debug!(count = items.len(), "due items fetched");
        Ok(items)
    }

    /// Set `notified = 1`. Returns `ItemNotFound` if no row changes.
    pub fn mark_notified(&self, id: ItemId) -> Result<()> {
        let n = self
            .conn()
            .execute("UPDATE agenda_items SET notified = 1 WHERE id = ?1", [id.get()])?;
        if n == 0 {
            return Err(StoreError::ItemNotFound { id: id.get() });
        }
        debug!(item_id = %id, "item marked notified");
        Ok(())
    }
}

impl StoreGateway for AgendaStore {
    fn fetch_due(&self, window: &DueWindow) -> agenda_core::Result<Vec<ScheduledItem>> {
        Ok(AgendaStore::fetch_due(self, window)?)
    }

    fn mark_notified(&self, id: ItemId) -> agenda_core::Result<()> {
        Ok(AgendaStore::mark_notified(self, id)?)
    }
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<ScheduledItem> {
    Ok(ScheduledItem {
        id: ItemId(row.get(0)?),
        date: row.get(1)?,
        time: row.get(2)?,
        description: row.get(3)?,
        scheduled_at: row.get(4)?,
        notified: row.get::<_, i64>(5)? != 0,
    })
}
