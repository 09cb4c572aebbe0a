use rusqlite::Connection;

use crate::error::Result;

/// Initialise the agenda schema in `conn`.
///
/// Creates the `agenda_items` table (idempotent) and an index covering the
/// poller's `notified = 0 AND datetime BETWEEN ? AND ?` query.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS agenda_items (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            date        TEXT    NOT NULL,   -- YYYY-MM-DD
            time        TEXT    NOT NULL,   -- HH:MM:SS
            description TEXT    NOT NULL,
            datetime    INTEGER NOT NULL,   -- Unix seconds
            notified    INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_agenda_items_due
            ON agenda_items (notified, datetime);
        ",
    )?;
    Ok(())
}
