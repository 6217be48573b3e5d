//! SqliteScheduleStore - SQLite-backed schedule store.
//!
//! One connection guarded by a mutex (a `rusqlite::Connection` is not `Sync`).
//! Every call installs a progress handler that interrupts the running
//! statement once the call deadline passes or the caller cancels, so a slow
//! query is aborted instead of blocking its caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::config::{StoreConfig, MAX_TIMEOUT_MS};
use crate::context::{remaining, Context};
use crate::error::StoreError;
use crate::filter::{Page, PageRequest, SortOrder};

use super::{
    from_micros, now_micros, to_micros, NewSchedule, Schedule, ScheduleFilter, ScheduleStore,
};

/// SQLite VM instructions between deadline/cancellation checks.
const PROGRESS_INTERVAL: i32 = 1_000;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS schedule (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL,
    discipline  TEXT    NOT NULL,
    cabinet     TEXT    NOT NULL DEFAULT '',
    time_period INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_schedule_time_period ON schedule (time_period);
";

const INSERT_SQL: &str = "
INSERT INTO schedule (created_at, updated_at, discipline, cabinet, time_period)
VALUES (?1, ?1, ?2, ?3, ?4)
RETURNING id, created_at, updated_at, discipline, cabinet, time_period";

const GET_SQL: &str = "
SELECT id, created_at, updated_at, discipline, cabinet, time_period
FROM schedule
WHERE id = ?1";

// Compare-and-swap: matches only while the stored token is the one the
// caller read. MAX() keeps the new token strictly later than the old one.
const UPDATE_SQL: &str = "
UPDATE schedule
SET discipline = ?1, cabinet = ?2, time_period = ?3,
    updated_at = MAX(?4, updated_at + 1)
WHERE id = ?5 AND updated_at = ?6
RETURNING id, created_at, updated_at, discipline, cabinet, time_period";

const DELETE_SQL: &str = "DELETE FROM schedule WHERE id = ?1";

const FILTER_PREDICATE: &str = "
WHERE (LOWER(discipline) = LOWER(?1) OR ?1 = '')
AND (time_period >= ?2 OR ?2 = 0)
AND (time_period <= ?3 OR ?3 = 0)";

/// Page query for `sort`. The column comes from a resolved `SortOrder`,
/// which only ever holds safelist text; every value is a bound parameter.
fn list_query(sort: SortOrder) -> String {
    format!(
        "SELECT count(*) OVER(), id, created_at, updated_at, discipline, cabinet, time_period
FROM schedule{}
ORDER BY {} {}, id ASC
LIMIT ?4 OFFSET ?5",
        FILTER_PREDICATE,
        sort.column(),
        sort.direction().as_sql()
    )
}

fn count_query() -> String {
    format!("SELECT count(*) FROM schedule{}", FILTER_PREDICATE)
}

/// `timeout` capped to what SQLite's busy handler can hold.
fn sqlite_timeout(timeout: Duration) -> Duration {
    timeout.min(Duration::from_millis(MAX_TIMEOUT_MS))
}

/// Raw column values; timestamps are still microseconds.
struct ScheduleRow {
    id: i64,
    created_at: i64,
    updated_at: i64,
    discipline: String,
    cabinet: String,
    time_period: i64,
}

impl ScheduleRow {
    fn read(row: &Row<'_>, base: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(base)?,
            created_at: row.get(base + 1)?,
            updated_at: row.get(base + 2)?,
            discipline: row.get(base + 3)?,
            cabinet: row.get(base + 4)?,
            time_period: row.get(base + 5)?,
        })
    }

    fn into_schedule(self) -> Result<Schedule, StoreError> {
        Ok(Schedule {
            id: self.id,
            created_at: from_micros(self.created_at)?,
            updated_at: from_micros(self.updated_at)?,
            discipline: self.discipline,
            cabinet: self.cabinet,
            time_period: self.time_period,
        })
    }
}

/// SQLite schedule store. Clone-friendly via Arc.
#[derive(Clone)]
pub struct SqliteScheduleStore {
    conn: Arc<Mutex<Connection>>,
    config: StoreConfig,
}

impl SqliteScheduleStore {
    /// Open (creating if needed) the database named by `config`.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.path)
        }
        .map_err(StoreError::internal)?;

        conn.busy_timeout(sqlite_timeout(config.busy_timeout()))
            .map_err(StoreError::internal)?;
        if !config.is_in_memory() {
            let mode: String = conn
                .pragma_update_and_check(
                    None,
                    "journal_mode",
                    config.journal_mode.pragma_value(),
                    |row| row.get(0),
                )
                .map_err(StoreError::internal)?;
            debug!(journal_mode = %mode, "set journal mode");
        }
        conn.execute_batch(SCHEMA).map_err(StoreError::internal)?;

        info!(path = %config.path.display(), "opened schedule store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    /// Open a private in-memory database with default settings.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(StoreConfig::in_memory())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Run `f` on the connection under the call deadline.
    fn with_conn<T, F>(&self, ctx: &Context, op: &'static str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T>,
    {
        let deadline = ctx.call_deadline(self.config.query_timeout());
        ctx.check(deadline)?;

        let Some(mut conn) = self.conn.try_lock_until(deadline) else {
            warn!(op, "timed out waiting for the store connection");
            return Err(StoreError::Timeout);
        };
        ctx.check(deadline)?;

        // The busy handler does not run the progress handler, so cap it too.
        conn.busy_timeout(sqlite_timeout(remaining(deadline).min(self.config.busy_timeout())))
            .map_err(StoreError::internal)?;
        let token = ctx.cancel_token().clone();
        conn.progress_handler(
            PROGRESS_INTERVAL,
            Some(move || token.is_cancelled() || Instant::now() >= deadline),
        );

        let result = f(&mut *conn);
        conn.progress_handler(0, None::<fn() -> bool>);

        result.map_err(|err| classify(err, ctx, deadline, op))
    }
}

/// Interrupts become `Cancelled` or `Timeout`; everything else is `Internal`.
fn classify(
    err: rusqlite::Error,
    ctx: &Context,
    deadline: Instant,
    op: &'static str,
) -> StoreError {
    let code = match &err {
        rusqlite::Error::SqliteFailure(failure, _) => Some(failure.code),
        _ => None,
    };
    match code {
        Some(ErrorCode::OperationInterrupted) if ctx.is_cancelled() => {
            debug!(op, "store call cancelled");
            StoreError::Cancelled
        }
        Some(ErrorCode::OperationInterrupted) => {
            warn!(op, "store call exceeded its deadline");
            StoreError::Timeout
        }
        Some(ErrorCode::DatabaseBusy) if Instant::now() >= deadline => {
            warn!(op, "database stayed busy past the deadline");
            StoreError::Timeout
        }
        _ => StoreError::internal(err),
    }
}

impl ScheduleStore for SqliteScheduleStore {
    fn insert(&self, ctx: &Context, schedule: &NewSchedule) -> Result<Schedule, StoreError> {
        let now = now_micros();
        let row = self.with_conn(ctx, "insert", |conn| {
            conn.query_row(
                INSERT_SQL,
                params![
                    now,
                    schedule.discipline,
                    schedule.cabinet,
                    schedule.time_period
                ],
                |row| ScheduleRow::read(row, 0),
            )
        })?;
        debug!(id = row.id, "inserted schedule");
        row.into_schedule()
    }

    fn get(&self, ctx: &Context, id: i64) -> Result<Schedule, StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }
        let row = self.with_conn(ctx, "get", |conn| {
            conn.query_row(GET_SQL, params![id], |row| ScheduleRow::read(row, 0))
                .optional()
        })?;
        row.ok_or(StoreError::NotFound)?.into_schedule()
    }

    fn list(
        &self,
        ctx: &Context,
        filter: &ScheduleFilter,
        page: &PageRequest,
    ) -> Result<Page<Schedule>, StoreError> {
        let sort = page.sort();
        let query = list_query(sort);
        let limit = i64::from(page.limit());
        let offset = i64::try_from(page.offset()).map_err(StoreError::internal)?;
        debug!(
            sort = %sort,
            limit,
            offset,
            discipline = %filter.discipline,
            "listing schedules"
        );

        let (rows, total) = self.with_conn(ctx, "list", |conn| {
            let tx = conn.transaction()?;
            let mut total: i64 = 0;
            let mut rows = Vec::new();
            {
                let mut stmt = tx.prepare(&query)?;
                let mut result = stmt.query(params![
                    filter.discipline,
                    filter.time_period_from,
                    filter.time_period_to,
                    limit,
                    offset
                ])?;
                while let Some(row) = result.next()? {
                    total = row.get(0)?;
                    rows.push(ScheduleRow::read(row, 1)?);
                }
            }
            // Past the last page the window count has no row to ride on;
            // count again inside the same read transaction.
            if rows.is_empty() && offset > 0 {
                total = tx.query_row(
                    &count_query(),
                    params![
                        filter.discipline,
                        filter.time_period_from,
                        filter.time_period_to
                    ],
                    |row| row.get(0),
                )?;
            }
            tx.commit()?;
            Ok((rows, total))
        })?;

        let total = u64::try_from(total).map_err(StoreError::internal)?;
        debug!(rows = rows.len(), total, "listed schedules");
        let records = rows
            .into_iter()
            .map(ScheduleRow::into_schedule)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            records,
            metadata: page.metadata(total),
        })
    }

    fn update(&self, ctx: &Context, schedule: &Schedule) -> Result<Schedule, StoreError> {
        let token = to_micros(&schedule.updated_at);
        let now = now_micros();
        let row = self.with_conn(ctx, "update", |conn| {
            conn.query_row(
                UPDATE_SQL,
                params![
                    schedule.discipline,
                    schedule.cabinet,
                    schedule.time_period,
                    now,
                    schedule.id,
                    token
                ],
                |row| ScheduleRow::read(row, 0),
            )
            .optional()
        })?;

        match row {
            Some(row) => {
                debug!(id = row.id, updated_at = row.updated_at, "updated schedule");
                row.into_schedule()
            }
            None => {
                warn!(id = schedule.id, token, "edit conflict on schedule update");
                Err(StoreError::EditConflict)
            }
        }
    }

    fn delete(&self, ctx: &Context, id: i64) -> Result<bool, StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }
        let removed = self.with_conn(ctx, "delete", |conn| conn.execute(DELETE_SQL, params![id]))?;
        debug!(id, removed, "deleted schedule");
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancelToken;
    use crate::filter::{Filters, SortSafelist};
    use std::thread;

    // Never finishes on its own; only an interrupt stops it.
    const ENDLESS_SQL: &str = "
WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c)
SELECT count(*) FROM c";

    fn store_with_timeout(ms: u64) -> SqliteScheduleStore {
        let mut config = StoreConfig::in_memory();
        config.query_timeout_ms = ms;
        SqliteScheduleStore::open(config).unwrap()
    }

    fn page(sort: &str) -> PageRequest {
        Filters {
            page: 1,
            page_size: 10,
            sort: sort.to_string(),
            sort_safelist: SortSafelist::new(["id", "discipline", "time_period"]),
        }
        .page_request()
        .unwrap()
    }

    #[test]
    fn list_query_orders_by_resolved_column_then_id() {
        let query = list_query(page("-time_period").sort());
        assert!(query.contains("ORDER BY time_period DESC, id ASC"));
        assert!(query.contains("count(*) OVER()"));
        assert!(query.contains("LIMIT ?4 OFFSET ?5"));
    }

    #[test]
    fn ids_below_one_skip_the_query() {
        let store = store_with_timeout(1_000);
        let ctx = Context::background();
        ctx.cancel_token().cancel();

        // A cancelled context would fail any real query, so NotFound proves
        // no round-trip happened.
        assert!(matches!(store.get(&ctx, 0), Err(StoreError::NotFound)));
        assert!(matches!(store.delete(&ctx, -4), Err(StoreError::NotFound)));
    }

    #[test]
    fn slow_statement_times_out() {
        let store = store_with_timeout(50);
        let started = Instant::now();
        let result = store.with_conn(&Context::background(), "endless", |conn| {
            conn.query_row(ENDLESS_SQL, [], |row| row.get::<_, i64>(0))
        });

        assert!(matches!(result, Err(StoreError::Timeout)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn caller_deadline_is_honoured() {
        let store = store_with_timeout(60_000);
        let ctx = Context::background().with_timeout(Duration::from_millis(50));
        let result = store.with_conn(&ctx, "endless", |conn| {
            conn.query_row(ENDLESS_SQL, [], |row| row.get::<_, i64>(0))
        });
        assert!(matches!(result, Err(StoreError::Timeout)));
    }

    #[test]
    fn cancellation_interrupts_running_statement() {
        let store = store_with_timeout(60_000);
        let token = CancelToken::new();
        let ctx = Context::background().with_cancel(token.clone());

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            token.cancel();
        });
        let result = store.with_conn(&ctx, "endless", |conn| {
            conn.query_row(ENDLESS_SQL, [], |row| row.get::<_, i64>(0))
        });
        canceller.join().unwrap();

        assert!(matches!(result, Err(StoreError::Cancelled)));
    }

    #[test]
    fn connection_is_usable_after_interrupt() {
        let store = store_with_timeout(50);
        let ctx = Context::background();
        let _ = store.with_conn(&ctx, "endless", |conn| {
            conn.query_row(ENDLESS_SQL, [], |row| row.get::<_, i64>(0))
        });

        let inserted = store.insert(&ctx, &NewSchedule::new("OOP", "269", 4)).unwrap();
        assert_eq!(store.get(&ctx, inserted.id).unwrap(), inserted);
    }

    #[test]
    fn page_past_the_end_keeps_total() {
        let store = store_with_timeout(1_000);
        let ctx = Context::background();
        for i in 0..3 {
            store
                .insert(&ctx, &NewSchedule::new(format!("D{}", i), "1", 3))
                .unwrap();
        }

        let far = Filters {
            page: 50,
            page_size: 10,
            sort: "id".into(),
            sort_safelist: SortSafelist::new(["id"]),
        }
        .page_request()
        .unwrap();
        let result = store.list(&ctx, &ScheduleFilter::default(), &far).unwrap();

        assert!(result.records.is_empty());
        assert_eq!(result.metadata.total_records, 3);
        assert_eq!(result.metadata.last_page, 1);
    }

    #[test]
    fn oversized_timeouts_do_not_panic() {
        let mut config = StoreConfig::in_memory();
        config.busy_timeout_ms = 3_000_000_000;
        config.query_timeout_ms = 4_000_000_000;
        let store = SqliteScheduleStore::open(config).unwrap();

        let ctx = Context::background();
        let inserted = store.insert(&ctx, &NewSchedule::new("Spring", "444", 3)).unwrap();
        assert_eq!(store.get(&ctx, inserted.id).unwrap(), inserted);
    }

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("schedule.db");
        let ctx = Context::background();

        let id = {
            let store = SqliteScheduleStore::open(StoreConfig::at_path(&path)).unwrap();
            store
                .insert(&ctx, &NewSchedule::new("Databases", "428", 3))
                .unwrap()
                .id
        };

        let store = SqliteScheduleStore::open(StoreConfig::at_path(&path)).unwrap();
        assert_eq!(store.get(&ctx, id).unwrap().discipline, "Databases");
    }
}
