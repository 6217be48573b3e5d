//! InMemoryScheduleStore - BTreeMap-backed schedule store for testing and development.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::StoreError;
use crate::filter::{Page, PageRequest, SortDirection, SortOrder};

use super::{
    from_micros, next_token, now_micros, to_micros, NewSchedule, Schedule, ScheduleFilter,
    ScheduleStore,
};

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Rows keyed by id, plus the id sequence.
struct Table {
    rows: BTreeMap<i64, Schedule>,
    next_id: i64,
}

/// In-memory schedule store.
///
/// Same observable semantics as the SQLite store: ids never reused, tokens
/// strictly increasing per row, list ordering with an `id` tie-break.
/// Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryScheduleStore {
    storage: Arc<RwLock<Table>>,
    query_timeout: Duration,
}

impl Default for InMemoryScheduleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryScheduleStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(Table {
                rows: BTreeMap::new(),
                next_id: 1,
            })),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Bound every call (including lock waits) by `timeout`.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    fn read<T>(
        &self,
        ctx: &Context,
        f: impl FnOnce(&Table) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let deadline = ctx.call_deadline(self.query_timeout);
        ctx.check(deadline)?;
        let table = self
            .storage
            .try_read_until(deadline)
            .ok_or(StoreError::Timeout)?;
        ctx.check(deadline)?;
        f(&table)
    }

    fn write<T>(
        &self,
        ctx: &Context,
        f: impl FnOnce(&mut Table) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let deadline = ctx.call_deadline(self.query_timeout);
        ctx.check(deadline)?;
        let mut table = self
            .storage
            .try_write_until(deadline)
            .ok_or(StoreError::Timeout)?;
        ctx.check(deadline)?;
        f(&mut table)
    }
}

type Comparator = fn(&Schedule, &Schedule) -> Ordering;

/// Field ordering for a schedule column, as SQLite orders it.
fn column_ordering(column: &str) -> Result<Comparator, StoreError> {
    let ordering: Comparator = match column {
        "id" => |a, b| a.id.cmp(&b.id),
        "created_at" => |a, b| a.created_at.cmp(&b.created_at),
        "updated_at" => |a, b| a.updated_at.cmp(&b.updated_at),
        "discipline" => |a, b| a.discipline.cmp(&b.discipline),
        "cabinet" => |a, b| a.cabinet.cmp(&b.cabinet),
        "time_period" => |a, b| a.time_period.cmp(&b.time_period),
        other => {
            return Err(StoreError::Internal(format!(
                "no such column: {}",
                other
            )))
        }
    };
    Ok(ordering)
}

/// Sort `rows` by `sort`, ties broken by ascending id.
fn sort_rows(rows: &mut [&Schedule], sort: SortOrder) -> Result<(), StoreError> {
    let ordering = column_ordering(sort.column())?;
    rows.sort_by(|a, b| {
        let primary = match sort.direction() {
            SortDirection::Asc => ordering(a, b),
            SortDirection::Desc => ordering(b, a),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    });
    Ok(())
}

impl ScheduleStore for InMemoryScheduleStore {
    fn insert(&self, ctx: &Context, schedule: &NewSchedule) -> Result<Schedule, StoreError> {
        let now = from_micros(now_micros())?;
        self.write(ctx, |table| {
            let id = table.next_id;
            table.next_id += 1;
            let stored = Schedule {
                id,
                created_at: now,
                updated_at: now,
                discipline: schedule.discipline.clone(),
                cabinet: schedule.cabinet.clone(),
                time_period: schedule.time_period,
            };
            table.rows.insert(id, stored.clone());
            debug!(id, "inserted schedule");
            Ok(stored)
        })
    }

    fn get(&self, ctx: &Context, id: i64) -> Result<Schedule, StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }
        self.read(ctx, |table| table.rows.get(&id).cloned().ok_or(StoreError::NotFound))
    }

    fn list(
        &self,
        ctx: &Context,
        filter: &ScheduleFilter,
        page: &PageRequest,
    ) -> Result<Page<Schedule>, StoreError> {
        let sort = page.sort();
        let offset = usize::try_from(page.offset()).map_err(StoreError::internal)?;
        let limit = page.limit() as usize;

        let (records, total) = self.read(ctx, |table| {
            let mut matched: Vec<&Schedule> =
                table.rows.values().filter(|s| filter.matches(s)).collect();
            sort_rows(&mut matched, sort)?;

            let total = matched.len() as u64;
            let records = matched
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect::<Vec<_>>();
            Ok((records, total))
        })?;

        debug!(sort = %sort, rows = records.len(), total, "listed schedules");
        Ok(Page {
            records,
            metadata: page.metadata(total),
        })
    }

    fn update(&self, ctx: &Context, schedule: &Schedule) -> Result<Schedule, StoreError> {
        let token = to_micros(&schedule.updated_at);
        let now = now_micros();
        self.write(ctx, |table| {
            let Some(stored) = table.rows.get_mut(&schedule.id) else {
                warn!(id = schedule.id, token, "edit conflict on schedule update");
                return Err(StoreError::EditConflict);
            };
            if to_micros(&stored.updated_at) != token {
                warn!(id = schedule.id, token, "edit conflict on schedule update");
                return Err(StoreError::EditConflict);
            }

            let updated_at = from_micros(next_token(token, now))?;
            stored.discipline = schedule.discipline.clone();
            stored.cabinet = schedule.cabinet.clone();
            stored.time_period = schedule.time_period;
            stored.updated_at = updated_at;
            debug!(id = stored.id, "updated schedule");
            Ok(stored.clone())
        })
    }

    fn delete(&self, ctx: &Context, id: i64) -> Result<bool, StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }
        self.write(ctx, |table| {
            let removed = table.rows.remove(&id).is_some();
            debug!(id, removed, "deleted schedule");
            Ok(removed)
        })
    }
}
