//! ScheduleStore - Abstract CRUD and paginated listing for schedules.

use crate::context::Context;
use crate::error::StoreError;
use crate::filter::{Page, PageRequest};

use super::{NewSchedule, Schedule, ScheduleFilter};

/// Storage for schedules.
///
/// Every call is bounded by the context's deadline narrowed by the store's
/// own query timeout, and fails with `Timeout` or `Cancelled` rather than
/// blocking. Implementations hold no per-caller state and are shared across
/// request threads.
pub trait ScheduleStore: Send + Sync {
    /// Insert a new schedule. The store assigns `id`, `created_at` and
    /// `updated_at` (equal to `created_at`).
    fn insert(&self, ctx: &Context, schedule: &NewSchedule) -> Result<Schedule, StoreError>;

    /// Get a schedule by ID. Ids below 1 are `NotFound` without a lookup.
    fn get(&self, ctx: &Context, id: i64) -> Result<Schedule, StoreError>;

    /// One page of schedules matching `filter`, ordered by the page's sort
    /// column then `id` ascending, plus the total number of matches.
    ///
    /// The page and the total come from the same snapshot.
    fn list(
        &self,
        ctx: &Context,
        filter: &ScheduleFilter,
        page: &PageRequest,
    ) -> Result<Page<Schedule>, StoreError>;

    /// Persist `schedule`'s editable fields if, and only if, the stored row
    /// still carries `schedule.updated_at` as its conflict token.
    ///
    /// Returns the stored record with a fresh, strictly later token, or
    /// `EditConflict` when nothing matched (stale token or deleted row).
    ///
    /// The compare and the write must be a single atomic step. A backend
    /// without an atomic conditional write must run read-then-write inside a
    /// transaction whose isolation rules out a concurrent interleaving.
    fn update(&self, ctx: &Context, schedule: &Schedule) -> Result<Schedule, StoreError>;

    /// Delete a schedule by ID. Returns true if a row was removed.
    ///
    /// Ids below 1 are `NotFound`; a missing id otherwise returns `false`.
    fn delete(&self, ctx: &Context, id: i64) -> Result<bool, StoreError>;
}
