//! Request handling for schedules, without a transport.
//!
//! Each method is what one endpoint does once the transport has decoded
//! the path, query string and body: validate, call the store, return the
//! record or a `StoreError` whose `status_code()` the transport reports.

use tracing::{debug, info};

use crate::config::ListDefaults;
use crate::context::Context;
use crate::error::StoreError;
use crate::filter::{Filters, Page, SortSafelist};
use crate::schedule::{self, NewSchedule, Schedule, ScheduleFilter, SchedulePatch, ScheduleStore};
use crate::validator::Validator;

use super::params::QueryParams;

/// Schedule endpoints over a store `S`.
pub struct ScheduleService<S> {
    store: S,
    defaults: ListDefaults,
    safelist: SortSafelist,
}

impl<S: ScheduleStore> ScheduleService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            defaults: ListDefaults::default(),
            safelist: schedule::sort_safelist(),
        }
    }

    /// Replace the defaults used when a list request omits parameters.
    pub fn with_list_defaults(mut self, defaults: ListDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// List schedules from query parameters `discipline`, `timePeriodFrom`,
    /// `timePeriodTo`, `page`, `page_size` and `sort`.
    pub fn list(&self, ctx: &Context, params: &QueryParams) -> Result<Page<Schedule>, StoreError> {
        let mut v = Validator::new();
        let filter = ScheduleFilter {
            discipline: params.read_string("discipline", ""),
            time_period_from: params.read_int("timePeriodFrom", 0, &mut v),
            time_period_to: params.read_int("timePeriodTo", 0, &mut v),
        };
        let filters = Filters {
            page: params.read_int("page", self.defaults.page, &mut v),
            page_size: params.read_int("page_size", self.defaults.page_size, &mut v),
            sort: params.read_string("sort", &self.defaults.sort),
            sort_safelist: self.safelist.clone(),
        };
        filters.validate(&mut v);
        v.into_result()?;

        let page = filters.page_request()?;
        self.store.list(ctx, &filter, &page)
    }

    pub fn create(&self, ctx: &Context, input: &NewSchedule) -> Result<Schedule, StoreError> {
        let mut v = Validator::new();
        input.validate(&mut v);
        v.into_result()?;

        let schedule = self.store.insert(ctx, input)?;
        info!(id = schedule.id, discipline = %schedule.discipline, "created schedule");
        Ok(schedule)
    }

    pub fn show(&self, ctx: &Context, id: i64) -> Result<Schedule, StoreError> {
        self.store.get(ctx, id)
    }

    /// Apply `patch` to the stored record and write it back.
    ///
    /// When the patch carries `updatedAt` the write is conditional on that
    /// token, so a client editing a stale copy gets `EditConflict` even if
    /// nobody raced this particular request.
    pub fn patch(
        &self,
        ctx: &Context,
        id: i64,
        patch: &SchedulePatch,
    ) -> Result<Schedule, StoreError> {
        let mut schedule = self.store.get(ctx, id)?;
        patch.apply(&mut schedule);
        validate(&schedule)?;
        self.store.update(ctx, &schedule)
    }

    /// Read-modify-write with retries on `EditConflict`.
    ///
    /// Every attempt re-fetches the record and re-applies `mutate` to the
    /// fresh copy. Stops after `max_attempts` (at least one) and returns the
    /// last conflict; any other error returns immediately.
    pub fn update_with_retry<F>(
        &self,
        ctx: &Context,
        id: i64,
        max_attempts: usize,
        mut mutate: F,
    ) -> Result<Schedule, StoreError>
    where
        F: FnMut(&mut Schedule),
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut schedule = self.store.get(ctx, id)?;
            mutate(&mut schedule);
            validate(&schedule)?;

            match self.store.update(ctx, &schedule) {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    debug!(id, attempt, "edit conflict, retrying");
                }
                result => return result,
            }
        }
    }

    /// Delete a schedule. A missing id is `NotFound`.
    pub fn remove(&self, ctx: &Context, id: i64) -> Result<(), StoreError> {
        self.store.get(ctx, id)?;
        // gone between the get and the delete
        if !self.store.delete(ctx, id)? {
            return Err(StoreError::NotFound);
        }
        info!(id, "removed schedule");
        Ok(())
    }
}

fn validate(schedule: &Schedule) -> Result<(), StoreError> {
    let mut v = Validator::new();
    schedule.validate(&mut v);
    v.into_result()
}
