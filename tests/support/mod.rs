//! Shared fixtures for integration tests.
#![allow(dead_code)]

use schedule_store::{
    Filters, NewSchedule, PageRequest, ScheduleStore, SqliteScheduleStore, StoreConfig,
};
use tempfile::TempDir;

/// A fresh SQLite store in a temp directory. Keep the `TempDir` alive for
/// as long as the store is used.
pub fn temp_store() -> (TempDir, SqliteScheduleStore) {
    let dir = TempDir::new().expect("temp dir");
    let store = SqliteScheduleStore::open(StoreConfig::at_path(dir.path().join("schedule.db")))
        .expect("open store");
    (dir, store)
}

pub fn memory_store() -> SqliteScheduleStore {
    SqliteScheduleStore::open(StoreConfig::in_memory()).expect("open store")
}

/// Validated page request against the schedule safelist.
pub fn page(number: i64, size: i64, sort: &str) -> PageRequest {
    Filters {
        page: number,
        page_size: size,
        sort: sort.to_string(),
        sort_safelist: schedule_store::sort_safelist(),
    }
    .page_request()
    .expect("valid page request")
}

pub fn insert_all<S: ScheduleStore>(store: &S, rows: &[(&str, i64)]) {
    let ctx = schedule_store::Context::background();
    for (discipline, time_period) in rows {
        store
            .insert(&ctx, &NewSchedule::new(*discipline, "100", *time_period))
            .expect("insert");
    }
}
