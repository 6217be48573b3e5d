//! Schedules - The persisted record type and its stores.
//!
//! A `Schedule` is one class slot: a discipline taught in a cabinet for a
//! number of time periods. The store assigns `id`, `created_at` and
//! `updated_at`; `updated_at` doubles as the conflict token for optimistic
//! concurrency.
//!
//! ## Example
//!
//! ```ignore
//! use schedule_store::{Context, NewSchedule, ScheduleStore, SqliteScheduleStore, StoreConfig};
//!
//! let store = SqliteScheduleStore::open(StoreConfig::in_memory())?;
//! let ctx = Context::background();
//!
//! let mut schedule = store.insert(&ctx, &NewSchedule::new("Calculus", "256", 3))?;
//! schedule.cabinet = "259".into();
//! let schedule = store.update(&ctx, &schedule)?; // fresh updated_at
//! ```

mod in_memory;
pub mod seed;
mod sqlite;
mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::filter::SortSafelist;
use crate::validator::Validator;

pub use in_memory::InMemoryScheduleStore;
pub use sqlite::SqliteScheduleStore;
pub use store::ScheduleStore;

/// Store-assigned instant, persisted as microseconds since the Unix epoch.
pub type Timestamp = DateTime<Utc>;

/// Columns a list request may sort schedules by.
pub const SORT_COLUMNS: [&str; 3] = ["id", "discipline", "time_period"];

/// Upper bound for `time_period`.
pub const MAX_TIME_PERIOD: i64 = 6;

/// Safelist for the schedule list endpoint.
pub fn sort_safelist() -> SortSafelist {
    SortSafelist::new(SORT_COLUMNS)
}

/// A persisted schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: i64,
    pub created_at: Timestamp,
    /// Conflict token: pass it back unchanged on the next update.
    pub updated_at: Timestamp,
    pub discipline: String,
    pub cabinet: String,
    pub time_period: i64,
}

impl Schedule {
    pub fn validate(&self, v: &mut Validator) {
        validate_fields(v, &self.discipline, &self.cabinet, self.time_period);
    }
}

/// The user-editable fields of a schedule, as supplied on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewSchedule {
    pub discipline: String,
    #[serde(default)]
    pub cabinet: String,
    pub time_period: i64,
}

impl NewSchedule {
    pub fn new(discipline: impl Into<String>, cabinet: impl Into<String>, time_period: i64) -> Self {
        Self {
            discipline: discipline.into(),
            cabinet: cabinet.into(),
            time_period,
        }
    }

    /// Strict JSON decode; unknown fields are rejected.
    pub fn from_json(body: &[u8]) -> Result<Self, StoreError> {
        decode_body(body)
    }

    pub fn validate(&self, v: &mut Validator) {
        validate_fields(v, &self.discipline, &self.cabinet, self.time_period);
    }
}

/// A partial update. Absent fields keep their stored value.
///
/// `updated_at`, when present, is the conflict token the client last saw and
/// takes precedence over the token of the freshly fetched record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SchedulePatch {
    #[serde(default)]
    pub discipline: Option<String>,
    #[serde(default)]
    pub cabinet: Option<String>,
    #[serde(default)]
    pub time_period: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl SchedulePatch {
    pub fn from_json(body: &[u8]) -> Result<Self, StoreError> {
        decode_body(body)
    }

    pub fn is_empty(&self) -> bool {
        self.discipline.is_none() && self.cabinet.is_none() && self.time_period.is_none()
    }

    /// Copy every provided field (and token) onto `schedule`.
    pub fn apply(&self, schedule: &mut Schedule) {
        if let Some(discipline) = &self.discipline {
            schedule.discipline = discipline.clone();
        }
        if let Some(cabinet) = &self.cabinet {
            schedule.cabinet = cabinet.clone();
        }
        if let Some(time_period) = self.time_period {
            schedule.time_period = time_period;
        }
        if let Some(updated_at) = self.updated_at {
            schedule.updated_at = updated_at;
        }
    }
}

/// Row filter for list requests.
///
/// A zero bound means "no bound", so a caller cannot ask for
/// `time_period == 0` explicitly. Zero is outside the valid range anyway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleFilter {
    /// Case-insensitive full-value match; empty matches everything.
    pub discipline: String,
    pub time_period_from: i64,
    pub time_period_to: i64,
}

impl ScheduleFilter {
    /// Same semantics as the SQL predicate: ASCII case folding, zero = unbounded.
    pub fn matches(&self, schedule: &Schedule) -> bool {
        (self.discipline.is_empty() || schedule.discipline.eq_ignore_ascii_case(&self.discipline))
            && (self.time_period_from == 0 || schedule.time_period >= self.time_period_from)
            && (self.time_period_to == 0 || schedule.time_period <= self.time_period_to)
    }
}

fn validate_fields(v: &mut Validator, discipline: &str, cabinet: &str, time_period: i64) {
    v.check(!discipline.is_empty(), "discipline", "must be provided");
    v.check(
        discipline.len() <= 100,
        "discipline",
        "must not be more than 100 bytes long",
    );
    v.check(
        cabinet.len() <= 1000,
        "cabinet",
        "must not be more than 1000 bytes long",
    );
    v.check(time_period > 0, "timePeriod", "must be greater than zero");
    v.check(
        time_period <= MAX_TIME_PERIOD,
        "timePeriod",
        "must not be more than 6",
    );
}

fn decode_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(body).map_err(|e| StoreError::invalid_field("body", &e.to_string()))
}

// ============================================================================
// Conflict token helpers
// ============================================================================

pub(crate) fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

pub(crate) fn to_micros(ts: &Timestamp) -> i64 {
    ts.timestamp_micros()
}

pub(crate) fn from_micros(micros: i64) -> Result<Timestamp, StoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::Internal(format!("timestamp out of range: {}", micros)))
}

/// Token assigned by an update: strictly later than `previous`.
pub(crate) fn next_token(previous: i64, now: i64) -> i64 {
    now.max(previous.saturating_add(1))
}
