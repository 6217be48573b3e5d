mod config;
mod context;
mod error;
mod filter;
mod schedule;
mod service;
mod validator;

pub use config::{
    JournalMode, ListDefaults, StoreConfig, CONFIG_FILE_NAME, IN_MEMORY_PATH, MAX_TIMEOUT_MS,
};
pub use context::{CancelToken, Context};
pub use error::StoreError;
pub use filter::{
    Filters, Metadata, Page, PageRequest, SortDirection, SortOrder, SortSafelist,
    DESCENDING_MARKER, MAX_PAGE, MAX_PAGE_SIZE,
};
pub use schedule::{
    seed, sort_safelist, InMemoryScheduleStore, NewSchedule, Schedule, ScheduleFilter,
    SchedulePatch, ScheduleStore, SqliteScheduleStore, Timestamp, MAX_TIME_PERIOD, SORT_COLUMNS,
};
pub use service::{parse_id, QueryParams, ScheduleService};
pub use validator::{permitted_value, ValidationErrors, Validator};
