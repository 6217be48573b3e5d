//! Schedule Service - Endpoint logic over a `ScheduleStore`.
//!
//! `ScheduleService<S>` turns decoded request input into store calls:
//! list parameters are read and validated here, bodies are validated
//! before they reach the store, and conflicting updates can be retried
//! with `update_with_retry`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use schedule_store::{Context, QueryParams, ScheduleService, SqliteScheduleStore, StoreConfig};
//!
//! let store = SqliteScheduleStore::open(StoreConfig::in_memory())?;
//! let service = ScheduleService::new(store);
//! let ctx = Context::background();
//!
//! let params: QueryParams = [("discipline", "calculus"), ("sort", "-time_period")]
//!     .into_iter()
//!     .collect();
//! let page = service.list(&ctx, &params)?;
//!
//! let updated = service.update_with_retry(&ctx, 1, 3, |s| s.cabinet = "259".into())?;
//! ```

mod params;
mod schedule_service;

pub use params::{parse_id, QueryParams};
pub use schedule_service::ScheduleService;
