//! Filters - Page, page size and sort key requested by a caller.
//!
//! `Filters` is built fresh from untrusted input on every list request.
//! Validation is the injection boundary: `Filters::page_request` is the only
//! way to obtain a `PageRequest`, and a `PageRequest` only ever carries a sort
//! column taken from the endpoint's `SortSafelist`. Stores interpolate that
//! column into query text without further checks.
//!
//! ## Example
//!
//! ```ignore
//! let filters = Filters {
//!     page: 2,
//!     page_size: 20,
//!     sort: "-time_period".into(),
//!     sort_safelist: SortSafelist::new(["id", "discipline", "time_period"]),
//! };
//! let page = filters.page_request()?;
//! assert_eq!(page.offset(), 20);
//! ```

mod metadata;
mod sort;

use serde::Serialize;

use crate::error::StoreError;
use crate::validator::{permitted_value, Validator};

pub use metadata::Metadata;
pub use sort::{SortDirection, SortOrder, SortSafelist, DESCENDING_MARKER};

/// Highest page number accepted; keeps offset arithmetic sane.
pub const MAX_PAGE: i64 = 10_000_000;
/// Largest page size accepted.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw pagination and sort parameters for one list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    pub sort_safelist: SortSafelist,
}

impl Filters {
    /// Record every rule violation in `v`; each rule reports independently.
    pub fn validate(&self, v: &mut Validator) {
        v.check(self.page > 0, "page", "must be greater than zero");
        v.check(self.page <= MAX_PAGE, "page", "must be a maximum of 10 million");
        v.check(self.page_size > 0, "page_size", "must be greater than zero");
        v.check(
            self.page_size <= MAX_PAGE_SIZE,
            "page_size",
            "must be a maximum of 100",
        );
        let sort_key = self
            .sort
            .strip_prefix(DESCENDING_MARKER)
            .unwrap_or(&self.sort);
        v.check(
            permitted_value(&sort_key, self.sort_safelist.columns()),
            "sort",
            "invalid sort value",
        );
    }

    /// Validate and resolve into a `PageRequest`.
    pub fn page_request(&self) -> Result<PageRequest, StoreError> {
        let mut v = Validator::new();
        self.validate(&mut v);
        v.into_result()?;

        let sort = self
            .sort_safelist
            .resolve(&self.sort)
            .ok_or_else(|| StoreError::internal("sort key passed validation but did not resolve"))?;
        let page = u32::try_from(self.page).map_err(StoreError::internal)?;
        let page_size = u32::try_from(self.page_size).map_err(StoreError::internal)?;

        Ok(PageRequest {
            page,
            page_size,
            sort,
        })
    }
}

/// A validated page window and sort order, consumed read-only by stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
    sort: SortOrder,
}

impl PageRequest {
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    /// Metadata for this request given the total number of matches.
    pub fn metadata(&self, total_records: u64) -> Metadata {
        Metadata::calculate(total_records, self.page, self.page_size)
    }
}

/// One page of records plus the metadata describing the whole result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub metadata: Metadata,
}
