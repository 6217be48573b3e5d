//! Pagination metadata derived from a total-row count.

use serde::Serialize;

/// Pagination summary returned next to every page of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub current_page: u32,
    pub page_size: u32,
    pub last_page: u64,
    pub total_records: u64,
}

impl Metadata {
    /// `last_page` is 0 for an empty result, otherwise `ceil(total / page_size)`.
    ///
    /// `page_size` is validated to be at least 1 before it reaches here; a
    /// zero is treated as 1 rather than dividing by zero.
    pub fn calculate(total_records: u64, page: u32, page_size: u32) -> Self {
        let last_page = if total_records == 0 {
            0
        } else {
            total_records.div_ceil(u64::from(page_size.max(1)))
        };
        Self {
            current_page: page,
            page_size,
            last_page,
            total_records,
        }
    }
}
