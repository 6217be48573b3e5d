//! Sort keys: the per-endpoint safelist and the resolved column/direction.

use std::fmt;

/// Marker prefix requesting descending order (`"-time_period"`).
pub const DESCENDING_MARKER: char = '-';

/// The exhaustive set of columns a caller may sort by on one endpoint.
///
/// Entries are `&'static str` so a resolved `SortOrder` always points at the
/// safelist's own text, never at the caller's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSafelist {
    columns: Vec<&'static str>,
}

impl SortSafelist {
    pub fn new(columns: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    /// Resolve a requested key (with an optional leading `-`) against the
    /// safelist. Returns `None` unless the stripped key is an exact member.
    pub fn resolve(&self, key: &str) -> Option<SortOrder> {
        let (name, direction) = match key.strip_prefix(DESCENDING_MARKER) {
            Some(rest) => (rest, SortDirection::Desc),
            None => (key, SortDirection::Asc),
        };
        self.columns
            .iter()
            .copied()
            .find(|column| *column == name)
            .map(|column| SortOrder {
                column,
                direction,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A safelisted column plus direction. Only produced by `SortSafelist::resolve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    column: &'static str,
    direction: SortDirection,
}

impl SortOrder {
    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.direction.as_sql())
    }
}
