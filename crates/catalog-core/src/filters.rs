//! Validation and query-window arithmetic for client-supplied paging and sort
//! parameters.
//!
//! A [`Filters`] value is built per request from untrusted input plus a
//! [`SortConfig`] owned by the caller. Construction applies defaults
//! (`page = 0 → 1`, `page_size = 0 → 30`, empty sort → the configured default)
//! and [`Filters::validate`] then reports every rule violation at once.
//!
//! Because zero is defaulted before validation runs, the "must be greater
//! than zero" rules can only fire for negative values.

use core::fmt;
use std::sync::Arc;

/// Page size used when the client sends `0`.
pub const DEFAULT_PAGE_SIZE: i64 = 30;
/// Pages at or beyond this value are rejected.
pub const MAX_PAGE: i64 = 10_000_000;
/// Largest accepted page size.
pub const MAX_PAGE_SIZE: i64 = 100;

const DESCENDING_MARKER: char = '-';

/// Direction of the requested sort.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Caller-side sort policy: the field used when the client sends no sort and
/// the exact values a client may send.
///
/// Entries in the safe list are matched literally, including the optional
/// leading `-`, so `"-price"` must be listed separately from `"price"`.
#[derive(Clone, Debug)]
pub struct SortConfig {
    default_sort: Arc<str>,
    safe_list: Arc<[String]>,
}

impl SortConfig {
    pub fn new<I, S>(default_sort: impl Into<String>, safe_list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let default_sort: String = default_sort.into();
        Self {
            default_sort: default_sort.into(),
            safe_list: safe_list.into_iter().map(Into::into).collect(),
        }
    }

    pub fn default_sort(&self) -> &str {
        &self.default_sort
    }

    pub fn safe_list(&self) -> &[String] {
        &self.safe_list
    }
}

/// Paging and sort parameters for one listing request.
#[derive(Clone, Debug)]
pub struct Filters {
    page: i64,
    page_size: i64,
    sort: String,
    safe_list: Arc<[String]>,
}

impl Filters {
    /// Builds filters from raw client input, applying defaults for zero or
    /// empty values. Nothing is validated here; call [`Filters::validate`].
    pub fn new(page: i64, page_size: i64, sort: impl Into<String>, config: &SortConfig) -> Self {
        let mut sort = sort.into();
        if sort.is_empty() {
            sort = config.default_sort().to_owned();
        }

        Self {
            page: if page == 0 { 1 } else { page },
            page_size: if page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
            sort,
            safe_list: Arc::clone(&config.safe_list),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn sort(&self) -> &str {
        &self.sort
    }

    /// Checks every rule and collects all violations.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] holding one entry per broken rule.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.page < 0 {
            errors.push("page", "must be greater than zero");
        }
        if self.page >= MAX_PAGE {
            errors.push("page", "must be a maximum of 10 million");
        }
        if self.page_size < 0 {
            errors.push("page_size", "must be greater than zero");
        }
        if self.page_size > MAX_PAGE_SIZE {
            errors.push("page_size", "must be a maximum of 100");
        }
        if !self.sort.is_empty() && self.sort_column().is_none() {
            errors.push("sort", "invalid sort value");
        }

        errors.into_result()
    }

    /// The sort field with its direction marker stripped, or `None` when the
    /// requested sort is not on the safe list.
    pub fn sort_column(&self) -> Option<&str> {
        self.safe_list
            .iter()
            .any(|safe| *safe == self.sort)
            .then(|| {
                self.sort
                    .strip_prefix(DESCENDING_MARKER)
                    .unwrap_or(&self.sort)
            })
    }

    pub fn sort_direction(&self) -> SortDirection {
        if self.sort.starts_with(DESCENDING_MARKER) {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    /// Maximum number of records in the window.
    pub fn limit(&self) -> u64 {
        u64::try_from(self.page_size).unwrap_or_default()
    }

    /// Number of records skipped before the window, `(page - 1) * page_size`.
    pub fn offset(&self) -> u64 {
        u64::try_from(self.page.saturating_sub(1))
            .unwrap_or_default()
            .saturating_mul(self.limit())
    }
}

/// A single rejected filter field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: &'static str,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Every violation found while validating one [`Filters`] value.
#[derive(Clone, Debug, Default, PartialEq, Eq, thiserror::Error)]
#[error("invalid filter params")]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: &'static str) {
        self.violations.push(FieldViolation { field, message });
    }

    fn into_result(self) -> Result<(), Self> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// One-line summary listing every violation, e.g.
    /// `invalid filter params: page must be greater than zero; sort invalid
    /// sort value`.
    pub fn describe(&self) -> String {
        let details = self
            .violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        format!("{self}: {details}")
    }
}
