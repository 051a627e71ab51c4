//! Page metadata attached to every successful listing response.

/// Position of a page within the full result set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

impl Pagination {
    /// Computes metadata for `page` of size `page_size` over `total_records`.
    ///
    /// Returns `None` for an empty catalog, and for a non-positive page size
    /// (which validated filters never carry). `last_page` is the ceiling of
    /// the real-valued quotient, so a partial final page still counts.
    pub fn new(total_records: u64, page: i64, page_size: i64) -> Option<Self> {
        if total_records == 0 || page_size <= 0 {
            return None;
        }

        let total_records = i64::try_from(total_records).unwrap_or(i64::MAX);
        let last_page = (total_records as f64 / page_size as f64).ceil() as i64;

        Some(Self {
            current_page: page,
            page_size,
            first_page: 1,
            last_page,
            total_records,
        })
    }
}
