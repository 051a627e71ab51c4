//! Product persistence.
//!
//! The listing path and the ingestion pipeline only talk to storage through
//! [`ProductRepository`]. Two backends are provided:
//!
//! - [`memory::MemoryProductStore`] - process-local, used when no database is
//!   configured and throughout the tests.
//! - [`sqlite::SqliteProductStore`] - SQLite through `sqlx` (feature
//!   `sqlite`, on by default).
//!
//! No backend offers snapshot isolation between [`ProductRepository::get_all`]
//! and [`ProductRepository::get_total_records`]; a concurrent upsert between
//! the two calls may leave a page's metadata slightly stale.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use catalog_core::{
    Result,
    filters::Filters,
    types::{Product, ProductRecord},
};
use std::sync::Arc;

/// Name-keyed product store.
#[tonic::async_trait]
pub trait ProductRepository: Send + Sync + 'static {
    /// Returns the window `[offset, offset + limit)` of products ordered by
    /// the filters' sort column and direction. Ties, and an unknown or empty
    /// sort column, fall back to ordering by name.
    async fn get_all(&self, filters: &Filters) -> Result<Vec<Product>>;

    /// Total number of stored products, regardless of any filter.
    async fn get_total_records(&self) -> Result<u64>;

    /// Inserts each record whose name is new and updates the price of each
    /// record whose name already exists.
    ///
    /// Records are applied independently: one failing record does not stop
    /// the others, and nothing is rolled back. A single aggregate
    /// [`catalog_core::Error::Storage`] is returned if any record failed.
    async fn update_or_create(&self, products: &[ProductRecord]) -> Result<()>;
}

/// Column a backend orders by, resolved from a validated sort column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SortField {
    Name,
    Price,
}

impl SortField {
    pub(crate) fn from_filters(filters: &Filters) -> Self {
        match filters.sort_column() {
            Some("price") => Self::Price,
            _ => Self::Name,
        }
    }
}

/// Fresh opaque identifier for a newly inserted product.
pub(crate) fn new_product_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Opens the configured backend: SQLite when `database_url` is set, the
/// in-memory store otherwise.
#[cfg_attr(not(feature = "sqlite"), allow(unused_variables))]
pub async fn open(
    database_url: Option<&str>,
    max_connections: u32,
) -> Result<Arc<dyn ProductRepository>> {
    match database_url {
        #[cfg(feature = "sqlite")]
        Some(url) => Ok(Arc::new(
            sqlite::SqliteProductStore::connect(url, max_connections).await?,
        )),
        #[cfg(not(feature = "sqlite"))]
        Some(_) => Err(catalog_core::Error::storage(
            "database support was not compiled in (feature `sqlite`)",
        )),
        None => Ok(Arc::new(memory::MemoryProductStore::new())),
    }
}
