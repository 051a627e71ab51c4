//! # Catalog Domain Types
//!
//! Records exchanged between the ingestion pipeline, the repository and the
//! listing path.
//!
//! - [`ProductRecord`] - what the CSV feed carries: a name and a price, no
//!   identity.
//! - [`Product`] - a stored record. The `id` is assigned by the repository on
//!   first insert and never changes afterwards; re-ingesting the same `name`
//!   only overwrites `price`.

/// Product name, used as the upsert key.
pub type ProductName = String;

/// Price in the smallest currency unit. Always non-negative once decoded.
pub type Price = i64;

/// Default sort field for product listings.
pub const PRODUCT_DEFAULT_SORT: &str = "name";

/// Sort values a client may request for product listings.
pub const PRODUCT_SORT_SAFE_LIST: [&str; 4] = ["name", "-name", "price", "-price"];

/// A product as persisted by the repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub name: ProductName,
    pub price: Price,
}

/// A product as decoded from the CSV feed, before it has an identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductRecord {
    pub name: ProductName,
    pub price: Price,
}

impl ProductRecord {
    pub fn new(name: impl Into<ProductName>, price: Price) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}
