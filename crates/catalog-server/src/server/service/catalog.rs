use crate::server::{
    ingest::{fetch_and_ingest, fetch_products, fetcher::Fetcher},
    storage::ProductRepository,
};
use catalog_core::{
    Result,
    filters::Filters,
    types::{Product, ProductRecord},
};
use reqwest::Url;
use std::sync::Arc;

/// Facade composing the product repository and the feed fetcher. This is the
/// only path from the transport layer to storage or the network.
///
/// Cheap to clone; every clone shares the same backends.
#[derive(Clone)]
pub struct ProductCatalog {
    repo: Arc<dyn ProductRepository>,
    fetcher: Arc<dyn Fetcher>,
}

impl ProductCatalog {
    pub fn new(repo: Arc<dyn ProductRepository>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { repo, fetcher }
    }

    pub async fn get_all(&self, filters: &Filters) -> Result<Vec<Product>> {
        self.repo.get_all(filters).await
    }

    pub async fn get_total_records(&self) -> Result<u64> {
        self.repo.get_total_records().await
    }

    pub async fn update_or_create(&self, products: &[ProductRecord]) -> Result<()> {
        self.repo.update_or_create(products).await
    }

    /// Downloads and decodes the feed at `url`. Nothing is written.
    pub async fn get_csv_products(&self, url: &Url) -> Result<Vec<ProductRecord>> {
        fetch_products(self.fetcher.as_ref(), url).await
    }

    /// Downloads the feed at `url` and upserts every record in it. Returns the
    /// number of records written.
    pub async fn ingest(&self, url: &str) -> Result<usize> {
        fetch_and_ingest(self.fetcher.as_ref(), self.repo.as_ref(), url).await
    }
}
