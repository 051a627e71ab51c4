//! CSV ingestion: fetch a feed, decode it, upsert every record.
//!
//! ## Structure
//!
//! - [`fetcher`] - the [`fetcher::Fetcher`] capability and its HTTP
//!   implementation.
//! - [`decode`] - `;`-delimited feed decoding.
//!
//! The pipeline is strictly sequential and never compensates: a decode
//! failure guarantees zero writes, while an upsert failure may leave some
//! records written.

pub mod decode;
pub mod fetcher;

use crate::server::storage::ProductRepository;
use catalog_core::{Error, Result, types::ProductRecord};
use fetcher::Fetcher;
use reqwest::Url;

/// Parses `raw` as an absolute URL.
///
/// # Errors
///
/// [`Error::InvalidUrl`] when `raw` is relative or malformed.
pub fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::InvalidUrl {
        reason: format!("{raw:?}: {e}"),
    })
}

/// Downloads and decodes the feed at `url` without writing anything.
pub async fn fetch_products(fetcher: &dyn Fetcher, url: &Url) -> Result<Vec<ProductRecord>> {
    let body = fetcher.fetch(url).await?;
    decode::decode_products(&body)
}

/// Runs the whole pipeline against `url` and returns the number of records
/// handed to the repository.
///
/// The URL is checked before any network call, and the full decoded set is
/// passed to [`ProductRepository::update_or_create`] in one call.
pub async fn fetch_and_ingest(
    fetcher: &dyn Fetcher,
    repo: &dyn ProductRepository,
    url: &str,
) -> Result<usize> {
    let url = parse_url(url)?;
    let products = fetch_products(fetcher, &url).await?;

    repo.update_or_create(&products).await?;

    Ok(products.len())
}
