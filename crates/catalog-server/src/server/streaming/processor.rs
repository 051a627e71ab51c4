use crate::server::{
    service::catalog::ProductCatalog,
    telemetry::{increment_filter_validation_failures, record_results_per_page},
};
use catalog_core::{
    filters::{Filters, SortConfig},
    pagination::Pagination,
    proto::{self, ListResponse},
};

/// Answers one inbound `Filters` message.
///
/// Invalid filters never reach storage; they produce a response whose `error`
/// field lists every violation, and the caller keeps the stream open. Valid
/// filters run the windowed query and the total count (two independent calls)
/// and produce a page with its metadata.
///
/// # Errors
///
/// Only storage failures are returned as `Err`; they end the stream.
pub async fn process_filters(
    catalog: &ProductCatalog,
    sort: &SortConfig,
    request: proto::Filters,
) -> catalog_core::Result<ListResponse> {
    let filters = Filters::new(request.page, request.page_size, request.sort, sort);

    if let Err(errors) = filters.validate() {
        increment_filter_validation_failures();
        #[cfg(feature = "tracing")]
        tracing::debug!("Rejected filters: {}", errors.describe());
        return Ok(ListResponse::rejected(&errors));
    }

    let products = catalog.get_all(&filters).await?;
    let total_records = catalog.get_total_records().await?;

    record_results_per_page(products.len() as f64);

    let metadata = Pagination::new(total_records, filters.page(), filters.page_size());
    Ok(ListResponse::page(products, metadata))
}
