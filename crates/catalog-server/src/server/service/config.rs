use catalog_core::{
    filters::SortConfig,
    types::{PRODUCT_DEFAULT_SORT, PRODUCT_SORT_SAFE_LIST},
};

/// Sort policy applied to every product listing: name order by default, and
/// ascending or descending by `name` or `price` on request.
pub fn product_sort_config() -> SortConfig {
    SortConfig::new(PRODUCT_DEFAULT_SORT, PRODUCT_SORT_SAFE_LIST)
}
