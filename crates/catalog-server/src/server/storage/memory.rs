use super::{ProductRepository, SortField, new_product_id};
use catalog_core::{
    Result,
    filters::{Filters, SortDirection},
    types::{Product, ProductRecord},
};
use core::cmp::Ordering;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-process product store keyed by name.
///
/// Reads clone the matching window out under a shared lock; upserts take the
/// write lock once per call. Upserts never fail.
#[derive(Default)]
pub struct MemoryProductStore {
    products: RwLock<HashMap<String, Product>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare(a: &Product, b: &Product, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::Price => a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)),
    }
}

#[tonic::async_trait]
impl ProductRepository for MemoryProductStore {
    async fn get_all(&self, filters: &Filters) -> Result<Vec<Product>> {
        let field = SortField::from_filters(filters);
        let direction = filters.sort_direction();

        let mut products: Vec<Product> = self.products.read().values().cloned().collect();
        products.sort_unstable_by(|a, b| {
            let ord = compare(a, b, field);
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });

        let offset = usize::try_from(filters.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(filters.limit()).unwrap_or(usize::MAX);

        Ok(products.into_iter().skip(offset).take(limit).collect())
    }

    async fn get_total_records(&self) -> Result<u64> {
        Ok(self.products.read().len() as u64)
    }

    async fn update_or_create(&self, products: &[ProductRecord]) -> Result<()> {
        let mut stored = self.products.write();
        for record in products {
            stored
                .entry(record.name.clone())
                .and_modify(|p| p.price = record.price)
                .or_insert_with(|| Product {
                    id: new_product_id(),
                    name: record.name.clone(),
                    price: record.price,
                });
        }
        Ok(())
    }
}
