use super::{ProductRepository, SortField, new_product_id};
use catalog_core::{
    Error, Result,
    filters::{Filters, SortDirection},
    types::{Product, ProductRecord},
};
use core::str::FromStr;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

const CREATE_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS products (
    id    TEXT PRIMARY KEY NOT NULL,
    name  TEXT NOT NULL UNIQUE,
    price INTEGER NOT NULL
)";

const UPSERT: &str = "INSERT INTO products (id, name, price) VALUES (?, ?, ?)
    ON CONFLICT(name) DO UPDATE SET price = excluded.price";

/// Product store backed by a SQLite database through `sqlx`.
#[derive(Clone)]
pub struct SqliteProductStore {
    pool: SqlitePool,
}

impl SqliteProductStore {
    /// Opens (creating if missing) the database at `url` and ensures the
    /// `products` table exists.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(Error::storage)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(Error::storage)?;

        sqlx::query(CREATE_SCHEMA)
            .execute(&pool)
            .await
            .map_err(Error::storage)?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn order_clause(field: SortField, direction: SortDirection) -> &'static str {
    match (field, direction) {
        (SortField::Name, SortDirection::Ascending) => "name ASC",
        (SortField::Name, SortDirection::Descending) => "name DESC",
        (SortField::Price, SortDirection::Ascending) => "price ASC, name ASC",
        (SortField::Price, SortDirection::Descending) => "price DESC, name DESC",
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[tonic::async_trait]
impl ProductRepository for SqliteProductStore {
    async fn get_all(&self, filters: &Filters) -> Result<Vec<Product>> {
        let order = order_clause(SortField::from_filters(filters), filters.sort_direction());
        let sql = format!("SELECT id, name, price FROM products ORDER BY {order} LIMIT ? OFFSET ?");

        let rows: Vec<(String, String, i64)> = sqlx::query_as(&sql)
            .bind(to_sql_int(filters.limit()))
            .bind(to_sql_int(filters.offset()))
            .fetch_all(&self.pool)
            .await
            .map_err(Error::storage)?;

        Ok(rows
            .into_iter()
            .map(|(id, name, price)| Product { id, name, price })
            .collect())
    }

    async fn get_total_records(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::storage)?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn update_or_create(&self, products: &[ProductRecord]) -> Result<()> {
        let mut failed = 0usize;
        let mut first_error = None;

        for record in products {
            let result = sqlx::query(UPSERT)
                .bind(new_product_id())
                .bind(&record.name)
                .bind(record.price)
                .execute(&self.pool)
                .await;

            if let Err(e) = result {
                failed += 1;
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            None => Ok(()),
            Some(e) => Err(Error::storage(format!(
                "{failed} of {} upserts failed: {e}",
                products.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{
        filters::SortConfig,
        types::{PRODUCT_DEFAULT_SORT, PRODUCT_SORT_SAFE_LIST},
    };

    async fn store() -> SqliteProductStore {
        // Every in-memory connection is its own database, so pin the pool to one.
        SqliteProductStore::connect("sqlite::memory:", 1).await.unwrap()
    }

    fn filters(page: i64, page_size: i64, sort: &str) -> Filters {
        let config = SortConfig::new(PRODUCT_DEFAULT_SORT, PRODUCT_SORT_SAFE_LIST);
        Filters::new(page, page_size, sort, &config)
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn upsert_then_list() {
        let store = store().await;
        store
            .update_or_create(&[
                ProductRecord::new("Widget", 1000),
                ProductRecord::new("Anvil", 2500),
                ProductRecord::new("Gizmo", 1000),
            ])
            .await
            .unwrap();

        assert_eq!(store.get_total_records().await.unwrap(), 3);

        let page = store.get_all(&filters(1, 30, "")).await.unwrap();
        assert_eq!(names(&page), ["Anvil", "Gizmo", "Widget"]);
        assert!(page.iter().all(|p| !p.id.is_empty()));
    }

    #[tokio::test]
    async fn upsert_updates_price_and_keeps_id() {
        let store = store().await;
        store
            .update_or_create(&[ProductRecord::new("Widget", 1000)])
            .await
            .unwrap();
        let before = store.get_all(&filters(1, 30, "")).await.unwrap();

        store
            .update_or_create(&[ProductRecord::new("Widget", 1200)])
            .await
            .unwrap();
        let after = store.get_all(&filters(1, 30, "")).await.unwrap();

        assert_eq!(store.get_total_records().await.unwrap(), 1);
        assert_eq!(after[0].price, 1200);
        assert_eq!(after[0].id, before[0].id);
    }

    #[tokio::test]
    async fn orders_and_windows() {
        let store = store().await;
        store
            .update_or_create(&[
                ProductRecord::new("Widget", 1000),
                ProductRecord::new("Anvil", 2500),
                ProductRecord::new("Gizmo", 1000),
                ProductRecord::new("Bolt", 5),
            ])
            .await
            .unwrap();

        let by_price = store.get_all(&filters(1, 10, "price")).await.unwrap();
        assert_eq!(names(&by_price), ["Bolt", "Gizmo", "Widget", "Anvil"]);

        let by_price_desc = store.get_all(&filters(1, 10, "-price")).await.unwrap();
        assert_eq!(names(&by_price_desc), ["Anvil", "Widget", "Gizmo", "Bolt"]);

        let second = store.get_all(&filters(2, 3, "-name")).await.unwrap();
        assert_eq!(names(&second), ["Anvil"]);
    }

    #[tokio::test]
    async fn failing_record_does_not_block_the_rest() {
        let store = store().await;
        sqlx::query(
            "CREATE TRIGGER reject_bad BEFORE INSERT ON products \
             WHEN NEW.name = 'Bad' BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let err = store
            .update_or_create(&[
                ProductRecord::new("A", 1),
                ProductRecord::new("Bad", 2),
                ProductRecord::new("C", 3),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Storage { .. }));
        assert!(err.to_string().contains("1 of 3 upserts failed"), "{err}");

        let stored = store.get_all(&filters(1, 30, "")).await.unwrap();
        assert_eq!(names(&stored), ["A", "C"]);
        assert_eq!(store.get_total_records().await.unwrap(), 2);
    }
}
