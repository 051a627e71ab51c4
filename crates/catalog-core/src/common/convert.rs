use crate::{
    filters::ValidationErrors,
    pagination::Pagination,
    proto::{self, list_response},
    types::Product,
};

impl From<Product> for list_response::Product {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            price: product.price,
        }
    }
}

impl From<Pagination> for list_response::Metadata {
    fn from(page: Pagination) -> Self {
        Self {
            current_page: page.current_page,
            page_size: page.page_size,
            first_page: page.first_page,
            last_page: page.last_page,
            total_records: page.total_records,
        }
    }
}

impl From<&ValidationErrors> for proto::FilterError {
    fn from(errors: &ValidationErrors) -> Self {
        Self {
            message: errors.to_string(),
            violations: errors
                .violations()
                .iter()
                .map(|v| proto::FieldViolation {
                    field: v.field.to_owned(),
                    description: v.message.to_owned(),
                })
                .collect(),
        }
    }
}

impl proto::ListResponse {
    /// A page of results with its metadata.
    pub fn page(products: Vec<Product>, metadata: Option<Pagination>) -> Self {
        Self {
            results: products.into_iter().map(Into::into).collect(),
            metadata: metadata.map(Into::into),
            error: None,
        }
    }

    /// A response that rejects the request's filters. Carries no results.
    pub fn rejected(errors: &ValidationErrors) -> Self {
        Self {
            results: Vec::new(),
            metadata: None,
            error: Some(errors.into()),
        }
    }
}
