//! CSV feed decoding.
//!
//! The feed is `;`-delimited with a header row naming the columns
//! `PRODUCT NAME` and `PRICE`. Whitespace around every field is ignored.

use catalog_core::{
    Error, Result,
    types::{Price, ProductName, ProductRecord},
};
use serde::Deserialize;

const DELIMITER: u8 = b';';

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "PRODUCT NAME")]
    name: ProductName,
    #[serde(rename = "PRICE")]
    price: Price,
}

fn decode_err(reason: impl Into<String>) -> Error {
    Error::Decode {
        reason: reason.into(),
    }
}

/// Decodes every record of `body`.
///
/// All-or-nothing: the first malformed row rejects the whole feed, and a feed
/// with no data rows is rejected as well.
///
/// # Errors
///
/// [`Error::Decode`] for an empty body, a missing column, a non-integer or
/// negative price, or a feed with only a header.
pub fn decode_products(body: &[u8]) -> Result<Vec<ProductRecord>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(decode_err("empty body"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body);

    let mut products = Vec::new();
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let row = row.map_err(|e| decode_err(format!("line {line}: {e}")))?;

        if row.price < 0 {
            return Err(decode_err(format!(
                "line {line}: negative price {} for {:?}",
                row.price, row.name
            )));
        }

        products.push(ProductRecord::new(row.name, row.price));
    }

    if products.is_empty() {
        return Err(decode_err("no product records"));
    }

    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(err: Error) -> String {
        match err {
            Error::Decode { reason } => reason,
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn decodes_rows_in_order() {
        let body = b"PRODUCT NAME;PRICE\nWidget;1000\nGizmo;250\n";
        let products = decode_products(body).unwrap();

        assert_eq!(
            products,
            [
                ProductRecord::new("Widget", 1000),
                ProductRecord::new("Gizmo", 250),
            ]
        );
    }

    #[test]
    fn trims_fields_and_accepts_missing_trailing_newline() {
        let body = b"PRODUCT NAME ; PRICE\n  Big Widget ;  42";
        let products = decode_products(body).unwrap();

        assert_eq!(products, [ProductRecord::new("Big Widget", 42)]);
    }

    #[test]
    fn columns_are_matched_by_header() {
        let body = b"PRICE;PRODUCT NAME\n7;Bolt\n";
        let products = decode_products(body).unwrap();

        assert_eq!(products, [ProductRecord::new("Bolt", 7)]);
    }

    #[test]
    fn empty_body_is_rejected() {
        assert_eq!(reason(decode_products(b"").unwrap_err()), "empty body");
        assert_eq!(reason(decode_products(b" \n\n").unwrap_err()), "empty body");
    }

    #[test]
    fn header_only_is_rejected() {
        let err = decode_products(b"PRODUCT NAME;PRICE\n").unwrap_err();
        assert_eq!(reason(err), "no product records");
    }

    #[test]
    fn malformed_price_rejects_the_whole_feed() {
        let body = b"PRODUCT NAME;PRICE\nWidget;1000\nGizmo;cheap\n";
        let reason = reason(decode_products(body).unwrap_err());

        assert!(reason.starts_with("line 3:"), "{reason}");
    }

    #[test]
    fn negative_price_is_rejected() {
        let body = b"PRODUCT NAME;PRICE\nWidget;-1\n";
        let reason = reason(decode_products(body).unwrap_err());

        assert!(reason.contains("negative price"), "{reason}");
    }

    #[test]
    fn missing_column_is_rejected() {
        let body = b"PRODUCT NAME\nWidget\n";
        assert!(matches!(decode_products(body), Err(Error::Decode { .. })));
    }

    #[test]
    fn short_row_is_rejected() {
        let body = b"PRODUCT NAME;PRICE\nWidget\n";
        assert!(matches!(decode_products(body), Err(Error::Decode { .. })));
    }
}
