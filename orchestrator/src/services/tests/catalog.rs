//! Tests for JsonCatalogSource and catalog validation

use tempfile::TempDir;

use crate::error::OrchestratorError;
use crate::services::catalog::JsonCatalogSource;
use crate::traits::CatalogSource;

fn write_catalog(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("products.json");
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_loads_products_with_numeric_codes() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(
        &dir,
        r#"[
            {"article_no": 1001, "product_name": "Iced Tea", "barcode": 8850000000001,
             "class": "Beverage", "sub_class": "Tea", "brand": "Leafy"},
            {"article_no": "1002", "product_name": "Cola", "barcode": "8850000000002",
             "class": "Beverage", "sub_class": "Soda", "brand": "Fizz"}
        ]"#,
    );

    let products = JsonCatalogSource::new(path).load_products().await.unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].article_no, "1001");
    assert_eq!(products[0].barcode, "8850000000001");
    assert_eq!(products[1].sub_class, "Soda");
}

#[tokio::test]
async fn test_rejects_duplicate_article_numbers() {
    let dir = TempDir::new().unwrap();
    let row = r#"{"article_no": "1", "product_name": "A", "barcode": "1", "class": "C", "sub_class": "S", "brand": "B"}"#;
    let path = write_catalog(&dir, &format!("[{row},{row}]"));

    let error = JsonCatalogSource::new(path).load_products().await.unwrap_err();
    assert!(matches!(error, OrchestratorError::CatalogError { ref message } if message.contains("duplicate")));
}

#[tokio::test]
async fn test_rejects_empty_and_blank() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(&dir, "[]");
    assert!(JsonCatalogSource::new(path).load_products().await.is_err());

    let path = write_catalog(
        &dir,
        r#"[{"article_no": "1", "product_name": " ", "barcode": "1", "class": "C", "sub_class": "S", "brand": "B"}]"#,
    );
    let error = JsonCatalogSource::new(path).load_products().await.unwrap_err();
    assert!(error.to_string().contains("product_name"));
}

#[tokio::test]
async fn test_missing_or_malformed_file_is_configuration_error() {
    let dir = TempDir::new().unwrap();
    let missing = JsonCatalogSource::new(dir.path().join("absent.json"))
        .load_products()
        .await
        .unwrap_err();
    assert!(missing.is_configuration());

    let path = write_catalog(&dir, "{ not json");
    let malformed = JsonCatalogSource::new(path).load_products().await.unwrap_err();
    assert!(malformed.is_configuration());
}
