//! Product catalog loading from a JSON export

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;

use shared::Product;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::CatalogSource;

/// Catalog read from a JSON array of product rows
pub struct JsonCatalogSource {
    path: PathBuf,
}

impl JsonCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for JsonCatalogSource {
    async fn load_products(&self) -> OrchestratorResult<Vec<Product>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| OrchestratorError::catalog(format!("cannot read {}: {}", self.path.display(), e)))?;

        let products: Vec<Product> = serde_json::from_str(&content).map_err(|e| {
            OrchestratorError::catalog(format!("{} is not a valid catalog: {}", self.path.display(), e))
        })?;

        validate_products(&products)?;
        tracing::info!(path = %self.path.display(), products = products.len(), "Catalog loaded");
        Ok(products)
    }
}

/// Reject empty catalogs, blank fields and repeated article numbers
pub fn validate_products(products: &[Product]) -> OrchestratorResult<()> {
    if products.is_empty() {
        return Err(OrchestratorError::catalog("catalog contains no products"));
    }

    let mut seen = HashSet::new();
    for (row, product) in products.iter().enumerate() {
        let fields = [
            ("article_no", &product.article_no),
            ("product_name", &product.product_name),
            ("barcode", &product.barcode),
            ("class", &product.class),
            ("sub_class", &product.sub_class),
            ("brand", &product.brand),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(OrchestratorError::catalog(format!("row {row}: field '{name}' is empty")));
        }
        if !seen.insert(product.article_no.as_str()) {
            return Err(OrchestratorError::catalog(format!(
                "row {row}: duplicate article_no '{}'",
                product.article_no
            )));
        }
    }
    Ok(())
}
