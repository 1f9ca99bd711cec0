//! Test fixtures and data for orchestrator tests

use std::collections::HashMap;
use std::time::Duration;

use orchestrator::RetryPolicy;
use shared::{dimension, AttributeDimension, Product};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const THAI_AD_COPY: &'static str = "Cool off today! ชาเย็นสดชื่น ดื่มเลย";
    pub const CHARACTER_ACTION: &'static str = "sipping tea on a hammock";
    pub const IMAGE_PROMPT: &'static str = "A cartoon chick sipping iced tea, art deco style";

    /// Identifier of (P1, hot, north, male, adult, driver)
    pub const SINGLE_TASK_ID: &'static str = "723691c2798116873286832978f83172fe4cb3e0bf27334423449edad86241ab";

    pub fn product(article_no: &str) -> Product {
        Product {
            article_no: article_no.to_string(),
            product_name: format!("Iced Tea {article_no}"),
            barcode: format!("885{article_no}"),
            class: "Beverage".to_string(),
            sub_class: "Tea".to_string(),
            brand: "Leafy".to_string(),
        }
    }

    pub fn age_ranges() -> HashMap<String, String> {
        HashMap::from([
            ("adult".to_string(), "25-40".to_string()),
            ("youth".to_string(), "15-24".to_string()),
        ])
    }

    /// Six dimensions in pipeline order with the given values
    pub fn dimensions(
        products: &[&str],
        weather: &[&str],
        regions: &[&str],
        genders: &[&str],
        ages: &[&str],
        jobs: &[&str],
    ) -> Vec<AttributeDimension> {
        let values = [products, weather, regions, genders, ages, jobs];
        dimension::ORDER
            .iter()
            .zip(values)
            .map(|(name, values)| AttributeDimension::new(*name, values.iter().copied()))
            .collect()
    }

    /// (P1, hot, north, male, adult, driver)
    pub fn single_task_dimensions() -> Vec<AttributeDimension> {
        Self::dimensions(&["P1"], &["hot"], &["north"], &["male"], &["adult"], &["driver"])
    }

    /// Retry policy that keeps tests fast
    pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }
}
