//! Tests for orchestrator services

pub mod catalog;

use shared::{GenerationRecord, TaskIdentifier};

use crate::core::identifier::storage_prefix;

pub fn sample_id() -> TaskIdentifier {
    TaskIdentifier::from_digest(&[0xab; 32])
}

pub fn sample_record() -> GenerationRecord {
    let id = sample_id();
    GenerationRecord {
        storage_path: storage_prefix(&id),
        advertisement_id: id,
        article_no: "P1".to_string(),
        barcode: "8850000000001".to_string(),
        weather: "Hot".to_string(),
        region: "North".to_string(),
        gender: "Male".to_string(),
        age: "Adult".to_string(),
        job: "Driver".to_string(),
        description: "ชาเย็น สดชื่น".to_string(),
    }
}
