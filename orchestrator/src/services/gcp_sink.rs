//! Cloud Storage + Firestore artifact sink
//!
//! Artifacts go to `gs://{bucket}/advertisement/{id}/{sequence}.{ext}` through
//! the Storage JSON API media upload; records are Firestore documents keyed by
//! identifier under the configured collection.

use std::path::Path;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};

use generators::services::http::{build_client, check_status, map_send_error};
use shared::{ApiFailure, ArtifactKind, GenerationRecord, TaskIdentifier};

use crate::core::identifier::artifact_object_name;
use crate::error::OrchestratorResult;
use crate::traits::ArtifactSink;

const STORAGE_BASE_URL: &str = "https://storage.googleapis.com";
const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

pub struct GcpArtifactSink {
    client: reqwest::Client,
    project_id: String,
    bucket: String,
    collection: String,
    access_token: String,
    storage_base_url: String,
    firestore_base_url: String,
}

impl GcpArtifactSink {
    pub fn new(
        project_id: impl Into<String>,
        bucket: impl Into<String>,
        collection: impl Into<String>,
        access_token: impl Into<String>,
    ) -> OrchestratorResult<Self> {
        Ok(Self {
            client: build_client()?,
            project_id: project_id.into(),
            bucket: bucket.into(),
            collection: collection.into(),
            access_token: access_token.into(),
            storage_base_url: STORAGE_BASE_URL.to_string(),
            firestore_base_url: FIRESTORE_BASE_URL.to_string(),
        })
    }

    /// Point both APIs at another host, used against emulators and in tests
    pub fn with_base_urls(mut self, storage: impl Into<String>, firestore: impl Into<String>) -> Self {
        self.storage_base_url = storage.into();
        self.firestore_base_url = firestore.into();
        self
    }

    fn document_url(&self, identifier: &TaskIdentifier) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}/{}",
            self.firestore_base_url.trim_end_matches('/'),
            self.project_id,
            self.collection,
            identifier
        )
    }

    /// Firestore wire form: every field becomes a `stringValue`
    fn document_body(record: &GenerationRecord) -> Result<Value, ApiFailure> {
        let flat = serde_json::to_value(record)
            .map_err(|e| ApiFailure::InvalidRequest(format!("record serialization: {e}")))?;
        let Value::Object(entries) = flat else {
            return Err(ApiFailure::InvalidRequest("record is not an object".to_string()));
        };

        let fields: Map<String, Value> = entries
            .into_iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(text) => text,
                    other => other.to_string(),
                };
                (name, json!({ "stringValue": text }))
            })
            .collect();
        Ok(json!({ "fields": fields }))
    }
}

#[async_trait]
impl ArtifactSink for GcpArtifactSink {
    async fn put(
        &self,
        local_path: &Path,
        identifier: &TaskIdentifier,
        sequence: u32,
        kind: ArtifactKind,
    ) -> Result<String, ApiFailure> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| ApiFailure::StorageError(format!("read {}: {}", local_path.display(), e)))?;
        let object_name = artifact_object_name(identifier, sequence, kind);
        let url = format!(
            "{}/upload/storage/v1/b/{}/o",
            self.storage_base_url.trim_end_matches('/'),
            self.bucket
        );

        let response = self
            .client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", object_name.as_str())])
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, kind.content_type())
            .body(bytes)
            .send()
            .await
            .map_err(map_send_error)?;
        check_status(response).await?;

        Ok(format!("gs://{}/{}", self.bucket, object_name))
    }

    async fn put_record(&self, record: &GenerationRecord) -> Result<(), ApiFailure> {
        let response = self
            .client
            .patch(self.document_url(&record.advertisement_id))
            .bearer_auth(&self.access_token)
            .json(&Self::document_body(record)?)
            .send()
            .await
            .map_err(map_send_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn record_exists(&self, identifier: &TaskIdentifier) -> Result<bool, ApiFailure> {
        let response = self
            .client
            .get(self.document_url(identifier))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(map_send_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(response).await?;
        Ok(true)
    }
}
