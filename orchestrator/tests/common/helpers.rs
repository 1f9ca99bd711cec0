//! Test helpers and builder patterns for orchestrator tests

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use generators::services::OfflineGenerator;
use generators::{ImageGenerator, SpeechSynthesizer, TextGenerator};
use orchestrator::core::artifact_object_name;
use orchestrator::{
    ArtifactSink, GenerationContext, Orchestrator, PipelineSettings, RetryExecutor, RetryPolicy, TaskPipeline,
};
use shared::{ApiFailure, ArtifactKind, GenerationRecord, TaskIdentifier};

use super::fixtures::TestFixtures;

/// Artifact sink that keeps everything in memory
#[derive(Default)]
pub struct InMemorySink {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    records: Mutex<BTreeMap<TaskIdentifier, GenerationRecord>>,
    put_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    put_delay: Option<Duration>,
    fail_records: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every upload takes `delay`, to make overlap between workers observable
    pub fn with_put_delay(mut self, delay: Duration) -> Self {
        self.put_delay = Some(delay);
        self
    }

    /// Every record write fails with a transient storage error
    pub fn failing_records(mut self) -> Self {
        self.fail_records = true;
        self
    }

    pub fn insert_record(&self, record: GenerationRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.advertisement_id.clone(), record);
    }

    pub fn record(&self, identifier: &TaskIdentifier) -> Option<GenerationRecord> {
        self.records.lock().unwrap().get(identifier).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn object_names(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn object(&self, name: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(name).cloned()
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactSink for InMemorySink {
    async fn put(
        &self,
        local_path: &Path,
        identifier: &TaskIdentifier,
        sequence: u32,
        kind: ArtifactKind,
    ) -> Result<String, ApiFailure> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.put_delay {
            tokio::time::sleep(delay).await;
        }
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| ApiFailure::StorageError(e.to_string()));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let name = artifact_object_name(identifier, sequence, kind);
        self.objects.lock().unwrap().insert(name.clone(), bytes?);
        Ok(format!("mem://{name}"))
    }

    async fn put_record(&self, record: &GenerationRecord) -> Result<(), ApiFailure> {
        if self.fail_records {
            return Err(ApiFailure::StorageError("metadata store offline".to_string()));
        }
        self.insert_record(record.clone());
        Ok(())
    }

    async fn record_exists(&self, identifier: &TaskIdentifier) -> Result<bool, ApiFailure> {
        Ok(self.records.lock().unwrap().contains_key(identifier))
    }
}

/// Builder for an [`Orchestrator`] wired with offline generators by default
pub struct PipelineBuilder {
    text: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageGenerator>,
    speech: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn ArtifactSink>,
    policy: RetryPolicy,
    settings: PipelineSettings,
    products: Vec<shared::Product>,
    concurrency: usize,
    cancel: CancellationToken,
}

impl PipelineBuilder {
    pub fn new(staging_dir: &Path, sink: Arc<dyn ArtifactSink>) -> Self {
        let offline = Arc::new(OfflineGenerator::new());
        Self {
            text: offline.clone(),
            images: offline.clone(),
            speech: offline,
            sink,
            policy: TestFixtures::fast_retry(3),
            settings: PipelineSettings {
                staging_dir: staging_dir.to_path_buf(),
                age_ranges: TestFixtures::age_ranges(),
                ..PipelineSettings::default()
            },
            products: vec![TestFixtures::product("P1"), TestFixtures::product("P2")],
            concurrency: 1,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_text(mut self, text: impl TextGenerator + 'static) -> Self {
        self.text = Arc::new(text);
        self
    }

    pub fn with_images(mut self, images: impl ImageGenerator + 'static) -> Self {
        self.images = Arc::new(images);
        self
    }

    pub fn with_speech(mut self, speech: impl SpeechSynthesizer + 'static) -> Self {
        self.speech = Arc::new(speech);
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_images_per_task(mut self, count: u32) -> Self {
        self.settings.images_per_task = count;
        self
    }

    pub fn with_skip_existing(mut self) -> Self {
        self.settings.skip_existing = true;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn build(self) -> Orchestrator {
        let context = GenerationContext {
            text: self.text,
            images: self.images,
            speech: self.speech,
            sink: self.sink,
        };
        let retry = RetryExecutor::new(self.policy, self.cancel.clone());
        let pipeline = TaskPipeline::new(context, self.settings, retry, self.products);
        Orchestrator::new(pipeline, self.concurrency, self.cancel)
    }
}
