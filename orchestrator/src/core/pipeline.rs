//! Per-task stage machine
//!
//! A task moves through PromptBuild, IdentifierDerive, ImageGenerate,
//! AudioGenerate, Upload and PersistMetadata strictly in that order. The
//! first failing stage ends the task; artifacts already uploaded stay in
//! place and are listed in the task's outcome. A metadata record is written
//! only after every artifact is uploaded.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use generators::prompt::{self, AdBrief};
use generators::{
    AspectRatio, AudioEncoding, GenerationParameters, ImageGenerator, SpeechSynthesizer, TextGenerator,
    VoiceGender,
};
use shared::{
    dimension, ApiFailure, ArtifactKind, GenerationArtifact, GenerationRecord, Product, Task, TaskIdentifier,
};
use shared::{task_debug, task_error, task_info, task_warn};

use crate::core::identifier::{identifier, storage_prefix};
use crate::core::retry::{RetryError, RetryExecutor};
use crate::services::staging::StagingArea;
use crate::traits::ArtifactSink;

/// Sequence number of the staged ad text
pub const AD_TEXT_SEQUENCE: u32 = 0;

/// Sequence number of the narration audio
pub const NARRATION_SEQUENCE: u32 = 1;

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Existing-record lookup, only when resuming
    ResumeCheck,
    PromptBuild,
    IdentifierDerive,
    ImageGenerate,
    AudioGenerate,
    Upload,
    PersistMetadata,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ResumeCheck => "resume check",
            Stage::PromptBuild => "prompt build",
            Stage::IdentifierDerive => "identifier derive",
            Stage::ImageGenerate => "image generate",
            Stage::AudioGenerate => "audio generate",
            Stage::Upload => "upload",
            Stage::PersistMetadata => "persist metadata",
        };
        f.write_str(name)
    }
}

/// Cause of a stage failure
#[derive(Error, Debug)]
pub enum StageFailure {
    #[error(transparent)]
    Retry(#[from] RetryError),

    #[error("staging I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("task attribute unavailable: {0}")]
    Attribute(String),
}

/// A failed stage together with its cause
#[derive(Error, Debug)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: StageFailure,
}

impl StageError {
    fn new(stage: Stage, source: impl Into<StageFailure>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(&self.source, StageFailure::Retry(retry) if retry.is_cancelled())
    }
}

/// Final state of one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Succeeded {
        uploaded: Vec<String>,
    },
    Failed {
        /// `None` if the worker died without reporting where
        stage: Option<Stage>,
        reason: String,
        /// Remote locations written before the failure
        uploaded: Vec<String>,
    },
    Cancelled {
        /// Stage that was running, `None` if the task never started
        stage: Option<Stage>,
        uploaded: Vec<String>,
    },
    /// A record for the identifier already existed
    Skipped,
}

impl TaskOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TaskOutcome::Succeeded { .. } => "succeeded",
            TaskOutcome::Failed { .. } => "failed",
            TaskOutcome::Cancelled { .. } => "cancelled",
            TaskOutcome::Skipped => "skipped",
        }
    }
}

/// Outcome of one task plus what is needed to report it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub ordinal: usize,
    pub attributes: Vec<String>,
    pub identifier: Option<TaskIdentifier>,
    pub outcome: TaskOutcome,
    pub duration_ms: u64,
}

impl TaskReport {
    /// Report for a task that was never dispatched because the run was cancelled
    pub fn not_started(task: &Task) -> Self {
        Self {
            ordinal: task.ordinal(),
            attributes: task.values().to_vec(),
            identifier: None,
            outcome: TaskOutcome::Cancelled {
                stage: None,
                uploaded: Vec::new(),
            },
            duration_ms: 0,
        }
    }

    /// Report for a task whose worker died without producing a report
    pub fn aborted(task: &Task, reason: impl Into<String>) -> Self {
        Self {
            ordinal: task.ordinal(),
            attributes: task.values().to_vec(),
            identifier: None,
            outcome: TaskOutcome::Failed {
                stage: None,
                reason: reason.into(),
                uploaded: Vec::new(),
            },
            duration_ms: 0,
        }
    }
}

/// External collaborators shared by every worker
#[derive(Clone)]
pub struct GenerationContext {
    pub text: Arc<dyn TextGenerator>,
    pub images: Arc<dyn ImageGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub sink: Arc<dyn ArtifactSink>,
}

/// Knobs of the per-task pipeline
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub images_per_task: u32,
    pub aspect_ratio: AspectRatio,
    pub language_code: String,
    pub voice_gender: VoiceGender,
    pub audio_encoding: AudioEncoding,
    pub generation: GenerationParameters,
    pub staging_dir: PathBuf,
    /// Report tasks whose record already exists as skipped
    pub skip_existing: bool,
    /// Age bracket to descriptive range, e.g. `ADULT -> 25-40`
    pub age_ranges: HashMap<String, String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            images_per_task: 1,
            aspect_ratio: AspectRatio::Portrait3x4,
            language_code: "th-TH".to_string(),
            voice_gender: VoiceGender::Neutral,
            audio_encoding: AudioEncoding::Mp3,
            generation: GenerationParameters::default(),
            staging_dir: PathBuf::from("tmp"),
            skip_existing: false,
            age_ranges: HashMap::new(),
        }
    }
}

enum Completion {
    Done,
    Skipped,
}

/// Drives single tasks through every stage
pub struct TaskPipeline {
    context: GenerationContext,
    settings: PipelineSettings,
    retry: RetryExecutor,
    staging: StagingArea,
    /// Catalog indexed by article number, the value of the product dimension
    products: HashMap<String, Product>,
}

impl TaskPipeline {
    pub fn new(
        context: GenerationContext,
        settings: PipelineSettings,
        retry: RetryExecutor,
        products: Vec<Product>,
    ) -> Self {
        let staging = StagingArea::new(settings.staging_dir.clone());
        let products = products
            .into_iter()
            .map(|product| (product.article_no.clone(), product))
            .collect();
        Self {
            context,
            settings,
            retry,
            staging,
            products,
        }
    }

    /// Run every stage for one task and report the outcome; never fails the run
    pub async fn run(&self, task: &Task) -> TaskReport {
        let started = Instant::now();
        let mut uploaded = Vec::new();
        let mut derived = None;

        task_debug!(task.ordinal(), attributes = %task, "Starting task");
        let result = self.process(task, &mut derived, &mut uploaded).await;

        let outcome = match result {
            Ok(Completion::Done) => {
                task_info!(task.ordinal(), attributes = %task, uploaded = uploaded.len(), "✅ Task succeeded");
                TaskOutcome::Succeeded { uploaded }
            }
            Ok(Completion::Skipped) => {
                task_info!(task.ordinal(), attributes = %task, "⏭️ Record exists, task skipped");
                TaskOutcome::Skipped
            }
            Err(error) if error.is_cancelled() => {
                task_warn!(task.ordinal(), stage = %error.stage, "Task cancelled");
                TaskOutcome::Cancelled {
                    stage: Some(error.stage),
                    uploaded,
                }
            }
            Err(error) => {
                task_error!(
                    task.ordinal(),
                    attributes = %task,
                    stage = %error.stage,
                    uploaded = uploaded.len(),
                    "❌ Task failed: {}",
                    error
                );
                TaskOutcome::Failed {
                    stage: Some(error.stage),
                    reason: error.source.to_string(),
                    uploaded,
                }
            }
        };

        TaskReport {
            ordinal: task.ordinal(),
            attributes: task.values().to_vec(),
            identifier: derived,
            outcome,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn process(
        &self,
        task: &Task,
        derived: &mut Option<TaskIdentifier>,
        uploaded: &mut Vec<String>,
    ) -> Result<Completion, StageError> {
        if self.settings.skip_existing {
            let id = identifier(task);
            let sink = &*self.context.sink;
            let key = &id;
            let exists = self
                .retry
                .execute("record lookup", move || sink.record_exists(key))
                .await
                .map_err(|e| StageError::new(Stage::ResumeCheck, e))?;
            if exists {
                *derived = Some(id);
                return Ok(Completion::Skipped);
            }
        }

        // PromptBuild
        let attributes = self
            .attributes(task)
            .map_err(|e| StageError::new(Stage::PromptBuild, e))?;
        let brief = AdBrief {
            product: attributes.product,
            weather: attributes.weather,
            region: attributes.region,
            gender: attributes.gender,
            age_range: attributes.age_range,
            job: attributes.job,
        };
        let ad_text = self
            .ad_copy(&brief)
            .await
            .map_err(|e| StageError::new(Stage::PromptBuild, e))?;
        let image_prompt = self
            .image_prompt(&brief)
            .await
            .map_err(|e| StageError::new(Stage::PromptBuild, e))?;

        // IdentifierDerive
        let id = identifier(task);
        *derived = Some(id.clone());
        task_debug!(task.ordinal(), identifier = %id, "Identifier derived");

        // The staged ad copy is the last output of PromptBuild
        let mut artifacts = vec![self
            .staging
            .write(&id, AD_TEXT_SEQUENCE, ArtifactKind::AdText, ad_text.as_bytes())
            .await
            .map_err(|e| StageError::new(Stage::PromptBuild, e))?];

        // ImageGenerate
        artifacts.extend(
            self.generate_images(&id, &image_prompt)
                .await
                .map_err(|e| StageError::new(Stage::ImageGenerate, e))?,
        );

        // AudioGenerate
        artifacts.push(
            self.generate_audio(&id, &ad_text)
                .await
                .map_err(|e| StageError::new(Stage::AudioGenerate, e))?,
        );

        // Upload
        let sink = &*self.context.sink;
        for artifact in &artifacts {
            let location = self
                .retry
                .execute("artifact upload", move || {
                    sink.put(&artifact.local_path, &artifact.identifier, artifact.sequence, artifact.kind)
                })
                .await
                .map_err(|e| StageError::new(Stage::Upload, e))?;
            task_debug!(task.ordinal(), location = %location, "Uploaded {}", artifact.kind);
            uploaded.push(location);
        }

        // PersistMetadata
        let record = GenerationRecord {
            advertisement_id: id.clone(),
            storage_path: storage_prefix(&id),
            article_no: attributes.product.article_no.clone(),
            barcode: attributes.product.barcode.clone(),
            weather: attributes.weather.to_string(),
            region: attributes.region.to_string(),
            gender: attributes.gender.to_string(),
            age: attributes.age.to_string(),
            job: attributes.job.to_string(),
            description: ad_text,
        };
        let record_ref = &record;
        self.retry
            .execute("record write", move || sink.put_record(record_ref))
            .await
            .map_err(|e| StageError::new(Stage::PersistMetadata, e))?;

        if let Err(e) = self.staging.clear(&id).await {
            task_warn!(task.ordinal(), error = %e, "Could not remove staging directory");
        }
        Ok(Completion::Done)
    }

    fn attributes<'a>(&'a self, task: &'a Task) -> Result<TaskAttributes<'a>, StageFailure> {
        let value = |name: &str| {
            task.get(name)
                .ok_or_else(|| StageFailure::Attribute(format!("missing dimension '{name}'")))
        };

        let article_no = value(dimension::PRODUCT)?;
        let product = self
            .products
            .get(article_no)
            .ok_or_else(|| StageFailure::Attribute(format!("unknown product '{article_no}'")))?;
        let age = value(dimension::AGE)?;
        let age_range = self
            .settings
            .age_ranges
            .get(age)
            .map(String::as_str)
            .ok_or_else(|| StageFailure::Attribute(format!("no age range for bracket '{age}'")))?;

        Ok(TaskAttributes {
            product,
            weather: value(dimension::WEATHER)?,
            region: value(dimension::REGION)?,
            gender: value(dimension::GENDER)?,
            age,
            age_range,
            job: value(dimension::JOB)?,
        })
    }

    /// Ad copy reduced to its Thai text; a reply without Thai is retried
    async fn ad_copy(&self, brief: &AdBrief<'_>) -> Result<String, RetryError> {
        let text = &*self.context.text;
        let parameters = &self.settings.generation;
        let request = prompt::ad_copy_prompt(brief);
        let request = &request;

        self.retry
            .execute("ad copy generation", move || async move {
                let raw = text.generate(request, parameters).await?;
                let thai = prompt::extract_thai_text(&raw);
                if thai.is_empty() {
                    return Err(ApiFailure::EmptyResponse("ad copy contains no Thai text".to_string()));
                }
                Ok(thai)
            })
            .await
    }

    async fn image_prompt(&self, brief: &AdBrief<'_>) -> Result<String, RetryError> {
        let text = &*self.context.text;
        let parameters = &self.settings.generation;

        let action_request = prompt::character_action_prompt(brief);
        let action_request = &action_request;
        let action = self
            .retry
            .execute("character action generation", move || text.generate(action_request, parameters))
            .await?;

        let rewrite_request = prompt::image_prompt_request(brief, &action);
        let rewrite_request = &rewrite_request;
        self.retry
            .execute("image prompt rewrite", move || text.generate(rewrite_request, parameters))
            .await
    }

    async fn generate_images(
        &self,
        id: &TaskIdentifier,
        image_prompt: &str,
    ) -> Result<Vec<GenerationArtifact>, StageFailure> {
        let count = self.settings.images_per_task;
        if count == 0 {
            return Ok(Vec::new());
        }

        let images = &*self.context.images;
        let aspect_ratio = self.settings.aspect_ratio;
        let generated = self
            .retry
            .execute("image generation", move || async move {
                let generated = images.generate(image_prompt, count, aspect_ratio).await?;
                if generated.is_empty() {
                    return Err(ApiFailure::EmptyResponse("no images generated".to_string()));
                }
                Ok(generated)
            })
            .await?;

        let mut artifacts = Vec::with_capacity(generated.len());
        for (sequence, image) in (0u32..).zip(&generated) {
            artifacts.push(
                self.staging
                    .write(id, sequence, ArtifactKind::Image, &image.bytes)
                    .await?,
            );
        }
        Ok(artifacts)
    }

    async fn generate_audio(&self, id: &TaskIdentifier, ad_text: &str) -> Result<GenerationArtifact, StageFailure> {
        let speech = &*self.context.speech;
        let language_code = self.settings.language_code.as_str();
        let voice_gender = self.settings.voice_gender;
        let encoding = self.settings.audio_encoding;

        let audio = self
            .retry
            .execute("speech synthesis", move || {
                speech.synthesize(ad_text, language_code, voice_gender, encoding)
            })
            .await?;

        Ok(self
            .staging
            .write(id, NARRATION_SEQUENCE, ArtifactKind::Narration, &audio)
            .await?)
    }
}

/// Task values resolved against the catalog and age mapping
struct TaskAttributes<'a> {
    product: &'a Product,
    weather: &'a str,
    region: &'a str,
    gender: &'a str,
    age: &'a str,
    age_range: &'a str,
    job: &'a str,
}
