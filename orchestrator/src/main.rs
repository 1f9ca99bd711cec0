//! Entry point of the ad creative batch pipeline
//!
//! Loads `.env` and configuration, wires the generators and the artifact
//! sink selected on the command line, and runs every task once.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;

use generators::services::{CloudSpeechSynthesizer, OfflineGenerator, VertexImageGenerator, VertexTextGenerator};
use generators::VertexSettings;
use orchestrator::core::summary::{EXIT_CONFIG_ERROR, EXIT_TASK_FAILURES};
use orchestrator::core::{rate_limiter, TaskEnumerator};
use orchestrator::orchestrator::{ensure_unique_identifiers, plan};
use orchestrator::services::{GcpArtifactSink, JsonCatalogSource, LocalArtifactSink};
use orchestrator::{
    ArtifactSink, CatalogSource, GenerationContext, Orchestrator, OrchestratorError, OrchestratorResult,
    PipelineConfig, PipelineSettings, RetryExecutor, TaskPipeline,
};
use shared::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Provider {
    /// Gemini, Imagen and Cloud Text-to-Speech
    Gcp,
    /// Deterministic local stand-ins, no credentials needed
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    /// Cloud Storage and Firestore
    Gcp,
    /// Local directory mirroring the remote layout
    Local,
}

/// Batch generation of localized advertisement creative
#[derive(Parser, Debug)]
#[command(name = "orchestrator")]
#[command(about = "Generates ad text, images and narration for every product and audience combination")]
struct Args {
    /// Catalog JSON file (defaults to PRODUCT_FILE_PATH)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Generation backend
    #[arg(long, value_enum, default_value = "gcp")]
    provider: Provider,

    /// Artifact and record destination
    #[arg(long, value_enum, default_value = "gcp")]
    sink: SinkKind,

    /// Output directory for the local sink
    #[arg(long, default_value = "./output")]
    output: PathBuf,

    /// Concurrent tasks (overrides CONCURRENCY)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Images per task (overrides N_IMAGES)
    #[arg(long)]
    images: Option<u32>,

    /// Attempts per external call (overrides MAX_ATTEMPTS)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write the run summary as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Skip tasks whose metadata record already exists
    #[arg(long)]
    skip_existing: bool,

    /// List tasks and identifiers without generating anything
    #[arg(long)]
    plan: bool,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = PipelineConfig::from_env();
    let log_file = config.as_ref().ok().and_then(|c| c.log_file.clone());
    if let Err(e) = logging::init_tracing(Some(&args.log_level), log_file.as_deref()) {
        eprintln!("Failed to initialise logging: {e}");
    }

    let code = match config {
        Ok(config) => match run(args, config).await {
            Ok(code) => code,
            Err(e) => {
                logging::log_error("Pipeline", &e);
                if e.is_configuration() {
                    EXIT_CONFIG_ERROR
                } else {
                    EXIT_TASK_FAILURES
                }
            }
        },
        Err(e) => {
            logging::log_error("Configuration", &e);
            EXIT_CONFIG_ERROR
        }
    };

    std::process::exit(code);
}

async fn run(args: Args, mut config: PipelineConfig) -> OrchestratorResult<i32> {
    apply_overrides(&args, &mut config);

    let catalog_path = args
        .catalog
        .clone()
        .or_else(|| config.catalog_path.clone())
        .ok_or_else(|| OrchestratorError::config("no catalog given (--catalog or PRODUCT_FILE_PATH)"))?;
    let products = JsonCatalogSource::new(catalog_path).load_products().await?;
    let enumerator = TaskEnumerator::new(config.attribute_dimensions(&products))?;
    ensure_unique_identifiers(&enumerator)?;

    if args.plan {
        for (task, id) in plan(&enumerator) {
            println!("{}\t{}\t{}", task.ordinal(), id, task);
        }
        return Ok(0);
    }

    logging::log_startup(&format!(
        "ad pipeline: {} products, {} tasks, provider {:?}, sink {:?}",
        products.len(),
        enumerator.len(),
        args.provider,
        args.sink
    ));

    let context = build_context(&args, &config)?;
    let cancel = CancellationToken::new();
    let mut retry = RetryExecutor::new(config.retry_policy(), cancel.clone());
    if let Some(rpm) = config.requests_per_minute {
        retry = retry.with_rate_limiter(rate_limiter(rpm));
    }

    let settings = PipelineSettings {
        images_per_task: config.images_per_task,
        language_code: config.language_code.clone(),
        staging_dir: config.staging_dir.clone(),
        skip_existing: args.skip_existing,
        age_ranges: config.age_ranges.clone(),
        ..PipelineSettings::default()
    };
    let pipeline = TaskPipeline::new(context, settings, retry, products);
    let orchestrator = Orchestrator::new(pipeline, config.concurrency, cancel.clone());

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown("Received Ctrl+C signal, cancelling remaining tasks");
                signal_cancel.cancel();
            }
            Err(err) => logging::log_error("Signal handling", &err),
        }
    });

    let summary = orchestrator.run(&enumerator).await;
    if let Some(path) = &args.report {
        summary.write_report(path).await?;
        logging::log_progress("Report written", &path.display().to_string());
    }

    Ok(summary.exit_code())
}

fn apply_overrides(args: &Args, config: &mut PipelineConfig) {
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency.max(1);
    }
    if let Some(images) = args.images {
        config.images_per_task = images;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.max_attempts = max_attempts.max(1);
    }
}

fn build_context(args: &Args, config: &PipelineConfig) -> OrchestratorResult<GenerationContext> {
    let sink: Arc<dyn ArtifactSink> = match args.sink {
        SinkKind::Local => Arc::new(LocalArtifactSink::new(
            &args.output,
            &config.bucket_name,
            &config.collection,
        )),
        SinkKind::Gcp => {
            let gcp = config.gcp()?;
            Arc::new(GcpArtifactSink::new(
                gcp.project_id,
                &config.bucket_name,
                &config.collection,
                gcp.access_token,
            )?)
        }
    };

    let context = match args.provider {
        Provider::Offline => {
            let offline = Arc::new(OfflineGenerator::new());
            GenerationContext {
                text: offline.clone(),
                images: offline.clone(),
                speech: offline,
                sink,
            }
        }
        Provider::Gcp => {
            let gcp = config.gcp()?;
            let vertex = VertexSettings::new(gcp.project_id, gcp.location, gcp.access_token);
            GenerationContext {
                text: Arc::new(VertexTextGenerator::new(vertex.clone(), gcp.gemini_model)?),
                images: Arc::new(VertexImageGenerator::new(vertex, gcp.imagen_model)?),
                speech: Arc::new(CloudSpeechSynthesizer::new(gcp.access_token)?.with_quota_project(gcp.project_id)),
                sink,
            }
        }
    };
    Ok(context)
}
