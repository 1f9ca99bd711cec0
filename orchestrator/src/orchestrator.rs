//! Run-level orchestration
//!
//! Dispatches enumerated tasks to a bounded pool of workers and gathers
//! their reports into a [`RunSummary`]. A failing task never stops the run;
//! cancellation stops dispatch and the workers wind down at their next await.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use shared::{logging, Task, TaskIdentifier};

use crate::core::identifier::identifier;
use crate::core::pipeline::{TaskPipeline, TaskReport};
use crate::core::summary::RunSummary;
use crate::core::TaskEnumerator;
use crate::error::{OrchestratorError, OrchestratorResult};

/// Coordinates one pipeline pass over the whole task space
pub struct Orchestrator {
    pipeline: Arc<TaskPipeline>,
    concurrency: usize,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(pipeline: TaskPipeline, concurrency: usize, cancel: CancellationToken) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            concurrency: concurrency.max(1),
            cancel,
        }
    }

    /// Process every task once and summarise the outcomes
    pub async fn run(&self, enumerator: &TaskEnumerator) -> RunSummary {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        logging::log_progress(
            "Run started",
            &format!(
                "run {} with {} tasks, {} worker(s)",
                run_id,
                enumerator.len(),
                self.concurrency
            ),
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers: JoinSet<TaskReport> = JoinSet::new();
        let mut in_flight: BTreeMap<usize, Task> = BTreeMap::new();
        let mut reports = Vec::with_capacity(enumerator.len());

        for task in enumerator.iter() {
            let permit = loop {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => break None,
                    Some(joined) = workers.join_next(), if !workers.is_empty() => {
                        Self::collect(joined, &mut in_flight, &mut reports);
                    }
                    permit = Arc::clone(&semaphore).acquire_owned() => break permit.ok(),
                }
            };

            let Some(permit) = permit else {
                reports.push(TaskReport::not_started(&task));
                continue;
            };

            in_flight.insert(task.ordinal(), task.clone());
            let pipeline = Arc::clone(&self.pipeline);
            let span = tracing::info_span!("task", ordinal = task.ordinal());
            workers.spawn(
                async move {
                    let report = pipeline.run(&task).await;
                    drop(permit);
                    report
                }
                .instrument(span),
            );
        }

        while let Some(joined) = workers.join_next().await {
            Self::collect(joined, &mut in_flight, &mut reports);
        }

        // Workers that panicked never reported
        for task in in_flight.into_values() {
            reports.push(TaskReport::aborted(&task, "worker terminated unexpectedly"));
        }

        let summary = RunSummary::from_reports(run_id, started_at, reports);
        summary.log();
        summary
    }

    fn collect(
        joined: Result<TaskReport, JoinError>,
        in_flight: &mut BTreeMap<usize, Task>,
        reports: &mut Vec<TaskReport>,
    ) {
        match joined {
            Ok(report) => {
                in_flight.remove(&report.ordinal);
                logging::log_progress(
                    "Task finished",
                    &format!("#{} {}", report.ordinal, report.outcome.label()),
                );
                reports.push(report);
            }
            Err(error) => logging::log_error("Task worker", &error),
        }
    }
}

/// Every task with its identifier, without calling any external service
pub fn plan(enumerator: &TaskEnumerator) -> impl Iterator<Item = (Task, TaskIdentifier)> + '_ {
    enumerator.iter().map(|task| {
        let id = identifier(&task);
        (task, id)
    })
}

/// Refuse a task space in which two tasks share an identifier
///
/// Values are concatenated without a separator, so tuples such as
/// `(hot, north)` and `(hotn, orth)` address the same storage prefix and
/// record. Such a run would overwrite one task's output with another's.
pub fn ensure_unique_identifiers(enumerator: &TaskEnumerator) -> OrchestratorResult<()> {
    let mut seen: HashMap<TaskIdentifier, Task> = HashMap::with_capacity(enumerator.len());
    for (task, id) in plan(enumerator) {
        if let Some(first) = seen.get(&id) {
            return Err(OrchestratorError::config(format!(
                "tasks {} {} and {} {} share identifier {}; rename an attribute value",
                first.ordinal(),
                first,
                task.ordinal(),
                task,
                id
            )));
        }
        seen.insert(id, task);
    }
    Ok(())
}
