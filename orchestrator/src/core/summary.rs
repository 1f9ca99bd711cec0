//! Run-level aggregation of task reports

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use shared::logging;

use crate::core::pipeline::{TaskOutcome, TaskReport};
use crate::error::{OrchestratorError, OrchestratorResult};

/// Exit code when every task succeeded or was skipped
pub const EXIT_OK: i32 = 0;
/// Exit code when any task failed or was cancelled
pub const EXIT_TASK_FAILURES: i32 = 1;
/// Exit code for configuration errors raised before any task ran
pub const EXIT_CONFIG_ERROR: i32 = 2;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub skipped: usize,
    /// Ordered by task ordinal
    pub tasks: Vec<TaskReport>,
}

impl RunSummary {
    pub fn from_reports(run_id: Uuid, started_at: DateTime<Utc>, mut tasks: Vec<TaskReport>) -> Self {
        tasks.sort_by_key(|report| report.ordinal);

        let count = |wanted: fn(&TaskOutcome) -> bool| tasks.iter().filter(|r| wanted(&r.outcome)).count();
        let succeeded = count(|o| matches!(o, TaskOutcome::Succeeded { .. }));
        let failed = count(|o| matches!(o, TaskOutcome::Failed { .. }));
        let cancelled = count(|o| matches!(o, TaskOutcome::Cancelled { .. }));
        let skipped = count(|o| matches!(o, TaskOutcome::Skipped));

        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            total: tasks.len(),
            succeeded,
            failed,
            cancelled,
            skipped,
            tasks,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_OK
        } else {
            EXIT_TASK_FAILURES
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks
            .iter()
            .filter(|report| matches!(report.outcome, TaskOutcome::Failed { .. }))
    }

    /// Emit the end-of-run summary, one line per failed task
    pub fn log(&self) {
        for report in self.failures() {
            if let TaskOutcome::Failed { stage, reason, uploaded } = &report.outcome {
                tracing::warn!(
                    task = report.ordinal,
                    attributes = %report.attributes.join(", "),
                    stage = ?stage,
                    partial_uploads = uploaded.len(),
                    "Failed: {}",
                    reason
                );
                for location in uploaded {
                    tracing::warn!(task = report.ordinal, location = %location, "Left behind by failed task");
                }
            }
        }

        let line = format!(
            "{} tasks: {} succeeded, {} failed, {} cancelled, {} skipped ({}s)",
            self.total,
            self.succeeded,
            self.failed,
            self.cancelled,
            self.skipped,
            (self.finished_at - self.started_at).num_seconds()
        );
        if self.is_success() {
            logging::log_success(&line);
        } else {
            logging::log_progress("Run finished with problems", &line);
        }
    }

    /// Write the summary as pretty JSON
    pub async fn write_report(&self, path: &Path) -> OrchestratorResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| OrchestratorError::file_system("create report directory", parent, e))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| OrchestratorError::file_system("write report", path, e))?;
        Ok(())
    }
}
