use crate::app::ports::BrowserLauncher;
use crate::config::Config;
use crate::error::{Result, ScraperError};
use crate::extract::{ExtractorSettings, PageExtractor};
use crate::metrics::names;
use crate::normalize::showtime::{parse_task_date, TaskDateError};
use crate::types::{ExtractionTask, RawPricingLine, TaskResult};
use chrono::{DateTime, Local};
use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Everything one batch produced. Results are in completion order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    pub results: Vec<TaskResult>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl BatchOutcome {
    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.succeeded_count()
    }
}

/// Progress notification sent after each task finishes.
#[derive(Debug)]
pub struct BatchProgress<'a> {
    pub completed: usize,
    pub total: usize,
    pub result: &'a TaskResult,
}

/// Checks every task before anything runs. The first violation rejects the
/// whole batch; task numbers in messages are 1-based.
pub fn validate_tasks(tasks: &[ExtractionTask]) -> Result<()> {
    for (i, task) in tasks.iter().enumerate() {
        let number = i + 1;
        if task.show.is_none() {
            return Err(ScraperError::MissingShow { task: number });
        }
        if task.from_date.trim().is_empty() {
            return Err(date_error(number, "From date is required".to_string()));
        }
        let from = parse_task_date(&task.from_date)
            .map_err(|e| date_error(number, describe(e, "from", &task.from_date)))?;
        if task.to_date.trim().is_empty() {
            continue;
        }
        let to = parse_task_date(&task.to_date)
            .map_err(|e| date_error(number, describe(e, "to", &task.to_date)))?;
        if to < from {
            return Err(date_error(
                number,
                format!("To date {} is before from date {}", task.to_date, task.from_date),
            ));
        }
    }
    Ok(())
}

fn date_error(task: usize, message: String) -> ScraperError {
    ScraperError::DateValidation { task, message }
}

fn describe(err: TaskDateError, which: &str, text: &str) -> String {
    match err {
        TaskDateError::Format => format!("Invalid {} date format (use MM/DD/YYYY)", which),
        TaskDateError::Calendar => format!("Invalid {} date: {} is not a calendar date", which, text),
    }
}

/// Runs extraction tasks on a bounded pool. Each task gets its own browser
/// session; one task failing never affects the others.
pub struct Orchestrator {
    launcher: Arc<dyn BrowserLauncher>,
    extractor: Arc<PageExtractor>,
    concurrency: usize,
}

impl Orchestrator {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, extractor: PageExtractor, concurrency: usize) -> Self {
        Self {
            launcher,
            extractor: Arc::new(extractor),
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(launcher: Arc<dyn BrowserLauncher>, config: &Config) -> Self {
        Self::new(
            launcher,
            PageExtractor::new(ExtractorSettings::from(&config.extractor)),
            config.orchestrator.concurrency,
        )
    }

    /// Validates, then runs every task to completion. `on_progress` is
    /// called once per finished task, in completion order.
    pub async fn run_batch<F>(&self, tasks: Vec<ExtractionTask>, mut on_progress: F) -> Result<BatchOutcome>
    where
        F: FnMut(BatchProgress<'_>),
    {
        validate_tasks(&tasks)?;

        let run_id = Uuid::new_v4();
        let started_at = Local::now();
        let total = tasks.len();
        info!(%run_id, "🚀 Starting batch of {} tasks ({} concurrent)", total, self.concurrency);

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let (tx, mut rx) = mpsc::unbounded_channel::<TaskResult>();

        for task in tasks {
            let semaphore = semaphore.clone();
            let tx = tx.clone();
            let launcher = self.launcher.clone();
            let extractor = self.extractor.clone();

            tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let _ = tx.send(TaskResult::failed_with(
                            task,
                            "scheduler",
                            format!("Semaphore acquire failed: {}", e),
                        ));
                        return;
                    }
                };

                // A panic inside the extraction stays inside this inner task.
                let fallback = task.clone();
                let result = match tokio::spawn(run_task(launcher, extractor, task)).await {
                    Ok(result) => result,
                    Err(join_err) => {
                        error!("Task {} aborted: {}", fallback.id + 1, join_err);
                        counter!(names::TASKS_FAILED, "code" => "aborted").increment(1);
                        TaskResult::failed_with(
                            fallback,
                            "aborted",
                            format!("Extraction aborted unexpectedly: {}", join_err),
                        )
                    }
                };
                let _ = tx.send(result);
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = rx.recv().await {
            results.push(result);
            if let Some(last) = results.last() {
                info!("Completed {}/{} tasks: {}", results.len(), total, last.title());
                on_progress(BatchProgress {
                    completed: results.len(),
                    total,
                    result: last,
                });
            }
        }

        let outcome = BatchOutcome {
            run_id,
            results,
            started_at,
            finished_at: Local::now(),
        };
        info!(
            %run_id,
            "🏁 Batch finished: {} succeeded, {} failed",
            outcome.succeeded_count(),
            outcome.failed_count()
        );
        Ok(outcome)
    }
}

async fn run_task(
    launcher: Arc<dyn BrowserLauncher>,
    extractor: Arc<PageExtractor>,
    task: ExtractionTask,
) -> TaskResult {
    counter!(names::TASKS_STARTED).increment(1);
    let Some(url) = task.show.as_ref().map(|s| s.detail_url.clone()) else {
        let number = task.id + 1;
        return finish(task, Err(ScraperError::MissingShow { task: number }));
    };

    let mut session = match launcher.launch().await {
        Ok(session) => session,
        Err(e) => return finish(task, Err(ScraperError::Browser(e))),
    };

    let started = Instant::now();
    let to_date = task.effective_to_date().to_string();
    let outcome = extractor
        .extract(session.as_mut(), &url, &task.from_date, &to_date)
        .await;
    histogram!(names::EXTRACTION_DURATION).record(started.elapsed().as_secs_f64());

    if let Err(e) = session.close().await {
        warn!("Failed to close browser session for task {}: {}", task.id + 1, e);
    }

    finish(task, outcome)
}

fn finish(task: ExtractionTask, outcome: Result<Vec<RawPricingLine>>) -> TaskResult {
    match outcome {
        Ok(lines) => {
            counter!(names::TASKS_SUCCEEDED).increment(1);
            info!("✅ {}: {} pricing lines", task.show_title(), lines.len());
            TaskResult::succeeded(task, lines)
        }
        Err(e) => {
            counter!(names::TASKS_FAILED, "code" => e.code()).increment(1);
            warn!("❌ {} ({}): {}", task.show_title(), task.date_range_label(), e);
            TaskResult::failed(task, &e)
        }
    }
}
