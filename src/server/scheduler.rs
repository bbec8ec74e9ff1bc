use crate::core::dataset::stats::{summarize, SummaryOptions};
use crate::core::dataset::{Dataset, SummaryResult};
use crate::core::error::DataError;
use crate::core::store::DatasetStore;
use crate::server::jobs::{Job, JobRegistry, JobUpdate};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Runs summarization jobs in the background.
///
/// Each job is a detached tokio task that does the actual computation on the
/// blocking pool. Callers only ever get the job id back; progress is observed
/// through the [`JobRegistry`]. There is no cancellation and no timeout, so a
/// job whose work never returns stays `running`.
pub struct JobScheduler {
    store: Arc<DatasetStore>,
    registry: Arc<JobRegistry>,
    options: SummaryOptions,
}

impl JobScheduler {
    pub fn new(
        store: Arc<DatasetStore>,
        registry: Arc<JobRegistry>,
        options: SummaryOptions,
    ) -> Self {
        Self {
            store,
            registry,
            options,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Registers a new job, starts it against the dataset held right now and
    /// returns the record without waiting for it to finish.
    pub fn create_summary_job(&self) -> Result<Job, DataError> {
        let job_id = self.registry.create();
        let snapshot = self.store.snapshot().ok();
        self.start_summary_job(job_id, snapshot);
        self.registry.get_by_id(job_id)
    }

    /// Summarizes `dataset` under `job_id`. A missing dataset is not an error
    /// here; it fails the job once the job runs.
    pub fn start_summary_job(&self, job_id: Uuid, dataset: Option<Arc<Dataset>>) {
        let options = self.options;
        self.spawn_job(job_id, move || {
            let dataset = dataset.ok_or(DataError::NoDataLoaded)?;
            Ok(summarize(&dataset, &options))
        });
    }

    /// Drives `job_id` through running to a terminal state around `work`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_job<F>(&self, job_id: Uuid, work: F)
    where
        F: FnOnce() -> Result<SummaryResult, DataError> + Send + 'static,
    {
        let registry = self.registry.clone();

        tokio::spawn(async move {
            if let Err(e) = registry.transition(job_id, JobUpdate::Running) {
                tracing::error!(job_id = %job_id, error = %e, "could not start job");
                return;
            }
            tracing::info!(job_id = %job_id, "job running");

            let res = tokio::task::spawn_blocking(work).await;

            let update = match res {
                Ok(Ok(result)) => JobUpdate::Completed {
                    result,
                    completed_at: Utc::now(),
                },
                Ok(Err(e)) => JobUpdate::Failed {
                    error: e.to_string(),
                    completed_at: Utc::now(),
                },
                Err(e) => JobUpdate::Failed {
                    error: format!("Task panicked: {}", e),
                    completed_at: Utc::now(),
                },
            };

            let status = update.status();
            match registry.transition(job_id, update) {
                Ok(()) => tracing::info!(job_id = %job_id, %status, "job finished"),
                Err(e) => tracing::error!(job_id = %job_id, error = %e, "could not finish job"),
            }
        });
    }
}
