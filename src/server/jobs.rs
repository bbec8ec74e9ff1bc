use crate::core::dataset::SummaryResult;
use crate::core::error::DataError;
pub use crate::core::job_status::JobStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Job {
    #[serde(rename = "job_id")]
    pub id: Uuid,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<SummaryResult>,
    pub error: Option<String>,
}

/// A status change together with the fields that status requires.
#[derive(Debug, Clone)]
pub enum JobUpdate {
    Running,
    Completed {
        result: SummaryResult,
        completed_at: DateTime<Utc>,
    },
    Failed {
        error: String,
        completed_at: DateTime<Utc>,
    },
}

impl JobUpdate {
    pub fn status(&self) -> JobStatus {
        match self {
            JobUpdate::Running => JobStatus::Running,
            JobUpdate::Completed { .. } => JobStatus::Completed,
            JobUpdate::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// Process-wide table of summarization jobs. Records are never removed.
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let job = Job {
            id,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            result: None,
            error: None,
        };
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, job);
        id
    }

    /// Looks a job up by its textual id. Strings that are not UUIDs cannot
    /// name a job and are reported as not found.
    pub fn get(&self, id: &str) -> Result<Job, DataError> {
        let uuid = Uuid::parse_str(id).map_err(|_| DataError::JobNotFound(id.to_string()))?;
        self.get_by_id(uuid)
    }

    pub fn get_by_id(&self, id: Uuid) -> Result<Job, DataError> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| DataError::JobNotFound(id.to_string()))
    }

    /// Applies `update` to job `id` under a single write lock, so readers see
    /// the status and its fields change together.
    pub fn transition(&self, id: Uuid, update: JobUpdate) -> Result<(), DataError> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| DataError::JobNotFound(id.to_string()))?;

        let next = update.status();
        if !job.status.can_transition_to(next) {
            return Err(DataError::InvalidTransition {
                from: job.status,
                to: next,
            });
        }

        job.status = next;
        match update {
            JobUpdate::Running => {}
            JobUpdate::Completed {
                result,
                completed_at,
            } => {
                job.completed_at = Some(completed_at);
                job.result = Some(result);
            }
            JobUpdate::Failed {
                error,
                completed_at,
            } => {
                job.completed_at = Some(completed_at);
                job.error = Some(error);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
