use chrono::{DateTime, Utc};

use super::{EpisodeId, JobId, JobStatus, JobType};

/// One execution attempt of a processing stage. Created at enqueue time;
/// only the job runner mutates it afterwards.
#[derive(Debug, Clone)]
pub struct ProcessingJob {
    pub id: JobId,
    pub episode_id: EpisodeId,
    pub job_type: JobType,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingJob {
    pub fn new(episode_id: EpisodeId, job_type: JobType) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            episode_id,
            job_type,
            status: JobStatus::Pending,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}
