use chrono::{DateTime, Utc};

use super::{EpisodeId, JobStatus, JobType};

/// One recording session: uploaded sources, derived artifacts, and the
/// status of each processing stage.
#[derive(Debug, Clone)]
pub struct Episode {
    pub id: EpisodeId,
    pub title: String,
    pub editor_state: String,
    pub preprocess_status: JobStatus,
    pub postprocess_status: JobStatus,
    pub metadata_status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Episode {
    pub fn new(title: String) -> Self {
        let now = Utc::now();
        Self {
            id: EpisodeId::new(),
            title,
            editor_state: String::new(),
            preprocess_status: JobStatus::Init,
            postprocess_status: JobStatus::Init,
            metadata_status: JobStatus::Init,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn stage_status(&self, stage: JobType) -> Option<JobStatus> {
        match stage {
            JobType::Preprocess => Some(self.preprocess_status),
            JobType::Postprocess => Some(self.postprocess_status),
            JobType::Metadata => Some(self.metadata_status),
            JobType::Export | JobType::AudioEdit => None,
        }
    }

    pub fn set_stage_status(&mut self, stage: JobType, status: JobStatus) {
        match stage {
            JobType::Preprocess => self.preprocess_status = status,
            JobType::Postprocess => self.postprocess_status = status,
            JobType::Metadata => self.metadata_status = status,
            JobType::Export | JobType::AudioEdit => {}
        }
    }

    /// Progress ordinal for the stepper UI: the number of COMPLETED stages
    /// read in pipeline order, stopping at the first stage that is not
    /// COMPLETED. A completed later stage behind a failed earlier one does
    /// not count.
    pub fn current_step(&self) -> usize {
        [
            self.preprocess_status,
            self.postprocess_status,
            self.metadata_status,
        ]
        .iter()
        .take_while(|status| **status == JobStatus::Completed)
        .count()
    }

    /// True while any stage is enqueued or running.
    pub fn is_busy(&self) -> bool {
        self.preprocess_status.is_busy()
            || self.postprocess_status.is_busy()
            || self.metadata_status.is_busy()
    }
}
