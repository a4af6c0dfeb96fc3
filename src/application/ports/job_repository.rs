use async_trait::async_trait;

use crate::domain::{EpisodeId, JobId, JobStatus, ProcessingJob};

use super::RepositoryError;

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &ProcessingJob) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: JobId) -> Result<Option<ProcessingJob>, RepositoryError>;

    async fn update_status(
        &self,
        id: JobId,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<(), RepositoryError>;

    async fn list_by_episode(
        &self,
        episode_id: EpisodeId,
    ) -> Result<Vec<ProcessingJob>, RepositoryError>;

    /// The episode's PENDING or PROCESSING job, if one exists. Used to keep
    /// stage execution single-flight per episode.
    async fn find_active_by_episode(
        &self,
        episode_id: EpisodeId,
    ) -> Result<Option<ProcessingJob>, RepositoryError>;
}
